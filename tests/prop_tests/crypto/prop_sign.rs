use std::sync::OnceLock;

use proptest::prelude::*;
use sleeqc::crypto::{AlgorithmId, DualSigner, LEVEL_A_SIG, LEVEL_B_SIG};

fn signer() -> &'static DualSigner {
    static SIGNER: OnceLock<DualSigner> = OnceLock::new();
    SIGNER.get_or_init(|| DualSigner::generate().unwrap())
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 12,
        .. proptest::test_runner::Config::default()
    })]
    #[test]
    fn prop_signatures_verify_and_respect_bound(
        payload in proptest::collection::vec(any::<u8>(), 1..=10_000),
        use_level_b in any::<bool>(),
    ) {
        let s = signer();
        let signed = s.sign(&payload, use_level_b).unwrap();
        let alg = AlgorithmId::from_decision(use_level_b);
        prop_assert_eq!(signed.algorithm(), alg);
        let bound = if use_level_b { LEVEL_B_SIG } else { LEVEL_A_SIG };
        prop_assert!(signed.as_bytes().len() <= bound);
        prop_assert!(s.verify(alg, &payload, signed.as_bytes()));
    }

    #[test]
    fn prop_flipped_byte_breaks_verification(
        mut payload in proptest::collection::vec(any::<u8>(), 1..512),
        idx in any::<prop::sample::Index>(),
    ) {
        let s = signer();
        let signed = s.sign(&payload, false).unwrap();
        let i = idx.index(payload.len());
        payload[i] ^= 0x01;
        prop_assert!(!s.verify(AlgorithmId::LevelA, &payload, signed.as_bytes()));
    }
}
