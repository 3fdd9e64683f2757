use proptest::prelude::*;
use sleeqc::crypto::AlgorithmId;
use sleeqc::protocol::{SignedResponse, parse_response};

fn algorithm() -> impl Strategy<Value = AlgorithmId> {
    prop_oneof![Just(AlgorithmId::LevelA), Just(AlgorithmId::LevelB)]
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 64,
        .. proptest::test_runner::Config::default()
    })]
    #[test]
    fn prop_encoded_frame_parses_back(
        alg in algorithm(),
        ms in 0.0f32..100_000.0,
        sig in proptest::collection::vec(any::<u8>(), 0..256),
        pk in proptest::collection::vec(any::<u8>(), 0..256),
    ) {
        let frame = SignedResponse { algorithm: alg, latency_ms: ms, signature: &sig, public_key: &pk }.encode();
        prop_assert!(frame.is_ascii());
        prop_assert_eq!(frame.matches('|').count(), 3);
        let parsed = parse_response(&frame).unwrap();
        prop_assert_eq!(parsed.algorithm, alg);
        prop_assert_eq!(parsed.signature, sig);
        prop_assert_eq!(parsed.public_key, pk);
        let back = parsed.latency_ms.unwrap();
        prop_assert!((back - ms).abs() <= 0.005 + ms * 1e-6);
    }

    #[test]
    fn prop_parser_never_panics(text in ".{0,200}") {
        let _ = parse_response(&text);
    }
}
