//! Keygen / sign / verify timings for both profiles.

use std::time::Instant;

use serde::Serialize;

use crate::crypto::{
    KeyPair, LEVEL_A_PK, LEVEL_A_SIG, LEVEL_A_SK, LEVEL_B_PK, LEVEL_B_SIG, LEVEL_B_SK, MlDsa44,
    MlDsa87, SigningPrimitive,
};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub algorithm: &'static str,
    pub iterations: u32,
    pub keygen_us: u128,
    pub sign_us_avg: f64,
    pub verify_us_avg: f64,
    pub signature_bytes: usize,
    pub verified: bool,
}

impl std::fmt::Display for BenchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<10} keygen {:>8} us | sign {:>10.1} us | verify {:>10.1} us | sig {} B | {}",
            self.algorithm,
            self.keygen_us,
            self.sign_us_avg,
            self.verify_us_avg,
            self.signature_bytes,
            if self.verified { "verification OK" } else { "verification FAILED" }
        )
    }
}

fn bench_profile<const PK: usize, const SK: usize, const SIG: usize>(
    primitive: &dyn SigningPrimitive,
    iterations: u32,
    message: &[u8],
) -> Result<BenchReport, ServiceError> {
    let profile = primitive.profile();
    let keygen_err =
        |e: crate::errors::SignError| ServiceError::KeyGeneration { profile: profile.label, reason: e.to_string() };

    let t0 = Instant::now();
    let keys = KeyPair::<PK, SK>::generate(primitive).map_err(keygen_err)?;
    let keygen_us = t0.elapsed().as_micros();

    let iterations = iterations.max(1);
    let mut sig = Box::new([0u8; SIG]);
    let mut sign_total = 0f64;
    let mut verify_total = 0f64;
    let mut verified = true;
    let mut len = 0;
    for _ in 0..iterations {
        let t = Instant::now();
        len = primitive
            .sign(&mut sig[..], message, &keys.secret_key()[..])?;
        sign_total += t.elapsed().as_secs_f64() * 1e6;

        let t = Instant::now();
        verified &= primitive.verify(&sig[..len], message, &keys.public_key()[..]);
        verify_total += t.elapsed().as_secs_f64() * 1e6;
    }

    Ok(BenchReport {
        algorithm: profile.label,
        iterations,
        keygen_us,
        sign_us_avg: sign_total / f64::from(iterations),
        verify_us_avg: verify_total / f64::from(iterations),
        signature_bytes: len,
        verified,
    })
}

/// Benchmark Level-A then Level-B over `message`.
pub fn run(iterations: u32, message: &[u8]) -> Result<Vec<BenchReport>, ServiceError> {
    Ok(vec![
        bench_profile::<LEVEL_A_PK, LEVEL_A_SK, LEVEL_A_SIG>(&MlDsa44, iterations, message)?,
        bench_profile::<LEVEL_B_PK, LEVEL_B_SK, LEVEL_B_SIG>(&MlDsa87, iterations, message)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_both_profiles_and_verifies() {
        let reports = run(1, b"Hello from the bench").unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].algorithm, "ML-DSA-44");
        assert_eq!(reports[1].algorithm, "ML-DSA-87");
        assert!(reports.iter().all(|r| r.verified));
        assert!(reports[0].signature_bytes <= LEVEL_A_SIG);
        assert!(reports[1].signature_bytes <= LEVEL_B_SIG);
    }
}
