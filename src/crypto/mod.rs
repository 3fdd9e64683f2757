//! Post-quantum signing: fixed algorithm profiles, zeroizing keypairs, the ML-DSA backend,
//! and the dual-algorithm signer that picks one profile per request.
//! Public API is re-exported here.

pub mod keys;
pub mod mldsa;
pub mod profile;
pub mod signer;

pub use keys::KeyPair;
pub use mldsa::{MlDsa44, MlDsa87, SigningPrimitive};
pub use profile::{
    AlgorithmId, AlgorithmProfile, LEVEL_A, LEVEL_A_PK, LEVEL_A_SIG, LEVEL_A_SK, LEVEL_B, LEVEL_B_PK,
    LEVEL_B_SIG, LEVEL_B_SK,
};
pub use signer::{DualSigner, Signature, Signed};
