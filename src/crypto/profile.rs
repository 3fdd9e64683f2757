use serde::{Deserialize, Serialize};

// ML-DSA-44 (FIPS 204, security category 2)
pub const LEVEL_A_PK: usize = 1312;
pub const LEVEL_A_SK: usize = 2560;
pub const LEVEL_A_SIG: usize = 2420;

// ML-DSA-87 (FIPS 204, security category 5)
pub const LEVEL_B_PK: usize = 2592;
pub const LEVEL_B_SK: usize = 4896;
pub const LEVEL_B_SIG: usize = 4627;

/// The two signature parameter sets the service can choose between.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgorithmId {
    /// Faster, smaller signatures.
    LevelA,
    /// Slower, stronger signatures.
    LevelB,
}

/// Fixed size descriptor of one signature profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlgorithmProfile {
    pub id: AlgorithmId,
    /// Label used on the wire (`ALG:` field).
    pub label: &'static str,
    pub public_key_bytes: usize,
    pub secret_key_bytes: usize,
    /// Upper bound on the signature length.
    pub signature_bytes: usize,
}

pub const LEVEL_A: AlgorithmProfile = AlgorithmProfile {
    id: AlgorithmId::LevelA,
    label: "ML-DSA-44",
    public_key_bytes: LEVEL_A_PK,
    secret_key_bytes: LEVEL_A_SK,
    signature_bytes: LEVEL_A_SIG,
};

pub const LEVEL_B: AlgorithmProfile = AlgorithmProfile {
    id: AlgorithmId::LevelB,
    label: "ML-DSA-87",
    public_key_bytes: LEVEL_B_PK,
    secret_key_bytes: LEVEL_B_SK,
    signature_bytes: LEVEL_B_SIG,
};

impl AlgorithmId {
    /// Maps the decision engine's boolean onto a profile (`true` selects Level-B).
    pub fn from_decision(use_level_b: bool) -> Self {
        if use_level_b { AlgorithmId::LevelB } else { AlgorithmId::LevelA }
    }

    pub fn profile(self) -> &'static AlgorithmProfile {
        match self {
            AlgorithmId::LevelA => &LEVEL_A,
            AlgorithmId::LevelB => &LEVEL_B,
        }
    }

    pub fn label(self) -> &'static str {
        self.profile().label
    }

    /// Resolve a wire label back to a profile.
    pub fn from_label(label: &str) -> Option<Self> {
        [AlgorithmId::LevelA, AlgorithmId::LevelB].into_iter().find(|id| id.label() == label)
    }

    /// Identify a profile by the length of a public key.
    pub fn from_public_key_len(len: usize) -> Option<Self> {
        match len {
            LEVEL_A_PK => Some(AlgorithmId::LevelA),
            LEVEL_B_PK => Some(AlgorithmId::LevelB),
            _ => None,
        }
    }
}

impl std::fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
