use crate::crypto::keys::KeyPair;
use crate::crypto::mldsa::{MlDsa44, MlDsa87, SigningPrimitive, check_len};
use crate::crypto::profile::{
    AlgorithmId, LEVEL_A_PK, LEVEL_A_SIG, LEVEL_A_SK, LEVEL_B_PK, LEVEL_B_SIG, LEVEL_B_SK,
};
use crate::errors::{ServiceError, SignError};

/// Signature bytes held in a buffer sized to one profile's bound.
#[derive(Debug, Clone)]
pub struct Signature<const SIG: usize> {
    bytes: Box<[u8; SIG]>,
    len: usize,
}

impl<const SIG: usize> Signature<SIG> {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Output of [`DualSigner::sign`]; each variant carries its own buffer type.
#[derive(Debug, Clone)]
pub enum Signed {
    LevelA(Signature<LEVEL_A_SIG>),
    LevelB(Signature<LEVEL_B_SIG>),
}

impl Signed {
    pub fn algorithm(&self) -> AlgorithmId {
        match self {
            Signed::LevelA(_) => AlgorithmId::LevelA,
            Signed::LevelB(_) => AlgorithmId::LevelB,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Signed::LevelA(sig) => sig.as_bytes(),
            Signed::LevelB(sig) => sig.as_bytes(),
        }
    }
}

struct ProfileSigner<const PK: usize, const SK: usize, const SIG: usize> {
    keys: KeyPair<PK, SK>,
    primitive: Box<dyn SigningPrimitive>,
}

impl<const PK: usize, const SK: usize, const SIG: usize> ProfileSigner<PK, SK, SIG> {
    fn generate(primitive: Box<dyn SigningPrimitive>) -> Result<Self, ServiceError> {
        let profile = primitive.profile();
        let keys = KeyPair::<PK, SK>::generate(primitive.as_ref()).map_err(|e| {
            ServiceError::KeyGeneration { profile: profile.label, reason: e.to_string() }
        })?;
        log::info!("Generated {} keypair ({} byte public key)", profile.label, PK);
        Ok(ProfileSigner { keys, primitive })
    }

    fn sign(&self, payload: &[u8]) -> Result<Signature<SIG>, SignError> {
        let profile = self.keys.profile();
        check_len(profile, "signature", profile.signature_bytes, SIG)?;
        let mut bytes = Box::new([0u8; SIG]);
        let len = self.primitive.sign(&mut bytes[..], payload, &self.keys.secret_key()[..])?;
        if len > profile.signature_bytes {
            return Err(SignError::SignatureTooLong {
                profile: profile.label,
                len,
                max: profile.signature_bytes,
            });
        }
        Ok(Signature { bytes, len })
    }

    fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        self.primitive.verify(signature, payload, &self.keys.public_key()[..])
    }
}

/// Owns one keypair per profile for the lifetime of the process and signs with the one
/// the decision engine selects.
pub struct DualSigner {
    level_a: ProfileSigner<LEVEL_A_PK, LEVEL_A_SK, LEVEL_A_SIG>,
    level_b: ProfileSigner<LEVEL_B_PK, LEVEL_B_SK, LEVEL_B_SIG>,
}

impl DualSigner {
    /// Generate both ML-DSA keypairs. Failure here is fatal to the service.
    pub fn generate() -> Result<Self, ServiceError> {
        Self::with_primitives(Box::new(MlDsa44), Box::new(MlDsa87))
    }

    /// Build a signer over injected primitives. `level_a` must be a Level-A primitive and
    /// `level_b` a Level-B one; the key buffer sizes reject anything else.
    pub fn with_primitives(
        level_a: Box<dyn SigningPrimitive>,
        level_b: Box<dyn SigningPrimitive>,
    ) -> Result<Self, ServiceError> {
        let level_a = ProfileSigner::generate(level_a)?;
        let level_b = ProfileSigner::generate(level_b)?;
        Ok(DualSigner { level_a, level_b })
    }

    /// Sign `payload` with Level-B when `use_level_b` is set, Level-A otherwise. No retry.
    pub fn sign(&self, payload: &[u8], use_level_b: bool) -> Result<Signed, SignError> {
        match AlgorithmId::from_decision(use_level_b) {
            AlgorithmId::LevelA => self.level_a.sign(payload).map(Signed::LevelA),
            AlgorithmId::LevelB => self.level_b.sign(payload).map(Signed::LevelB),
        }
    }

    pub fn public_key(&self, algorithm: AlgorithmId) -> &[u8] {
        match algorithm {
            AlgorithmId::LevelA => &self.level_a.keys.public_key()[..],
            AlgorithmId::LevelB => &self.level_b.keys.public_key()[..],
        }
    }

    pub fn verify(&self, algorithm: AlgorithmId, payload: &[u8], signature: &[u8]) -> bool {
        match algorithm {
            AlgorithmId::LevelA => self.level_a.verify(payload, signature),
            AlgorithmId::LevelB => self.level_b.verify(payload, signature),
        }
    }
}

impl std::fmt::Debug for DualSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualSigner")
            .field("level_a", &self.level_a.keys)
            .field("level_b", &self.level_b.keys)
            .finish()
    }
}
