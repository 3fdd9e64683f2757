use zeroize::Zeroize;

use crate::crypto::mldsa::{SigningPrimitive, check_len};
use crate::crypto::profile::AlgorithmProfile;
use crate::errors::SignError;

/// A keypair sized for exactly one profile. The secret half is wiped when the pair is dropped.
pub struct KeyPair<const PK: usize, const SK: usize> {
    profile: &'static AlgorithmProfile,
    public: Box<[u8; PK]>,
    secret: Box<[u8; SK]>,
}

impl<const PK: usize, const SK: usize> KeyPair<PK, SK> {
    /// Generate a keypair with `primitive`. The array sizes must match the primitive's profile.
    pub fn generate(primitive: &dyn SigningPrimitive) -> Result<Self, SignError> {
        let profile = primitive.profile();
        check_len(profile, "public key", profile.public_key_bytes, PK)?;
        check_len(profile, "secret key", profile.secret_key_bytes, SK)?;
        let mut keys = KeyPair { profile, public: Box::new([0u8; PK]), secret: Box::new([0u8; SK]) };
        keys.fill(primitive)?;
        Ok(keys)
    }

    /// Ask `primitive` for fresh key material. A failed call leaves both halves zeroed.
    fn fill(&mut self, primitive: &dyn SigningPrimitive) -> Result<(), SignError> {
        let filled = primitive.keypair(&mut self.public[..], &mut self.secret[..]);
        if filled.is_err() {
            self.public.zeroize();
            self.wipe();
        }
        filled
    }

    /// Zero the secret half in place.
    pub(crate) fn wipe(&mut self) {
        self.secret.zeroize();
    }

    pub fn profile(&self) -> &'static AlgorithmProfile {
        self.profile
    }

    pub fn public_key(&self) -> &[u8; PK] {
        &self.public
    }

    pub(crate) fn secret_key(&self) -> &[u8; SK] {
        &self.secret
    }
}

impl<const PK: usize, const SK: usize> Drop for KeyPair<PK, SK> {
    fn drop(&mut self) {
        self.wipe();
        log::debug!("{} secret key wiped", self.profile.label);
    }
}

impl<const PK: usize, const SK: usize> std::fmt::Debug for KeyPair<PK, SK> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("profile", &self.profile.label)
            .field("public", &hex::encode(&self.public[..PK.min(8)]))
            .field("secret", &"<redacted>")
            .finish()
    }
}
