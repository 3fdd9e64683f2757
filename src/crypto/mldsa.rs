//! ML-DSA backend for both profiles, built on the PQClean bindings.
//!
//! The primitives work on caller-owned buffers whose lengths must match the profile
//! exactly, so a Level-A buffer can never be handed to the Level-B primitive.

use std::sync::atomic::{Ordering, compiler_fence};

use pqcrypto_mldsa::{mldsa44, mldsa87};
use pqcrypto_traits::sign::{DetachedSignature as _, PublicKey as _, SecretKey as _};

use crate::crypto::profile::{AlgorithmProfile, LEVEL_A, LEVEL_B};
use crate::errors::SignError;

/// Opaque signature primitive bound to one profile.
pub trait SigningPrimitive: Send + Sync {
    fn profile(&self) -> &'static AlgorithmProfile;

    /// Fill `public` and `secret` with a fresh keypair.
    fn keypair(&self, public: &mut [u8], secret: &mut [u8]) -> Result<(), SignError>;

    /// Sign `message` into `signature` and return the number of bytes written.
    fn sign(&self, signature: &mut [u8], message: &[u8], secret: &[u8]) -> Result<usize, SignError>;

    fn verify(&self, signature: &[u8], message: &[u8], public: &[u8]) -> bool;
}

pub(crate) fn check_len(
    profile: &AlgorithmProfile,
    what: &'static str,
    expected: usize,
    got: usize,
) -> Result<(), SignError> {
    if expected == got {
        Ok(())
    } else {
        Err(SignError::InvalidLength { profile: profile.label, what, expected, got })
    }
}

fn copy_exact(
    profile: &AlgorithmProfile,
    what: &'static str,
    src: &[u8],
    dst: &mut [u8],
) -> Result<(), SignError> {
    check_len(profile, what, dst.len(), src.len())?;
    dst.copy_from_slice(src);
    Ok(())
}

macro_rules! mldsa_backend {
    ($name:ident, $module:ident, $profile:expr) => {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $name;

        // `scrub` writes over every byte of the backend value; it must be exactly the key.
        const _: () = assert!(std::mem::size_of::<$module::SecretKey>() == $profile.secret_key_bytes);

        impl $name {
            // Backend key values are plain byte arrays without a Drop impl; wipe them by hand.
            fn scrub(sk: &mut $module::SecretKey) {
                let ptr = (sk as *mut $module::SecretKey).cast::<u8>();
                for offset in 0..std::mem::size_of::<$module::SecretKey>() {
                    // SAFETY: `SecretKey` wraps a byte array, so every offset below its size is a
                    // valid `u8` inside the value and zero is a valid bit pattern.
                    unsafe { std::ptr::write_volatile(ptr.add(offset), 0) };
                }
                compiler_fence(Ordering::SeqCst);
            }
        }

        impl SigningPrimitive for $name {
            fn profile(&self) -> &'static AlgorithmProfile {
                &$profile
            }

            fn keypair(&self, public: &mut [u8], secret: &mut [u8]) -> Result<(), SignError> {
                let profile = self.profile();
                check_len(profile, "public key", profile.public_key_bytes, public.len())?;
                check_len(profile, "secret key", profile.secret_key_bytes, secret.len())?;
                let (pk, mut sk) = $module::keypair();
                let copied = copy_exact(profile, "public key", pk.as_bytes(), public)
                    .and_then(|()| copy_exact(profile, "secret key", sk.as_bytes(), secret));
                Self::scrub(&mut sk);
                copied
            }

            fn sign(
                &self,
                signature: &mut [u8],
                message: &[u8],
                secret: &[u8],
            ) -> Result<usize, SignError> {
                let profile = self.profile();
                check_len(profile, "signature", profile.signature_bytes, signature.len())?;
                let mut sk = $module::SecretKey::from_bytes(secret).map_err(|e| {
                    SignError::Primitive { profile: profile.label, reason: format!("{e:?}") }
                })?;
                let sig = $module::detached_sign(message, &sk);
                Self::scrub(&mut sk);
                let bytes = sig.as_bytes();
                if bytes.len() > signature.len() {
                    return Err(SignError::SignatureTooLong {
                        profile: profile.label,
                        len: bytes.len(),
                        max: signature.len(),
                    });
                }
                signature[..bytes.len()].copy_from_slice(bytes);
                Ok(bytes.len())
            }

            fn verify(&self, signature: &[u8], message: &[u8], public: &[u8]) -> bool {
                let (Ok(pk), Ok(sig)) = (
                    $module::PublicKey::from_bytes(public),
                    $module::DetachedSignature::from_bytes(signature),
                ) else {
                    return false;
                };
                $module::verify_detached_signature(&sig, message, &pk).is_ok()
            }
        }
    };
}

mldsa_backend!(MlDsa44, mldsa44, LEVEL_A);
mldsa_backend!(MlDsa87, mldsa87, LEVEL_B);
