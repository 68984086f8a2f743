//! Key derivation: PBKDF2-HMAC-SHA256 password → envelope key
//!
//! Iteration count and hash are fixed. Both backends compute the same
//! function, so a key derived natively equals one derived portably.

use std::num::NonZeroU32;

use pwseal_core::{Backend, SealResult};
use secrecy::{ExposeSecret, SecretString};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{KEY_SIZE, SALT_SIZE};

/// PBKDF2 iteration count
pub const PBKDF2_ITERATIONS: u32 = 100_000;

const ITERATIONS: NonZeroU32 = match NonZeroU32::new(PBKDF2_ITERATIONS) {
    Some(n) => n,
    None => panic!("PBKDF2_ITERATIONS must be non-zero"),
};

/// Substituted for an empty password
pub const DEFAULT_PASSWORD: &str = "default-password";

/// A 256-bit envelope key. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

fn password_bytes(password: &SecretString) -> &[u8] {
    let exposed = password.expose_secret();
    if exposed.is_empty() {
        DEFAULT_PASSWORD.as_bytes()
    } else {
        exposed.as_bytes()
    }
}

/// Derive the envelope key for `password` and a 16-byte salt.
pub fn derive_key(
    backend: Backend,
    password: &SecretString,
    salt: &[u8; SALT_SIZE],
) -> SealResult<DerivedKey> {
    let mut key = DerivedKey::from_bytes([0u8; KEY_SIZE]);
    pbkdf2_sha256(backend, password_bytes(password), salt, ITERATIONS, &mut key.bytes)?;
    Ok(key)
}

/// Raw PBKDF2-HMAC-SHA256 on the chosen backend. `out.len()` sets the output length.
pub(crate) fn pbkdf2_sha256(
    backend: Backend,
    secret: &[u8],
    salt: &[u8],
    iterations: NonZeroU32,
    out: &mut [u8],
) -> SealResult<()> {
    match backend {
        Backend::Native => pbkdf2_native(secret, salt, iterations, out),
        Backend::Fallback => {
            pbkdf2::pbkdf2_hmac::<sha2::Sha256>(secret, salt, iterations.get(), out);
            Ok(())
        }
    }
}

#[cfg(feature = "native")]
fn pbkdf2_native(secret: &[u8], salt: &[u8], iterations: NonZeroU32, out: &mut [u8]) -> SealResult<()> {
    ring::pbkdf2::derive(ring::pbkdf2::PBKDF2_HMAC_SHA256, iterations, salt, secret, out);
    Ok(())
}

#[cfg(not(feature = "native"))]
fn pbkdf2_native(_secret: &[u8], _salt: &[u8], _iterations: NonZeroU32, _out: &mut [u8]) -> SealResult<()> {
    Err(crate::backend::native_unavailable())
}
