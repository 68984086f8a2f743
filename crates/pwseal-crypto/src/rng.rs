//! Cryptographically secure random bytes
//!
//! Both backends read from the operating system CSPRNG. A failure is an
//! `Environment` error; there is no fallback to a seeded or user-space PRNG.

use pwseal_core::{Backend, SealError, SealResult};
use rand::{rngs::OsRng, RngCore};

/// Fill `buf` with random bytes from the given backend.
pub fn fill_random(backend: Backend, buf: &mut [u8]) -> SealResult<()> {
    match backend {
        Backend::Native => fill_native(buf),
        Backend::Fallback => OsRng
            .try_fill_bytes(buf)
            .map_err(|e| SealError::Environment(format!("OS random source unavailable: {e}"))),
    }
}

/// Return `n` random bytes.
pub fn random_bytes(backend: Backend, n: usize) -> SealResult<Vec<u8>> {
    let mut buf = vec![0u8; n];
    fill_random(backend, &mut buf)?;
    Ok(buf)
}

/// Return a fixed-size array of random bytes.
pub fn random_array<const N: usize>(backend: Backend) -> SealResult<[u8; N]> {
    let mut buf = [0u8; N];
    fill_random(backend, &mut buf)?;
    Ok(buf)
}

#[cfg(feature = "native")]
fn fill_native(buf: &mut [u8]) -> SealResult<()> {
    use ring::rand::{SecureRandom, SystemRandom};

    SystemRandom::new()
        .fill(buf)
        .map_err(|_| SealError::Environment("system random source unavailable".into()))
}

#[cfg(not(feature = "native"))]
fn fill_native(_buf: &mut [u8]) -> SealResult<()> {
    Err(crate::backend::native_unavailable())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_returns_requested_length() {
        assert_eq!(random_bytes(Backend::Fallback, 0).unwrap().len(), 0);
        assert_eq!(random_bytes(Backend::Fallback, 37).unwrap().len(), 37);
    }

    #[test]
    fn fallback_draws_differ() {
        let a: [u8; 16] = random_array(Backend::Fallback).unwrap();
        let b: [u8; 16] = random_array(Backend::Fallback).unwrap();
        assert_ne!(a, b, "two 128-bit draws must not collide");
    }

    #[cfg(feature = "native")]
    #[test]
    fn native_draws_differ() {
        let a: [u8; 16] = random_array(Backend::Native).unwrap();
        let b: [u8; 16] = random_array(Backend::Native).unwrap();
        assert_ne!(a, b);
    }

    #[cfg(not(feature = "native"))]
    #[test]
    fn native_without_feature_is_environment_error() {
        assert!(random_bytes(Backend::Native, 12).unwrap_err().is_environment());
    }
}
