//! AEAD engine for AES-256-GCM and ChaCha20-Poly1305.
//!
//! - Both ciphers take 32-byte keys and 12-byte nonces and append a 16-byte tag.
//! - No associated data is authenticated.
//! - `open` fails closed with a bare `Authentication` error; no partial plaintext.
//! - Key/nonce length violations are `Programming` errors: internal callers
//!   always produce correctly sized values.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce as AesNonce};
use chacha20poly1305::{ChaCha20Poly1305, Nonce as ChaNonce};
use pwseal_core::{Algorithm, Backend, SealError, SealResult};

use crate::{KEY_SIZE, NONCE_SIZE, TAG_SIZE};

/// A keyed cipher, bound to one algorithm and backend.
pub enum AeadImpl {
    AesGcm(Aes256Gcm),
    ChaCha(ChaCha20Poly1305),
    #[cfg(feature = "native")]
    Native(ring::aead::LessSafeKey),
}

impl AeadImpl {
    /// Construct the cipher for `algorithm` on `backend` from a 32-byte key.
    pub fn new(backend: Backend, algorithm: Algorithm, key: &[u8]) -> SealResult<Self> {
        if key.len() != KEY_SIZE {
            return Err(SealError::Programming(format!(
                "invalid key length: expected {KEY_SIZE}, got {}",
                key.len()
            )));
        }

        match (backend, algorithm) {
            (Backend::Fallback, Algorithm::Aes256Gcm) => Aes256Gcm::new_from_slice(key)
                .map(Self::AesGcm)
                .map_err(|_| key_rejected(algorithm)),
            (Backend::Fallback, Algorithm::ChaCha20Poly1305) => {
                ChaCha20Poly1305::new_from_slice(key)
                    .map(Self::ChaCha)
                    .map_err(|_| key_rejected(algorithm))
            }
            (Backend::Native, _) => native_key(algorithm, key),
        }
    }

    /// Encrypt `plaintext`, returning ciphertext with the 16-byte tag appended.
    pub fn seal(&self, nonce: &[u8], plaintext: &[u8]) -> SealResult<Vec<u8>> {
        check_nonce(nonce)?;

        match self {
            AeadImpl::AesGcm(cipher) => cipher
                .encrypt(AesNonce::from_slice(nonce), plaintext)
                .map_err(|_| too_long(plaintext.len())),
            AeadImpl::ChaCha(cipher) => cipher
                .encrypt(ChaNonce::from_slice(nonce), plaintext)
                .map_err(|_| too_long(plaintext.len())),
            #[cfg(feature = "native")]
            AeadImpl::Native(key) => native::seal(key, nonce, plaintext),
        }
    }

    /// Verify and decrypt `ciphertext_and_tag`.
    pub fn open(&self, nonce: &[u8], ciphertext_and_tag: &[u8]) -> SealResult<Vec<u8>> {
        check_nonce(nonce)?;

        if ciphertext_and_tag.len() < TAG_SIZE {
            return Err(SealError::Authentication);
        }

        match self {
            AeadImpl::AesGcm(cipher) => cipher
                .decrypt(AesNonce::from_slice(nonce), ciphertext_and_tag)
                .map_err(|_| SealError::Authentication),
            AeadImpl::ChaCha(cipher) => cipher
                .decrypt(ChaNonce::from_slice(nonce), ciphertext_and_tag)
                .map_err(|_| SealError::Authentication),
            #[cfg(feature = "native")]
            AeadImpl::Native(key) => native::open(key, nonce, ciphertext_and_tag),
        }
    }
}

impl std::fmt::Debug for AeadImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AeadImpl::AesGcm(_) => "AesGcm",
            AeadImpl::ChaCha(_) => "ChaCha",
            #[cfg(feature = "native")]
            AeadImpl::Native(_) => "Native",
        };
        f.debug_tuple(name).field(&"[REDACTED]").finish()
    }
}

/// Seal in one call. Output length is `plaintext.len() + TAG_SIZE`.
pub fn seal(
    backend: Backend,
    algorithm: Algorithm,
    key: &[u8],
    nonce: &[u8],
    plaintext: &[u8],
) -> SealResult<Vec<u8>> {
    AeadImpl::new(backend, algorithm, key)?.seal(nonce, plaintext)
}

/// Open in one call. Any verification failure is `SealError::Authentication`.
pub fn open(
    backend: Backend,
    algorithm: Algorithm,
    key: &[u8],
    nonce: &[u8],
    ciphertext_and_tag: &[u8],
) -> SealResult<Vec<u8>> {
    AeadImpl::new(backend, algorithm, key)?.open(nonce, ciphertext_and_tag)
}

fn check_nonce(nonce: &[u8]) -> SealResult<()> {
    if nonce.len() != NONCE_SIZE {
        return Err(SealError::Programming(format!(
            "invalid nonce length: expected {NONCE_SIZE}, got {}",
            nonce.len()
        )));
    }
    Ok(())
}

fn key_rejected(algorithm: Algorithm) -> SealError {
    SealError::Programming(format!("{algorithm} rejected a {KEY_SIZE}-byte key"))
}

fn too_long(len: usize) -> SealError {
    SealError::Programming(format!("plaintext of {len} bytes exceeds the AEAD limit"))
}

#[cfg(feature = "native")]
fn native_key(algorithm: Algorithm, key: &[u8]) -> SealResult<AeadImpl> {
    native::key(algorithm, key).map(AeadImpl::Native)
}

#[cfg(not(feature = "native"))]
fn native_key(_algorithm: Algorithm, _key: &[u8]) -> SealResult<AeadImpl> {
    Err(crate::backend::native_unavailable())
}

#[cfg(feature = "native")]
mod native {
    use pwseal_core::{Algorithm, SealError, SealResult};
    use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, CHACHA20_POLY1305};

    use crate::TAG_SIZE;

    pub(super) fn key(algorithm: Algorithm, key: &[u8]) -> SealResult<LessSafeKey> {
        let alg = match algorithm {
            Algorithm::Aes256Gcm => &AES_256_GCM,
            Algorithm::ChaCha20Poly1305 => &CHACHA20_POLY1305,
        };
        UnboundKey::new(alg, key)
            .map(LessSafeKey::new)
            .map_err(|_| super::key_rejected(algorithm))
    }

    fn nonce(bytes: &[u8]) -> SealResult<Nonce> {
        Nonce::try_assume_unique_for_key(bytes)
            .map_err(|_| SealError::Programming("nonce rejected by native backend".into()))
    }

    pub(super) fn seal(key: &LessSafeKey, nonce_bytes: &[u8], plaintext: &[u8]) -> SealResult<Vec<u8>> {
        let mut in_out = Vec::with_capacity(plaintext.len() + TAG_SIZE);
        in_out.extend_from_slice(plaintext);
        key.seal_in_place_append_tag(nonce(nonce_bytes)?, Aad::empty(), &mut in_out)
            .map_err(|_| super::too_long(plaintext.len()))?;
        Ok(in_out)
    }

    pub(super) fn open(key: &LessSafeKey, nonce_bytes: &[u8], ciphertext_and_tag: &[u8]) -> SealResult<Vec<u8>> {
        let mut in_out = ciphertext_and_tag.to_vec();
        let plaintext_len = key
            .open_in_place(nonce(nonce_bytes)?, Aad::empty(), &mut in_out)
            .map_err(|_| SealError::Authentication)?
            .len();
        in_out.truncate(plaintext_len);
        Ok(in_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; KEY_SIZE] = [0x42; KEY_SIZE];
    const NONCE: [u8; NONCE_SIZE] = [0x24; NONCE_SIZE];

    fn backends() -> Vec<Backend> {
        let mut out = vec![Backend::Fallback];
        if cfg!(feature = "native") {
            out.push(Backend::Native);
        }
        out
    }

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn test_seal_open_roundtrip_all_backends() {
        for backend in backends() {
            for alg in Algorithm::ALL {
                let sealed = seal(backend, alg, &KEY, &NONCE, b"secret data").unwrap();
                assert_eq!(sealed.len(), b"secret data".len() + TAG_SIZE);
                let opened = open(backend, alg, &KEY, &NONCE, &sealed).unwrap();
                assert_eq!(opened, b"secret data", "{backend}/{alg}");
            }
        }
    }

    #[test]
    fn test_empty_plaintext_is_tag_only() {
        for backend in backends() {
            for alg in Algorithm::ALL {
                let sealed = seal(backend, alg, &KEY, &NONCE, b"").unwrap();
                assert_eq!(sealed.len(), TAG_SIZE);
                assert!(open(backend, alg, &KEY, &NONCE, &sealed).unwrap().is_empty());
            }
        }
    }

    // McGrew/Viega GCM test case 14: 256-bit zero key, zero IV, one zero block
    #[test]
    fn test_aes_gcm_known_answer() {
        for backend in backends() {
            let sealed = seal(backend, Algorithm::Aes256Gcm, &[0u8; 32], &[0u8; 12], &[0u8; 16]).unwrap();
            assert_eq!(
                hex(&sealed),
                "cea7403d4d606b6e074ec5d3baf39d18d0d1c8a799996bf0265b98b5d48ab919"
            );
        }
    }

    #[test]
    fn test_backends_produce_identical_output() {
        if !cfg!(feature = "native") {
            return;
        }
        for alg in Algorithm::ALL {
            let a = seal(Backend::Native, alg, &KEY, &NONCE, b"interop").unwrap();
            let b = seal(Backend::Fallback, alg, &KEY, &NONCE, b"interop").unwrap();
            assert_eq!(a, b, "{alg} output must not depend on backend");
        }
    }

    #[test]
    fn test_algorithms_are_not_interchangeable() {
        let sealed = seal(Backend::Fallback, Algorithm::Aes256Gcm, &KEY, &NONCE, b"x").unwrap();
        let err = open(Backend::Fallback, Algorithm::ChaCha20Poly1305, &KEY, &NONCE, &sealed).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn test_wrong_key_or_nonce_fails_authentication() {
        for backend in backends() {
            for alg in Algorithm::ALL {
                let sealed = seal(backend, alg, &KEY, &NONCE, b"payload").unwrap();
                assert!(open(backend, alg, &[0x43; KEY_SIZE], &NONCE, &sealed)
                    .unwrap_err()
                    .is_authentication());
                assert!(open(backend, alg, &KEY, &[0x25; NONCE_SIZE], &sealed)
                    .unwrap_err()
                    .is_authentication());
            }
        }
    }

    #[test]
    fn test_tampered_tag_fails() {
        for backend in backends() {
            for alg in Algorithm::ALL {
                let mut sealed = seal(backend, alg, &KEY, &NONCE, b"payload").unwrap();
                let last = sealed.len() - 1;
                sealed[last] ^= 0x01;
                assert!(open(backend, alg, &KEY, &NONCE, &sealed).unwrap_err().is_authentication());
            }
        }
    }

    #[test]
    fn test_every_bit_flip_fails() {
        for backend in backends() {
            for alg in Algorithm::ALL {
                let sealed = seal(backend, alg, &KEY, &NONCE, b"bits").unwrap();
                for idx in 0..sealed.len() {
                    for bit in 0..8 {
                        let mut tampered = sealed.clone();
                        tampered[idx] ^= 1 << bit;
                        let err = open(backend, alg, &KEY, &NONCE, &tampered).unwrap_err();
                        assert!(err.is_authentication(), "{backend}/{alg} byte {idx} bit {bit}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_short_ciphertext_fails_authentication() {
        let err = open(Backend::Fallback, Algorithm::Aes256Gcm, &KEY, &NONCE, &[0u8; 15]).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn test_bad_key_length_is_programming_error() {
        for backend in backends() {
            let err = seal(backend, Algorithm::Aes256Gcm, &[0u8; 16], &NONCE, b"x").unwrap_err();
            assert!(err.is_programming());
        }
    }

    #[test]
    fn test_bad_nonce_length_is_programming_error() {
        for backend in backends() {
            for alg in Algorithm::ALL {
                let err = seal(backend, alg, &KEY, &[0u8; 24], b"x").unwrap_err();
                assert!(err.is_programming());
                let err = open(backend, alg, &KEY, &[0u8; 8], &[0u8; 32]).unwrap_err();
                assert!(err.is_programming());
            }
        }
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let cipher = AeadImpl::new(Backend::Fallback, Algorithm::ChaCha20Poly1305, &KEY).unwrap();
        assert_eq!(format!("{cipher:?}"), "ChaCha(\"[REDACTED]\")");
    }
}
