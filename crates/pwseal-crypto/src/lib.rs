//! pwseal-crypto: password-based authenticated-encryption envelopes
//!
//! Pipeline: password + fresh salt → PBKDF2-HMAC-SHA256 → AEAD seal → envelope → Base64
//!
//! Envelope layout:
//! ```text
//! [16 bytes: salt][12 bytes: nonce][ciphertext][16 bytes: tag]
//! ```
//!
//! Backends:
//! ```text
//! BackendSelector (probed once, cached)
//!   ├── native   (feature "native", ring): hardware AES-GCM, SIMD ChaCha20-Poly1305, PBKDF2, SystemRandom
//!   └── fallback (RustCrypto):             aes-gcm, chacha20poly1305, pbkdf2, OsRng
//! ```
//!
//! Both backends produce byte-identical envelopes.

pub mod aead;
pub mod backend;
pub mod codec;
pub mod envelope;
pub mod kdf;
pub mod rng;
pub mod sealer;

use std::sync::OnceLock;

use secrecy::SecretString;

pub use backend::{BackendSelector, Capabilities, CapabilityProbe, FixedProbe, PlatformProbe};
pub use codec::{bytes_to_text, decode_base64, encode_base64, text_to_bytes};
pub use envelope::{decrypt_from_envelope, encrypt_to_envelope, Envelope, EnvelopeParts};
pub use kdf::{derive_key, DerivedKey, DEFAULT_PASSWORD, PBKDF2_ITERATIONS};
pub use pwseal_core::{Algorithm, Backend, SealError, SealResult, Support, TextEncoding};
pub use sealer::Sealer;

/// Size of a derived key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of a PBKDF2 salt
pub const SALT_SIZE: usize = 16;

/// Size of an AES-GCM / ChaCha20-Poly1305 nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM / Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

/// Offset of the ciphertext within an envelope
pub const HEADER_SIZE: usize = SALT_SIZE + NONCE_SIZE;

/// Process-wide sealer used by the free functions below. Probes on first use.
pub fn default_sealer() -> &'static Sealer {
    static DEFAULT: OnceLock<Sealer> = OnceLock::new();
    DEFAULT.get_or_init(Sealer::platform)
}

/// Encrypt `plaintext` with the process-wide sealer.
pub fn encrypt(
    plaintext: &str,
    password: &str,
    algorithm: Algorithm,
    encoding: &TextEncoding,
) -> SealResult<String> {
    let password = SecretString::from(password);
    default_sealer().encrypt(plaintext, &password, algorithm, encoding)
}

/// Decrypt a text-encoded envelope with the process-wide sealer.
pub fn decrypt(
    encoded: &str,
    password: &str,
    algorithm: Algorithm,
    encoding: &TextEncoding,
) -> SealResult<String> {
    let password = SecretString::from(password);
    default_sealer().decrypt(encoded, &password, algorithm, encoding)
}

/// Capability of the process-wide sealer for `algorithm`.
pub fn supports(algorithm: Algorithm) -> Support {
    default_sealer().supports(algorithm)
}

/// Base64 of the UTF-8 bytes of `text`. Independent of encryption.
pub fn to_base64(text: &str) -> String {
    encode_base64(&text_to_bytes(text))
}

/// Inverse of [`to_base64`].
pub fn from_base64(encoded: &str) -> SealResult<String> {
    bytes_to_text(&decode_base64(encoded)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_from_base64() {
        assert_eq!(to_base64("hello"), "aGVsbG8=");
        // U+1F30D is F0 9F 8C 8D
        assert_eq!(to_base64("🌍"), "8J+MjQ==");
        assert_eq!(from_base64("8J+MjQ==").unwrap(), "🌍");
        assert_eq!(from_base64("8J+MjQ==").unwrap().as_bytes(), &[0xF0, 0x9F, 0x8C, 0x8D]);
    }

    #[test]
    fn test_from_base64_errors() {
        assert!(from_base64("%%%").unwrap_err().is_decoding());
        // valid Base64 of a lone continuation byte
        assert!(from_base64("gA==").unwrap_err().is_decoding());
    }

    #[test]
    fn test_header_size() {
        assert_eq!(HEADER_SIZE, 28);
    }

    #[test]
    fn test_default_sealer_roundtrip() {
        let encoded = encrypt("free function", "pw", Algorithm::ChaCha20Poly1305, &TextEncoding::Base64).unwrap();
        let decoded = decrypt(&encoded, "pw", Algorithm::ChaCha20Poly1305, &TextEncoding::Base64).unwrap();
        assert_eq!(decoded, "free function");
        assert_ne!(supports(Algorithm::Aes256Gcm), Support::None);
    }
}
