//! `Sealer`: text-in, text-out envelope operations over an injected selector.

use std::sync::Arc;

use pwseal_core::{Algorithm, Backend, SealResult, Support, TextEncoding};
use secrecy::SecretString;

use crate::backend::{BackendSelector, Capabilities, CapabilityProbe};
use crate::codec;
use crate::envelope::{self, Envelope};

/// Encrypts and decrypts text-encoded envelopes.
///
/// Cheap to clone; clones share the selector and its cached capabilities.
#[derive(Debug, Clone)]
pub struct Sealer {
    selector: Arc<BackendSelector>,
}

impl Sealer {
    pub fn new(selector: BackendSelector) -> Self {
        Self::from_shared(Arc::new(selector))
    }

    pub fn from_shared(selector: Arc<BackendSelector>) -> Self {
        Self { selector }
    }

    pub fn with_probe(probe: impl CapabilityProbe + 'static) -> Self {
        Self::new(BackendSelector::new(probe))
    }

    /// Sealer that probes the running platform on first use.
    pub fn platform() -> Self {
        Self::new(BackendSelector::platform())
    }

    /// Sealer pinned to one backend for every primitive.
    pub fn with_backend(backend: Backend) -> Self {
        Self::new(BackendSelector::fixed(backend))
    }

    pub fn selector(&self) -> &BackendSelector {
        &self.selector
    }

    /// Run the capability probe now instead of on first use.
    pub fn initialize(&self) -> Capabilities {
        self.selector.capabilities()
    }

    pub fn supports(&self, algorithm: Algorithm) -> Support {
        self.selector.supports(algorithm)
    }

    pub fn encrypt_envelope(
        &self,
        plaintext: &str,
        password: &SecretString,
        algorithm: Algorithm,
    ) -> SealResult<Envelope> {
        envelope::encrypt_to_envelope(&self.selector, plaintext, password, algorithm)
    }

    pub fn decrypt_envelope(
        &self,
        envelope: &[u8],
        password: &SecretString,
        algorithm: Algorithm,
    ) -> SealResult<String> {
        envelope::decrypt_from_envelope(&self.selector, envelope, password, algorithm)
    }

    /// Encrypt `plaintext` and return the envelope as text in `encoding`.
    pub fn encrypt(
        &self,
        plaintext: &str,
        password: &SecretString,
        algorithm: Algorithm,
        encoding: &TextEncoding,
    ) -> SealResult<String> {
        // reject before paying for key derivation
        codec::encode_text(encoding, &[])?;
        let envelope = self.encrypt_envelope(plaintext, password, algorithm)?;
        codec::encode_text(encoding, envelope.as_bytes())
    }

    /// Decode `encoded` from `encoding` and decrypt it.
    pub fn decrypt(
        &self,
        encoded: &str,
        password: &SecretString,
        algorithm: Algorithm,
        encoding: &TextEncoding,
    ) -> SealResult<String> {
        let bytes = codec::decode_text(encoding, encoded)?;
        self.decrypt_envelope(&bytes, password, algorithm)
    }

    pub fn encrypt_aes(&self, plaintext: &str, password: &SecretString) -> SealResult<String> {
        self.encrypt(plaintext, password, Algorithm::Aes256Gcm, &TextEncoding::Base64)
    }

    pub fn decrypt_aes(&self, encoded: &str, password: &SecretString) -> SealResult<String> {
        self.decrypt(encoded, password, Algorithm::Aes256Gcm, &TextEncoding::Base64)
    }

    pub fn encrypt_chacha(&self, plaintext: &str, password: &SecretString) -> SealResult<String> {
        self.encrypt(plaintext, password, Algorithm::ChaCha20Poly1305, &TextEncoding::Base64)
    }

    pub fn decrypt_chacha(&self, encoded: &str, password: &SecretString) -> SealResult<String> {
        self.decrypt(encoded, password, Algorithm::ChaCha20Poly1305, &TextEncoding::Base64)
    }
}

impl Default for Sealer {
    fn default() -> Self {
        Self::platform()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sealer() -> Sealer {
        Sealer::with_backend(Backend::Fallback)
    }

    #[test]
    fn test_base64_roundtrip() {
        let s = sealer();
        let pw = SecretString::from("correct-horse");
        let encoded = s
            .encrypt("Hello, 🌍!", &pw, Algorithm::Aes256Gcm, &TextEncoding::Base64)
            .unwrap();
        assert!(encoded.len() >= 40);
        let decoded = s
            .decrypt(&encoded, &pw, Algorithm::Aes256Gcm, &TextEncoding::Base64)
            .unwrap();
        assert_eq!(decoded, "Hello, 🌍!");
    }

    #[test]
    fn test_unimplemented_encoding_fails_explicitly() {
        let s = sealer();
        let pw = SecretString::from("pw");
        let enc = TextEncoding::Other("Base1024".into());

        assert!(s.encrypt("x", &pw, Algorithm::Aes256Gcm, &enc).unwrap_err().is_unsupported());
        assert!(s.decrypt("AAAA", &pw, Algorithm::Aes256Gcm, &enc).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_malformed_base64_is_decoding_error() {
        let s = sealer();
        let err = s
            .decrypt("not base64!", &SecretString::from("pw"), Algorithm::Aes256Gcm, &TextEncoding::Base64)
            .unwrap_err();
        assert!(err.is_decoding());
    }

    #[test]
    fn test_short_base64_is_format_error() {
        let s = sealer();
        let err = s.decrypt_aes("AAAA", &SecretString::from("pw")).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_algorithm_shorthands() {
        let s = sealer();
        let pw = SecretString::from("pw");

        let aes = s.encrypt_aes("aes text", &pw).unwrap();
        assert_eq!(s.decrypt_aes(&aes, &pw).unwrap(), "aes text");

        let chacha = s.encrypt_chacha("chacha text", &pw).unwrap();
        assert_eq!(s.decrypt_chacha(&chacha, &pw).unwrap(), "chacha text");
        assert!(s.decrypt_aes(&chacha, &pw).unwrap_err().is_authentication());
    }

    #[test]
    fn test_clones_share_capability_cache() {
        let s = sealer();
        let clone = s.clone();
        s.initialize();
        assert!(std::ptr::eq(s.selector(), clone.selector()));
        assert_eq!(clone.supports(Algorithm::ChaCha20Poly1305), Support::Fallback);
    }
}
