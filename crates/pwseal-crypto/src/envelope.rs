//! Envelope binary layout
//!
//! ```text
//! [16 bytes: salt][12 bytes: nonce][N bytes: ciphertext][16 bytes: tag]
//! ```
//!
//! The salt feeds PBKDF2, the nonce feeds the AEAD. Neither is secret. The
//! algorithm is not recorded: the decrypting side must supply it.

use pwseal_core::{Algorithm, SealError, SealResult};
use secrecy::SecretString;
use tracing::debug;
use zeroize::Zeroize;

use crate::backend::BackendSelector;
use crate::{aead, codec, kdf, rng, HEADER_SIZE, NONCE_SIZE, SALT_SIZE};

/// An assembled envelope. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    bytes: Vec<u8>,
}

/// Borrowed view of an envelope's fields.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeParts<'a> {
    pub salt: &'a [u8; SALT_SIZE],
    pub nonce: &'a [u8; NONCE_SIZE],
    pub ciphertext: &'a [u8],
}

impl Envelope {
    /// Concatenate `salt ‖ nonce ‖ ciphertext`.
    pub fn assemble(salt: &[u8; SALT_SIZE], nonce: &[u8; NONCE_SIZE], ciphertext: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + ciphertext.len());
        bytes.extend_from_slice(salt);
        bytes.extend_from_slice(nonce);
        bytes.extend_from_slice(ciphertext);
        Self { bytes }
    }

    /// Wrap raw envelope bytes, checking only the minimum length.
    pub fn from_bytes(bytes: Vec<u8>) -> SealResult<Self> {
        parse(&bytes)?;
        Ok(Self { bytes })
    }

    /// Borrow the fields of raw envelope bytes. See [`parse`].
    pub fn parse(bytes: &[u8]) -> SealResult<EnvelopeParts<'_>> {
        parse(bytes)
    }

    pub fn salt(&self) -> &[u8] {
        &self.bytes[..SALT_SIZE]
    }

    pub fn nonce(&self) -> &[u8] {
        &self.bytes[SALT_SIZE..HEADER_SIZE]
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for Envelope {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Split raw bytes at the fixed offsets 16 and 28.
pub fn parse(bytes: &[u8]) -> SealResult<EnvelopeParts<'_>> {
    let too_short = || {
        SealError::Format(format!(
            "envelope too short: {} bytes (minimum {HEADER_SIZE})",
            bytes.len()
        ))
    };
    let (salt, rest) = bytes.split_first_chunk::<SALT_SIZE>().ok_or_else(too_short)?;
    let (nonce, ciphertext) = rest.split_first_chunk::<NONCE_SIZE>().ok_or_else(too_short)?;
    Ok(EnvelopeParts {
        salt,
        nonce,
        ciphertext,
    })
}

/// Encrypt `plaintext` under `password` into a fresh envelope.
///
/// Salt and nonce are drawn fresh on every call. Backend availability is
/// checked before any randomness is drawn.
pub fn encrypt_to_envelope(
    selector: &BackendSelector,
    plaintext: &str,
    password: &SecretString,
    algorithm: Algorithm,
) -> SealResult<Envelope> {
    let cipher_backend = selector.backend_for(algorithm)?;
    let kdf_backend = selector.kdf_backend()?;
    let rng_backend = selector.rng_backend()?;

    let salt: [u8; SALT_SIZE] = rng::random_array(rng_backend)?;
    let nonce: [u8; NONCE_SIZE] = rng::random_array(rng_backend)?;
    let key = kdf::derive_key(kdf_backend, password, &salt)?;

    let mut message = codec::text_to_bytes(plaintext);
    let sealed = aead::seal(cipher_backend, algorithm, key.as_bytes(), &nonce, &message);
    message.zeroize();
    let envelope = Envelope::assemble(&salt, &nonce, &sealed?);

    debug!(
        %algorithm,
        backend = %cipher_backend,
        plaintext_len = plaintext.len(),
        envelope_len = envelope.len(),
        "sealed envelope"
    );
    Ok(envelope)
}

/// Decrypt raw envelope bytes back to text.
///
/// Errors: `Format` if shorter than 28 bytes, `Authentication` if the tag
/// does not verify, `Decoding` if the plaintext is not UTF-8.
pub fn decrypt_from_envelope(
    selector: &BackendSelector,
    envelope: &[u8],
    password: &SecretString,
    algorithm: Algorithm,
) -> SealResult<String> {
    let cipher_backend = selector.backend_for(algorithm)?;
    let kdf_backend = selector.kdf_backend()?;

    let parts = parse(envelope)?;
    let key = kdf::derive_key(kdf_backend, password, parts.salt)?;
    let mut plaintext = aead::open(
        cipher_backend,
        algorithm,
        key.as_bytes(),
        parts.nonce,
        parts.ciphertext,
    )?;

    debug!(
        %algorithm,
        backend = %cipher_backend,
        envelope_len = envelope.len(),
        "opened envelope"
    );

    let text = codec::bytes_to_text(&plaintext);
    plaintext.zeroize();
    text
}
