use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SealError;

/// AEAD algorithm used to seal an envelope.
///
/// The envelope does not record which one was used; decryption must be given
/// the same algorithm as encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Algorithm {
    /// AES-256 in Galois/Counter Mode
    #[default]
    #[serde(rename = "AES-256-GCM")]
    Aes256Gcm,
    /// ChaCha20 stream cipher with Poly1305 MAC (RFC 8439)
    #[serde(rename = "ChaCha20-Poly1305")]
    ChaCha20Poly1305,
}

impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Algorithm::Aes256Gcm, Algorithm::ChaCha20Poly1305];

    /// Canonical name, as shown to users and written to config files.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Aes256Gcm => "AES-256-GCM",
            Algorithm::ChaCha20Poly1305 => "ChaCha20-Poly1305",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = SealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aes-256-gcm" | "aes256gcm" | "aes-gcm" | "aes" => Ok(Algorithm::Aes256Gcm),
            "chacha20-poly1305" | "chacha20poly1305" | "chacha" => {
                Ok(Algorithm::ChaCha20Poly1305)
            }
            _ => Err(SealError::Unsupported(format!("encryption algorithm: {s}"))),
        }
    }
}

/// Text encoding applied to envelope bytes for transport.
///
/// Only `Base64` is implemented. Other names are accepted so that callers can
/// pass user selections through unchanged, but every encode/decode with them
/// fails with [`SealError::Unsupported`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TextEncoding {
    /// RFC 4648 standard alphabet with padding
    #[default]
    Base64,
    /// A named encoding with no implementation
    Other(String),
}

impl TextEncoding {
    pub fn name(&self) -> &str {
        match self {
            TextEncoding::Base64 => "Base64",
            TextEncoding::Other(name) => name,
        }
    }

    pub fn is_implemented(&self) -> bool {
        matches!(self, TextEncoding::Base64)
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for TextEncoding {
    fn from(s: String) -> Self {
        if s.trim().eq_ignore_ascii_case("base64") {
            TextEncoding::Base64
        } else {
            TextEncoding::Other(s)
        }
    }
}

impl From<TextEncoding> for String {
    fn from(e: TextEncoding) -> Self {
        e.name().to_string()
    }
}

impl FromStr for TextEncoding {
    type Err = SealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(SealError::Unsupported("empty text encoding name".into()));
        }
        Ok(TextEncoding::from(s.to_string()))
    }
}

/// A concrete cryptographic implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Platform-optimised implementation (hardware AES, SIMD ChaCha)
    Native,
    /// Portable pure-Rust implementation
    Fallback,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Native => f.write_str("native"),
            Backend::Fallback => f.write_str("fallback"),
        }
    }
}

/// Result of a capability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Support {
    Native,
    Fallback,
    None,
}

impl Support {
    /// The backend that satisfies this capability, if any.
    pub fn backend(self) -> Option<Backend> {
        match self {
            Support::Native => Some(Backend::Native),
            Support::Fallback => Some(Backend::Fallback),
            Support::None => None,
        }
    }
}

impl From<Backend> for Support {
    fn from(b: Backend) -> Self {
        match b {
            Backend::Native => Support::Native,
            Backend::Fallback => Support::Fallback,
        }
    }
}

impl fmt::Display for Support {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Support::Native => f.write_str("native"),
            Support::Fallback => f.write_str("fallback"),
            Support::None => f.write_str("none"),
        }
    }
}
