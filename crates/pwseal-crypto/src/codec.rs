//! Text <-> bytes conversions
//!
//! Plaintext is carried as UTF-8. Envelope bytes are carried as text using a
//! [`TextEncoding`]; only Base64 (standard alphabet, padded) is implemented.

use base64::{engine::general_purpose::STANDARD, Engine};
use pwseal_core::{SealError, SealResult, TextEncoding};

/// Encode text as UTF-8 bytes.
pub fn text_to_bytes(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

/// Decode UTF-8 bytes into text. Invalid sequences are rejected, not replaced.
pub fn bytes_to_text(bytes: &[u8]) -> SealResult<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| SealError::Decoding(format!("invalid UTF-8: {}", e.utf8_error())))
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard padded Base64. Leading/trailing ASCII whitespace is ignored.
pub fn decode_base64(text: &str) -> SealResult<Vec<u8>> {
    STANDARD
        .decode(text.trim_matches(|c: char| c.is_ascii_whitespace()))
        .map_err(|e| SealError::Decoding(format!("invalid Base64: {e}")))
}

pub fn encode_text(encoding: &TextEncoding, bytes: &[u8]) -> SealResult<String> {
    match encoding {
        TextEncoding::Base64 => Ok(encode_base64(bytes)),
        TextEncoding::Other(name) => Err(unsupported(name)),
    }
}

pub fn decode_text(encoding: &TextEncoding, text: &str) -> SealResult<Vec<u8>> {
    match encoding {
        TextEncoding::Base64 => decode_base64(text),
        TextEncoding::Other(name) => Err(unsupported(name)),
    }
}

fn unsupported(name: &str) -> SealError {
    SealError::Unsupported(format!("text encoding {name} is not implemented"))
}
