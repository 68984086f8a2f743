use std::path::PathBuf;

use thiserror::Error;

pub type SealResult<T> = Result<T, SealError>;

/// Failure of an encrypt, decrypt, or encoding operation.
///
/// `Authentication` carries no detail: a wrong password, a wrong algorithm,
/// and tampered data must be indistinguishable to the caller.
#[derive(Debug, Error)]
pub enum SealError {
    #[error("environment error: {0}")]
    Environment(String),

    #[error("format error: {0}")]
    Format(String),

    #[error("authentication failed")]
    Authentication,

    #[error("decoding error: {0}")]
    Decoding(String),

    #[error("programming error: {0}")]
    Programming(String),

    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl SealError {
    pub fn is_environment(&self) -> bool {
        matches!(self, Self::Environment(_))
    }

    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format(_))
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication)
    }

    pub fn is_decoding(&self) -> bool {
        matches!(self, Self::Decoding(_))
    }

    pub fn is_programming(&self) -> bool {
        matches!(self, Self::Programming(_))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

/// Failure to load the TOML configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_message_is_generic() {
        assert_eq!(SealError::Authentication.to_string(), "authentication failed");
    }

    #[test]
    fn predicates_match_variants() {
        assert!(SealError::Format("short".into()).is_format());
        assert!(SealError::Decoding("utf-8".into()).is_decoding());
        assert!(SealError::Environment("no rng".into()).is_environment());
        assert!(SealError::Programming("key".into()).is_programming());
        assert!(!SealError::Authentication.is_format());
    }

    #[test]
    fn format_error_display() {
        let err = SealError::Format("envelope too short: 3 bytes".into());
        assert_eq!(err.to_string(), "format error: envelope too short: 3 bytes");
    }
}
