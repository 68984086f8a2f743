pub mod config;
pub mod error;
pub mod types;

pub use error::{ConfigError, SealError, SealResult};
pub use types::{Algorithm, Backend, Support, TextEncoding};
