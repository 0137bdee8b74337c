//! Error types for secret resolution.

use thiserror::Error;

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while resolving secrets.
///
/// Every variant is fatal to the current resolution run: there is no retry,
/// recovery, or default-value substitution anywhere in this crate. A failing
/// batch surfaces exactly one error and never a partial result.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid caller configuration (empty request map, unknown
    /// authentication method, missing credentials).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A credential exchange did not yield a usable token.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Vault returned an explicit error list for a read. Carries the first
    /// error message verbatim.
    #[error("vault error: {0}")]
    Store(String),

    /// The requested secret path has no data.
    #[error("Secret: '{0}' not found")]
    SecretNotFound(String),

    /// A requested key is absent from the secret payload.
    #[error("Key: '{0}' not found")]
    KeyNotFound(String),

    /// Underlying network/HTTP failure, propagated from the transport.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_not_found_names_path() {
        let err = Error::SecretNotFound("secret/data/mongo".to_string());
        assert_eq!(err.to_string(), "Secret: 'secret/data/mongo' not found");
    }

    #[test]
    fn key_not_found_names_key() {
        let err = Error::KeyNotFound("password".to_string());
        assert_eq!(err.to_string(), "Key: 'password' not found");
    }

    #[test]
    fn store_error_carries_message_verbatim() {
        let err = Error::Store("Permission denied".to_string());
        assert!(err.to_string().contains("Permission denied"));
    }
}
