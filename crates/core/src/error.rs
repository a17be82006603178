//! Error types for the Jobport core crate.

use thiserror::Error;

/// Top-level error type for all Jobport core operations.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    /// The upstream authorization server rejected the stored refresh token.
    /// Unrecoverable without re-running the authorization flow and reseeding.
    #[error("refresh token rejected by authorization server: {0}")]
    RefreshTokenInvalid(String),

    /// Non-401 upstream failure (5xx, 4xx other than auth).
    #[error("upstream API error: status {status}: {body}")]
    Upstream { status: u16, body: String },

    /// A resource call failed 401 even after one forced refresh.
    #[error("authorization failed: {0}")]
    Unauthorized(String),

    /// Credential token not found, expired, or already consumed. Deliberately
    /// carries no detail about which sub-case occurred.
    #[error("invalid or expired link")]
    CredentialInvalid,
}

/// A convenience Result alias that defaults to [`PortalError`].
pub type Result<T> = std::result::Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = PortalError::Config("missing client_id".into());
        assert_eq!(err.to_string(), "configuration error: missing client_id");
    }

    #[test]
    fn io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = PortalError::from(io_err);
        assert!(matches!(err, PortalError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn credential_invalid_reveals_nothing() {
        let err = PortalError::CredentialInvalid;
        assert_eq!(err.to_string(), "invalid or expired link");
    }

    #[test]
    fn upstream_error_display() {
        let err = PortalError::Upstream {
            status: 503,
            body: "maintenance".into(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("maintenance"));
    }

    #[test]
    fn result_alias_works() {
        let ok: Result<i32> = Ok(42);
        assert!(ok.is_ok());

        let err: Result<i32> = Err(PortalError::Config("bad".into()));
        assert!(err.is_err());
    }
}
