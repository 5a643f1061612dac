//! Error types for the odocal ecosystem.

use thiserror::Error;

/// Errors that can occur in odocal operations.
///
/// Transport sub-kinds are kept distinct because callers show different
/// guidance for an unreachable host than for a rejected credential.
/// Empty chain states (no partner, no attendance, no events) are *not*
/// errors; see `SyncOutcome`.
#[derive(Error, Debug)]
pub enum OdooError {
    #[error("Could not reach server: {0}")]
    Unreachable(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("TLS handshake failed: {0}")]
    Tls(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Authentication failed: invalid database, username or password")]
    InvalidCredentials,

    #[error("Server error {code}: {message}")]
    Server { code: i64, message: String },

    #[error("Malformed response: {0}")]
    Protocol(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OdooError {
    /// True for failures of the wire itself, as opposed to a reply the
    /// server actually produced.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            OdooError::Unreachable(_)
                | OdooError::Timeout(_)
                | OdooError::Tls(_)
                | OdooError::Transport(_)
        )
    }
}

/// Result type alias for odocal operations.
pub type OdooResult<T> = Result<T, OdooError>;
