//! Unified error types for freshgate.
//!
//! Every variant carries a stable code prefix in its display form so log
//! lines and MCP error payloads can be matched without parsing prose.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the freshgate workspace.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A request description failed boundary validation.
    #[error("INVALID_REQUEST: {0}")]
    InvalidRequest(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// No cache entry found for the given key.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored entry could not be decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// The named generation does not exist.
    #[error("UNKNOWN_GENERATION: {0}")]
    UnknownGeneration(String),

    /// The active generation cannot be purged.
    #[error("GENERATION_ACTIVE: {0}")]
    GenerationActive(String),

    /// Transport-level fetch failure (connection refused, DNS, reset).
    #[error("FETCH_FAILED: {0}")]
    FetchFailed(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Lifecycle transition attempted from the wrong state.
    #[error("LIFECYCLE_ERROR: {0}")]
    Lifecycle(String),

    /// A host platform facility (skip-waiting, preload, claim) failed.
    #[error("HOST_ERROR: {0}")]
    Host(String),
}

impl Error {
    /// Whether this error is a transport-level network rejection.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::FetchFailed(_) | Error::FetchTimeout(_) | Error::FetchTooLarge(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::CorruptEntry(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::InvalidRequest(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::CacheMiss(msg) => (-32001, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::CorruptEntry(msg) => (-32002, msg.clone()),
            Error::UnknownGeneration(msg) => (-32004, msg.clone()),
            Error::GenerationActive(msg) => (-32005, msg.clone()),
            Error::FetchFailed(msg) => (-32008, msg.clone()),
            Error::FetchTimeout(msg) => (-32006, msg.clone()),
            Error::FetchTooLarge(msg) => (-32007, msg.clone()),
            Error::Lifecycle(msg) => (-32010, msg.clone()),
            Error::Host(msg) => (-32011, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::CacheMiss("GET /static/app.js?v=5".to_string());
        assert!(err.to_string().starts_with("CACHE_MISS"));
        assert!(err.to_string().contains("app.js"));
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::CacheMiss("abc123".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32001);

        let mcp_err: McpError = Error::GenerationActive("freshgate-5".into()).into();
        assert_eq!(mcp_err.code.0, -32005);
    }

    #[test]
    fn test_is_network() {
        assert!(Error::FetchFailed("refused".into()).is_network());
        assert!(Error::FetchTimeout("20s".into()).is_network());
        assert!(!Error::Lifecycle("bad".into()).is_network());
    }
}
