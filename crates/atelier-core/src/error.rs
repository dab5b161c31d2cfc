//! Error types for atelier.

use thiserror::Error;

/// Result type alias using atelier's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for atelier operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Schema definition is invalid (duplicate codes, missing vocabulary)
    #[error("Schema error: {0}")]
    Schema(String),

    /// Attribute matching failed in an unexpected way
    #[error("Match error: {0}")]
    Match(String),

    /// Remote extraction call failed
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Image compression failed (after the synchronous fallback)
    #[error("Compression error: {0}")]
    Compression(String),

    /// Batch/queue job error
    #[error("Job error: {0}")]
    Job(String),

    /// A polling deadline elapsed before the job reached a terminal state.
    /// Distinct from failure: the remote job may still be processing.
    #[error("Timed out after {0}ms")]
    Timeout(u64),

    /// Operation was cancelled via the abort signal. Not a failure.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error represents cancellation rather than failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }

    /// Whether this error is a polling timeout (job may still complete remotely).
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_schema() {
        let err = Error::Schema("duplicate short form 'RN'".to_string());
        assert_eq!(err.to_string(), "Schema error: duplicate short form 'RN'");
    }

    #[test]
    fn test_error_display_extraction() {
        let err = Error::Extraction("backend returned 502".to_string());
        assert_eq!(err.to_string(), "Extraction error: backend returned 502");
    }

    #[test]
    fn test_error_display_compression() {
        let err = Error::Compression("encoder pool unavailable".to_string());
        assert_eq!(
            err.to_string(),
            "Compression error: encoder pool unavailable"
        );
    }

    #[test]
    fn test_error_display_job() {
        let err = Error::Job("queue full".to_string());
        assert_eq!(err.to_string(), "Job error: queue full");
    }

    #[test]
    fn test_error_display_timeout() {
        let err = Error::Timeout(120_000);
        assert_eq!(err.to_string(), "Timed out after 120000ms");
    }

    #[test]
    fn test_error_display_cancelled() {
        let err = Error::Cancelled("batch aborted".to_string());
        assert_eq!(err.to_string(), "Cancelled: batch aborted");
    }

    #[test]
    fn test_error_display_request() {
        let err = Error::Request("network unreachable".to_string());
        assert_eq!(err.to_string(), "Request error: network unreachable");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("missing base URL".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing base URL");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("empty schema".to_string());
        assert_eq!(err.to_string(), "Invalid input: empty schema");
    }

    #[test]
    fn test_is_cancelled() {
        assert!(Error::Cancelled("x".into()).is_cancelled());
        assert!(!Error::Timeout(1).is_cancelled());
        assert!(!Error::Internal("x".into()).is_cancelled());
    }

    #[test]
    fn test_is_timeout() {
        assert!(Error::Timeout(2000).is_timeout());
        assert!(!Error::Cancelled("x".into()).is_timeout());
        assert!(!Error::Extraction("x".into()).is_timeout());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_error_debug_format() {
        let err = Error::Timeout(500);
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Timeout"));
    }
}
