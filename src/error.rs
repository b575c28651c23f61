//! Error types for chan-dl
//!
//! Only operation-level failures are represented here. Individual request
//! failures inside the fetch pipelines are logged and turned into empty result
//! slots instead of errors.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for chan-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for chan-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api_base")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A thread URL could not be interpreted as `/{board}/thread/{id}`
    #[error("invalid thread URL: {0}")]
    InvalidUrl(String),

    /// The thread listing endpoint answered with a non-success status or an
    /// unparsable body. An empty thread is not an error.
    #[error("thread /{board}/{thread_id} not found or API error: {reason}")]
    ThreadUnavailable {
        /// Board identifier
        board: String,
        /// Thread identifier
        thread_id: String,
        /// What went wrong (status code or parse failure)
        reason: String,
    },

    /// The download destination could not be created
    #[error("could not create folder {path}: {source}")]
    CreateDirectory {
        /// Directory that failed to be created
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// No HTTP session is open
    #[error("no HTTP session is open")]
    NoSession,

    /// `open()` called on a session manager that already holds a client
    #[error("HTTP session is already open")]
    SessionAlreadyOpen,

    /// Self-update error
    #[error("update error: {0}")]
    Update(#[from] UpdateError),

    /// Shutdown in progress - not accepting new jobs
    #[error("shutdown in progress: not accepting new jobs")]
    ShuttingDown,
}

/// Self-update errors, each surfaced to the user with a specific message
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The release has no asset usable by this kind of installation
    #[error("no suitable asset found in release {tag}")]
    NoSuitableAsset {
        /// Release tag that was inspected
        tag: String,
    },

    /// Fetching the replacement artifact failed
    #[error("failed to download update from {url}: {reason}")]
    DownloadFailed {
        /// Asset URL
        url: String,
        /// Status code or transport error description
        reason: String,
    },

    /// The restart step could not be prepared or launched
    #[error("failed to restart into the new version: {0}")]
    Restart(String),
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_unavailable_message_names_board_and_thread() {
        let err = Error::ThreadUnavailable {
            board: "g".to_string(),
            thread_id: "12345".to_string(),
            reason: "HTTP 404".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("/g/12345"), "got: {msg}");
        assert!(msg.contains("HTTP 404"));
    }

    #[test]
    fn create_directory_keeps_io_source() {
        use std::error::Error as _;

        let err = Error::CreateDirectory {
            path: PathBuf::from("/nope/dir"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };

        assert!(err.to_string().contains("/nope/dir"));
        let source = err.source().expect("source must be preserved");
        assert!(source.to_string().contains("denied"));
    }

    #[test]
    fn update_error_converts_into_error() {
        let err: Error = UpdateError::NoSuitableAsset {
            tag: "v1.2.0".to_string(),
        }
        .into();

        match err {
            Error::Update(UpdateError::NoSuitableAsset { tag }) => assert_eq!(tag, "v1.2.0"),
            other => panic!("expected Update error, got {other:?}"),
        }
    }
}
