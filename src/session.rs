//! HTTP session management.
//!
//! One connection-reusing [`reqwest::Client`] per process, carrying a fixed
//! identity header. [`SessionManager`] owns it; jobs running on the execution
//! bridge get cheap clones through [`HttpSession`].

use crate::config::NetworkConfig;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Why a single request produced no data
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Connection, TLS or timeout failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),

    /// The body was not the expected JSON document
    #[error("unparsable body: {0}")]
    Parse(#[from] serde_json::Error),

    /// Writing the body to disk failed
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Abstraction over "fetch the bytes at this URL", enabling testability.
///
/// Implementations swallow failures: a failed fetch is `None`, logged where it
/// happened, never an error for the caller.
#[async_trait::async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetch a resource, returning its body on a success status
    async fn fetch_bytes(&self, url: &str) -> Option<Vec<u8>>;
}

/// Handle to the open HTTP client (cloneable, shares the connection pool)
#[derive(Clone, Debug)]
pub struct HttpSession {
    client: reqwest::Client,
}

impl HttpSession {
    /// GET `url` and decode the body as JSON
    ///
    /// Distinguishes transport, status and parse failures so callers can tell a
    /// missing document from an empty one.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> std::result::Result<T, RequestError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::Status(status));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// GET `url` and stream the body into a new file at `target`
    ///
    /// Returns the number of bytes written. A partially written file is removed.
    pub async fn download_to(
        &self,
        url: &str,
        target: &Path,
    ) -> std::result::Result<u64, RequestError> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::Status(status));
        }

        let mut file = tokio::fs::File::create(target).await?;
        let mut written = 0u64;
        let copied: std::result::Result<(), RequestError> = async {
            while let Some(chunk) = response.chunk().await? {
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.flush().await?;
            Ok(())
        }
        .await;

        if let Err(e) = copied {
            drop(file);
            if let Err(remove_err) = tokio::fs::remove_file(target).await {
                tracing::warn!(path = %target.display(), error = %remove_err, "Failed to remove partial download");
            }
            return Err(e);
        }

        Ok(written)
    }
}

#[async_trait::async_trait]
impl ResourceFetcher for HttpSession {
    async fn fetch_bytes(&self, url: &str) -> Option<Vec<u8>> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Failed to fetch resource");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = status.as_u16(), "Resource request returned non-success status");
            return None;
        }

        match response.bytes().await {
            Ok(body) => Some(body.to_vec()),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Failed to read resource body");
                None
            }
        }
    }
}

/// Owner of the process-wide HTTP client
///
/// Starts in the "no session" state. Operations that need the network ask for
/// [`SessionManager::session`] and get [`Error::NoSession`] until `open()` ran.
#[derive(Debug)]
pub struct SessionManager {
    config: NetworkConfig,
    session: Option<HttpSession>,
}

impl SessionManager {
    /// Create a manager in the "no session" state
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Build the client with the fixed header set
    ///
    /// # Errors
    ///
    /// - [`Error::SessionAlreadyOpen`] if a client already exists
    /// - [`Error::Config`] if the configured user agent is not a valid header value
    /// - [`Error::Network`] if the TLS backend cannot be initialized
    pub fn open(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(Error::SessionAlreadyOpen);
        }

        let mut headers = reqwest::header::HeaderMap::new();
        let user_agent = reqwest::header::HeaderValue::from_str(&self.config.user_agent)
            .map_err(|e| Error::Config {
                message: format!("invalid user agent: {}", e),
                key: Some("user_agent".to_string()),
            })?;
        headers.insert(reqwest::header::USER_AGENT, user_agent);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = self.config.request_timeout {
            builder = builder.timeout(timeout);
        }

        self.session = Some(HttpSession {
            client: builder.build()?,
        });
        tracing::info!("HTTP session opened");
        Ok(())
    }

    /// Release the client. Returns whether a session was open.
    pub fn close(&mut self) -> bool {
        let was_open = self.session.take().is_some();
        if was_open {
            tracing::info!("HTTP session closed");
        }
        was_open
    }

    /// Whether a client exists
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// A handle to the open client
    pub fn session(&self) -> Result<HttpSession> {
        self.session.clone().ok_or(Error::NoSession)
    }
}
