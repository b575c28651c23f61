//! Orchestration core split into focused submodules.
//!
//! The `ChanDownloader` struct and its commands are organized by domain:
//! - [`thread`] - Thread listing, thumbnails and previews
//! - [`files`] - Download of selected media
//! - [`update`] - Release check and self-update
//! - [`lifecycle`] - Session close and shutdown coordination
//!
//! Every command is non-blocking: it submits a job to the execution bridge and
//! returns its [`JobHandle`]. Results arrive as [`Event`](crate::types::Event)s
//! on the [`EventReceiver`] handed out by [`ChanDownloader::new`].

mod files;
mod lifecycle;
mod thread;
mod update;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::bridge::{EventReceiver, EventSender, ExecutionBridge, JobHandle};
use crate::config::Config;
use crate::error::Result;
use crate::session::{HttpSession, SessionManager};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

/// Orchestration core: owns the HTTP session and the execution bridge
pub struct ChanDownloader {
    /// Configuration (shared with running jobs)
    pub(crate) config: Arc<Config>,
    /// Owner of the process-wide HTTP client
    pub(crate) sessions: Mutex<SessionManager>,
    /// Background network context
    pub(crate) bridge: ExecutionBridge,
    /// Event channel back to the interactive context
    pub(crate) events: EventSender,
    /// Held for the whole of a download run; runs never overlap
    pub(crate) download_lock: Arc<tokio::sync::Mutex<()>>,
}

impl ChanDownloader {
    /// Validate `config`, open the HTTP session and start the background context.
    ///
    /// Returns the downloader and the receiving end of its event channel.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`](crate::Error::Config) if the configuration is invalid
    /// - [`Error::Network`](crate::Error::Network) if the HTTP client cannot be built
    /// - [`Error::Io`](crate::Error::Io) if the background thread cannot be spawned
    pub fn new(config: Config) -> Result<(Self, EventReceiver)> {
        config.validate()?;

        let mut sessions = SessionManager::new(config.network.clone());
        sessions.open()?;

        let (bridge, events, receiver) = ExecutionBridge::start()?;

        tracing::info!(
            api_base = %config.network.api_base,
            img_base = %config.network.img_base,
            version = %config.update.current_version,
            "Downloader initialized"
        );

        let downloader = Self {
            config: Arc::new(config),
            sessions: Mutex::new(sessions),
            bridge,
            events,
            download_lock: Arc::new(tokio::sync::Mutex::new(())),
        };
        Ok((downloader, receiver))
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether an HTTP session is open
    pub fn is_session_open(&self) -> bool {
        self.session_manager().is_open()
    }

    /// Clone of the open session, or [`Error::NoSession`](crate::Error::NoSession)
    pub(crate) fn current_session(&self) -> Result<HttpSession> {
        self.session_manager().session()
    }

    fn session_manager(&self) -> MutexGuard<'_, SessionManager> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Submit a job to the bridge
    pub(crate) fn spawn<F>(&self, job: F) -> Result<JobHandle>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.bridge.submit(job)
    }
}
