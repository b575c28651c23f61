//! Session close and shutdown coordination.

use crate::types::Event;

use super::ChanDownloader;

impl ChanDownloader {
    /// Release the HTTP client. Returns whether a session was open.
    ///
    /// Jobs already submitted keep the client they were handed; new commands
    /// fail with [`Error::NoSession`](crate::Error::NoSession).
    pub fn close_session(&self) -> bool {
        let mut sessions = match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        sessions.close()
    }

    /// Whether the background context still accepts commands
    pub fn is_running(&self) -> bool {
        self.bridge.is_running()
    }

    /// Shut down the downloader
    ///
    /// 1. Emits [`Event::Shutdown`]
    /// 2. Closes the HTTP session
    /// 3. Stops the background context, abandoning in-flight jobs
    ///
    /// Events of abandoned jobs are discarded. Calling this twice is harmless.
    pub fn shutdown(&self) {
        if !self.bridge.is_running() {
            tracing::debug!("Shutdown already performed");
            return;
        }
        tracing::info!("Initiating shutdown");

        self.events.send(Event::Shutdown);

        if self.close_session() {
            tracing::info!("Closed HTTP session");
        }

        self.bridge.shutdown();
        tracing::info!("Shutdown complete");
    }
}

impl Drop for ChanDownloader {
    fn drop(&mut self) {
        self.shutdown();
    }
}
