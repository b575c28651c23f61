//! # chan-dl
//!
//! Backend library for discussion-board media downloaders.
//!
//! ## Design Philosophy
//!
//! chan-dl is designed to be:
//! - **Non-blocking** - Every command returns immediately; network I/O runs on a
//!   dedicated background thread
//! - **Event-driven** - Results come back as immutable [`Event`] values the
//!   interactive side drains on its own schedule
//! - **Idempotent** - Re-running a download never re-fetches a file already on disk
//! - **Library-first** - No UI, purely a Rust crate for embedding
//!
//! ## Quick Start
//!
//! ```no_run
//! use chan_dl::{AppState, ChanDownloader, Config, Event};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (downloader, mut events) = ChanDownloader::new(Config::default())?;
//!     let mut state = AppState::new();
//!
//!     let thread = chan_dl::parse_thread_url("https://boards.4chan.org/g/thread/123")
//!         .ok_or("not a thread URL")?;
//!     state.begin_load(thread.clone());
//!     downloader.load_thread(thread)?;
//!
//!     // On every tick of the interactive loop:
//!     state.apply_all(events.drain());
//!     println!("{}", state.status);
//!
//!     downloader.shutdown();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Chunked concurrent fetching
pub mod batch;
/// Background execution context and event channel
pub mod bridge;
/// Configuration types
pub mod config;
/// Sequential idempotent downloads
pub mod download;
/// Orchestration core (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Thread listing fetch
pub mod listing;
/// HTTP session management
pub mod session;
/// Persisted user preferences
pub mod settings;
/// Interactive-context state
pub mod state;
/// Core types and events
pub mod types;
/// Self-update
pub mod update;

// Re-export commonly used types
pub use bridge::{EventReceiver, EventSender, ExecutionBridge, JobHandle};
pub use config::{Config, NetworkConfig, UpdateConfig};
pub use downloader::ChanDownloader;
pub use error::{Error, Result, UpdateError};
pub use listing::parse_thread_url;
pub use session::{HttpSession, ResourceFetcher, SessionManager};
pub use settings::{Settings, SettingsStore};
pub use state::AppState;
pub use types::{
    DownloadProgress, DownloadResult, Event, JobId, MediaDescriptor, MediaId, MediaKind,
    ReleaseAsset, SelectionSet, ThreadContext, ThreadRef, UpdateDescriptor,
};
pub use update::InstallKind;
pub use update::restart::RestartPlan;

/// Helper function to run the downloader until a termination signal arrives.
///
/// Waits for a termination signal and then calls the downloader's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use chan_dl::{ChanDownloader, Config, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let (downloader, _events) = ChanDownloader::new(Config::default())?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(downloader).await;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: ChanDownloader) {
    wait_for_signal().await;
    downloader.shutdown();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Received Ctrl+C signal");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
