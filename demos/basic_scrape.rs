//! Basic scrape example
//!
//! This example demonstrates the core functionality of chan-dl:
//! - Creating a downloader instance
//! - Loading a thread and its thumbnails
//! - Folding events into an `AppState`
//! - Downloading every item to the configured folder
//! - Checking for a newer release
//!
//! ```bash
//! RUST_LOG=chan_dl=debug cargo run --example basic_scrape -- https://boards.4chan.org/g/thread/123
//! ```

use chan_dl::{AppState, ChanDownloader, Config, Event, Settings, SettingsStore};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("chan_dl=info")),
        )
        .init();

    let url = std::env::args()
        .nth(1)
        .ok_or("usage: basic_scrape <thread-url>")?;

    // Preferences live next to the working directory for this demo
    let store = SettingsStore::new("chan-dl-settings.json");
    let settings: Settings = store.load()?;

    let (downloader, mut events) = ChanDownloader::new(Config::default())?;
    let mut state = AppState::new();

    if settings.check_updates_on_start {
        downloader.check_update()?;
    }

    let Some(thread) = chan_dl::parse_thread_url(&url) else {
        state.reject_url();
        println!("{}", state.status);
        return Ok(());
    };
    state.begin_load(thread.clone());
    downloader.load_thread(thread)?;

    // Interactive loop: drain on a tick, never block on the network
    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    let mut thumbnails_done = false;
    let mut download_started = false;
    loop {
        ticker.tick().await;

        for event in events.drain() {
            match &event {
                Event::ThumbnailsComplete { loaded, total, .. } => {
                    println!("✓ Thumbnails: {}/{}", loaded, total);
                    thumbnails_done = true;
                }
                Event::DownloadProgress(progress) => {
                    println!(
                        "⬇ {:.1}% ({}/{})",
                        progress.percent(),
                        progress.succeeded,
                        progress.total
                    );
                }
                Event::DownloadComplete {
                    result,
                    destination,
                } => {
                    println!(
                        "✓ Downloaded {} of {} files to {}",
                        result.succeeded,
                        result.total,
                        destination.display()
                    );
                }
                Event::UpdateAvailable(descriptor) => {
                    println!("ℹ Version {} is available", descriptor.version);
                }
                _ => {}
            }
            state.apply(event);
        }

        if let Some(error) = state.last_error.take() {
            println!("✗ {}", error);
            break;
        }

        // Start downloading everything once the listing and thumbnails are in
        if thumbnails_done && !download_started && !state.items.is_empty() {
            state.select_all();
            if let Some(context) = state.context() {
                downloader.download_selection(&context, &state.selection, &settings)?;
                download_started = true;
            }
        }

        if state.last_download.is_some() || (thumbnails_done && state.items.is_empty()) {
            break;
        }
    }

    println!("{}", state.status);
    store.save(&settings)?;
    downloader.shutdown();
    Ok(())
}
