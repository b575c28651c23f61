//! Test configuration helpers for creating downloaders against mock or live endpoints

use chan_dl::{ChanDownloader, Config, EventReceiver, NetworkConfig, UpdateConfig};
use std::time::Duration;

/// Downloader with every endpoint pointed at a mock server
pub fn create_mock_downloader(base: &str) -> (ChanDownloader, EventReceiver) {
    let config = Config {
        network: NetworkConfig {
            api_base: base.to_string(),
            img_base: base.to_string(),
            request_timeout: Some(Duration::from_secs(10)),
            ..Default::default()
        },
        update: UpdateConfig {
            release_url: format!("{}/releases/latest", base),
            current_version: "0.1.0".to_string(),
            ..Default::default()
        },
    };
    ChanDownloader::new(config).expect("downloader must start")
}

/// Thread URL to exercise against the real board API
///
/// Read from `CHAN_DL_LIVE_THREAD` (a `.env` file is honored). Returns `None`
/// when unset so live tests can skip.
pub fn live_thread_url() -> Option<String> {
    dotenvy::dotenv().ok();
    std::env::var("CHAN_DL_LIVE_THREAD").ok()
}

/// Downloader with default (production) endpoints and a bounded request time
pub fn create_live_downloader() -> (ChanDownloader, EventReceiver) {
    let mut config = Config::default();
    config.network.request_timeout = Some(Duration::from_secs(30));
    ChanDownloader::new(config).expect("downloader must start")
}
