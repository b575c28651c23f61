//! Shared test helpers for creating ChanDownloader instances in tests.

use crate::bridge::EventReceiver;
use crate::config::{Config, NetworkConfig, UpdateConfig};
use crate::downloader::ChanDownloader;
use crate::types::Event;
use std::time::Duration;

/// Downloader whose listing, media and release endpoints all point at `base`
pub(crate) fn create_test_downloader(base: &str) -> (ChanDownloader, EventReceiver) {
    let config = Config {
        network: NetworkConfig {
            api_base: base.to_string(),
            img_base: base.to_string(),
            request_timeout: Some(Duration::from_secs(10)),
            ..Default::default()
        },
        update: UpdateConfig {
            release_url: format!("{}/releases/latest", base),
            current_version: "1.0.0".to_string(),
            binary_asset_hint: "linux".to_string(),
            ..Default::default()
        },
    };
    ChanDownloader::new(config).unwrap()
}

/// Receive events until one satisfies `last`, returning all of them in order.
///
/// Panics after five seconds without a match.
pub(crate) async fn collect_until<P>(receiver: &mut EventReceiver, mut last: P) -> Vec<Event>
where
    P: FnMut(&Event) -> bool,
{
    let mut events = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), receiver.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed");
        let done = last(&event);
        events.push(event);
        if done {
            return events;
        }
    }
}

/// Thread listing document with one post per `(tim, ext)`
pub(crate) fn thread_json(posts: &[(u64, &str)]) -> serde_json::Value {
    let posts: Vec<serde_json::Value> = posts
        .iter()
        .enumerate()
        .map(|(no, (tim, ext))| {
            serde_json::json!({
                "no": no + 1,
                "tim": tim,
                "ext": ext,
                "filename": format!("file{}", no),
            })
        })
        .collect();
    serde_json::json!({ "posts": posts })
}
