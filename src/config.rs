//! Configuration types for chan-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Browser identification string sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Network endpoints and request behavior
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Base URL of the thread listing API (default: "https://a.4cdn.org")
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Base URL of the media host (default: "https://i.4cdn.org")
    #[serde(default = "default_img_base")]
    pub img_base: String,

    /// User-Agent header sent on every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout (None = no timeout, a hung request stalls its chunk)
    #[serde(default, with = "optional_duration_serde")]
    pub request_timeout: Option<Duration>,

    /// Number of thumbnails fetched concurrently per chunk (default: 10)
    #[serde(default = "default_chunk_size")]
    pub thumbnail_chunk_size: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            img_base: default_img_base(),
            user_agent: default_user_agent(),
            request_timeout: None,
            thumbnail_chunk_size: default_chunk_size(),
        }
    }
}

/// Self-update settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Release descriptor endpoint (GitHub "latest release" shaped JSON)
    #[serde(default = "default_release_url")]
    pub release_url: String,

    /// Version of the running instance (default: this crate's version)
    #[serde(default = "default_current_version")]
    pub current_version: String,

    /// Substring identifying the packaged-binary asset for this platform
    #[serde(default = "default_binary_asset_hint")]
    pub binary_asset_hint: String,

    /// Suffix of source archive assets, which are never selected for an
    /// update (default: ".tar.gz")
    #[serde(default = "default_source_asset_suffix")]
    pub source_asset_suffix: String,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            release_url: default_release_url(),
            current_version: default_current_version(),
            binary_asset_hint: default_binary_asset_hint(),
            source_asset_suffix: default_source_asset_suffix(),
        }
    }
}

/// Main configuration for [`ChanDownloader`](crate::ChanDownloader)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Endpoints, identity header and request pacing
    #[serde(default)]
    pub network: NetworkConfig,

    /// Release checking and self-replacement
    #[serde(default)]
    pub update: UpdateConfig,
}

impl Config {
    /// Check the configuration for values the pipelines cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.network.thumbnail_chunk_size == 0 {
            return Err(Error::Config {
                message: "thumbnail chunk size must be at least 1".to_string(),
                key: Some("thumbnail_chunk_size".to_string()),
            });
        }

        for (key, value) in [
            ("api_base", &self.network.api_base),
            ("img_base", &self.network.img_base),
        ] {
            if let Err(e) = url::Url::parse(value) {
                return Err(Error::Config {
                    message: format!("'{}' is not a valid base URL: {}", value, e),
                    key: Some(key.to_string()),
                });
            }
        }

        Ok(())
    }
}

fn default_api_base() -> String {
    "https://a.4cdn.org".to_string()
}

fn default_img_base() -> String {
    "https://i.4cdn.org".to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_chunk_size() -> usize {
    10
}

fn default_release_url() -> String {
    "https://api.github.com/repos/chan-dl/chan-dl/releases/latest".to_string()
}

fn default_current_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_binary_asset_hint() -> String {
    if cfg!(windows) {
        ".exe".to_string()
    } else {
        std::env::consts::OS.to_string()
    }
}

fn default_source_asset_suffix() -> String {
    ".tar.gz".to_string()
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
