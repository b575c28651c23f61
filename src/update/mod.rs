//! Self-update: release check, version comparison and artifact retrieval.
//!
//! The swap-and-restart half lives in [`restart`]. Nothing here verifies the
//! downloaded artifact beyond the HTTP status.

pub mod restart;

use crate::config::UpdateConfig;
use crate::error::{Result, UpdateError};
use crate::session::HttpSession;
use crate::types::{ReleaseAsset, UpdateDescriptor};
use restart::RestartPlan;
use std::path::{Path, PathBuf};

/// Dotted numeric version, compared component by component
///
/// Always has at least three components. Anything that is not a dotted list of
/// integers (after an optional leading `v`) parses to `0.0.0`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version(Vec<u64>);

impl Version {
    /// Parse a tag such as `"v1.2.0"` or `"1.4"`
    pub fn parse(tag: &str) -> Self {
        let trimmed = tag.trim().trim_start_matches(['v', 'V']);

        let parsed: std::result::Result<Vec<u64>, _> =
            trimmed.split('.').map(str::parse::<u64>).collect();

        let mut parts = match parsed {
            Ok(parts) if !trimmed.is_empty() => parts,
            _ => Vec::new(),
        };
        while parts.len() > 3 && parts.last() == Some(&0) {
            parts.pop();
        }
        while parts.len() < 3 {
            parts.push(0);
        }
        Self(parts)
    }

    /// Numeric components
    pub fn components(&self) -> &[u64] {
        &self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined: Vec<String> = self.0.iter().map(u64::to_string).collect();
        write!(f, "{}", joined.join("."))
    }
}

/// Whether `remote` is strictly newer than `local`
pub fn is_newer(remote: &str, local: &str) -> bool {
    Version::parse(remote) > Version::parse(local)
}

/// Ask the release endpoint whether a newer version exists.
///
/// Fails closed: any transport, status or parse failure is logged and reported
/// as "no update".
pub async fn check_update(session: &HttpSession, config: &UpdateConfig) -> Option<UpdateDescriptor> {
    let descriptor: UpdateDescriptor = match session.fetch_json(&config.release_url).await {
        Ok(descriptor) => descriptor,
        Err(e) => {
            tracing::warn!(url = %config.release_url, error = %e, "Update check failed");
            return None;
        }
    };

    if is_newer(&descriptor.version, &config.current_version) {
        tracing::info!(
            current = %config.current_version,
            latest = %descriptor.version,
            "Update available"
        );
        Some(descriptor)
    } else {
        tracing::debug!(
            current = %config.current_version,
            latest = %descriptor.version,
            "Already up to date"
        );
        None
    }
}

/// How the running instance was launched
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstallKind {
    /// A distributed binary; updated by swapping the executable
    Packaged {
        /// Path of the running executable
        executable: PathBuf,
    },
    /// A build from a source checkout (lives under a cargo `target/` directory)
    Source {
        /// Path of the running executable
        executable: PathBuf,
    },
}

impl InstallKind {
    /// Classify the running process
    pub fn detect() -> Result<Self> {
        let executable = std::env::current_exe()?;
        Ok(Self::classify(executable))
    }

    /// Classify an executable path
    pub fn classify(executable: PathBuf) -> Self {
        let components: Vec<_> = executable
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let in_target_dir = components
            .windows(2)
            .any(|pair| pair[0] == "target" && (pair[1] == "debug" || pair[1] == "release"));

        if in_target_dir {
            InstallKind::Source { executable }
        } else {
            InstallKind::Packaged { executable }
        }
    }

    /// Path of the running executable
    pub fn executable(&self) -> &Path {
        match self {
            InstallKind::Packaged { executable } | InstallKind::Source { executable } => executable,
        }
    }
}

/// Pick the runnable binary asset for this platform.
///
/// Both install kinds run the same prebuilt binary; source archives are
/// never selected since nothing here builds them.
pub fn select_asset<'a>(
    descriptor: &'a UpdateDescriptor,
    config: &UpdateConfig,
) -> std::result::Result<&'a ReleaseAsset, UpdateError> {
    let hint = config.binary_asset_hint.to_ascii_lowercase();
    let archive = config.source_asset_suffix.to_ascii_lowercase();

    descriptor
        .assets
        .iter()
        .find(|asset| {
            let name = asset.name.to_ascii_lowercase();
            name.contains(&hint) && !name.ends_with(&archive)
        })
        .ok_or_else(|| UpdateError::NoSuitableAsset {
            tag: descriptor.version.clone(),
        })
}

/// Where the downloaded artifact is staged: `{executable}.new`
pub fn target_path(kind: &InstallKind) -> PathBuf {
    let mut name = kind.executable().as_os_str().to_os_string();
    name.push(".new");
    PathBuf::from(name)
}

/// Download the release artifact and prepare the restart.
///
/// Packaged installs leave the swap to a deferred-replace script. Source
/// builds on unix move the new binary over the executable right away and
/// re-execute it; elsewhere they take the script path too.
///
/// Returns the path holding the new binary and the plan to hand to
/// [`restart::execute`] once the caller has persisted its state.
pub async fn apply_update(
    session: &HttpSession,
    descriptor: &UpdateDescriptor,
    kind: &InstallKind,
    config: &UpdateConfig,
) -> Result<(PathBuf, RestartPlan)> {
    let asset = select_asset(descriptor, config)?;
    let target = target_path(kind);

    tracing::info!(
        version = %descriptor.version,
        asset = %asset.name,
        target = %target.display(),
        "Downloading update"
    );
    let bytes = session
        .download_to(&asset.url, &target)
        .await
        .map_err(|e| UpdateError::DownloadFailed {
            url: asset.url.clone(),
            reason: e.to_string(),
        })?;
    tracing::info!(bytes, "Update downloaded");

    let executable = kind.executable();
    match kind {
        InstallKind::Source { .. } if cfg!(unix) => {
            restart::install_in_place(executable, &target)?;
            Ok((executable.to_path_buf(), restart::prepare_reexec(executable)))
        }
        _ => {
            let plan = restart::prepare_deferred_replace(executable, &target, std::process::id())?;
            Ok((target, plan))
        }
    }
}
