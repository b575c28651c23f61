//! Sequential, idempotent download of selected media to disk.

use crate::error::{Error, Result};
use crate::session::ResourceFetcher;
use crate::types::{DownloadProgress, DownloadResult, MediaDescriptor};
use std::path::{Path, PathBuf};

/// Suffix of the temporary file a download is written to before being renamed
const PARTIAL_SUFFIX: &str = ".part";

/// Download `items` into `destination`, one at a time, in input order.
///
/// For each item: a file already present under its local name counts as
/// succeeded without a request; otherwise the full resource is fetched and
/// written. Fetch and write failures are logged and counted as failed, and the
/// run continues. `on_progress` is called after every item.
///
/// # Errors
///
/// Returns [`Error::CreateDirectory`] if `destination` cannot be created. No
/// request is made in that case.
pub async fn download_selected<F, P>(
    fetcher: &F,
    img_base: &str,
    items: &[MediaDescriptor],
    destination: &Path,
    mut on_progress: P,
) -> Result<DownloadResult>
where
    F: ResourceFetcher + ?Sized,
    P: FnMut(DownloadProgress),
{
    tokio::fs::create_dir_all(destination)
        .await
        .map_err(|source| Error::CreateDirectory {
            path: destination.to_path_buf(),
            source,
        })?;

    let total = items.len();
    let mut succeeded = 0;

    for (index, item) in items.iter().enumerate() {
        let target = destination.join(item.local_filename());

        if is_present(&target).await {
            tracing::debug!(path = %target.display(), "Already downloaded, skipping");
            succeeded += 1;
        } else {
            let url = item.full_url(img_base);
            match fetcher.fetch_bytes(&url).await {
                Some(data) => match write_file(&target, &data).await {
                    Ok(()) => {
                        tracing::debug!(path = %target.display(), bytes = data.len(), "Saved");
                        succeeded += 1;
                    }
                    Err(e) => {
                        tracing::error!(path = %target.display(), error = %e, "Write error");
                    }
                },
                None => {
                    tracing::warn!(url = %url, "Download failed, skipping item");
                }
            }
        }

        on_progress(DownloadProgress {
            processed: index + 1,
            succeeded,
            total,
        });
    }

    tracing::info!(
        destination = %destination.display(),
        succeeded,
        total,
        "Download run finished"
    );
    Ok(DownloadResult { succeeded, total })
}

async fn is_present(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// Write through a temporary name so an interrupted write never looks complete
async fn write_file(target: &Path, data: &[u8]) -> std::io::Result<()> {
    let partial = partial_path(target);

    let written = async {
        tokio::fs::write(&partial, data).await?;
        tokio::fs::rename(&partial, target).await
    }
    .await;

    if written.is_err() {
        if let Err(remove_err) = tokio::fs::remove_file(&partial).await {
            tracing::warn!(path = %partial.display(), error = %remove_err, "Failed to remove partial file");
        }
    }
    written
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}
