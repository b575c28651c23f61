//! Download of selected media.

use crate::bridge::JobHandle;
use crate::download;
use crate::error::Result;
use crate::settings::Settings;
use crate::types::{Event, MediaDescriptor, SelectionSet, ThreadContext};
use std::path::PathBuf;

use super::ChanDownloader;

impl ChanDownloader {
    /// Download `items` into `destination`, sequentially and idempotently.
    ///
    /// Emits [`Event::DownloadStarted`], one [`Event::DownloadProgress`] per
    /// item and [`Event::DownloadComplete`]. If `destination` cannot be created
    /// the run aborts with [`Event::DownloadFailed`] before any request.
    ///
    /// Runs are serialized: a run submitted while another is in progress waits
    /// for it to finish before emitting anything.
    pub fn download(&self, items: Vec<MediaDescriptor>, destination: PathBuf) -> Result<JobHandle> {
        let session = self.current_session()?;
        let config = self.config.clone();
        let events = self.events.clone();
        let download_lock = self.download_lock.clone();

        tracing::info!(
            destination = %destination.display(),
            count = items.len(),
            "Download requested"
        );
        self.spawn(async move {
            let _run = download_lock.lock().await;
            events.send(Event::DownloadStarted {
                destination: destination.clone(),
                total: items.len(),
            });

            let outcome = download::download_selected(
                &session,
                &config.network.img_base,
                &items,
                &destination,
                |progress| events.send(Event::DownloadProgress(progress)),
            )
            .await;

            match outcome {
                Ok(result) => events.send(Event::DownloadComplete {
                    result,
                    destination,
                }),
                Err(e) => {
                    tracing::error!(destination = %destination.display(), error = %e, "Download aborted");
                    events.send(Event::DownloadFailed {
                        error: e.to_string(),
                    });
                }
            }
        })
    }

    /// Download the selected items of `context` to the location `settings` names
    pub fn download_selection(
        &self,
        context: &ThreadContext,
        selection: &SelectionSet,
        settings: &Settings,
    ) -> Result<JobHandle> {
        let destination = context
            .thread
            .destination(&settings.download_path, settings.create_subfolders);
        self.download(selection.selected_from(&context.items), destination)
    }
}
