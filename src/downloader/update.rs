//! Release check and self-update.

use crate::bridge::JobHandle;
use crate::error::Result;
use crate::types::{Event, UpdateDescriptor};
use crate::update::{self, InstallKind};

use super::ChanDownloader;

impl ChanDownloader {
    /// Ask the release endpoint for a newer version.
    ///
    /// Emits [`Event::UpdateAvailable`] or [`Event::UpToDate`]. Transport and
    /// parse failures count as "up to date".
    ///
    /// # Errors
    ///
    /// [`Error::NoSession`](crate::Error::NoSession) without an open session.
    pub fn check_update(&self) -> Result<JobHandle> {
        let session = self.current_session()?;
        let config = self.config.clone();
        let events = self.events.clone();

        self.spawn(async move {
            match update::check_update(&session, &config.update).await {
                Some(descriptor) => events.send(Event::UpdateAvailable(descriptor)),
                None => events.send(Event::UpToDate {
                    current_version: config.update.current_version.clone(),
                }),
            }
        })
    }

    /// Download the update for the running installation and prepare the restart.
    ///
    /// Emits [`Event::UpdateReady`] or [`Event::UpdateFailed`]. The process is
    /// not restarted here.
    pub fn apply_update(&self, descriptor: UpdateDescriptor) -> Result<JobHandle> {
        let kind = InstallKind::detect()?;
        self.apply_update_for(descriptor, kind)
    }

    /// [`apply_update`](Self::apply_update) for an explicit installation kind
    pub fn apply_update_for(
        &self,
        descriptor: UpdateDescriptor,
        kind: InstallKind,
    ) -> Result<JobHandle> {
        let session = self.current_session()?;
        let config = self.config.clone();
        let events = self.events.clone();

        tracing::info!(version = %descriptor.version, ?kind, "Update requested");
        self.spawn(async move {
            match update::apply_update(&session, &descriptor, &kind, &config.update).await {
                Ok((path, plan)) => events.send(Event::UpdateReady { path, plan }),
                Err(e) => {
                    tracing::error!(version = %descriptor.version, error = %e, "Update failed");
                    events.send(Event::UpdateFailed {
                        error: e.to_string(),
                    });
                }
            }
        })
    }
}
