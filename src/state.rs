//! Interactive-context state, folded from drained bridge events.
//!
//! Only the interactive context owns an [`AppState`]. Background jobs never see
//! it; they describe what happened through [`Event`] values and this module
//! decides what that means for the view.

use crate::types::{
    DownloadResult, Event, MediaDescriptor, MediaId, SelectionSet, ThreadContext, ThreadRef,
    UpdateDescriptor,
};
use crate::update::restart::RestartPlan;
use std::path::PathBuf;
use std::sync::Arc;

/// Status line shown when nothing is in progress
pub const STATUS_READY: &str = "Ready";

/// Everything the presentation layer renders
#[derive(Debug)]
pub struct AppState {
    /// Thread being shown (set as soon as a load is requested)
    pub thread: Option<ThreadRef>,
    /// Descriptors of the loaded thread, in listing order
    pub items: Arc<Vec<MediaDescriptor>>,
    /// User selection for download
    pub selection: SelectionSet,
    /// One thumbnail slot per item; `None` until loaded or if the fetch failed
    pub thumbnails: Vec<Option<Vec<u8>>>,
    /// Most recent preview
    pub preview: Option<(MediaId, Option<Vec<u8>>)>,
    /// Download progress, 0.0 to 100.0
    pub progress: f32,
    /// Status line text
    pub status: String,
    /// Last error worth showing to the user
    pub last_error: Option<String>,
    /// Outcome of the last finished download run
    pub last_download: Option<(DownloadResult, PathBuf)>,
    /// Whether a download run is in progress
    pub downloading: bool,
    /// Newer release, once a check found one
    pub pending_update: Option<UpdateDescriptor>,
    /// Downloaded update waiting for the restart
    pub ready_update: Option<(PathBuf, RestartPlan)>,
    /// Set once the background context announced shutdown
    pub shutting_down: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            thread: None,
            items: Arc::new(Vec::new()),
            selection: SelectionSet::new(),
            thumbnails: Vec::new(),
            preview: None,
            progress: 0.0,
            status: STATUS_READY.to_string(),
            last_error: None,
            last_download: None,
            downloading: false,
            pending_update: None,
            ready_update: None,
            shutting_down: false,
        }
    }
}

impl AppState {
    /// Fresh state with the "Ready" status
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a new thread load.
    ///
    /// Clears descriptors, selection, thumbnails and progress. Events still in
    /// flight for the previous thread are ignored from here on.
    pub fn begin_load(&mut self, thread: ThreadRef) {
        self.status = format!("Fetching thread {}...", thread);
        self.thread = Some(thread);
        self.items = Arc::new(Vec::new());
        self.selection.clear();
        self.thumbnails.clear();
        self.preview = None;
        self.progress = 0.0;
        self.last_error = None;
    }

    /// Record that the entered text was not a thread URL
    pub fn reject_url(&mut self) {
        self.status = "Invalid URL format".to_string();
    }

    /// Fold a batch of events in arrival order
    pub fn apply_all(&mut self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.apply(event);
        }
    }

    /// Fold one event
    pub fn apply(&mut self, event: Event) {
        match event {
            Event::ThreadLoaded { context } => {
                if !self.is_current(&context.thread) {
                    tracing::debug!(thread = %context.thread, "Ignoring listing for a stale thread");
                    return;
                }
                self.status = format!("Found {} items. Loading thumbnails...", context.items.len());
                self.thumbnails = vec![None; context.items.len()];
                self.items = context.items;
            }

            Event::ThreadLoadFailed { thread, error } => {
                if !self.is_current(&thread) {
                    return;
                }
                self.status = "Error fetching thread".to_string();
                self.last_error = Some(error);
            }

            Event::ThumbnailsChunk {
                thread,
                offset,
                thumbnails,
            } => {
                if !self.is_current(&thread) {
                    tracing::debug!(thread = %thread, offset, "Ignoring thumbnails for a stale thread");
                    return;
                }
                let count = thumbnails.len();
                for (index, slot) in thumbnails.into_iter().enumerate() {
                    if let Some(target) = self.thumbnails.get_mut(offset + index) {
                        *target = slot;
                    }
                }
                let total = self.items.len();
                self.status = format!("Loaded {}/{} thumbnails", (offset + count).min(total), total);
            }

            Event::ThumbnailsComplete { thread, .. } => {
                if !self.is_current(&thread) {
                    return;
                }
                tracing::debug!(thread = %thread, "Thumbnails complete");
            }

            Event::PreviewLoaded { id, data } => {
                self.preview = Some((id, data));
            }

            Event::DownloadStarted { .. } => {
                self.downloading = true;
                self.progress = 0.0;
                self.status = "Starting download...".to_string();
            }

            Event::DownloadProgress(progress) => {
                self.progress = progress.percent();
                self.status = format!("Downloading: {}/{}", progress.succeeded, progress.total);
            }

            Event::DownloadComplete {
                result,
                destination,
            } => {
                self.downloading = false;
                self.progress = 0.0;
                self.status = STATUS_READY.to_string();
                self.last_download = Some((result, destination));
            }

            Event::DownloadFailed { error } => {
                self.downloading = false;
                self.progress = 0.0;
                self.status = STATUS_READY.to_string();
                self.last_error = Some(error);
            }

            Event::UpdateAvailable(descriptor) => {
                self.pending_update = Some(descriptor);
            }

            Event::UpToDate { .. } => {
                self.pending_update = None;
            }

            Event::UpdateFailed { error } => {
                self.last_error = Some(error);
            }

            Event::UpdateReady { path, plan } => {
                self.pending_update = None;
                self.ready_update = Some((path, plan));
            }

            Event::Shutdown => {
                self.shutting_down = true;
            }
        }
    }

    /// Flip selection of `id`; returns whether it is now selected
    pub fn toggle(&mut self, id: MediaId) -> bool {
        self.selection.toggle(id)
    }

    /// Select every loaded item
    pub fn select_all(&mut self) {
        self.selection.select_all(self.items.iter());
    }

    /// Drop the selection
    pub fn deselect_all(&mut self) {
        self.selection.clear();
    }

    /// The loaded thread and its items, once a listing arrived
    pub fn context(&self) -> Option<ThreadContext> {
        self.thread.clone().map(|thread| ThreadContext {
            thread,
            items: self.items.clone(),
        })
    }

    /// Selected descriptors in listing order
    pub fn selected(&self) -> Vec<MediaDescriptor> {
        self.selection.selected_from(&self.items)
    }

    /// Whether the download command is available
    pub fn can_download(&self) -> bool {
        !self.downloading && !self.selection.is_empty()
    }

    /// Label of the download command
    pub fn download_label(&self) -> String {
        format!("Download Selected ({})", self.selection.len())
    }

    fn is_current(&self, thread: &ThreadRef) -> bool {
        self.thread.as_ref() == Some(thread)
    }
}
