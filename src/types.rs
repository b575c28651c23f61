//! Core types for chan-dl

use crate::update::restart::RestartPlan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Numeric identity (`tim`) of one attached media resource
///
/// Unique within a loaded thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(pub u64);

impl MediaId {
    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for MediaId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one job submitted to the execution bridge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JobId(pub u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Media classification derived from the file extension
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// `.webm`, `.mp4`
    Video,
    /// `.gif`
    AnimatedImage,
    /// Anything else (`.jpg`, `.png`, ...)
    StaticImage,
}

impl MediaKind {
    /// Classify an extension, with or without the leading dot, case-insensitively
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "webm" | "mp4" => MediaKind::Video,
            "gif" => MediaKind::AnimatedImage,
            _ => MediaKind::StaticImage,
        }
    }
}

/// One remote asset attached to a post
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    /// Identity (`tim`)
    pub id: MediaId,
    /// File extension including the dot (e.g. ".jpg")
    pub ext: String,
    /// Original filename as uploaded, without extension
    pub filename: String,
    /// Board the thread lives on
    pub board: String,
    /// Size in bytes, when the listing reports it
    pub size: Option<u64>,
}

impl MediaDescriptor {
    /// Full-size resource URL: `{img_base}/{board}/{id}{ext}`
    pub fn full_url(&self, img_base: &str) -> String {
        format!(
            "{}/{}/{}{}",
            img_base.trim_end_matches('/'),
            self.board,
            self.id,
            self.ext
        )
    }

    /// Thumbnail URL: `{img_base}/{board}/{id}s.jpg`
    pub fn thumb_url(&self, img_base: &str) -> String {
        format!(
            "{}/{}/{}s.jpg",
            img_base.trim_end_matches('/'),
            self.board,
            self.id
        )
    }

    /// Name of the file written to disk: `{id}{ext}`
    pub fn local_filename(&self) -> String {
        format!("{}{}", self.id, self.ext)
    }

    /// Classification by extension
    pub fn kind(&self) -> MediaKind {
        MediaKind::from_extension(&self.ext)
    }

    /// True for kinds that cannot be previewed as a still image
    pub fn is_video(&self) -> bool {
        matches!(self.kind(), MediaKind::Video | MediaKind::AnimatedImage)
    }
}

/// A (board, thread) pair naming one remote thread
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadRef {
    /// Board identifier (e.g. "g")
    pub board: String,
    /// Thread identifier (numeric string)
    pub thread_id: String,
}

impl ThreadRef {
    /// Create a new thread reference
    pub fn new(board: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            board: board.into(),
            thread_id: thread_id.into(),
        }
    }

    /// Parse a thread page URL of the form `https://host/{board}/thread/{id}[/slug][#p123]`
    ///
    /// Returns `None` for anything that does not have that shape.
    pub fn from_url(input: &str) -> Option<Self> {
        let parsed = url::Url::parse(input.trim()).ok()?;
        let mut parts = parsed.path_segments()?.filter(|s| !s.is_empty());

        let board = parts.next()?;
        if parts.next()? != "thread" {
            return None;
        }
        let thread_id = parts.next()?;
        if !thread_id.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        Some(Self::new(board, thread_id))
    }

    /// Listing endpoint: `{api_base}/{board}/thread/{id}.json`
    pub fn api_url(&self, api_base: &str) -> String {
        format!(
            "{}/{}/thread/{}.json",
            api_base.trim_end_matches('/'),
            self.board,
            self.thread_id
        )
    }

    /// Download directory for this thread, optionally nested as `board/thread_id`
    pub fn destination(&self, base: &std::path::Path, create_subfolders: bool) -> PathBuf {
        if create_subfolders {
            base.join(&self.board).join(&self.thread_id)
        } else {
            base.to_path_buf()
        }
    }
}

impl std::fmt::Display for ThreadRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}/{}", self.board, self.thread_id)
    }
}

/// The thread currently loaded, replaced wholesale on every load
///
/// Descriptors are shared read-only with the pipelines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThreadContext {
    /// Which thread
    pub thread: ThreadRef,
    /// Its deduplicated media, in listing order
    pub items: Arc<Vec<MediaDescriptor>>,
}

impl ThreadContext {
    /// Create a context from a freshly loaded listing
    pub fn new(thread: ThreadRef, items: Vec<MediaDescriptor>) -> Self {
        Self {
            thread,
            items: Arc::new(items),
        }
    }
}

/// Identities the user picked for download
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: HashSet<MediaId>,
}

impl SelectionSet {
    /// Create an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `id`, returning whether it is now selected
    pub fn toggle(&mut self, id: MediaId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Add `id` to the selection
    pub fn insert(&mut self, id: MediaId) {
        self.ids.insert(id);
    }

    /// Whether `id` is selected
    pub fn contains(&self, id: MediaId) -> bool {
        self.ids.contains(&id)
    }

    /// Select every descriptor of a listing
    pub fn select_all<'a>(&mut self, items: impl IntoIterator<Item = &'a MediaDescriptor>) {
        self.ids.extend(items.into_iter().map(|item| item.id));
    }

    /// Drop every selection
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Number of selected identities
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when nothing is selected
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected descriptors, in listing order
    pub fn selected_from(&self, items: &[MediaDescriptor]) -> Vec<MediaDescriptor> {
        items
            .iter()
            .filter(|item| self.ids.contains(&item.id))
            .cloned()
            .collect()
    }
}

/// Outcome of one download run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    /// Items already present or fetched and written
    pub succeeded: usize,
    /// Items in the run
    pub total: usize,
}

impl DownloadResult {
    /// Items that failed to fetch or write
    pub fn failed(&self) -> usize {
        self.total.saturating_sub(self.succeeded)
    }
}

/// Progress after one item of a download run
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DownloadProgress {
    /// Items handled so far, successful or not
    pub processed: usize,
    /// Items that succeeded so far
    pub succeeded: usize,
    /// Items in the run
    pub total: usize,
}

impl DownloadProgress {
    /// Handled fraction as a percentage (0.0 to 100.0)
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            return 100.0;
        }
        (self.processed as f32 / self.total as f32) * 100.0
    }
}

/// One downloadable file attached to a release
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    /// Asset file name
    pub name: String,
    /// Direct download URL
    #[serde(rename = "browser_download_url", alias = "url")]
    pub url: String,
}

/// Remote release metadata returned by the release descriptor endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDescriptor {
    /// Version tag, e.g. "v1.2.0"
    #[serde(rename = "tag_name", alias = "version")]
    pub version: String,
    /// Release notes
    #[serde(rename = "body", alias = "notes", default)]
    pub notes: String,
    /// Downloadable assets
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
    /// Publication time, when reported
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Result values delivered from the background context to the interactive one
#[derive(Clone, Debug)]
pub enum Event {
    /// A thread listing was fetched and reduced to descriptors
    ThreadLoaded {
        /// Thread and its media
        context: ThreadContext,
    },

    /// The listing could not be fetched or parsed
    ThreadLoadFailed {
        /// Thread that was requested
        thread: ThreadRef,
        /// User-visible error message
        error: String,
    },

    /// One chunk of thumbnails finished
    ThumbnailsChunk {
        /// Thread the thumbnails belong to
        thread: ThreadRef,
        /// Index of the first slot in this chunk
        offset: usize,
        /// One slot per requested thumbnail, `None` where the fetch failed
        thumbnails: Vec<Option<Vec<u8>>>,
    },

    /// All thumbnail chunks finished
    ThumbnailsComplete {
        /// Thread the thumbnails belong to
        thread: ThreadRef,
        /// Slots that received data
        loaded: usize,
        /// Slots requested
        total: usize,
    },

    /// Preview bytes for one descriptor
    PreviewLoaded {
        /// Which descriptor
        id: MediaId,
        /// Bytes, or `None` if the fetch failed
        data: Option<Vec<u8>>,
    },

    /// A download run started
    DownloadStarted {
        /// Destination directory
        destination: PathBuf,
        /// Items in the run
        total: usize,
    },

    /// One item of a download run was handled
    DownloadProgress(DownloadProgress),

    /// A download run finished
    DownloadComplete {
        /// Counts for the run
        result: DownloadResult,
        /// Destination directory
        destination: PathBuf,
    },

    /// A download run was aborted before any item was handled
    DownloadFailed {
        /// User-visible error message
        error: String,
    },

    /// A newer release exists
    UpdateAvailable(UpdateDescriptor),

    /// The running version is current (or the check failed closed)
    UpToDate {
        /// Version of the running instance
        current_version: String,
    },

    /// An update step failed
    UpdateFailed {
        /// User-visible error message
        error: String,
    },

    /// The replacement artifact is downloaded and the restart is prepared.
    ///
    /// The interactive context persists its state and then hands `plan` to
    /// [`restart::execute`](crate::update::restart::execute), which exits the process.
    UpdateReady {
        /// Where the new artifact was written
        path: PathBuf,
        /// How to swap and relaunch
        plan: RestartPlan,
    },

    /// The background context is shutting down
    Shutdown,
}
