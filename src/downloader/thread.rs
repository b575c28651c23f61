//! Thread listing, thumbnails and previews.

use crate::batch;
use crate::bridge::{EventSender, JobHandle};
use crate::error::{Error, Result};
use crate::listing;
use crate::session::{HttpSession, ResourceFetcher};
use crate::types::{Event, MediaDescriptor, ThreadContext, ThreadRef};

use super::ChanDownloader;

impl ChanDownloader {
    /// Load a thread listing, then fetch its thumbnails.
    ///
    /// Emits [`Event::ThreadLoaded`] or [`Event::ThreadLoadFailed`], followed on
    /// success by one [`Event::ThumbnailsChunk`] per chunk and a final
    /// [`Event::ThumbnailsComplete`].
    ///
    /// # Errors
    ///
    /// [`Error::NoSession`] without an open session, [`Error::ShuttingDown`]
    /// once shutdown has begun.
    pub fn load_thread(&self, thread: ThreadRef) -> Result<JobHandle> {
        let session = self.current_session()?;
        let config = self.config.clone();
        let events = self.events.clone();

        tracing::info!(thread = %thread, "Load requested");
        self.spawn(async move {
            let items =
                match listing::load_thread(&session, &config.network.api_base, &thread).await {
                    Ok(items) => items,
                    Err(e) => {
                        events.send(Event::ThreadLoadFailed {
                            thread,
                            error: e.to_string(),
                        });
                        return;
                    }
                };

            let context = ThreadContext::new(thread, items);
            events.send(Event::ThreadLoaded {
                context: context.clone(),
            });

            stream_thumbnails(
                &session,
                &config.network.img_base,
                config.network.thumbnail_chunk_size,
                &context,
                &events,
            )
            .await;
        })
    }

    /// [`load_thread`](Self::load_thread) from a thread page URL
    ///
    /// # Errors
    ///
    /// [`Error::InvalidUrl`] if `url` is not a thread URL.
    pub fn load_thread_url(&self, url: &str) -> Result<JobHandle> {
        let thread =
            listing::parse_thread_url(url).ok_or_else(|| Error::InvalidUrl(url.to_string()))?;
        self.load_thread(thread)
    }

    /// Fetch thumbnails for an already loaded thread
    pub fn fetch_thumbnails(&self, context: ThreadContext) -> Result<JobHandle> {
        let session = self.current_session()?;
        let config = self.config.clone();
        let events = self.events.clone();

        self.spawn(async move {
            stream_thumbnails(
                &session,
                &config.network.img_base,
                config.network.thumbnail_chunk_size,
                &context,
                &events,
            )
            .await;
        })
    }

    /// Fetch preview bytes for one item: the thumbnail for video kinds, the
    /// full resource otherwise. Emits [`Event::PreviewLoaded`].
    pub fn fetch_preview(&self, item: MediaDescriptor) -> Result<JobHandle> {
        let session = self.current_session()?;
        let config = self.config.clone();
        let events = self.events.clone();

        self.spawn(async move {
            let url = preview_url(&item, &config.network.img_base);
            let data = session.fetch_bytes(&url).await;
            events.send(Event::PreviewLoaded { id: item.id, data });
        })
    }
}

/// URL a preview is taken from
pub(crate) fn preview_url(item: &MediaDescriptor, img_base: &str) -> String {
    if item.is_video() {
        item.thumb_url(img_base)
    } else {
        item.full_url(img_base)
    }
}

/// Fetch every thumbnail of `context`, one event per finished chunk
async fn stream_thumbnails(
    session: &HttpSession,
    img_base: &str,
    chunk_size: usize,
    context: &ThreadContext,
    events: &EventSender,
) {
    let urls: Vec<String> = context
        .items
        .iter()
        .map(|item| item.thumb_url(img_base))
        .collect();

    let loaded = batch::fetch_in_chunks(session, &urls, chunk_size, |chunk| {
        events.send(Event::ThumbnailsChunk {
            thread: context.thread.clone(),
            offset: chunk.offset,
            thumbnails: chunk.results,
        });
    })
    .await;

    tracing::info!(thread = %context.thread, loaded, total = urls.len(), "Thumbnails fetched");
    events.send(Event::ThumbnailsComplete {
        thread: context.thread.clone(),
        loaded,
        total: urls.len(),
    });
}
