//! Thread listing fetch and reduction to media descriptors.

use crate::error::{Error, Result};
use crate::session::HttpSession;
use crate::types::{MediaDescriptor, MediaId, ThreadRef};
use serde::Deserialize;
use std::collections::HashSet;

/// Thread document as served by `{api-base}/{board}/thread/{id}.json`
#[derive(Debug, Deserialize)]
pub struct ThreadDocument {
    /// Posts in thread order. Required: a document without it is unusable.
    pub posts: Vec<Post>,
}

/// The attachment-related fields of one post
#[derive(Debug, Default, Deserialize)]
pub struct Post {
    /// Attachment identity
    #[serde(default)]
    pub tim: Option<u64>,
    /// Attachment extension, including the dot
    #[serde(default)]
    pub ext: Option<String>,
    /// Original filename without extension
    #[serde(default)]
    pub filename: Option<String>,
    /// Attachment size in bytes
    #[serde(default)]
    pub fsize: Option<u64>,
}

/// Interpret user input as a thread page URL
///
/// See [`ThreadRef::from_url`] for the accepted shape.
pub fn parse_thread_url(input: &str) -> Option<ThreadRef> {
    ThreadRef::from_url(input)
}

/// Reduce a thread document to its media, in listing order.
///
/// Posts without an attachment are skipped. Duplicate identities are dropped as
/// they are encountered; the first occurrence wins.
pub fn descriptors_from_document(board: &str, document: ThreadDocument) -> Vec<MediaDescriptor> {
    let mut seen: HashSet<MediaId> = HashSet::with_capacity(document.posts.len());
    let mut items = Vec::new();

    for post in document.posts {
        let (Some(tim), Some(ext)) = (post.tim, post.ext) else {
            continue;
        };

        let id = MediaId(tim);
        if !seen.insert(id) {
            tracing::debug!(board, id = %id, "Skipping duplicate attachment");
            continue;
        }

        items.push(MediaDescriptor {
            id,
            ext,
            filename: post.filename.unwrap_or_default(),
            board: board.to_string(),
            size: post.fsize,
        });
    }

    items
}

/// Fetch a thread listing and reduce it to descriptors.
///
/// # Errors
///
/// Returns [`Error::ThreadUnavailable`] when the endpoint answers with a
/// non-success status, the body is not a thread document, or the request fails
/// in transport. A thread with zero attachments is `Ok(vec![])`.
pub async fn load_thread(
    session: &HttpSession,
    api_base: &str,
    thread: &ThreadRef,
) -> Result<Vec<MediaDescriptor>> {
    let url = thread.api_url(api_base);
    tracing::info!(board = %thread.board, thread_id = %thread.thread_id, url = %url, "Fetching thread listing");

    let document: ThreadDocument = session.fetch_json(&url).await.map_err(|e| {
        tracing::warn!(url = %url, error = %e, "Thread listing unavailable");
        Error::ThreadUnavailable {
            board: thread.board.clone(),
            thread_id: thread.thread_id.clone(),
            reason: e.to_string(),
        }
    })?;

    let items = descriptors_from_document(&thread.board, document);
    tracing::info!(thread = %thread, count = items.len(), "Thread listing loaded");
    Ok(items)
}
