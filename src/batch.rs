//! Chunked concurrent fetching of many small resources (thumbnails).
//!
//! Input is split into fixed-size chunks. All requests of a chunk run
//! concurrently and the whole chunk is awaited before the next one starts, so
//! at most `chunk_size` requests are in flight. A failed request leaves an
//! empty slot; it never aborts the chunk or the run.

use crate::session::ResourceFetcher;
use futures::future::join_all;

/// Results of one chunk, in request order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedChunk {
    /// Index of this chunk's first slot in the full input
    pub offset: usize,
    /// One slot per URL of the chunk, `None` where the fetch failed
    pub results: Vec<Option<Vec<u8>>>,
}

impl FetchedChunk {
    /// Slots that received data
    pub fn loaded(&self) -> usize {
        self.results.iter().filter(|slot| slot.is_some()).count()
    }
}

/// Fetch `urls` chunk by chunk, handing each finished chunk to `on_chunk`.
///
/// Chunk N is delivered before chunk N+1 is requested. Returns the number of
/// slots that received data.
pub async fn fetch_in_chunks<F, C>(
    fetcher: &F,
    urls: &[String],
    chunk_size: usize,
    mut on_chunk: C,
) -> usize
where
    F: ResourceFetcher + ?Sized,
    C: FnMut(FetchedChunk),
{
    let chunk_size = chunk_size.max(1);
    let mut loaded = 0;

    for (index, chunk) in urls.chunks(chunk_size).enumerate() {
        let offset = index * chunk_size;
        let results = join_all(chunk.iter().map(|url| fetcher.fetch_bytes(url))).await;

        let fetched = FetchedChunk { offset, results };
        loaded += fetched.loaded();
        tracing::debug!(
            offset,
            requested = chunk.len(),
            loaded = fetched.loaded(),
            "Chunk fetched"
        );
        on_chunk(fetched);
    }

    loaded
}

/// Fetch `urls` in chunks and return every slot, same length and order as the input.
pub async fn fetch_many<F>(fetcher: &F, urls: &[String], chunk_size: usize) -> Vec<Option<Vec<u8>>>
where
    F: ResourceFetcher + ?Sized,
{
    let mut all = Vec::with_capacity(urls.len());
    fetch_in_chunks(fetcher, urls, chunk_size, |chunk| all.extend(chunk.results)).await;
    all
}
