//! Progress reporting for star collection.
//!
//! Events are emitted through an optional callback so the CLI (or any
//! other frontend) can surface per-page progress without the collector
//! knowing anything about terminals or log formats.

/// Progress events emitted while collecting a repository's stars.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum CollectProgress {
    /// Page fan-out is starting.
    FetchingPages {
        /// The repository being collected (`owner/name`).
        repo: String,
        /// Number of pages that will be requested.
        expected_pages: u32,
    },

    /// One page settled with fresh or cached data.
    FetchedPage {
        repo: String,
        /// Page number (1-indexed). Pages complete out of order.
        page: u32,
        /// Star events contributed by this page.
        count: usize,
        /// Running total of events accumulated so far.
        total_so_far: usize,
    },

    /// Collection finished successfully.
    Complete { repo: String, total: usize },
}

/// Callback invoked with progress events.
pub type ProgressCallback = Box<dyn Fn(CollectProgress) + Send + Sync>;

/// Emit an event if a callback is present.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: CollectProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
