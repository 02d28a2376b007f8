//! Progress reporting for collection runs.
//!
//! Two modes, auto-detected:
//! - Interactive mode (TTY): per-page status lines on stderr
//! - Logging mode (non-TTY): structured logging using tracing

use std::sync::Arc;

use console::Term;
use starhist::{CollectProgress, ProgressCallback};

/// Progress reporter that handles both interactive and logging modes.
pub enum ProgressReporter {
    /// Status lines on stderr for a TTY.
    Interactive(Term),
    /// Structured logging for non-TTY (CI, pipes).
    Logging,
}

impl ProgressReporter {
    /// Create a new progress reporter, auto-detecting TTY mode.
    pub fn new() -> Self {
        let term = Term::stderr();
        if term.is_term() {
            Self::Interactive(term)
        } else {
            Self::Logging
        }
    }

    /// Handle a progress event.
    pub fn handle(&self, event: CollectProgress) {
        match self {
            Self::Interactive(term) => Self::display(term, event),
            Self::Logging => Self::log(event),
        }
    }

    fn display(term: &Term, event: CollectProgress) {
        let line = match event {
            CollectProgress::FetchingPages {
                repo,
                expected_pages,
            } => format!("{repo}: fetching up to {expected_pages} pages"),
            CollectProgress::FetchedPage {
                page,
                count,
                total_so_far,
                ..
            } => format!("  page {page}: {count} stars ({total_so_far} so far)"),
            CollectProgress::Complete { repo, total } => {
                format!("{repo}: {total} stars collected")
            }
            _ => return,
        };
        // Progress is best-effort; a broken stderr should not kill the run.
        let _ = term.write_line(&line);
    }

    fn log(event: CollectProgress) {
        match event {
            CollectProgress::FetchingPages {
                repo,
                expected_pages,
            } => {
                tracing::info!(repo = %repo, pages = expected_pages, "fetching stargazer pages");
            }
            CollectProgress::FetchedPage {
                repo,
                page,
                count,
                total_so_far,
            } => {
                tracing::info!(repo = %repo, page, count, total = total_so_far, "fetched page");
            }
            CollectProgress::Complete { repo, total } => {
                tracing::info!(repo = %repo, total, "collection complete");
            }
            _ => {}
        }
    }

    /// Convert to a ProgressCallback for the library.
    pub fn callback(self: &Arc<Self>) -> ProgressCallback {
        let reporter = Arc::clone(self);
        Box::new(move |event| reporter.handle(event))
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
