//! Progress-callback trait for rasterisation and processing-stage events.
//!
//! Inject an [`Arc<dyn ProgressCallback>`] via
//! [`crate::config::CompanionConfigBuilder::progress_callback`] to receive
//! events while a PDF is rasterised page by page and while an upload waits on
//! the vision endpoint.
//!
//! Pages are rasterised strictly in order, one at a time, so page events are
//! monotonic: `on_page_start(1, n)`, `on_page_complete(1, n, _)`,
//! `on_page_start(2, n)`, …
//!
//! # Example
//!
//! ```rust
//! use eduguide::{CompanionConfig, ProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter(AtomicUsize);
//!
//! impl ProgressCallback for PageCounter {
//!     fn on_page_complete(&self, page: usize, total: usize, bytes: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page}/{total} encoded ({bytes} bytes)");
//!     }
//! }
//!
//! let config = CompanionConfig::builder()
//!     .progress_callback(Arc::new(PageCounter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Stage of a mock-test upload while the user waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    /// Reading the upload (file → base64, PDF → page images).
    Extracting,
    /// Waiting on the vision endpoint.
    Analyzing,
    Complete,
}

impl ProcessingStatus {
    /// Coarse progress percentage used when no page counter is available.
    pub fn percent(self) -> u8 {
        match self {
            ProcessingStatus::Extracting => 40,
            ProcessingStatus::Analyzing => 80,
            ProcessingStatus::Complete => 100,
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProcessingStatus::Extracting => "🔍 Reading image with AI Vision...",
            ProcessingStatus::Analyzing => "✨ Generating results with AI Vision...",
            ProcessingStatus::Complete => "✓ Analysis complete!",
        })
    }
}

/// Called by the rasteriser and the mock-test flow as work progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`: page events
/// are emitted from the blocking rasterisation thread.
pub trait ProgressCallback: Send + Sync {
    /// Called once the page count is known, before the first page renders.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is rendered (1-indexed).
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page has been rendered and encoded.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, encoded_len: usize) {
        let _ = (page_num, total_pages, encoded_len);
    }

    /// Called once after the last page, only when every page succeeded.
    fn on_conversion_complete(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called when a mock-test upload moves to another stage.
    fn on_status(&self, status: ProcessingStatus) {
        let _ = status;
    }
}

/// A no-op implementation; the default when no callback is configured.
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {}

/// Convenience alias matching the type stored in [`crate::config::CompanionConfig`].
pub type SharedProgress = Arc<dyn ProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ProgressCallback for Recorder {
        fn on_page_start(&self, page_num: usize, total_pages: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("start {page_num}/{total_pages}"));
        }

        fn on_status(&self, status: ProcessingStatus) {
            self.events.lock().unwrap().push(format!("{status:?}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgress;
        cb.on_conversion_start(3);
        cb.on_page_start(1, 3);
        cb.on_page_complete(1, 3, 42);
        cb.on_conversion_complete(3);
        cb.on_status(ProcessingStatus::Complete);
    }

    #[test]
    fn recorder_sees_overridden_events_only() {
        let rec = Recorder::default();
        rec.on_conversion_start(2);
        rec.on_page_start(1, 2);
        rec.on_status(ProcessingStatus::Analyzing);
        let events = rec.events.lock().unwrap();
        assert_eq!(*events, vec!["start 1/2".to_string(), "Analyzing".to_string()]);
    }

    #[test]
    fn status_percentages_increase() {
        assert!(ProcessingStatus::Extracting.percent() < ProcessingStatus::Analyzing.percent());
        assert_eq!(ProcessingStatus::Complete.percent(), 100);
    }
}
