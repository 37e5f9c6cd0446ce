//! Progress-callback trait for extraction stage transitions.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive an
//! event each time the pipeline moves to a new stage. The CLI uses this to
//! print its status lines; library callers can forward the events anywhere
//! (a log, a job table, a websocket) without the pipeline knowing.
//!
//! # Example
//!
//! ```rust
//! use offer_extract::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::Arc;
//!
//! struct PrintPages;
//!
//! impl ExtractionProgressCallback for PrintPages {
//!     fn on_page_converted(&self, page_num: usize, total: usize) {
//!         eprintln!("page {page_num}/{total} rendered");
//!     }
//! }
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(Arc::new(PrintPages) as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the extraction pipeline at each stage transition.
///
/// Events arrive in pipeline order from a single task. Implementations must
/// still be `Send + Sync` because the config holding them is shared with the
/// blocking render thread. All methods default to no-ops.
pub trait ExtractionProgressCallback: Send + Sync {
    /// The PDF was opened.
    ///
    /// * `total_pages`      : page count reported by the document
    /// * `pages_to_process` : pages that will be rendered (after the cap)
    fn on_pdf_opened(&self, total_pages: usize, pages_to_process: usize) {
        let _ = (total_pages, pages_to_process);
    }

    /// A page was rendered and encoded. `page_num` is 1-indexed.
    fn on_page_converted(&self, page_num: usize, total: usize) {
        let _ = (page_num, total);
    }

    /// The multimodal request is about to be sent.
    fn on_request_sent(&self, image_count: usize) {
        let _ = image_count;
    }

    /// The model replied. `chars` is the reply length in characters.
    fn on_response_received(&self, chars: usize) {
        let _ = chars;
    }

    /// The reply parsed successfully.
    fn on_extraction_parsed(&self, items: usize, sections: usize, images: usize) {
        let _ = (items, sections, images);
    }

    /// Items were grouped. Pairs are `(category, item_count)` in first-seen order.
    fn on_categories(&self, breakdown: &[(String, usize)]) {
        let _ = breakdown;
    }

    /// The output file was written.
    fn on_saved(&self, path: &Path) {
        let _ = path;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
