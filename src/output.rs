//! Result types returned by the top-level `extract*` functions.

use crate::model::PersistedOutput;
use serde::{Deserialize, Serialize};

/// The extracted document plus run statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// The record that is (or would be) written to disk.
    pub output: PersistedOutput,
    pub stats: ExtractionStats,
}

/// Counters and timings for one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Page count reported by the PDF.
    pub total_pages: usize,
    /// Pages rasterised and sent to the model (capped by `max_pages`).
    pub processed_pages: usize,
    pub item_count: usize,
    pub section_count: usize,
    pub image_count: usize,
    pub category_count: usize,
    pub render_duration_ms: u64,
    pub inference_duration_ms: u64,
    pub total_duration_ms: u64,
}

impl ExtractionStats {
    /// True when the PDF had more pages than were sent to the model.
    pub fn was_truncated(&self) -> bool {
        self.total_pages > self.processed_pages
    }
}
