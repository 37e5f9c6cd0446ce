//! # offer-extract
//!
//! Extract line items from supplier quotations (PDF) with a single
//! multimodal model call.
//!
//! Quotations mix price tables, option lists and long technical prose across
//! several pages, often in more than one language. Text extraction loses the
//! table structure, so this crate rasterises the first pages to PNG and asks
//! a vision model to read the whole document at once and answer with JSON:
//! line items with verbatim prices, technical sections, pictures and document
//! metadata.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve local file or download from URL
//!  ├─ 2. Render     rasterise up to 15 pages at 1.5× via pdfium (spawn_blocking)
//!  ├─ 3. Encode     PNG → base64
//!  ├─ 4. Request    fixed instructions + every page image, in page order
//!  ├─ 5. Infer      ONE call to gpt-4o (or any edgequake-llm provider)
//!  ├─ 6. Normalize  strip code fences, parse JSON, reject zero items
//!  ├─ 7. Categorize default missing categories, group in first-seen order
//!  └─ 8. Persist    pretty UTF-8 JSON, temp file + rename
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use offer_extract::{extract_to_file, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder()
//!         .credential(std::env::var("OPENAI_API_KEY")?)
//!         .build()?;
//!     let stats = extract_to_file("uploads/offer1.pdf", "outputs/items_offer1.json", &config).await?;
//!     eprintln!("{} items in {} categories", stats.item_count, stats.category_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `offer-extract` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! ```toml
//! offer-extract = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, WorkspacePaths};
pub use error::ExtractError;
pub use extract::{extract, extract_from_pages, extract_sync, extract_to_file, extract_with_client};
pub use model::{
    ExtractionRecord, ImageDescriptor, LineItem, Metadata, MetadataValue, PageImage,
    PersistedOutput, Section, SectionContent,
};
pub use output::{ExtractionOutput, ExtractionStats};
pub use pipeline::categorize::CategoryGroup;
pub use pipeline::llm::{resolve_client, InferenceClient, LlmClient};
pub use pipeline::persist::{read_output, write_output};
pub use pipeline::render::RasterizedDocument;
pub use pipeline::request::ExtractionRequest;
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
