//! Pipeline stages for quotation extraction.
//!
//! Each submodule implements exactly one step; stages run strictly in order
//! and never revisit an earlier one.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ request ──▶ llm ──▶ normalize ──▶ categorize ──▶ persist
//! (path/URL) (pdfium)  (base64)   (prompt+   (VLM)   (fences,      (group,        (JSON
//!                                  images)            parse)        default)       file)
//! ```
//!
//! 1. [`input`]      canonicalise the path or URL to a local, readable PDF
//! 2. [`render`]     rasterise the first `max_pages` pages in `spawn_blocking`
//! 3. [`encode`]     PNG-encode and base64-wrap each page
//! 4. [`request`]    pair the fixed instructions with the images
//! 5. [`llm`]        the one network call, behind [`llm::InferenceClient`]
//! 6. [`normalize`]  strip code fences, parse JSON, reject empty extractions
//! 7. [`categorize`] default and group categories, build the output record
//! 8. [`persist`]    write the record as pretty UTF-8 JSON

pub mod categorize;
pub mod encode;
pub mod input;
pub mod llm;
pub mod normalize;
pub mod persist;
pub mod render;
pub mod request;
