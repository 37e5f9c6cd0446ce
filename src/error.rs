//! Error types for the offer-extract library.
//!
//! Every failure in this pipeline is fatal for the run: a quotation is
//! extracted in one model call, so there is no page-level partial result to
//! fall back on. [`ExtractError`] is therefore the only error type, returned
//! from every stage and from the top-level `extract*` functions.
//!
//! Variants are grouped by the stage that raises them. The binary reduces all
//! of them to "print diagnostic, exit 1".

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the offer-extract library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// The API credential is not configured. Raised before any PDF work or
    /// network traffic.
    #[error("{var} is not set.\nExport the API key before running: export {var}=sk-...")]
    MissingCredential { var: String },

    /// The provider factory rejected the provider/model combination.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input PDF was not found at the given path.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// HTTP input could not be fetched.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium failed to render or PNG-encode a page (1-indexed).
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or place the library next to the executable."
    )]
    PdfiumBindingFailed(String),

    // ── Model errors ──────────────────────────────────────────────────────
    /// Transport, quota or service failure from the model provider. Not retried.
    #[error("LLM request failed: {message}")]
    InferenceFailed { message: String },

    /// The reply was not JSON of the expected shape, even after fence stripping.
    #[error("Model reply is not valid extraction JSON: {detail}\nReply starts with: {excerpt:?}")]
    MalformedResponse { detail: String, excerpt: String },

    /// The reply parsed but contained zero line items.
    #[error("No items extracted: the document may be unreadable or not a quotation")]
    EmptyExtraction,

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An existing output file could not be read back or parsed.
    #[error("Failed to read output file '{path}': {detail}")]
    OutputReadFailed { path: PathBuf, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExtractError {
    /// Build a [`ExtractError::MalformedResponse`] with a bounded excerpt of
    /// the offending text.
    pub(crate) fn malformed(detail: impl Into<String>, text: &str) -> Self {
        const EXCERPT_CHARS: usize = 200;
        ExtractError::MalformedResponse {
            detail: detail.into(),
            excerpt: text.chars().take(EXCERPT_CHARS).collect(),
        }
    }
}
