//! Extraction entry points.
//!
//! One run is: resolve the input, resolve the model client, rasterise the
//! first pages, send them in a single request, normalise the reply, and
//! categorise the items. Every step is awaited before the next starts, and
//! any error ends the run with nothing written.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::model::PersistedOutput;
use crate::output::{ExtractionOutput, ExtractionStats};
use crate::pipeline::llm::{self, InferenceClient};
use crate::pipeline::render::{self, RasterizedDocument};
use crate::pipeline::{categorize, input, normalize, persist, request};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Extract line items from a PDF file or URL.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// - `FileNotFound` and the other input errors, before anything else
/// - `MissingCredential` when no provider and no credential are configured,
///   before the PDF is opened
/// - any rasterisation, inference or normalisation error from the run
pub async fn extract(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let input_str = input_str.as_ref();
    info!("Starting extraction: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let client = llm::resolve_client(config)?;

    extract_with_client(resolved.path(), &client, config).await
}

/// Blocking wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally; do not call it from inside
/// an async context.
pub fn extract_sync(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(extract(input_str, config))
}

/// Extract with a caller-supplied client. `pdf_path` must be a local file.
pub async fn extract_with_client<C: InferenceClient>(
    pdf_path: &Path,
    client: &C,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let total_start = Instant::now();

    let render_start = Instant::now();
    let document = render::rasterize(pdf_path, config).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!(
        "Rendered {}/{} pages in {}ms",
        document.pages.len(),
        document.total_pages,
        render_duration_ms
    );

    let mut output = extract_from_pages(document, client, config).await?;
    output.stats.render_duration_ms = render_duration_ms;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Run the model stages on already-rasterised pages.
///
/// `stats.render_duration_ms` is left at zero; `total_duration_ms` covers
/// only the stages run here.
pub async fn extract_from_pages<C: InferenceClient>(
    document: RasterizedDocument,
    client: &C,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let start = Instant::now();
    let RasterizedDocument { total_pages, pages } = document;
    let processed_pages = pages.len();

    let request = request::build_request(config.instructions(), pages);
    if let Some(ref cb) = config.progress_callback {
        cb.on_request_sent(request.images.len());
    }

    let inference_start = Instant::now();
    let reply = client.infer(&request).await?;
    let inference_duration_ms = inference_start.elapsed().as_millis() as u64;
    info!(
        "Model replied with {} chars in {}ms",
        reply.chars().count(),
        inference_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_response_received(reply.chars().count());
    }

    let record = normalize::normalize_response(&reply)?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_parsed(
            record.items.len(),
            record.technical_sections.len(),
            record.images.len(),
        );
    }

    let output = PersistedOutput::from_record(
        record,
        &config.extraction_method,
        &config.fallback_category,
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_categories(&categorize::breakdown(&output.items));
    }

    let stats = ExtractionStats {
        total_pages,
        processed_pages,
        item_count: output.items.len(),
        section_count: output.technical_sections.len(),
        image_count: output.images.len(),
        category_count: output.categories.len(),
        render_duration_ms: 0,
        inference_duration_ms,
        total_duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Extraction complete: {} items in {} categories",
        stats.item_count, stats.category_count
    );

    Ok(ExtractionOutput { output, stats })
}

/// Extract and write the result to `output_path`.
///
/// Nothing is written unless extraction succeeds.
pub async fn extract_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionStats, ExtractError> {
    let result = extract(input_str, config).await?;
    let path = output_path.as_ref();

    persist::write_output(path, &result.output).await?;
    info!("Saved {}", path.display());
    if let Some(ref cb) = config.progress_callback {
        cb.on_saved(path);
    }

    Ok(result.stats)
}
