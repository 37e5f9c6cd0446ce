//! PDF rasterisation: render the first `max_pages` pages via pdfium.
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and must not run on a Tokio worker thread. The whole open → render
//! → encode loop therefore runs inside `tokio::task::spawn_blocking`; the
//! caller awaits it before moving on, so the pipeline stays sequential.
//!
//! Pages are rendered at a fixed magnification (`render_scale`, 1.5× by
//! default) with each edge capped at [`MAX_DIMENSION_PX`], so a stray A0
//! drawing sheet cannot blow up memory or the request size.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::model::PageImage;
use crate::pipeline::encode;
use crate::progress::ProgressCallback;
use pdfium_render::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Longest rendered edge in pixels.
pub const MAX_DIMENSION_PX: u32 = 4096;

/// Environment variable pointing at an explicit pdfium library file.
pub const PDFIUM_LIB_PATH_VAR: &str = "PDFIUM_LIB_PATH";

/// Encoded pages plus the document's full page count.
#[derive(Debug, Clone)]
pub struct RasterizedDocument {
    /// Page count reported by the PDF, before the cap.
    pub total_pages: usize,
    /// Encoded pages in document order.
    pub pages: Vec<PageImage>,
}

/// 0-based indices of the pages to render: `0..min(total, max_pages)`.
pub fn pages_to_render(total_pages: usize, max_pages: usize) -> Range<usize> {
    0..total_pages.min(max_pages)
}

/// Pixel size of a page of `width_pt × height_pt` points at `scale`,
/// clamped to `[1, MAX_DIMENSION_PX]` on each edge with aspect ratio kept.
pub fn scaled_dimensions(width_pt: f32, height_pt: f32, scale: f32) -> (u32, u32) {
    let w = (width_pt * scale).max(1.0);
    let h = (height_pt * scale).max(1.0);
    let longest = w.max(h);
    if longest > MAX_DIMENSION_PX as f32 {
        let ratio = MAX_DIMENSION_PX as f32 / longest;
        (
            ((w * ratio) as u32).clamp(1, MAX_DIMENSION_PX),
            ((h * ratio) as u32).clamp(1, MAX_DIMENSION_PX),
        )
    } else {
        (w as u32, h as u32)
    }
}

/// Render and encode the first `config.max_pages` pages of `pdf_path`.
pub async fn rasterize(
    pdf_path: &Path,
    config: &ExtractionConfig,
) -> Result<RasterizedDocument, ExtractError> {
    let path = pdf_path.to_path_buf();
    let max_pages = config.max_pages;
    let scale = config.render_scale;
    let password = config.password.clone();
    let progress = config.progress_callback.clone();

    tokio::task::spawn_blocking(move || {
        rasterize_blocking(&path, max_pages, scale, password.as_deref(), progress)
    })
    .await
    .map_err(|e| ExtractError::Internal(format!("Render task panicked: {e}")))?
}

fn rasterize_blocking(
    pdf_path: &Path,
    max_pages: usize,
    scale: f32,
    password: Option<&str>,
    progress: Option<ProgressCallback>,
) -> Result<RasterizedDocument, ExtractError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| classify_load_error(pdf_path, password.is_some(), format!("{e:?}")))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    let selected = pages_to_render(total_pages, max_pages);
    info!(
        "PDF loaded: {} pages, rendering {}",
        total_pages,
        selected.len()
    );
    if let Some(ref cb) = progress {
        cb.on_pdf_opened(total_pages, selected.len());
    }

    let mut encoded = Vec::with_capacity(selected.len());
    for idx in selected.clone() {
        let render_failed = |detail: String| ExtractError::RasterisationFailed {
            page: idx + 1,
            detail,
        };

        let page = pages
            .get(idx as u16)
            .map_err(|e| render_failed(format!("{e:?}")))?;

        let (width_px, height_px) =
            scaled_dimensions(page.width().value, page.height().value, scale);
        let render_config = PdfRenderConfig::new()
            .set_target_width(width_px as i32)
            .set_maximum_height(height_px as i32);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| render_failed(format!("{e:?}")))?;
        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        let page_image = encode::encode_page(idx, &image)
            .map_err(|e| render_failed(format!("PNG encoding failed: {e}")))?;
        encoded.push(page_image);

        if let Some(ref cb) = progress {
            cb.on_page_converted(idx + 1, selected.len());
        }
    }

    Ok(RasterizedDocument {
        total_pages,
        pages: encoded,
    })
}

/// Bind to a pdfium library.
///
/// Search order: `PDFIUM_LIB_PATH`, the executable's directory, the current
/// directory, then the system library path.
pub fn bind_pdfium() -> Result<Pdfium, ExtractError> {
    if let Ok(path) = std::env::var(PDFIUM_LIB_PATH_VAR) {
        debug!(path = %path, "Loading pdfium from {}", PDFIUM_LIB_PATH_VAR);
        let bindings = Pdfium::bind_to_library(&path)
            .map_err(|e| ExtractError::PdfiumBindingFailed(format!("{path}: {e}")))?;
        return Ok(Pdfium::new(bindings));
    }

    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(exe_dir);
    }
    candidates.push(PathBuf::from("./"));

    for dir in &candidates {
        let lib_path = Pdfium::pdfium_platform_library_name_at_path(dir.to_string_lossy().as_ref());
        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            debug!(dir = %dir.display(), "Loaded pdfium from candidate directory");
            return Ok(Pdfium::new(bindings));
        }
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| ExtractError::PdfiumBindingFailed(e.to_string()))
}

/// Map a pdfium load failure onto the password/corruption variants.
fn classify_load_error(path: &Path, had_password: bool, detail: String) -> ExtractError {
    if detail.to_lowercase().contains("password") {
        if had_password {
            ExtractError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            ExtractError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        ExtractError::CorruptPdf {
            path: path.to_path_buf(),
            detail,
        }
    }
}
