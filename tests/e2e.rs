//! End-to-end tests for offer-extract.
//!
//! These tests render a real quotation with pdfium and make a live model
//! call. They are gated behind the `E2E_ENABLED` environment variable so they
//! do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 OPENAI_API_KEY=sk-... DYLD_LIBRARY_PATH=. cargo test --test e2e -- --nocapture
//!
//! The quotation is read from `OFFER_EXTRACT_E2E_PDF`, falling back to
//! `./test_cases/offer1.pdf`.

use offer_extract::{
    extract, extract_to_file, read_output, ExtractionConfig, WorkspacePaths,
};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn sample_pdf() -> PathBuf {
    std::env::var("OFFER_EXTRACT_E2E_PDF")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases/offer1.pdf")
        })
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

fn live_config() -> Option<ExtractionConfig> {
    let key = std::env::var("OPENAI_API_KEY").ok()?;
    Some(ExtractionConfig::builder().credential(key).build().unwrap())
}

// ── Live extraction ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_extract_sample_quotation() {
    let path = e2e_skip_unless_ready!(sample_pdf());
    let Some(config) = live_config() else {
        println!("SKIP — OPENAI_API_KEY not set");
        return;
    };

    let result = extract(path.to_str().unwrap(), &config)
        .await
        .expect("extract() should succeed");

    let out = &result.output;
    assert!(!out.items.is_empty());
    assert!(out.items.iter().all(|i| !i.category.trim().is_empty()));
    assert!(!out.categories.is_empty());
    assert!(result.stats.processed_pages <= 15);
    assert!(result.stats.processed_pages >= 1);

    println!(
        "{} items / {} sections / {} images in {}ms",
        result.stats.item_count,
        result.stats.section_count,
        result.stats.image_count,
        result.stats.total_duration_ms
    );
    for item in out.items.iter().take(5) {
        println!("  [{}] {} — {}", item.category, item.item_name, item.total_price);
    }
}

#[tokio::test]
async fn test_extract_to_workspace_layout() {
    let path = e2e_skip_unless_ready!(sample_pdf());
    let Some(config) = live_config() else {
        println!("SKIP — OPENAI_API_KEY not set");
        return;
    };

    let dir = tempfile::tempdir().unwrap();
    let paths = WorkspacePaths::from_workdir(dir.path());
    std::fs::create_dir_all(paths.input.parent().unwrap()).unwrap();
    std::fs::copy(&path, &paths.input).unwrap();

    let stats = extract_to_file(paths.input.to_str().unwrap(), &paths.output, &config)
        .await
        .expect("extract_to_file() should succeed");

    let back = read_output(&paths.output).await.unwrap();
    assert_eq!(back.items.len(), stats.item_count);
    assert_eq!(back.categories.len(), stats.category_count);
}
