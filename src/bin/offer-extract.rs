//! CLI binary for offer-extract.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, prints status lines, and turns any failure into
//! `ERROR: …` plus exit code 1.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use offer_extract::config::credential_var_for;
use offer_extract::pipeline::categorize;
use offer_extract::{
    extract_to_file, read_output, ExtractError, ExtractionConfig, ExtractionProgressCallback,
    ProgressCallback, WorkspacePaths,
};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback ────────────────────────────────────────────────────

/// Prints one status line per pipeline stage to stdout, with a spinner while
/// the model call is in flight.
struct CliProgress {
    spinner_enabled: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    fn new(spinner_enabled: bool) -> Arc<Self> {
        Arc::new(Self {
            spinner_enabled,
            spinner: Mutex::new(None),
        })
    }

    fn stop_spinner(&self) {
        if let Some(bar) = self.spinner.lock().ok().and_then(|mut s| s.take()) {
            bar.finish_and_clear();
        }
    }
}

impl ExtractionProgressCallback for CliProgress {
    fn on_pdf_opened(&self, total_pages: usize, pages_to_process: usize) {
        println!("{} PDF opened: {} pages", cyan("◆"), bold(&total_pages.to_string()));
        if pages_to_process < total_pages {
            println!(
                "  {}",
                dim(&format!("converting the first {pages_to_process} pages only"))
            );
        }
        println!("Converting PDF pages to images...");
    }

    fn on_page_converted(&self, page_num: usize, total: usize) {
        println!("  {} Page {:>2}/{}", green("✓"), page_num, total);
    }

    fn on_request_sent(&self, image_count: usize) {
        println!("Converted {image_count} pages to images");
        println!("Calling the vision model with {image_count} images...");

        if self.spinner_enabled {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg}  ⏱ {elapsed}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
            );
            bar.set_message("waiting for the model");
            bar.enable_steady_tick(Duration::from_millis(80));
            if let Ok(mut slot) = self.spinner.lock() {
                *slot = Some(bar);
            }
        }
    }

    fn on_response_received(&self, chars: usize) {
        self.stop_spinner();
        println!("Received response {}", dim(&format!("({chars} chars)")));
    }

    fn on_extraction_parsed(&self, items: usize, sections: usize, images: usize) {
        println!(
            "Extracted {} items, {} technical sections, {} images",
            bold(&items.to_string()),
            sections,
            images
        );
    }

    fn on_categories(&self, breakdown: &[(String, usize)]) {
        print_breakdown(breakdown);
    }

    fn on_saved(&self, path: &Path) {
        println!("{} Saved to {}", green("✔"), bold(&path.display().to_string()));
    }
}

fn print_breakdown(breakdown: &[(String, usize)]) {
    println!("Categories:");
    for (name, count) in breakdown {
        println!("  {:<32} {:>4} items", name, count);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Default layout: ./uploads/offer1.pdf → ./outputs/items_offer1.json
  offer-extract

  # Another working directory
  offer-extract --workdir /srv/requote

  # Explicit paths, larger page budget
  offer-extract --input quote.pdf --output items.json --max-pages 20

  # From a URL
  offer-extract --input https://example.com/offers/Q-2024-118.pdf

  # Show the category breakdown of an existing output without calling the model
  offer-extract --summary-only

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY            API key for --provider openai (the default)
  ANTHROPIC_API_KEY         API key for --provider anthropic
  GEMINI_API_KEY            API key for --provider gemini
  OPENROUTER_API_KEY        API key for --provider openrouter
  OLLAMA_HOST               Server for --provider ollama (no key needed)
  PDFIUM_LIB_PATH           Path to libpdfium; otherwise the executable's
                            directory, the current directory and the system
                            library path are searched
  RUST_LOG                  Override the log filter (logs go to stderr)
"#;

/// Extract line items from a supplier quotation PDF with one vision-model call.
#[derive(Parser, Debug)]
#[command(
    name = "offer-extract",
    version,
    about = "Extract line items from a supplier quotation PDF with a vision LLM",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Working directory holding uploads/ and outputs/.
    #[arg(long, env = "OFFER_EXTRACT_WORKDIR", default_value = ".")]
    workdir: PathBuf,

    /// PDF path or HTTP/HTTPS URL. Default: <workdir>/uploads/offer1.pdf.
    #[arg(short, long, env = "OFFER_EXTRACT_INPUT")]
    input: Option<String>,

    /// Output JSON path. Default: <workdir>/outputs/items_offer1.json.
    #[arg(short, long, env = "OFFER_EXTRACT_OUTPUT")]
    output: Option<PathBuf>,

    /// Vision model ID.
    #[arg(long, env = "OFFER_EXTRACT_MODEL", default_value = offer_extract::config::DEFAULT_MODEL)]
    model: String,

    /// LLM provider: openai, anthropic, gemini, openrouter, azure, ollama, lmstudio.
    #[arg(long, env = "OFFER_EXTRACT_PROVIDER", default_value = offer_extract::config::DEFAULT_PROVIDER)]
    provider: String,

    /// Maximum pages sent to the model.
    #[arg(long, env = "OFFER_EXTRACT_MAX_PAGES", default_value_t = offer_extract::config::MAX_PAGES)]
    max_pages: usize,

    /// Rendering magnification (1.0 = 72 DPI).
    #[arg(long, env = "OFFER_EXTRACT_SCALE", default_value_t = offer_extract::config::DEFAULT_RENDER_SCALE)]
    scale: f32,

    /// Max output tokens for the reply.
    #[arg(long, env = "OFFER_EXTRACT_MAX_TOKENS", default_value_t = offer_extract::config::DEFAULT_MAX_TOKENS)]
    max_tokens: usize,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "OFFER_EXTRACT_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "OFFER_EXTRACT_PASSWORD")]
    password: Option<String>,

    /// Text file replacing the built-in extraction instructions.
    #[arg(long, env = "OFFER_EXTRACT_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// Value written as `extraction_method`.
    #[arg(long, env = "OFFER_EXTRACT_METHOD_TAG", default_value = offer_extract::config::EXTRACTION_METHOD)]
    method_tag: String,

    /// Print the category breakdown of the existing output file and exit.
    #[arg(long)]
    summary_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "OFFER_EXTRACT_VERBOSE")]
    verbose: bool,

    /// Suppress status lines; only errors are printed.
    #[arg(short, long, env = "OFFER_EXTRACT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let defaults = WorkspacePaths::from_workdir(&cli.workdir);
    let output_path = cli.output.clone().unwrap_or(defaults.output);

    if cli.summary_only {
        let output = read_output(&output_path)
            .await
            .with_context(|| format!("Failed to read {}", output_path.display()))?;
        println!(
            "{}: {} items, {} technical sections, {} images",
            bold(&output_path.display().to_string()),
            output.items.len(),
            output.technical_sections.len(),
            output.images.len()
        );
        print_breakdown(&categorize::breakdown(&output.items));
        return Ok(());
    }

    let input = cli
        .input
        .clone()
        .unwrap_or_else(|| defaults.input.to_string_lossy().into_owned());

    let progress: Option<ProgressCallback> = if cli.quiet {
        None
    } else {
        let cb = CliProgress::new(io::stdout().is_terminal());
        Some(cb as Arc<dyn ExtractionProgressCallback>)
    };
    let config = build_config(cli, progress).await?;

    if !cli.quiet {
        println!("Reading PDF: {input}");
    }

    let stats = extract_to_file(&input, &output_path, &config)
        .await
        .context("Extraction failed")?;

    if !cli.quiet {
        if stats.was_truncated() {
            println!(
                "{} Only {} of {} pages were sent to the model",
                cyan("⚠"),
                stats.processed_pages,
                stats.total_pages
            );
        }
        println!(
            "{}  {} items in {} categories  {}",
            green("✔"),
            stats.item_count,
            stats.category_count,
            dim(&format!(
                "render {}ms · model {}ms · total {}ms",
                stats.render_duration_ms, stats.inference_duration_ms, stats.total_duration_ms
            )),
        );
        println!("COMPLETED");
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .model(&cli.model)
        .provider_name(&cli.provider)
        .max_pages(cli.max_pages)
        .render_scale(cli.scale)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .extraction_method(&cli.method_tag);

    // Keyed providers get their key here, read once at startup.
    if let Some(var) = credential_var_for(&cli.provider) {
        if let Ok(key) = std::env::var(var) {
            builder = builder.credential(key);
        }
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(ref path) = cli.prompt_file {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {}", path.display()))?;
        builder = builder.instructions(text);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Print `ERROR: …` and the full cause chain to stdout.
fn report_error(e: &anyhow::Error) {
    match e.downcast_ref::<ExtractError>() {
        Some(ExtractError::FileNotFound { path }) => {
            println!("{}", red(&format!("ERROR: PDF not found at {}", path.display())));
        }
        Some(inner) => println!("{}", red(&format!("ERROR: {inner}"))),
        None => println!("{}", red(&format!("ERROR: {e}"))),
    }
    println!("{}", dim(&format!("{e:?}")));
}
