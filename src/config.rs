//! Configuration types for quotation extraction.
//!
//! Every knob lives in [`ExtractionConfig`], built via
//! [`ExtractionConfigBuilder`]. The credential is part of the config rather
//! than read from the environment by the pipeline: the binary reads the
//! provider's key variable once at startup, and tests can build configs with
//! or without one.

use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use edgequake_llm::{LLMProvider, ProviderType};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Maximum number of pages sent to the model.
pub const MAX_PAGES: usize = 15;

/// Rasterisation magnification in both axes (1.0 = 72 DPI).
pub const DEFAULT_RENDER_SCALE: f32 = 1.5;

/// Vision model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// edgequake-llm provider name used when none is configured.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Environment variable holding the key for [`DEFAULT_PROVIDER`].
pub const DEFAULT_CREDENTIAL_VAR: &str = "OPENAI_API_KEY";

/// Output token cap for the single reply.
pub const DEFAULT_MAX_TOKENS: usize = 8000;

/// Tag written as `extraction_method` in the output file.
pub const EXTRACTION_METHOD: &str = "direct_vision_single_pass";

/// Category given to items the model left uncategorised.
pub const FALLBACK_CATEGORY: &str = "Main Items";

/// Configuration for one extraction run.
///
/// # Example
/// ```rust
/// use offer_extract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .max_pages(10)
///     .model("gpt-4o")
///     .credential("sk-test")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_pages, 10);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Pages beyond this are not rendered. Default: 15.
    pub max_pages: usize,

    /// Page magnification for rendering. Default: 1.5.
    ///
    /// 1.5× (108 DPI) keeps 15 A4 pages inside a single request while table
    /// digits stay readable.
    pub render_scale: f32,

    /// Model identifier. Default: `gpt-4o`.
    pub model: String,

    /// Provider name for `ProviderFactory`. Default: `openai`.
    pub provider_name: String,

    /// Pre-constructed provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// API key passed to the provider. Required for keyed providers (see
    /// [`credential_var_for`]) unless `provider` is set.
    pub credential: Option<String>,

    /// Sampling temperature. Default: 0.0 (deterministic decoding).
    pub temperature: f32,

    /// Output token cap for the single reply. Default: 8000.
    ///
    /// A 15-page quotation with full technical descriptions routinely needs
    /// 5–7k output tokens; a truncated reply is unparseable JSON.
    pub max_tokens: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Replacement for the built-in extraction instructions.
    pub instructions: Option<String>,

    /// Value of `extraction_method` in the output. Default: [`EXTRACTION_METHOD`].
    pub extraction_method: String,

    /// Label for items without a category. Default: [`FALLBACK_CATEGORY`].
    pub fallback_category: String,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Stage-transition events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_pages: MAX_PAGES,
            render_scale: DEFAULT_RENDER_SCALE,
            model: DEFAULT_MODEL.to_string(),
            provider_name: DEFAULT_PROVIDER.to_string(),
            provider: None,
            credential: None,
            temperature: 0.0,
            max_tokens: DEFAULT_MAX_TOKENS,
            password: None,
            instructions: None,
            extraction_method: EXTRACTION_METHOD.to_string(),
            fallback_category: FALLBACK_CATEGORY.to_string(),
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("max_pages", &self.max_pages)
            .field("render_scale", &self.render_scale)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("instructions", &self.instructions.as_ref().map(|s| s.len()))
            .field("extraction_method", &self.extraction_method)
            .field("fallback_category", &self.fallback_category)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Environment variable conventionally holding the key for the
    /// configured provider, or `None` when no key is passed explicitly.
    pub fn credential_var(&self) -> Option<&'static str> {
        credential_var_for(&self.provider_name)
    }

    /// The instruction text sent with the page images.
    pub fn instructions(&self) -> &str {
        self.instructions
            .as_deref()
            .unwrap_or(crate::prompts::EXTRACTION_PROMPT)
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n;
        self
    }

    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale.clamp(0.25, 4.0);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn credential(mut self, key: impl Into<String>) -> Self {
        self.config.credential = Some(key.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn instructions(mut self, text: impl Into<String>) -> Self {
        self.config.instructions = Some(text.into());
        self
    }

    pub fn extraction_method(mut self, tag: impl Into<String>) -> Self {
        self.config.extraction_method = tag.into();
        self
    }

    pub fn fallback_category(mut self, label: impl Into<String>) -> Self {
        self.config.fallback_category = label.into();
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.max_pages == 0 {
            return Err(ExtractError::InvalidConfig("max_pages must be ≥ 1".into()));
        }
        if c.max_tokens == 0 {
            return Err(ExtractError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.model.trim().is_empty() {
            return Err(ExtractError::InvalidConfig("model must not be empty".into()));
        }
        if c.fallback_category.trim().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "fallback category must not be empty".into(),
            ));
        }
        if c.instructions.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(ExtractError::InvalidConfig(
                "custom instructions must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Key variable for providers that are built from an explicit credential.
///
/// Local providers (`ollama`, `lmstudio`, `mock`, `vscode`) need no key, and
/// the remaining hosted ones read their own variables inside edgequake-llm;
/// both return `None`.
pub fn credential_var_for(provider_name: &str) -> Option<&'static str> {
    match ProviderType::from_str(provider_name)? {
        ProviderType::OpenAI => Some(DEFAULT_CREDENTIAL_VAR),
        ProviderType::Anthropic => Some("ANTHROPIC_API_KEY"),
        ProviderType::Gemini => Some("GEMINI_API_KEY"),
        ProviderType::OpenRouter => Some("OPENROUTER_API_KEY"),
        _ => None,
    }
}

// ── Workspace paths ──────────────────────────────────────────────────────

/// Default input and output locations under a working directory:
/// `<workdir>/uploads/offer1.pdf` → `<workdir>/outputs/items_offer1.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl WorkspacePaths {
    pub const UPLOADS_DIR: &'static str = "uploads";
    pub const OUTPUTS_DIR: &'static str = "outputs";
    pub const INPUT_FILE: &'static str = "offer1.pdf";
    pub const OUTPUT_FILE: &'static str = "items_offer1.json";

    pub fn from_workdir(workdir: impl AsRef<Path>) -> Self {
        let dir = workdir.as_ref();
        Self {
            input: dir.join(Self::UPLOADS_DIR).join(Self::INPUT_FILE),
            output: dir.join(Self::OUTPUTS_DIR).join(Self::OUTPUT_FILE),
        }
    }
}
