//! Model interaction: send the extraction request, return the raw reply text.
//!
//! The pipeline talks to the model only through [`InferenceClient`], so tests
//! can drive every later stage with a canned reply. [`LlmClient`] is the
//! production implementation on top of an edgequake-llm provider.
//!
//! There is exactly one call per run and no retry: the request carries every
//! page, so a retry would resend the whole document. Transport errors surface
//! as [`ExtractError::InferenceFailed`].

use crate::config::{credential_var_for, ExtractionConfig};
use crate::error::ExtractError;
use crate::pipeline::request::ExtractionRequest;
use edgequake_llm::{
    AnthropicProvider, CompletionOptions, GeminiProvider, LLMProvider, OpenAIProvider,
    OpenRouterProvider, ProviderFactory, ProviderType,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Something that can answer an [`ExtractionRequest`] with text.
pub trait InferenceClient: Send + Sync {
    /// Send the request once and return the model's reply verbatim.
    fn infer(
        &self,
        request: &ExtractionRequest,
    ) -> impl Future<Output = Result<String, ExtractError>> + Send;
}

/// [`InferenceClient`] backed by an `edgequake_llm` provider.
#[derive(Clone)]
pub struct LlmClient {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("provider", &"<dyn LLMProvider>")
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl LlmClient {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
        }
    }

    /// Wrap `provider` with the decoding settings from `config`.
    pub fn from_config(provider: Arc<dyn LLMProvider>, config: &ExtractionConfig) -> Self {
        Self::new(provider, config.temperature, config.max_tokens)
    }

    fn options(&self) -> CompletionOptions {
        build_options(self.temperature, self.max_tokens)
    }
}

impl InferenceClient for LlmClient {
    async fn infer(&self, request: &ExtractionRequest) -> Result<String, ExtractError> {
        let start = Instant::now();
        let messages = request.to_messages();
        let options = self.options();

        info!(
            "Sending {} page images ({} base64 bytes) to the model",
            request.images.len(),
            request.payload_bytes()
        );

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| ExtractError::InferenceFailed {
                message: e.to_string(),
            })?;

        debug!(
            "{} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        Ok(response.content)
    }
}

/// Completion options for the single extraction call.
fn build_options(temperature: f32, max_tokens: usize) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(temperature),
        max_tokens: Some(max_tokens),
        ..Default::default()
    }
}

/// Build the production client for `config`.
///
/// A pre-built `config.provider` is used as-is. Keyed providers (see
/// [`credential_var_for`]) are constructed from `config.credential`, which
/// must be present and non-blank; it is checked here, before any PDF work or
/// network I/O. Every other provider is created by name through
/// `ProviderFactory`.
pub fn resolve_client(config: &ExtractionConfig) -> Result<LlmClient, ExtractError> {
    if let Some(ref provider) = config.provider {
        return Ok(LlmClient::from_config(Arc::clone(provider), config));
    }

    let provider = match credential_var_for(&config.provider_name) {
        Some(var) => {
            let key = config
                .credential
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .ok_or_else(|| ExtractError::MissingCredential { var: var.into() })?;
            keyed_provider(&config.provider_name, key, &config.model)?
        }
        None => ProviderFactory::create_llm_provider(&config.provider_name, &config.model)
            .map_err(|e| ExtractError::ProviderNotConfigured {
                provider: config.provider_name.clone(),
                hint: e.to_string(),
            })?,
    };
    debug!(
        provider = %config.provider_name,
        model = %provider.model(),
        "Created LLM provider"
    );

    Ok(LlmClient::from_config(provider, config))
}

/// Construct a hosted provider from an explicit API key.
fn keyed_provider(
    provider_name: &str,
    key: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ExtractError> {
    let provider: Arc<dyn LLMProvider> = match ProviderType::from_str(provider_name) {
        Some(ProviderType::OpenAI) => Arc::new(OpenAIProvider::new(key).with_model(model)),
        Some(ProviderType::Anthropic) => Arc::new(AnthropicProvider::new(key).with_model(model)),
        Some(ProviderType::Gemini) => Arc::new(GeminiProvider::new(key).with_model(model)),
        Some(ProviderType::OpenRouter) => {
            Arc::new(OpenRouterProvider::new(key).with_model(model))
        }
        _ => {
            return Err(ExtractError::ProviderNotConfigured {
                provider: provider_name.to_string(),
                hint: "this provider does not take an explicit API key".into(),
            })
        }
    };
    Ok(provider)
}
