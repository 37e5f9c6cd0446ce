//! Response normalisation: model reply text → [`ExtractionRecord`].
//!
//! Models asked for "JSON only" still wrap the answer in a Markdown code
//! fence often enough that the fence has to be removed before parsing. After
//! that the reply is strict JSON: no repair, no partial recovery. A reply
//! that parses but carries no line items is rejected, since writing an empty
//! quotation would look like success downstream.

use crate::error::ExtractError;
use crate::model::{ExtractionRecord, LineItem};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

static RE_JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A```(?i:json)[ \t]*\r?\n?(.*?)\s*(?:```)?\s*\z").unwrap());

static RE_BARE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A```[ \t]*\r?\n?(.*?)\s*(?:```)?\s*\z").unwrap());

/// Remove a surrounding Markdown code fence.
///
/// A ```` ```json ```` opener (any case) is tried before a bare ```` ``` ````
/// opener; the closing fence is optional. The result is trimmed and
/// otherwise untouched.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    for re in [&*RE_JSON_FENCE, &*RE_BARE_FENCE] {
        if let Some(body) = re.captures(trimmed).and_then(|caps| caps.get(1)) {
            return body.as_str().trim();
        }
    }
    trimmed
}

/// Parse the reply into an [`ExtractionRecord`].
///
/// A top-level array is accepted as the item list.
pub fn parse_response(raw: &str) -> Result<ExtractionRecord, ExtractError> {
    let text = strip_code_fences(raw);
    let value: Value =
        serde_json::from_str(text).map_err(|e| ExtractError::malformed(e.to_string(), text))?;

    match value {
        Value::Object(_) => serde_json::from_value(value)
            .map_err(|e| ExtractError::malformed(format!("unexpected shape: {e}"), text)),
        Value::Array(_) => {
            warn!("Model returned a bare JSON array; reading it as the item list");
            let items: Vec<LineItem> = serde_json::from_value(value)
                .map_err(|e| ExtractError::malformed(format!("unexpected item shape: {e}"), text))?;
            Ok(ExtractionRecord {
                items,
                ..Default::default()
            })
        }
        other => Err(ExtractError::malformed(
            format!("expected a JSON object, got {}", json_kind(&other)),
            text,
        )),
    }
}

/// Parse the reply and require at least one line item.
pub fn normalize_response(raw: &str) -> Result<ExtractionRecord, ExtractError> {
    let record = parse_response(raw)?;
    debug!(
        "Parsed reply: {} items, {} sections, {} images, {} metadata keys",
        record.items.len(),
        record.technical_sections.len(),
        record.images.len(),
        record.document_metadata.len()
    );
    if record.items.is_empty() {
        return Err(ExtractError::EmptyExtraction);
    }
    Ok(record)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
