//! Recovery of a JSON object from free-form model output
//!
//! Models wrap otherwise valid JSON in markdown fences or prose. The parser
//! takes the interior of the first fence (preferring a ```json fence), then
//! slices from the first `{` to the last `}` and parses that.

use serde_json::Value;
use thiserror::Error;

/// Model output that could not be turned into a record
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("no balanced JSON object delimiters in model output")]
    Unbalanced,

    #[error("model output is not valid JSON: {0}")]
    Invalid(#[source] serde_json::Error),

    #[error("model output does not match the record schema: {0}")]
    Schema(#[source] serde_json::Error),
}

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Parse the outermost JSON object found in `raw`.
pub fn parse(raw: &str) -> Result<Value, FormatError> {
    let candidate = object_slice(strip_fences(raw)).ok_or(FormatError::Unbalanced)?;
    serde_json::from_str(candidate).map_err(FormatError::Invalid)
}

/// Interior of the first fenced block, or the whole text when there is none.
fn strip_fences(raw: &str) -> &str {
    let interior = if let Some(start) = raw.find(JSON_FENCE) {
        &raw[start + JSON_FENCE.len()..]
    } else if let Some(start) = raw.find(FENCE) {
        &raw[start + FENCE.len()..]
    } else {
        return raw.trim();
    };

    match interior.find(FENCE) {
        Some(end) => interior[..end].trim(),
        None => interior.trim(),
    }
}

fn object_slice(text: &str) -> Option<&str> {
    let first = text.find('{')?;
    let last = text.rfind('}')?;
    if last < first {
        return None;
    }
    Some(&text[first..=last])
}
