//! Turns raw model text into typed values: strip wrapping, repair near-valid
//! JSON, then deserialize and validate.

use llm_json::RepairOptions;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use validator::Validate;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\n?(.*?)(?:```|\z)")
        .expect("FENCED_BLOCK is a valid regex pattern")
});

#[derive(Debug, Error)]
pub enum OutputParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schema validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Cuts the JSON value out of a completion.
///
/// A fenced block wins over surrounding prose. Inside the chosen text every
/// `{`/`[` is a candidate start, and the first one whose slice up to the last
/// closing bracket parses as-is is taken. With no clean candidate, the
/// earliest start is kept so repair gets a chance at it.
pub fn normalize(raw: &str) -> String {
    let fenced = FENCED_BLOCK
        .captures_iter(raw)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .find(|block| block.contains(['{', '[']));
    let text = fenced.unwrap_or_else(|| raw.trim());

    let candidates: Vec<&str> = text
        .match_indices(['{', '['])
        .map(|(start, _)| match text.rfind(['}', ']']) {
            Some(end) if end > start => &text[start..=end],
            _ => &text[start..],
        })
        .collect();

    candidates
        .iter()
        .find(|slice| is_json(slice))
        .or(candidates.first())
        .map(|slice| slice.to_string())
        .unwrap_or_else(|| text.to_string())
}

/// Best-effort repair of near-valid JSON. Never fails: valid input and input
/// that cannot be repaired are both returned unchanged.
///
/// The cheap sanitizer (trailing commas, unclosed brackets and strings) runs
/// first; anything it cannot fix goes through the full `json_repair` port,
/// which also handles unquoted keys, single or smart quotes, comments and
/// missing separators.
pub fn repair_json(input: &str) -> String {
    if is_json(input) {
        return input.to_string();
    }

    let sanitized: String = fuzzy_parser::sanitize_json(input).into();
    if is_json(&sanitized) {
        log::debug!("Sanitized model output into valid JSON");
        return sanitized;
    }

    match llm_json::repair_json(input, &RepairOptions::default()) {
        Ok(repaired) if is_json(&repaired) => {
            log::debug!("Repaired model output into valid JSON");
            repaired
        }
        Ok(_) => input.to_string(),
        Err(e) => {
            log::debug!("JSON repair gave up: {}", e);
            input.to_string()
        }
    }
}

fn is_json(text: &str) -> bool {
    serde_json::from_str::<Value>(text).is_ok()
}

/// Full parsing chain used on every completion.
pub fn parse_structured<T>(raw: &str) -> Result<T, OutputParseError>
where
    T: DeserializeOwned + Validate,
{
    let repaired = repair_json(&normalize(raw));
    let value: T = serde_json::from_str(&repaired)?;
    value.validate()?;
    Ok(value)
}
