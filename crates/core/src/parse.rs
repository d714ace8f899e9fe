//! Prompt-line parsing and request payload construction.
//!
//! A batch is authored as plain text, one prompt per line. Blank lines and
//! `#`-prefixed comment lines are skipped; surviving lines get 1-based
//! sequence numbers in input order.

use crate::error::CoreError;

/// Maximum accepted length of a single prompt, in characters.
pub const MAX_PROMPT_LEN: usize = 2000;

/// Lines starting with this character (after trimming) are comments.
const COMMENT_PREFIX: char = '#';

/// One accepted prompt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPrompt {
    /// 1-based position among accepted lines.
    pub sequence_number: u32,
    /// The trimmed prompt text.
    pub text: String,
}

/// Parse a multi-line prompt text into individual prompts.
///
/// Blank lines and comment lines are skipped and do not consume sequence
/// numbers. No per-prompt validation is performed here; see
/// [`validate_prompt`].
pub fn parse_prompt_lines(input: &str) -> Vec<ParsedPrompt> {
    let mut prompts = Vec::new();
    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
            continue;
        }
        prompts.push(ParsedPrompt {
            sequence_number: prompts.len() as u32 + 1,
            text: trimmed.to_string(),
        });
    }
    prompts
}

/// Validate a single prompt before submission.
///
/// Rules:
/// - Must not be empty (after trimming).
/// - Must not exceed [`MAX_PROMPT_LEN`] characters.
pub fn validate_prompt(text: &str) -> Result<(), CoreError> {
    if text.trim().is_empty() {
        return Err(CoreError::Validation("Prompt must not be empty".to_string()));
    }
    if text.chars().count() > MAX_PROMPT_LEN {
        return Err(CoreError::Validation(format!(
            "Prompt must not exceed {MAX_PROMPT_LEN} characters"
        )));
    }
    Ok(())
}

/// Build the provider-agnostic submission payload for a prompt.
pub fn request_payload(prompt: &str) -> serde_json::Value {
    serde_json::json!({ "prompt": prompt })
}

/// Extract the prompt string back out of a submission payload.
///
/// Returns `None` when the payload does not carry a `"prompt"` string,
/// which the pipeline treats as a validation failure.
pub fn payload_prompt(request: &serde_json::Value) -> Option<&str> {
    request.get("prompt").and_then(|v| v.as_str())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
