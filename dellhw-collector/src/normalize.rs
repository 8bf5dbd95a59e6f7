//! Token clean-up and value extraction for omreport fields.

use thiserror::Error;

/// Field separator of `omreport -fmt ssv` output.
pub const FIELD_SEPARATOR: char = ';';

/// Placeholder for runs of characters rejected by [`sanitize_identifier`].
const PLACEHOLDER: char = '_';

/// Errors produced while normalizing a field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    /// Sanitization left nothing of the input.
    #[error("identifier {input:?} is empty after sanitization")]
    EmptyResult { input: String },

    /// The field does not carry the expected unit suffix.
    #[error("value {input:?} does not end with {suffix:?}")]
    SuffixMismatch { input: String, suffix: String },

    /// The number in front of the suffix is malformed.
    #[error("value {input:?} is not a number: {reason}")]
    NumericParse { input: String, reason: String },
}

/// Join `fields` with a single space and collapse whitespace runs.
pub fn clean(fields: &[&str]) -> String {
    fields
        .iter()
        .flat_map(|f| f.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split one line of tool output into cleaned fields.
pub fn split_row(line: &str) -> Vec<String> {
    line.split(FIELD_SEPARATOR).map(|f| clean(&[f])).collect()
}

/// Keep letters, digits and `- _ . /`; every run of anything else becomes `_`.
///
/// Idempotent: an already sanitized identifier is returned unchanged.
pub fn sanitize_identifier(s: &str) -> Result<String, NormalizeError> {
    let mut result = String::with_capacity(s.len());
    let mut replaced = false;

    for c in s.chars() {
        if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '/') {
            result.push(c);
            replaced = false;
        } else if !replaced {
            result.push(PLACEHOLDER);
            replaced = true;
        }
    }

    // Placeholders alone mean the input had no usable character at all.
    let only_placeholders =
        result.chars().all(|c| c == PLACEHOLDER) && !s.contains(PLACEHOLDER);
    if result.is_empty() || only_placeholders {
        return Err(NormalizeError::EmptyResult {
            input: s.to_string(),
        });
    }

    Ok(result)
}

/// Storage instance id: `:` replaced by `_` (e.g. `0:0:1` -> `0_0_1`).
pub fn instance_id(s: &str) -> String {
    s.replace(':', "_")
}

/// Collapse a vendor status to `0` (healthy) or `1` (anything else).
///
/// Only `Ok` and `Non-Critical` count as healthy; `Critical`,
/// `Non-Recoverable` and `Unknown` all map to `1`.
pub fn severity(s: &str) -> i32 {
    match s {
        "Ok" | "Non-Critical" => 0,
        _ => 1,
    }
}

/// Parse the number in front of `suffix`, e.g. `"2400 RPM"` with `"RPM"`.
pub fn extract_number_with_suffix(s: &str, suffix: &str) -> Result<f64, NormalizeError> {
    let number = s
        .strip_suffix(suffix)
        .ok_or_else(|| NormalizeError::SuffixMismatch {
            input: s.to_string(),
            suffix: suffix.to_string(),
        })?;

    number
        .trim()
        .parse::<f64>()
        .map_err(|e| NormalizeError::NumericParse {
            input: s.to_string(),
            reason: e.to_string(),
        })
}
