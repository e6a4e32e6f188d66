//! Duration extraction from Lambda tail logs.
//!
//! A tail log is the base64-encoded end of the invocation's log stream. The
//! platform report line looks like:
//!
//! ```text
//! REPORT RequestId: 3f0c… Duration: 12.34 ms  Billed Duration: 13 ms  Memory Size: 128 MB …
//! ```

use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("no log result available")]
    EmptyInput,
    #[error("failed to decode log result: {0}")]
    DecodeError(String),
    #[error("duration not found in logs")]
    PatternNotFound,
    #[error("failed to parse duration {value:?}: {message}")]
    NumericParseError { value: String, message: String },
}

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"Duration:\s+(\d+(?:\.\d*)?|\.\d+)\s+ms")
            .expect("duration pattern is a valid regex")
    })
}

/// Returns the first `Duration: <n> ms` value of a base64 tail log, in
/// milliseconds, unrounded.
pub fn extract_duration_ms(log_result: &str) -> Result<f64, ExtractError> {
    if log_result.is_empty() {
        return Err(ExtractError::EmptyInput);
    }

    let decoded = STANDARD
        .decode(log_result.trim())
        .map_err(|error| ExtractError::DecodeError(error.to_string()))?;
    let text = String::from_utf8_lossy(&decoded);

    find_duration_ms(&text)
}

/// Same as [`extract_duration_ms`] for an already decoded report.
pub fn find_duration_ms(report: &str) -> Result<f64, ExtractError> {
    let captures = duration_pattern()
        .captures(report)
        .ok_or(ExtractError::PatternNotFound)?;
    let value = captures
        .get(1)
        .map(|matched| matched.as_str())
        .ok_or(ExtractError::PatternNotFound)?;

    value
        .parse::<f64>()
        .map_err(|error| ExtractError::NumericParseError {
            value: value.to_string(),
            message: error.to_string(),
        })
}
