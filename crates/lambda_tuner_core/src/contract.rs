use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_ARCHITECTURE_LABEL: &str = "x86_64";
pub const ARM64_ARCHITECTURE_LABEL: &str = "arm64";
pub const MIN_ARN_FIELDS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Fully qualified function ARN, e.g.
/// `arn:aws:lambda:eu-west-1:123456789012:function:checkout`.
///
/// The region is the fourth colon-separated field. Construction fails for
/// anything that does not carry one, so no remote call is ever attempted
/// against a malformed identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FunctionIdentity {
    arn: String,
}

impl FunctionIdentity {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let arn = raw.trim();
        if arn.is_empty() {
            return Err(ValidationError::new("Lambda ARN cannot be empty"));
        }

        let fields: Vec<&str> = arn.split(':').collect();
        if fields.len() < MIN_ARN_FIELDS {
            return Err(ValidationError::new(format!(
                "Invalid Lambda ARN format: expected at least {MIN_ARN_FIELDS} colon-separated fields, got {}",
                fields.len()
            )));
        }

        if fields[3].trim().is_empty() {
            return Err(ValidationError::new(
                "Invalid Lambda ARN format: region field is empty",
            ));
        }

        Ok(Self {
            arn: arn.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.arn
    }

    pub fn region(&self) -> &str {
        // parse() guarantees at least four fields
        self.arn.split(':').nth(3).unwrap_or_default()
    }
}

impl fmt::Display for FunctionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.arn)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Architecture {
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "arm64")]
    Arm64,
}

impl Architecture {
    /// Any label other than `arm64` maps to x86_64. This is the documented
    /// default policy, not an error path.
    pub fn from_label(label: &str) -> Self {
        if label.trim() == ARM64_ARCHITECTURE_LABEL {
            Self::Arm64
        } else {
            Self::X86_64
        }
    }

    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        if labels
            .iter()
            .any(|label| Self::from_label(label.as_ref()) == Self::Arm64)
        {
            Self::Arm64
        } else {
            Self::X86_64
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => DEFAULT_ARCHITECTURE_LABEL,
            Self::Arm64 => ARM64_ARCHITECTURE_LABEL,
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateStatus {
    InProgress,
    Successful,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionConfiguration {
    pub memory_size: u32,
    pub architectures: Vec<String>,
    pub last_update_status: UpdateStatus,
}

impl FunctionConfiguration {
    /// Builds a configuration as reported by the platform. An empty
    /// architecture list is reported as `["x86_64"]`.
    pub fn new(memory_size: u32, architectures: Vec<String>) -> Result<Self, ValidationError> {
        if memory_size == 0 {
            return Err(ValidationError::new(
                "memory_size must be a positive integer",
            ));
        }

        let mut architectures: Vec<String> = architectures
            .into_iter()
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .collect();
        if architectures.is_empty() {
            architectures.push(DEFAULT_ARCHITECTURE_LABEL.to_string());
        }

        Ok(Self {
            memory_size,
            architectures,
            last_update_status: UpdateStatus::Successful,
        })
    }

    pub fn with_update_status(mut self, status: UpdateStatus) -> Self {
        self.last_update_status = status;
        self
    }

    pub fn architecture(&self) -> Architecture {
        Architecture::from_labels(&self.architectures)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationOutcome {
    pub log_result: String,
    pub payload: Vec<u8>,
    pub function_error: Option<String>,
}

/// One measured candidate.
///
/// `cost` is always `duration_ms * price_per_ms`; the fields are private so
/// that relation cannot be broken after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
    memory_size: u32,
    duration_ms: f64,
    cost: f64,
    price_per_ms: f64,
    raw_log: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    extraction_error: Option<String>,
}

impl SweepResult {
    pub fn measured(
        memory_size: u32,
        duration_ms: f64,
        price_per_ms: f64,
        raw_log: impl Into<String>,
    ) -> Self {
        Self {
            memory_size,
            duration_ms,
            cost: duration_ms * price_per_ms,
            price_per_ms,
            raw_log: raw_log.into(),
            extraction_error: None,
        }
    }

    /// Zero-metric record kept for diagnostics when the duration could not
    /// be extracted from the execution report.
    pub fn degraded(
        memory_size: u32,
        price_per_ms: f64,
        raw_log: impl Into<String>,
        extraction_error: impl Into<String>,
    ) -> Self {
        Self {
            memory_size,
            duration_ms: 0.0,
            cost: 0.0,
            price_per_ms,
            raw_log: raw_log.into(),
            extraction_error: Some(extraction_error.into()),
        }
    }

    pub fn memory_size(&self) -> u32 {
        self.memory_size
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn price_per_ms(&self) -> f64 {
        self.price_per_ms
    }

    pub fn raw_log(&self) -> &str {
        &self.raw_log
    }

    pub fn extraction_error(&self) -> Option<&str> {
        self.extraction_error.as_deref()
    }

    pub fn is_degraded(&self) -> bool {
        self.extraction_error.is_some()
    }
}

/// Checks that an optional invocation payload is well-formed JSON and
/// returns the bytes to send. Blank input means "no payload".
pub fn normalize_payload(raw: Option<&str>) -> Result<Option<Vec<u8>>, ValidationError> {
    let Some(text) = raw else {
        return Ok(None);
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    serde_json::from_str::<Value>(trimmed)
        .map_err(|error| ValidationError::new(format!("Invalid JSON payload: {error}")))?;
    Ok(Some(trimmed.as_bytes().to_vec()))
}
