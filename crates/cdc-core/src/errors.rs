//! Structured error types shared across CDC crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`CdcError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (identifiers, counts, paths).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

/// Canonical error type for the CDC simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum CdcError {
    /// Invalid system configuration.
    #[error("parameter error: {0}")]
    Parameters(ErrorInfo),
    /// API misuse: mutually exclusive arguments, zero sample counts, missing
    /// required columns. These are programmer errors and fail fast.
    #[error("usage error: {0}")]
    Usage(ErrorInfo),
    /// Result cache I/O failures other than a plain miss.
    #[error("cache error: {0}")]
    Cache(ErrorInfo),
    /// Solver or evaluator failures.
    #[error("evaluation error: {0}")]
    Evaluation(ErrorInfo),
    /// Invalid distribution parameters or degenerate sample sets.
    #[error("stats error: {0}")]
    Stats(ErrorInfo),
    /// Cooperative cancellation was requested.
    #[error("cancelled: {0}")]
    Cancelled(ErrorInfo),
}

impl CdcError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            CdcError::Parameters(info)
            | CdcError::Usage(info)
            | CdcError::Cache(info)
            | CdcError::Evaluation(info)
            | CdcError::Stats(info)
            | CdcError::Cancelled(info) => info,
        }
    }
}
