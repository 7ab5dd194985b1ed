//! Structured error types shared across blockrand crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`RandError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (stratum keys, subject identifiers, etc.).
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

/// Canonical error type for the randomization engine.
///
/// None of the families is fatal to the process: every error is scoped to a
/// single request and leaves the randomization state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum RandError {
    /// Invalid user input such as an empty subject identifier.
    #[error("validation error: {0}")]
    Validation(ErrorInfo),
    /// The stratum's pre-generated allocation capacity has been consumed.
    #[error("allocation exhausted: {0}")]
    Exhausted(ErrorInfo),
    /// The assignment log could not be read or appended to.
    #[error("persistence error: {0}")]
    Persistence(ErrorInfo),
    /// The trial design or session configuration is unusable.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Randomization state lifecycle violations.
    #[error("state error: {0}")]
    State(ErrorInfo),
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

impl RandError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            RandError::Validation(info)
            | RandError::Exhausted(info)
            | RandError::Persistence(info)
            | RandError::Config(info)
            | RandError::State(info) => info,
        }
    }

    /// Returns the stable machine readable code of the error.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Shorthand for a persistence failure wrapping a backend error.
    pub fn persistence(code: &str, err: impl ToString) -> Self {
        RandError::Persistence(ErrorInfo::new(code, err.to_string()))
    }
}
