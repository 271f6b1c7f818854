use crate::validation::ValidationIssues;
use thiserror::Error;

/// Structured error context for diagnosing pipeline failures.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// Setting or field that caused the error (e.g., "batch_size", "BATCHPIPE_WORKERS")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected range, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "batcher", "worker_pool", "settings")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Unified error type for the batch pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message} ({} issue(s))", .issues.len())]
    Validation {
        message: String,
        issues: ValidationIssues,
    },

    #[error("Lifecycle error: {message}{}", format_context(.context))]
    Lifecycle {
        message: String,
        context: ErrorContext,
    },

    #[error("Runtime error: {message}{}", format_context(.context))]
    Runtime {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a new lifecycle error with structured context
    pub fn lifecycle_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Lifecycle {
            message: msg.into(),
            context,
        }
    }

    /// Create a new runtime error with structured context
    pub fn runtime_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Runtime {
            message: msg.into(),
            context,
        }
    }

    pub fn validation(msg: impl Into<String>, issues: ValidationIssues) -> Self {
        Error::Validation {
            message: msg.into(),
            issues,
        }
    }

    /// Get error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. }
            | Error::Lifecycle { context, .. }
            | Error::Runtime { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Validation issues carried by a validation error.
    pub fn issues(&self) -> Option<&ValidationIssues> {
        match self {
            Error::Validation { issues, .. } => Some(issues),
            _ => None,
        }
    }

    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Error::Lifecycle { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_formatting() {
        let err = Error::configuration_with_context(
            "invalid batch size",
            ErrorContext::new()
                .with_field_path("batch_size")
                .with_source("settings"),
        );
        let text = err.to_string();
        assert!(text.starts_with("Configuration error: invalid batch size"));
        assert!(text.contains("field: batch_size"));
        assert!(text.contains("source: settings"));
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("batch_size")
        );
    }

    #[test]
    fn test_empty_context_has_no_suffix() {
        let err = Error::lifecycle_with_context("not running", ErrorContext::new());
        assert_eq!(err.to_string(), "Lifecycle error: not running");
        assert!(err.is_lifecycle());
    }
}
