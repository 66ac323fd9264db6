//! Error types for estatedash-core
//!
//! Provides an error hierarchy with thiserror for graceful degradation: a
//! failed collection becomes a [`LoadError`] in the batch's [`LoadReport`],
//! only a failed batch surfaces as a [`CoreError`].

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for estatedash operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // HTTP Errors
    // ===================
    #[error("Request for {collection} failed")]
    Http {
        collection: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request for {collection} returned HTTP {status}")]
    HttpStatus { collection: String, status: u16 },

    #[error("Invalid API URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    // ===================
    // Decode Errors
    // ===================
    #[error("Failed to decode {collection} response: {message}")]
    Decode {
        collection: String,
        message: String,
        #[source]
        source: reqwest::Error,
    },

    // ===================
    // Batch Errors
    // ===================
    #[error("Report fetch timed out after {timeout_secs}s")]
    BatchTimeout { timeout_secs: u64 },

    #[error("Report fetch failed: {message}")]
    BatchFailed { message: String },

    // ===================
    // IO Errors
    // ===================
    #[error("Failed to write file: {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ===================
    // Config Errors
    // ===================
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Severity level for errors during load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Non-critical, the report renders with less data
    Warning,
    /// Needs user action (credentials), every later batch will fail the same way
    Error,
}

impl ErrorSeverity {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorSeverity::Warning => "warning",
            ErrorSeverity::Error => "error",
        }
    }
}

/// Individual error entry in load report
#[derive(Debug, Clone)]
pub struct LoadError {
    pub source: String,
    pub message: String,
    pub severity: ErrorSeverity,
    /// Actionable suggestion for user (optional)
    pub suggestion: Option<String>,
}

impl LoadError {
    pub fn warning(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
            severity: ErrorSeverity::Warning,
            suggestion: None,
        }
    }

    /// Add an actionable suggestion to this error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Create an entry from a CoreError with context-aware suggestions.
    ///
    /// Collection failures never abort a batch. Rejected credentials are
    /// reported as errors, everything else as warnings.
    pub fn from_core_error(source: impl Into<String>, error: &CoreError) -> Self {
        let source = source.into();
        let mut severity = ErrorSeverity::Warning;
        let (message, suggestion) = match error {
            CoreError::HttpStatus { status: 401 | 403, collection } => {
                severity = ErrorSeverity::Error;
                (
                    format!("Not authorized to read {}", collection),
                    Some("Check the API token (--token or ESTATEDASH_TOKEN)".to_string()),
                )
            }
            CoreError::HttpStatus { status, collection } => (
                format!("{} endpoint returned HTTP {}", collection, status),
                None,
            ),
            CoreError::Http { collection, source } if source.is_connect() => (
                format!("Cannot reach the API for {}", collection),
                Some("Check the API URL (--api-url or ESTATEDASH_API_URL)".to_string()),
            ),
            CoreError::Http { collection, source } if source.is_timeout() => (
                format!("Request for {} timed out", collection),
                Some("Raise request_timeout_secs or narrow the period".to_string()),
            ),
            CoreError::Decode {
                collection,
                message,
                ..
            } => (
                format!("Malformed {} response: {}", collection, message),
                None,
            ),
            _ => (error.to_string(), None),
        };

        Self {
            source,
            message,
            severity,
            suggestion,
        }
    }
}

/// Report of errors encountered while fetching one batch
///
/// Enables graceful degradation by tracking partial failures
/// instead of failing completely on any error.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub errors: Vec<LoadError>,
    /// Collections that loaded successfully
    pub loaded: Vec<String>,
    /// Collections replaced by an empty list after a failure
    pub failed: Vec<String>,
    pub records_fetched: usize,
}

impl LoadReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: LoadError) {
        self.errors.push(error);
    }

    /// Returns (warnings, errors)
    pub fn error_count(&self) -> (usize, usize) {
        let count = |severity| self.errors.iter().filter(|e| e.severity == severity).count();
        (count(ErrorSeverity::Warning), count(ErrorSeverity::Error))
    }
}

/// Degraded state indicator for the report store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradedState {
    /// Every collection loaded
    Healthy,
    /// Some collections missing, the report shows less data
    PartialData {
        missing: Vec<String>,
        reason: String,
    },
    /// Last batch failed entirely, metrics are zeroed
    Unavailable { reason: String },
}

impl DegradedState {
    pub fn from_report(report: &LoadReport) -> Self {
        if report.failed.is_empty() {
            DegradedState::Healthy
        } else {
            DegradedState::PartialData {
                missing: report.failed.clone(),
                reason: format!("Missing: {}", report.failed.join(", ")),
            }
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, DegradedState::Healthy)
    }

    pub fn is_degraded(&self) -> bool {
        !self.is_healthy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_report_severity_counting() {
        let mut report = LoadReport::new();
        report.add_error(LoadError::warning("payments", "HTTP 500"));
        report.add_error(LoadError::from_core_error(
            "leads",
            &CoreError::HttpStatus {
                collection: "leads".into(),
                status: 503,
            },
        ));
        report.add_error(LoadError::from_core_error(
            "users",
            &CoreError::HttpStatus {
                collection: "users".into(),
                status: 403,
            },
        ));

        assert_eq!(report.error_count(), (2, 1));
    }

    #[test]
    fn test_degraded_state_from_report() {
        let mut report = LoadReport::new();
        assert!(DegradedState::from_report(&report).is_healthy());

        report.failed.push("payments".into());
        let state = DegradedState::from_report(&report);
        assert!(state.is_degraded());
        assert!(matches!(state, DegradedState::PartialData { ref reason, .. } if reason == "Missing: payments"));
    }

    #[test]
    fn test_unauthorized_suggestion() {
        let err = CoreError::HttpStatus {
            collection: "leads".into(),
            status: 401,
        };
        let load = LoadError::from_core_error("leads", &err);
        assert_eq!(load.severity, ErrorSeverity::Error);
        assert!(load.suggestion.unwrap().contains("ESTATEDASH_TOKEN"));
    }
}
