//! Client configuration and persisted UI preferences
//!
//! `ClientConfig` is assembled by the binary from CLI flags and environment
//! variables. `Preferences` lives in `<config_dir>/estatedash/preferences.json`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analytics::{Period, ReportKind};
use crate::error::CoreError;

/// Records requested per collection call
pub const DEFAULT_PAGE_SIZE: usize = 500;

const PREFERENCES_FILE: &str = "preferences.json";

/// Connection settings for the CRM API
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://crm.example.com/api`
    pub base_url: String,

    /// Bearer token forwarded on every request
    pub token: Option<String>,

    /// `limit` sent with each collection read
    pub page_size: usize,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Upper bound for a whole fetch batch
    pub batch_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            token: None,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: Duration::from_secs(15),
            batch_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_timeouts(mut self, request: Duration, batch: Duration) -> Self {
        self.request_timeout = request;
        self.batch_timeout = batch;
        self
    }

    /// Reject settings no request could succeed with
    pub fn validate(&self) -> Result<(), CoreError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CoreError::InvalidUrl {
                url: self.base_url.clone(),
                reason: "must start with http:// or https://".to_string(),
            });
        }
        if self.page_size == 0 {
            return Err(CoreError::InvalidConfig {
                message: "page size must be at least 1".to_string(),
            });
        }
        if self.batch_timeout.is_zero() {
            return Err(CoreError::InvalidConfig {
                message: "batch timeout must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// `{base}/{path}` without doubled slashes
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// UI defaults remembered between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Period label ("7d", "30d", "90d", "1y")
    pub default_period: String,

    /// Report slug opened on start
    pub default_report: String,

    /// Where exports land; the current directory when unset
    pub export_dir: Option<PathBuf>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_period: Period::default().label().to_string(),
            default_report: ReportKind::default().slug().to_string(),
            export_dir: None,
        }
    }
}

impl Preferences {
    /// `<config_dir>/estatedash`, if the platform has a config dir
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("estatedash"))
    }

    /// Load preferences from `<dir>/preferences.json`.
    /// Returns defaults on any I/O or parse error.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(PREFERENCES_FILE);
        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Write `<dir>/preferences.json`, creating `dir` if needed
    pub fn save(&self, dir: &Path) -> Result<(), CoreError> {
        let path = dir.join(PREFERENCES_FILE);
        let write_err = |source: std::io::Error| CoreError::FileWrite {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(dir).map_err(write_err)?;
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| write_err(std::io::Error::from(e)))?;
        std::fs::write(&path, content).map_err(write_err)
    }

    pub fn period(&self) -> Period {
        Period::parse(&self.default_period)
    }

    /// Configured start report; unknown slugs open the overview
    pub fn report(&self) -> ReportKind {
        self.default_report.parse().unwrap_or_default()
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_endpoint_joins_cleanly() {
        let config = ClientConfig::new("https://crm.example.com/api/");
        assert_eq!(config.endpoint("/leads"), "https://crm.example.com/api/leads");
        assert_eq!(
            config.endpoint("stats/reports"),
            "https://crm.example.com/api/stats/reports"
        );
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::default().validate().is_ok());
        assert!(matches!(
            ClientConfig::new("crm.example.com").validate(),
            Err(CoreError::InvalidUrl { .. })
        ));
        assert!(matches!(
            ClientConfig::default().with_page_size(0).validate(),
            Err(CoreError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_blank_token_ignored() {
        let config = ClientConfig::default().with_token(Some("  ".to_string()));
        assert!(config.token.is_none());
    }

    #[test]
    fn test_preferences_round_trip() {
        let dir = TempDir::new().unwrap();
        let prefs = Preferences {
            default_period: "90d".to_string(),
            default_report: "agency-health".to_string(),
            export_dir: Some(PathBuf::from("/tmp/reports")),
        };
        prefs.save(dir.path()).unwrap();

        let loaded = Preferences::load(dir.path());
        assert_eq!(loaded, prefs);
        assert_eq!(loaded.period(), Period::Last90d);
        assert_eq!(loaded.report(), ReportKind::Agencies);
    }

    #[test]
    fn test_preferences_save_reports_path() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let err = Preferences::default().save(&blocker).unwrap_err();
        assert!(matches!(
            err,
            CoreError::FileWrite { ref path, .. } if path == &blocker.join("preferences.json")
        ));
    }

    #[test]
    fn test_preferences_fallback() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Preferences::load(dir.path()), Preferences::default());

        std::fs::write(dir.path().join("preferences.json"), "{ not json").unwrap();
        assert_eq!(Preferences::load(dir.path()), Preferences::default());

        std::fs::write(
            dir.path().join("preferences.json"),
            r#"{ "default_period": "fortnight", "default_report": "nope" }"#,
        )
        .unwrap();
        let prefs = Preferences::load(dir.path());
        assert_eq!(prefs.period(), Period::Last30d);
        assert_eq!(prefs.report(), ReportKind::Overview);
    }
}
