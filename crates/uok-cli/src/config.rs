//! TOML configuration file schema and parsing.
//!
//! Every key is optional; command-line flags override file values.
//!
//! ```toml
//! [check]
//! urls = "uok-urls"
//! state = ".uok_state.bin"
//! concurrency = 4
//! request_timeout_ms = 10000
//! success = "2xx"
//!
//! [notify]
//! url = "https://notify.example.com/message"
//! title = "Houston, we have a problem"
//! token = "AbCdEf"
//!
//! [log]
//! format = "json"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use uok_core::config::{DEFAULT_NOTIFY_TITLE, DEFAULT_NOTIFY_URL, DEFAULT_STATE_PATH, DEFAULT_URLS_PATH};
use uok_core::{CheckConfig, NotifyConfig, SuccessPolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub check: CheckSection,

    #[serde(default)]
    pub notify: NotifySection,

    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckSection {
    #[serde(default = "default_urls")]
    pub urls: PathBuf,

    #[serde(default = "default_state")]
    pub state: PathBuf,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    #[serde(default)]
    pub success: SuccessPolicy,
}

impl Default for CheckSection {
    fn default() -> Self {
        Self {
            urls: default_urls(),
            state: default_state(),
            concurrency: default_concurrency(),
            request_timeout_ms: None,
            success: SuccessPolicy::default(),
        }
    }
}

fn default_urls() -> PathBuf {
    PathBuf::from(DEFAULT_URLS_PATH)
}

fn default_state() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_PATH)
}

fn default_concurrency() -> usize {
    1
}

#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotifySection {
    #[serde(default = "default_notify_url")]
    pub url: String,

    #[serde(default = "default_notify_title")]
    pub title: String,

    #[serde(default)]
    pub token: Option<String>,
}

impl Default for NotifySection {
    fn default() -> Self {
        Self {
            url: default_notify_url(),
            title: default_notify_title(),
            token: None,
        }
    }
}

impl std::fmt::Debug for NotifySection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifySection")
            .field("url", &self.url)
            .field("title", &self.title)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn default_notify_url() -> String {
    DEFAULT_NOTIFY_URL.into()
}

fn default_notify_title() -> String {
    DEFAULT_NOTIFY_TITLE.into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

fn default_log_format() -> String {
    "pretty".into()
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub token: Option<String>,
    pub urls: Option<PathBuf>,
    pub state: Option<PathBuf>,
    pub notify_url: Option<String>,
    pub concurrency: Option<usize>,
    pub request_timeout_ms: Option<u64>,
    pub lenient_status: bool,
    pub log_format: Option<String>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies command-line overrides, then validates the merged result.
    pub fn merge(mut self, overrides: Overrides) -> Result<Self, ConfigError> {
        if let Some(token) = overrides.token {
            self.notify.token = Some(token);
        }
        if let Some(urls) = overrides.urls {
            self.check.urls = urls;
        }
        if let Some(state) = overrides.state {
            self.check.state = state;
        }
        if let Some(url) = overrides.notify_url {
            self.notify.url = url;
        }
        if let Some(n) = overrides.concurrency {
            self.check.concurrency = n;
        }
        if let Some(ms) = overrides.request_timeout_ms {
            self.check.request_timeout_ms = Some(ms);
        }
        if overrides.lenient_status {
            self.check.success = SuccessPolicy::Contains200;
        }
        if let Some(format) = overrides.log_format {
            self.log.format = format;
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.check.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }

        if self.check.request_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "request_timeout_ms must be greater than 0".into(),
            ));
        }

        if self.notify.token.as_deref() == Some("") {
            return Err(ConfigError::Invalid("Notification token must not be empty".into()));
        }

        let parsed = url::Url::parse(&self.notify.url).map_err(|e| {
            ConfigError::Invalid(format!("Invalid notify URL: {} ({})", self.notify.url, e))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ConfigError::Invalid(format!(
                "Notify URL must use http or https: {}",
                self.notify.url
            )));
        }

        match self.log.format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "Invalid log format '{}': must be 'pretty' or 'json'",
                    other
                )));
            }
        }

        Ok(())
    }

    pub fn to_check_config(&self) -> CheckConfig {
        let mut c = CheckConfig::default()
            .with_urls_path(&self.check.urls)
            .with_state_path(&self.check.state)
            .with_concurrency(self.check.concurrency)
            .with_success_policy(self.check.success);
        if let Some(ms) = self.check.request_timeout_ms {
            c = c.with_request_timeout(ms);
        }
        if let Some(ref token) = self.notify.token {
            c = c.with_notify(
                NotifyConfig::new(token.clone())
                    .with_url(self.notify.url.clone())
                    .with_title(self.notify.title.clone()),
            );
        }
        c
    }
}
