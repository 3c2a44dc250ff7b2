use std::path::PathBuf;
use std::time::Duration;

use crate::classify::SuccessPolicy;

pub const DEFAULT_URLS_PATH: &str = "uok-urls";
pub const DEFAULT_STATE_PATH: &str = ".uok_state.bin";
pub const DEFAULT_NOTIFY_URL: &str = "https://notify.olin.dev/message";
pub const DEFAULT_NOTIFY_TITLE: &str = "Houston, we have a problem";

/// Configuration for a single check run.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Newline-delimited list of URLs to probe.
    pub urls_path: PathBuf,
    /// Where the failure snapshot of the latest run lives.
    pub state_path: PathBuf,
    /// HTTP request timeout. `None` leaves the transport default in place.
    pub request_timeout: Option<Duration>,
    /// Number of probes in flight at once (1 = sequential).
    pub concurrency: usize,
    pub success_policy: SuccessPolicy,
    /// Notification settings. `None` means report-only mode.
    pub notify: Option<NotifyConfig>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            urls_path: PathBuf::from(DEFAULT_URLS_PATH),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            request_timeout: None,
            concurrency: 1,
            success_policy: SuccessPolicy::default(),
            notify: None,
        }
    }
}

impl CheckConfig {
    pub fn with_urls_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.urls_path = path.into();
        self
    }

    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = path.into();
        self
    }

    pub fn with_request_timeout(mut self, ms: u64) -> Self {
        self.request_timeout = Some(Duration::from_millis(ms));
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn with_success_policy(mut self, policy: SuccessPolicy) -> Self {
        self.success_policy = policy;
        self
    }

    pub fn with_notify(mut self, notify: NotifyConfig) -> Self {
        self.notify = Some(notify);
        self
    }

    pub fn notify_enabled(&self) -> bool {
        self.notify.is_some()
    }
}

/// Where and how failure notifications are sent.
#[derive(Clone)]
pub struct NotifyConfig {
    /// Base message endpoint; the token is appended as `?token=`.
    pub url: String,
    pub token: String,
    pub title: String,
}

impl NotifyConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            url: DEFAULT_NOTIFY_URL.to_string(),
            token: token.into(),
            title: DEFAULT_NOTIFY_TITLE.to_string(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

// Keeps the token out of logs and panic messages.
impl std::fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("title", &self.title)
            .finish()
    }
}
