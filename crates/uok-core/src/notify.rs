//! Failure notifications.
//!
//! New failures are joined into one message and POSTed as a form to a
//! Gotify-style `/message?token=` endpoint. Delivery is best-effort: callers
//! log a [`NotifyError`] and carry on.

use reqwest::Client;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::NotifyConfig;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid notify URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Notification request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("Notification endpoint answered {status}")]
    Status { status: u16 },
}

/// Joins failure lines into a single message body.
pub fn format_message(messages: &[String]) -> String {
    messages.join("\n")
}

/// Sends notifications to the configured webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    endpoint: Url,
    title: String,
}

impl WebhookNotifier {
    /// Resolves the endpoint up front so a bad URL fails before any probing.
    pub fn new(config: &NotifyConfig, client: Client) -> Result<Self, NotifyError> {
        let mut endpoint = Url::parse(&config.url).map_err(|e| NotifyError::InvalidUrl {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;
        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            return Err(NotifyError::InvalidUrl {
                url: config.url.clone(),
                reason: "scheme must be http or https".into(),
            });
        }
        endpoint
            .query_pairs_mut()
            .append_pair("token", &config.token);

        Ok(Self {
            client,
            endpoint,
            title: config.title.clone(),
        })
    }

    /// POSTs `messages` joined by newlines. An empty list sends an empty message.
    pub async fn notify(&self, messages: &[String]) -> Result<(), NotifyError> {
        let message = format_message(messages);
        let form = [("message", message.as_str()), ("title", self.title.as_str())];

        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&form)
            .send()
            .await
            // The URL carries the token; keep it out of error text.
            .map_err(|e| NotifyError::Request(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                status: status.as_u16(),
            });
        }

        debug!(
            host = self.endpoint.host_str().unwrap_or_default(),
            count = messages.len(),
            "Notification delivered"
        );
        Ok(())
    }
}
