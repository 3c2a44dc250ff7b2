use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{ProbeResult, Prober};
use crate::config::CheckConfig;

pub const USER_AGENT: &str = concat!("uok/", env!("CARGO_PKG_VERSION"));

/// HTTP prober issuing a single GET per URL with the client's redirect defaults.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(Self::build_client(timeout)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &CheckConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.request_timeout)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Builds the shared client. Without a timeout the transport defaults apply.
    pub fn build_client(timeout: Option<Duration>) -> Result<Client, reqwest::Error> {
        let mut builder = Client::builder().user_agent(USER_AGENT).gzip(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> ProbeResult {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                debug!(url, status = status.as_u16(), "Probe answered");
                ProbeResult::response(url, status.as_u16(), status.to_string())
            }
            Err(e) => {
                let reason = error_chain(&e);
                debug!(url, timeout = e.is_timeout(), error = %reason, "Probe failed");
                ProbeResult::transport_error(url, reason)
            }
        }
    }
}

/// Joins an error with its sources; reqwest keeps the useful part (DNS,
/// refused, TLS) in the source chain.
fn error_chain(err: &reqwest::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn probe_reports_status_line_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string("fine"))
            .expect(1)
            .mount(&server)
            .await;

        let prober = HttpProber::new(Some(Duration::from_secs(5))).unwrap();
        let result = prober.probe(&format!("{}/health", server.uri())).await;
        assert_eq!(result.status, Some(200));
        assert_eq!(result.status_text, "200 OK");
    }

    #[tokio::test]
    async fn probe_reports_error_status_without_retrying() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let prober = HttpProber::new(None).unwrap();
        let result = prober.probe(&format!("{}/broken", server.uri())).await;
        assert_eq!(result.status, Some(500));
        assert_eq!(result.status_text, "500 Internal Server Error");
    }

    #[tokio::test]
    async fn probe_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let prober = HttpProber::new(None).unwrap();
        let result = prober.probe(&server.uri()).await;
        assert_eq!(result.status, Some(204));
    }

    #[tokio::test]
    async fn probe_folds_connection_error_into_text() {
        // Bind then drop a listener so the port is very likely closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let prober = HttpProber::new(Some(Duration::from_secs(2))).unwrap();
        let url = format!("http://127.0.0.1:{}/", port);
        let result = prober.probe(&url).await;
        assert_eq!(result.status, None);
        assert_eq!(result.url, url);
        assert!(!result.status_text.is_empty());
    }

    #[tokio::test]
    async fn probe_folds_invalid_url_into_text() {
        let prober = HttpProber::new(None).unwrap();
        let result = prober.probe("not a url").await;
        assert_eq!(result.status, None);
        assert!(!result.status_text.contains("200"));
    }

    #[tokio::test]
    async fn probe_times_out_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let prober = HttpProber::new(Some(Duration::from_millis(100))).unwrap();
        let result = prober.probe(&server.uri()).await;
        assert_eq!(result.status, None);
    }
}
