mod http;

pub use http::HttpProber;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

/// Outcome of a single GET against a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub url: String,
    /// Numeric status code, `None` when no response was received.
    pub status: Option<u16>,
    /// Status line such as `200 OK`, or the transport error text.
    pub status_text: String,
}

impl ProbeResult {
    pub fn response(url: impl Into<String>, status: u16, status_text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: Some(status),
            status_text: status_text.into(),
        }
    }

    pub fn transport_error(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: None,
            status_text: reason.into(),
        }
    }
}

/// Trait for probing a single URL.
///
/// Transport failures are folded into the returned [`ProbeResult`] rather than
/// surfaced as errors, so a probe never aborts a run.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeResult;
}

/// Probes every URL with at most `concurrency` requests in flight.
///
/// Results come back in input order regardless of completion order, and the
/// future only resolves once every probe has finished.
pub async fn probe_all<P, F>(
    prober: &P,
    urls: &[String],
    concurrency: usize,
    mut on_result: F,
) -> Vec<ProbeResult>
where
    P: Prober + ?Sized,
    F: FnMut(&ProbeResult),
{
    let mut results = Vec::with_capacity(urls.len());
    let mut pending = stream::iter(urls.iter().map(|url| prober.probe(url)))
        .buffered(concurrency.max(1));

    while let Some(result) = pending.next().await {
        on_result(&result);
        results.push(result);
    }
    results
}
