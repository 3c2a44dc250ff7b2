//! One check run: load targets, probe, classify, then settle the
//! notification decision and persist the failure snapshot.
//!
//! [`Checker::check`] and [`Checker::settle`] are separate so a caller can
//! render the report in between; [`Checker::run`] does both.

use std::sync::Arc;

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::classify::{classify, Classification, FailureRecord};
use crate::config::CheckConfig;
use crate::dedupe::dedupe;
use crate::notify::{NotifyError, WebhookNotifier};
use crate::probe::{probe_all, HttpProber, ProbeResult, Prober};
use crate::state::{FailureKeySet, SnapshotStore, StateError};
use crate::targets::{load_targets, TargetError};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Targets(#[from] TargetError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error("Could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// What happened on the notification path of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotifyOutcome {
    /// No token configured; report-only mode.
    Disabled,
    /// Every current failure was already reported, or nothing is failing.
    NothingNew,
    Delivered { count: usize, first_run: bool },
    Failed {
        count: usize,
        first_run: bool,
        reason: String,
    },
}

/// Result of the notify-and-persist half of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Settlement {
    /// Failures not present in the previous snapshot. Empty in report-only mode.
    pub new_failures: Vec<FailureRecord>,
    pub notify: NotifyOutcome,
    /// Number of keys written to the new snapshot.
    pub snapshot_keys: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub classification: Classification,
    pub settlement: Settlement,
}

pub struct Checker {
    config: CheckConfig,
    prober: Arc<dyn Prober>,
    store: SnapshotStore,
    notifier: Option<WebhookNotifier>,
}

impl Checker {
    /// `client` is used for notifications; the prober brings its own.
    pub fn new(
        config: CheckConfig,
        prober: Arc<dyn Prober>,
        client: Client,
    ) -> Result<Self, RunError> {
        let notifier = config
            .notify
            .as_ref()
            .map(|n| WebhookNotifier::new(n, client))
            .transpose()?;
        let store = SnapshotStore::new(config.state_path.clone());

        Ok(Self {
            config,
            prober,
            store,
            notifier,
        })
    }

    /// Builds an HTTP prober from `config` and shares its client with the notifier.
    pub fn from_config(config: CheckConfig) -> Result<Self, RunError> {
        let prober = HttpProber::from_config(&config)?;
        let client = prober.client().clone();
        Self::new(config, Arc::new(prober), client)
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    pub fn targets(&self) -> Result<Vec<String>, RunError> {
        let urls = load_targets(&self.config.urls_path)?;
        debug!(path = %self.config.urls_path.display(), count = urls.len(), "Loaded targets");
        Ok(urls)
    }

    /// Probes `urls` and classifies the results. `on_result` sees each result
    /// as it lands, in input order.
    pub async fn probe_and_classify<F>(&self, urls: &[String], on_result: F) -> Classification
    where
        F: FnMut(&ProbeResult),
    {
        let results = probe_all(
            self.prober.as_ref(),
            urls,
            self.config.concurrency,
            on_result,
        )
        .await;
        let classification = classify(results, self.config.success_policy);
        info!(
            ok = classification.ok.len(),
            failing = classification.failing.len(),
            policy = %self.config.success_policy,
            "Probing finished"
        );
        classification
    }

    pub async fn check(&self) -> Result<Classification, RunError> {
        let urls = self.targets()?;
        Ok(self.probe_and_classify(&urls, |_| {}).await)
    }

    /// Decides whether to notify, sends if needed, then overwrites the snapshot.
    ///
    /// A corrupt or unreadable previous snapshot aborts before notifying and
    /// before saving. A failed notification does not.
    pub async fn settle(&self, classification: &Classification) -> Result<Settlement, RunError> {
        let current = FailureKeySet::from_failures(&classification.failures);

        let (new_failures, notify) = match &self.notifier {
            None => {
                debug!("No notification token, skipping dedupe");
                (Vec::new(), NotifyOutcome::Disabled)
            }
            Some(notifier) => {
                let (fresh, first_run) = match self.store.load_previous() {
                    Ok(previous) => (dedupe(&classification.failures, &previous), false),
                    Err(e) if e.is_not_found() => {
                        info!(
                            path = %self.store.path().display(),
                            "No previous snapshot, reporting every failure"
                        );
                        (classification.failures.clone(), true)
                    }
                    Err(e) => return Err(e.into()),
                };
                let outcome = send(notifier, &fresh, first_run).await;
                (fresh, outcome)
            }
        };

        self.store.save(&current)?;

        Ok(Settlement {
            new_failures,
            notify,
            snapshot_keys: current.len(),
        })
    }

    pub async fn run(&self) -> Result<RunReport, RunError> {
        let classification = self.check().await?;
        let settlement = self.settle(&classification).await?;
        Ok(RunReport {
            classification,
            settlement,
        })
    }
}

async fn send(notifier: &WebhookNotifier, fresh: &[FailureRecord], first_run: bool) -> NotifyOutcome {
    // Without a previous snapshot the send is unconditional, even when empty.
    if fresh.is_empty() && !first_run {
        debug!("No new failures to notify");
        return NotifyOutcome::NothingNew;
    }

    let messages: Vec<String> = fresh.iter().map(|f| f.message.clone()).collect();
    let count = messages.len();
    match notifier.notify(&messages).await {
        Ok(()) => {
            info!(count, first_run, "Sent failure notification");
            NotifyOutcome::Delivered { count, first_run }
        }
        Err(e) => {
            warn!(count, first_run, error = %e, "Failure notification was not delivered");
            NotifyOutcome::Failed {
                count,
                first_run,
                reason: e.to_string(),
            }
        }
    }
}
