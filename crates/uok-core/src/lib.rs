#![forbid(unsafe_code)]

pub mod classify;
pub mod config;
pub mod dedupe;
pub mod notify;
pub mod probe;
pub mod run;
pub mod state;
pub mod targets;

pub use classify::{classify, Classification, FailureRecord, SuccessPolicy};
pub use config::{CheckConfig, NotifyConfig};
pub use dedupe::dedupe;
pub use notify::{NotifyError, WebhookNotifier};
pub use probe::{probe_all, HttpProber, ProbeResult, Prober};
pub use run::{Checker, NotifyOutcome, RunError, RunReport, Settlement};
pub use state::{FailureKeySet, SnapshotStore, StateError};
pub use targets::{load_targets, parse_targets, TargetError};
