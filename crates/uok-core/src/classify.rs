use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::probe::ProbeResult;

/// Rule deciding whether a probe counts as healthy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuccessPolicy {
    /// Numeric status in `200..=299`.
    #[default]
    #[serde(rename = "2xx")]
    Range2xx,
    /// Status text contains `"200"` anywhere. Lenient; also matches error text
    /// that happens to mention 200.
    #[serde(rename = "contains-200")]
    Contains200,
}

impl SuccessPolicy {
    pub fn is_success(self, result: &ProbeResult) -> bool {
        match self {
            Self::Range2xx => matches!(result.status, Some(code) if (200..=299).contains(&code)),
            Self::Contains200 => result.status_text.contains("200"),
        }
    }
}

impl fmt::Display for SuccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range2xx => write!(f, "2xx"),
            Self::Contains200 => write!(f, "contains-200"),
        }
    }
}

impl FromStr for SuccessPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2xx" => Ok(Self::Range2xx),
            "contains-200" => Ok(Self::Contains200),
            other => Err(format!(
                "Invalid success policy '{}': must be '2xx' or 'contains-200'",
                other
            )),
        }
    }
}

/// A failing target. `key` identifies it across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub key: String,
    pub message: String,
}

impl FailureRecord {
    pub fn from_result(result: &ProbeResult) -> Self {
        Self {
            key: result.url.clone(),
            message: format!("{} returned {}", result.url, result.status_text),
        }
    }
}

/// Probe results split into healthy and failing, each in probe order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Classification {
    pub ok: Vec<ProbeResult>,
    pub failing: Vec<ProbeResult>,
    pub failures: Vec<FailureRecord>,
}

impl Classification {
    pub fn total(&self) -> usize {
        self.ok.len() + self.failing.len()
    }

    pub fn all_ok(&self) -> bool {
        self.failing.is_empty()
    }
}

pub fn classify(results: Vec<ProbeResult>, policy: SuccessPolicy) -> Classification {
    let mut out = Classification::default();
    for result in results {
        if policy.is_success(&result) {
            out.ok.push(result);
        } else {
            out.failures.push(FailureRecord::from_result(&result));
            out.failing.push(result);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<ProbeResult> {
        vec![
            ProbeResult::response("http://a.example", 200, "200 OK"),
            ProbeResult::response("http://b.example", 500, "500 Internal Server Error"),
            ProbeResult::response("http://c.example", 204, "204 No Content"),
            ProbeResult::transport_error("http://d.example", "dns error: no record for 200.example"),
            ProbeResult::response("http://e.example", 301, "301 Moved Permanently"),
        ]
    }

    #[test]
    fn range_policy_accepts_only_2xx() {
        let c = classify(sample(), SuccessPolicy::Range2xx);
        let ok: Vec<_> = c.ok.iter().map(|r| r.url.as_str()).collect();
        let failing: Vec<_> = c.failing.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(ok, vec!["http://a.example", "http://c.example"]);
        assert_eq!(
            failing,
            vec!["http://b.example", "http://d.example", "http://e.example"]
        );
        assert_eq!(c.total(), 5);
    }

    #[test]
    fn contains_policy_matches_substring_anywhere() {
        let results = sample();
        let c = classify(results.clone(), SuccessPolicy::Contains200);
        for r in &results {
            let in_ok = c.ok.contains(r);
            assert_eq!(in_ok, r.status_text.contains("200"), "{}", r.url);
        }
        // The transport error mentions 200 and is therefore let through.
        assert!(c.ok.iter().any(|r| r.url == "http://d.example"));
        assert_eq!(c.ok.len() + c.failing.len(), results.len());
    }

    #[test]
    fn failure_message_names_url_and_status() {
        let c = classify(
            vec![ProbeResult::response("http://b.example", 500, "500 Internal Server Error")],
            SuccessPolicy::Range2xx,
        );
        assert_eq!(
            c.failures,
            vec![FailureRecord {
                key: "http://b.example".into(),
                message: "http://b.example returned 500 Internal Server Error".into(),
            }]
        );
        assert!(!c.all_ok());
    }

    #[test]
    fn empty_input_is_all_ok() {
        let c = classify(vec![], SuccessPolicy::Range2xx);
        assert!(c.all_ok());
        assert_eq!(c.total(), 0);
    }

    #[test]
    fn policy_parses_and_displays() {
        assert_eq!("2xx".parse::<SuccessPolicy>().unwrap(), SuccessPolicy::Range2xx);
        assert_eq!(
            "contains-200".parse::<SuccessPolicy>().unwrap(),
            SuccessPolicy::Contains200
        );
        assert!("200".parse::<SuccessPolicy>().is_err());
        assert_eq!(SuccessPolicy::Contains200.to_string(), "contains-200");
    }
}
