use crate::classify::FailureRecord;
use crate::state::FailureKeySet;

/// Keeps the failures whose key was not failing in the previous run.
///
/// Stable: output order follows `current`.
pub fn dedupe(current: &[FailureRecord], previous: &FailureKeySet) -> Vec<FailureRecord> {
    current
        .iter()
        .filter(|f| !previous.contains(&f.key))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(url: &str, status: &str) -> FailureRecord {
        FailureRecord {
            key: url.to_string(),
            message: format!("{} returned {}", url, status),
        }
    }

    #[test]
    fn drops_failures_already_reported() {
        let current = vec![
            failure("http://a.example", "500 Internal Server Error"),
            failure("http://b.example", "502 Bad Gateway"),
        ];
        let previous: FailureKeySet = ["http://a.example"].into_iter().collect();
        assert_eq!(
            dedupe(&current, &previous),
            vec![failure("http://b.example", "502 Bad Gateway")]
        );
    }

    #[test]
    fn changed_status_for_known_key_is_still_suppressed() {
        let current = vec![failure("http://a.example", "503 Service Unavailable")];
        let previous: FailureKeySet = ["http://a.example"].into_iter().collect();
        assert!(dedupe(&current, &previous).is_empty());
    }

    #[test]
    fn preserves_input_order() {
        let current = vec![
            failure("http://z.example", "500 Internal Server Error"),
            failure("http://m.example", "500 Internal Server Error"),
            failure("http://a.example", "500 Internal Server Error"),
        ];
        let keys: Vec<_> = dedupe(&current, &FailureKeySet::new())
            .into_iter()
            .map(|f| f.key)
            .collect();
        assert_eq!(keys, vec!["http://z.example", "http://m.example", "http://a.example"]);
    }

    #[test]
    fn membership_matches_previous_keys_and_is_repeatable() {
        let current = vec![
            failure("http://a.example", "500 Internal Server Error"),
            failure("http://b.example", "404 Not Found"),
            failure("http://c.example", "connection refused"),
        ];
        let previous: FailureKeySet = ["http://b.example", "http://gone.example"]
            .into_iter()
            .collect();

        let first = dedupe(&current, &previous);
        let second = dedupe(&current, &previous);
        assert_eq!(first, second);

        for f in &current {
            assert_eq!(first.contains(f), !previous.contains(&f.key), "{}", f.key);
        }
    }

    #[test]
    fn empty_current_yields_empty_output() {
        let previous: FailureKeySet = ["http://a.example"].into_iter().collect();
        assert!(dedupe(&[], &previous).is_empty());
    }
}
