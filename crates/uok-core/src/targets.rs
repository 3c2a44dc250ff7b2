//! Loading the list of URLs to probe.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("Could not read URL list {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads the newline-delimited target list at `path`.
pub fn load_targets(path: &Path) -> Result<Vec<String>, TargetError> {
    let content = std::fs::read_to_string(path).map_err(|source| TargetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_targets(&content))
}

/// One URL per line. Surrounding whitespace is trimmed; blank lines and
/// `#` comments are skipped. A URL listed twice is kept once, at its first
/// position.
pub fn parse_targets(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| seen.insert(*line))
        .map(str::to_string)
        .collect()
}
