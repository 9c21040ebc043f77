//! Name list parsing: inline comma-separated arguments and list files.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

/// Split a comma-separated argument into trimmed, non-empty names.
#[must_use]
pub fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Load names from a list file.
///
/// Lines starting with `#` and empty lines are skipped; remaining lines
/// may each carry one name or several comma-separated names.
pub fn load_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading list file {}", path.display()))?;

    let names: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(split_csv)
        .collect();

    info!(count = names.len(), file = %path.display(), "loaded name list");
    Ok(names)
}
