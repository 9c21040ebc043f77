//! Audit report files.
//!
//! Every stage can write its inputs or outputs as a JSON policy file
//! under a per-day directory, so a migration run leaves a reviewable
//! trail and any stage's output can be re-imported later.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use tracing::info;

use opm_core::PolicyFile;

/// Write policies as `{report_dir}/{YYYY-MM-DD}/{stem}_{timestamp}.json`.
///
/// Returns the path written.
pub fn save_policies<T: Serialize + Clone>(
    report_dir: &Path,
    stem: &str,
    policies: &[T],
) -> Result<PathBuf> {
    let now = Local::now();
    let day_dir = report_dir.join(now.format("%Y-%m-%d").to_string());
    std::fs::create_dir_all(&day_dir)
        .with_context(|| format!("creating report directory {}", day_dir.display()))?;

    let filename = format!("{stem}_{}.json", now.format("%Y%m%d_%H%M%S"));
    let path = day_dir.join(filename);

    let file = PolicyFile {
        policies: policies.to_vec(),
    };
    let json = serde_json::to_string_pretty(&file).context("serializing policy report")?;
    std::fs::write(&path, json)
        .with_context(|| format!("writing report file {}", path.display()))?;

    info!(count = policies.len(), file = %path.display(), "saved policy report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opm_core::{RootIdentifier, TargetPolicy, TargetResources};
    use pretty_assertions::assert_eq;

    #[test]
    fn report_is_written_under_day_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = RootIdentifier::new("fid1");
        let policies = vec![TargetPolicy {
            service: "cm_ozone".to_string(),
            name: "fid1_volume_policy".to_string(),
            description: None,
            resources: TargetResources::volume(&root),
            policy_items: Vec::new(),
        }];

        let path = save_policies(dir.path(), "hdfs_converted", &policies).unwrap();
        assert!(path.starts_with(dir.path()));
        assert!(path
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("hdfs_converted_"));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["policies"][0]["name"], "fid1_volume_policy");
    }
}
