//! Database policy cloning.
//!
//! Hive policies bound to migrated warehouse locations are cloned rather
//! than translated: the clone keeps its policy items verbatim and only the
//! resources and identity change. Database names gain the migration
//! prefix, legacy-filesystem URLs are rewritten to the object-store
//! service, and the clone is stripped of its store-assigned identity so
//! re-importing creates a fresh policy.

use tracing::{debug, warn};

use crate::path::parse_hdfs_location;
use crate::policy::SourcePolicy;

/// A cloned policy plus anything that deserves operator attention.
#[derive(Debug, Clone, PartialEq)]
pub struct CloneOutcome {
    pub policy: SourcePolicy,
    /// URLs that matched no recognized shape and were rewritten by
    /// best-effort string substitution instead.
    pub warnings: Vec<String>,
}

/// Clone one Hive policy for the object store.
///
/// The new name is assembled from the transformed resources
/// (`db=`, `url=`, `tbl=`, `col=`, `udf=` fragments); table and column
/// wildcards are elided from the name, udf wildcards are kept. When no
/// fragment applies the name falls back to `{prefix}_{original}`.
#[must_use]
pub fn clone_for_object_store(
    source: &SourcePolicy,
    prefix: &str,
    target_service_id: &str,
) -> CloneOutcome {
    let mut policy = source.clone();
    let mut warnings = Vec::new();

    policy.id = None;
    policy.guid = None;
    policy.version = None;

    let original_name = policy.name.clone();
    let mut name_parts = Vec::new();

    if let Some(database) = policy.resources.get_mut("database") {
        database.values = database
            .values
            .iter()
            .map(|db| format!("{prefix}_{db}"))
            .collect();
        if !database.values.is_empty() {
            name_parts.push(format!("db={}", database.values.join(",")));
        }
    }

    if let Some(url) = policy.resources.get_mut("url") {
        url.values = url
            .values
            .iter()
            .map(|value| rewrite_url(value, target_service_id, &mut warnings))
            .collect();
        if let Some(first) = url.values.first() {
            name_parts.push(format!("url={first}"));
        }
    }

    if let Some(table) = policy.resources.get("table") {
        if !table.values.is_empty() && table.values != ["*"] {
            name_parts.push(format!("tbl={}", table.values.join(",")));
        }
    }
    if let Some(column) = policy.resources.get("column") {
        if !column.values.is_empty() && column.values != ["*"] {
            name_parts.push(format!("col={}", column.values.join(",")));
        }
    }
    // Unlike tables and columns, a udf wildcard is meaningful enough to name.
    if let Some(udf) = policy.resources.get("udf") {
        if !udf.values.is_empty() {
            name_parts.push(format!("udf={}", udf.values.join(",")));
        }
    }

    policy.name = if name_parts.is_empty() {
        format!("{prefix}_{original_name}")
    } else {
        name_parts.join(",")
    };
    policy.description = Some(format!(
        "Cloned from '{original_name}' for Ozone migration with prefix {prefix}"
    ));

    debug!(original = %original_name, clone = %policy.name, "cloned policy");
    CloneOutcome { policy, warnings }
}

fn rewrite_url(url: &str, target_service_id: &str, warnings: &mut Vec<String>) -> String {
    let url = url.trim();
    if let Some(parsed) = parse_hdfs_location(url) {
        return format!(
            "ofs://{target_service_id}/{}/{}/hive/{}",
            parsed.root,
            parsed.layer.as_str(),
            parsed.database
        );
    }
    warn!(url, "url matched no recognized warehouse shape");
    warnings.push(format!("unrecognized warehouse url: {url}"));
    url.replace("hdfs://", &format!("ofs://{target_service_id}/"))
        .replace("/data/", "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ResourceValues;
    use pretty_assertions::assert_eq;

    fn hive_policy(resources: &[(&str, &[&str])]) -> SourcePolicy {
        let mut policy = SourcePolicy {
            id: Some(42),
            guid: Some("guid-42".to_string()),
            version: Some(3),
            service: "cm_hive".to_string(),
            name: "finance access".to_string(),
            ..SourcePolicy::default()
        };
        for (kind, values) in resources {
            policy.resources.insert(
                (*kind).to_string(),
                ResourceValues::new(values.iter().map(ToString::to_string).collect()),
            );
        }
        policy
    }

    #[test]
    fn clone_strips_identity_and_prefixes_databases() {
        let source = hive_policy(&[("database", &["finance", "hr"])]);
        let outcome = clone_for_object_store(&source, "ozone", "ozsvc1");

        assert_eq!(outcome.policy.id, None);
        assert_eq!(outcome.policy.guid, None);
        assert_eq!(outcome.policy.version, None);
        assert_eq!(
            outcome.policy.database_values(),
            ["ozone_finance", "ozone_hr"]
        );
        assert_eq!(outcome.policy.name, "db=ozone_finance,ozone_hr");
        assert_eq!(
            outcome.policy.description.as_deref(),
            Some("Cloned from 'finance access' for Ozone migration with prefix ozone")
        );
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn recognized_url_is_rewritten_structurally() {
        let source = hive_policy(&[("url", &["hdfs://ns1/data/fid2/raw/hive/db4"])]);
        let outcome = clone_for_object_store(&source, "ozone", "ozsvc1");

        assert_eq!(
            outcome.policy.url_values(),
            ["ofs://ozsvc1/fid2/raw/hive/db4"]
        );
        assert_eq!(outcome.policy.name, "url=ofs://ozsvc1/fid2/raw/hive/db4");
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn unrecognized_url_falls_back_with_warning() {
        let source = hive_policy(&[("url", &["hdfs://ns1/data/fid2/archive/hive/db4"])]);
        let outcome = clone_for_object_store(&source, "ozone", "ozsvc1");

        assert_eq!(
            outcome.policy.url_values(),
            ["ofs://ozsvc1/ns1/fid2/archive/hive/db4"]
        );
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("hdfs://ns1/data/fid2/archive/hive/db4"));
    }

    #[test]
    fn name_fragments_skip_table_and_column_wildcards_but_keep_udf() {
        let source = hive_policy(&[
            ("database", &["finance"]),
            ("table", &["*"]),
            ("column", &["*"]),
            ("udf", &["*"]),
        ]);
        let outcome = clone_for_object_store(&source, "ozone", "ozsvc1");
        assert_eq!(outcome.policy.name, "db=ozone_finance,udf=*");

        let source = hive_policy(&[("database", &["finance"]), ("table", &["ledger"])]);
        let outcome = clone_for_object_store(&source, "ozone", "ozsvc1");
        assert_eq!(outcome.policy.name, "db=ozone_finance,tbl=ledger");
    }

    #[test]
    fn no_fragments_falls_back_to_prefixed_name() {
        let source = hive_policy(&[]);
        let outcome = clone_for_object_store(&source, "ozone", "ozsvc1");
        assert_eq!(outcome.policy.name, "ozone_finance access");
    }

    #[test]
    fn policy_items_pass_through_untouched() {
        let mut source = hive_policy(&[("database", &["finance"])]);
        source.policy_items.push(crate::policy::PolicyItem {
            users: vec!["alice".to_string()],
            ..crate::policy::PolicyItem::default()
        });
        let outcome = clone_for_object_store(&source, "ozone", "ozsvc1");
        assert_eq!(outcome.policy.policy_items, source.policy_items);
    }
}
