//! Source policy selection: boilerplate detection, opaque-resource
//! detection, and include/exclude database scoping.

use tracing::debug;

use crate::path::parse_hive_location;
use crate::policy::SourcePolicy;

/// Database names whose policies are pre-installed defaults.
pub const RESERVED_DATABASES: &[&str] = &["default", "information_schema"];

/// Whether a policy is a pre-existing default/catch-all that must be
/// excluded from translation and retained unmodified at the source.
///
/// The name rule is a substring match on `"all"` and is knowingly broad
/// (it also matches e.g. `install_db_policy`); it mirrors the convention
/// used for Ranger's generated `all - database` style policies.
#[must_use]
pub fn is_boilerplate(policy: &SourcePolicy) -> bool {
    if policy.name.to_lowercase().contains("all") {
        return true;
    }
    policy
        .database_values()
        .iter()
        .any(|db| RESERVED_DATABASES.contains(&db.to_lowercase().as_str()))
}

/// Whether a policy declares a URL resource. URL resources fall outside
/// the hierarchical path model and are never reinterpreted.
#[must_use]
pub fn has_opaque_resource(policy: &SourcePolicy) -> bool {
    !policy.url_values().is_empty()
}

/// Include/exclude filter over effective database names.
#[derive(Debug, Clone, Default)]
pub struct ScopeFilter {
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
}

impl ScopeFilter {
    /// Build a filter; names are compared case-insensitively.
    #[must_use]
    pub fn new(include: Option<Vec<String>>, exclude: Option<Vec<String>>) -> Self {
        let lower = |names: Vec<String>| {
            names
                .into_iter()
                .map(|name| name.to_lowercase())
                .collect::<Vec<_>>()
        };
        Self {
            include: include.map(lower),
            exclude: exclude.map(lower),
        }
    }

    /// Effective database set: declared database values unioned with
    /// databases inferred from URL values matching a known location shape.
    fn effective_databases(policy: &SourcePolicy) -> Vec<String> {
        let mut databases: Vec<String> = policy
            .database_values()
            .iter()
            .map(|db| db.to_lowercase())
            .collect();
        for url in policy.url_values() {
            if let Some(location) = parse_hive_location(url) {
                let database = location.database.to_lowercase();
                if !databases.contains(&database) {
                    databases.push(database);
                }
            }
        }
        databases
    }

    /// Whether a policy falls inside the scope.
    ///
    /// A policy with no effective database is ambiguous: it is excluded
    /// whenever an include filter is active, otherwise passed through.
    /// Exclude wins over include.
    #[must_use]
    pub fn matches(&self, policy: &SourcePolicy) -> bool {
        let databases = Self::effective_databases(policy);

        if databases.is_empty() {
            return self.include.is_none();
        }

        if let Some(exclude) = &self.exclude {
            if databases.iter().any(|db| exclude.contains(db)) {
                return false;
            }
        }

        if let Some(include) = &self.include {
            if !databases.iter().any(|db| include.contains(db)) {
                return false;
            }
        }

        true
    }
}

/// Drop boilerplate policies and those outside the scope filter.
#[must_use]
pub fn filter_policies(policies: &[SourcePolicy], scope: &ScopeFilter) -> Vec<SourcePolicy> {
    let filtered: Vec<SourcePolicy> = policies
        .iter()
        .filter(|policy| {
            if is_boilerplate(policy) {
                debug!(policy = %policy.name, "filtered out boilerplate policy");
                return false;
            }
            scope.matches(policy)
        })
        .cloned()
        .collect();
    debug!(
        total = policies.len(),
        kept = filtered.len(),
        "filtered source policies"
    );
    filtered
}

/// Partition policies for source-side cleanup into (delete, keep).
///
/// Boilerplate and URL-bearing policies are always kept; everything else
/// is deleted, subject to an optional include filter.
#[must_use]
pub fn partition_for_cleanup(
    policies: &[SourcePolicy],
    include: Option<&[String]>,
) -> (Vec<SourcePolicy>, Vec<SourcePolicy>) {
    let scope = ScopeFilter::new(include.map(<[String]>::to_vec), None);
    let mut delete = Vec::new();
    let mut keep = Vec::new();

    for policy in policies {
        if is_boilerplate(policy) || has_opaque_resource(policy) {
            keep.push(policy.clone());
        } else if include.is_none() || scope.matches(policy) {
            delete.push(policy.clone());
        } else {
            keep.push(policy.clone());
        }
    }

    (delete, keep)
}
