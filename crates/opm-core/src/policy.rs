//! Ranger policy wire model.
//!
//! Source policies are deserialized exactly as Ranger exports them; fields
//! this engine does not interpret are carried in `extra` so a policy can be
//! re-imported without losing anything. Target (Ozone) policies are built
//! fresh with typed resources that enforce the volume/bucket/key hierarchy.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Access permission kind.
///
/// Unknown kinds round-trip verbatim through `Other` so a newer Ranger
/// service definition does not break deserialization; translation ignores
/// them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AccessKind {
    Read,
    Write,
    Execute,
    List,
    Create,
    Delete,
    Other(String),
}

impl AccessKind {
    /// Wire name of the access kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Execute => "execute",
            Self::List => "list",
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for AccessKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "read" => Self::Read,
            "write" => Self::Write,
            "execute" => Self::Execute,
            "list" => Self::List,
            "create" => Self::Create,
            "delete" => Self::Delete,
            _ => Self::Other(value),
        }
    }
}

impl From<AccessKind> for String {
    fn from(value: AccessKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single permission grant within a policy item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    #[serde(rename = "type")]
    pub kind: AccessKind,
    pub is_allowed: bool,
}

impl AccessGrant {
    /// An allowed grant of the given kind.
    #[must_use]
    pub const fn allowed(kind: AccessKind) -> Self {
        Self {
            kind,
            is_allowed: true,
        }
    }
}

/// Principals and the accesses granted to them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyItem {
    #[serde(default)]
    pub accesses: Vec<AccessGrant>,
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Value set for one resource kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceValues {
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_excludes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_recursive: Option<bool>,
}

impl ResourceValues {
    /// Plain value set without flags.
    #[must_use]
    pub fn new(values: Vec<String>) -> Self {
        Self {
            values,
            is_excludes: None,
            is_recursive: None,
        }
    }

    /// Value set marked recursive.
    #[must_use]
    pub fn recursive(values: Vec<String>) -> Self {
        Self {
            values,
            is_excludes: None,
            is_recursive: Some(true),
        }
    }
}

/// A policy as exported from Ranger (read-only snapshot).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceValues>,
    #[serde(default)]
    pub policy_items: Vec<PolicyItem>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl SourcePolicy {
    /// Values declared for a resource kind, or empty when absent.
    #[must_use]
    pub fn resource_values(&self, kind: &str) -> &[String] {
        self.resources
            .get(kind)
            .map_or(&[], |resource| resource.values.as_slice())
    }

    /// Declared filesystem path values.
    #[must_use]
    pub fn path_values(&self) -> &[String] {
        self.resource_values("path")
    }

    /// Declared database values.
    #[must_use]
    pub fn database_values(&self) -> &[String] {
        self.resource_values("database")
    }

    /// Declared URL values.
    #[must_use]
    pub fn url_values(&self) -> &[String] {
        self.resource_values("url")
    }
}

/// Top-level container name migrated as one unit (volume-equivalent).
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RootIdentifier(String);

impl RootIdentifier {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RootIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resource descriptors for an Ozone policy.
///
/// Exactly one volume; a key requires exactly one bucket. Constructors are
/// the only way to build one, so every `TargetPolicy` is hierarchy-valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetResources {
    pub volume: ResourceValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<ResourceValues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<ResourceValues>,
}

impl TargetResources {
    /// Volume-level resources.
    #[must_use]
    pub fn volume(root: &RootIdentifier) -> Self {
        Self {
            volume: ResourceValues::new(vec![root.to_string()]),
            bucket: None,
            key: None,
        }
    }

    /// Bucket-level resources. Returns `None` when the bucket set is empty.
    #[must_use]
    pub fn buckets(root: &RootIdentifier, buckets: &BTreeSet<String>) -> Option<Self> {
        if buckets.is_empty() {
            return None;
        }
        Some(Self {
            volume: ResourceValues::new(vec![root.to_string()]),
            bucket: Some(ResourceValues::new(buckets.iter().cloned().collect())),
            key: None,
        })
    }

    /// Key-level resources under a single bucket; keys are recursive.
    #[must_use]
    pub fn key(root: &RootIdentifier, bucket: &str, key: &str) -> Self {
        Self {
            volume: ResourceValues::new(vec![root.to_string()]),
            bucket: Some(ResourceValues::new(vec![bucket.to_string()])),
            key: Some(ResourceValues::recursive(vec![key.to_string()])),
        }
    }
}

/// A freshly synthesized Ozone policy, submitted once and discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetPolicy {
    pub service: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub resources: TargetResources,
    pub policy_items: Vec<PolicyItem>,
}

/// JSON document shape used for audit/report files and re-import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyFile<T> {
    pub policies: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn access_kind_roundtrips_known_and_unknown() {
        let json = "\"read\"";
        let kind: AccessKind = serde_json::from_str(json).unwrap();
        assert_eq!(kind, AccessKind::Read);
        assert_eq!(serde_json::to_string(&kind).unwrap(), json);

        let json = "\"select\"";
        let kind: AccessKind = serde_json::from_str(json).unwrap();
        assert_eq!(kind, AccessKind::Other("select".to_string()));
        assert_eq!(serde_json::to_string(&kind).unwrap(), json);
    }

    #[test]
    fn source_policy_preserves_unknown_fields() {
        let json = serde_json::json!({
            "id": 7,
            "guid": "abc-123",
            "version": 2,
            "service": "cm_hive",
            "name": "finance_select",
            "resources": {
                "database": { "values": ["finance"] }
            },
            "policyItems": [{
                "accesses": [{ "type": "select", "isAllowed": true }],
                "users": ["alice"],
                "groups": [],
                "roles": []
            }],
            "isEnabled": true,
            "policyType": 0
        });

        let policy: SourcePolicy = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(policy.id, Some(7));
        assert_eq!(policy.database_values(), ["finance"]);
        assert_eq!(
            policy.extra.get("isEnabled"),
            Some(&serde_json::Value::Bool(true))
        );

        let back = serde_json::to_value(&policy).unwrap();
        assert_eq!(back, json);
    }

    #[test]
    fn target_resources_bucket_requires_nonempty_set() {
        let root = RootIdentifier::new("fid1");
        assert!(TargetResources::buckets(&root, &BTreeSet::new()).is_none());

        let buckets: BTreeSet<String> = ["raw".to_string()].into_iter().collect();
        let resources = TargetResources::buckets(&root, &buckets).unwrap();
        assert_eq!(resources.volume.values, ["fid1"]);
        assert_eq!(resources.bucket.unwrap().values, ["raw"]);
        assert!(resources.key.is_none());
    }

    #[test]
    fn key_resources_are_recursive_single_bucket() {
        let root = RootIdentifier::new("fid2");
        let resources = TargetResources::key(&root, "raw", "k1");
        assert_eq!(resources.bucket.as_ref().unwrap().values, ["raw"]);
        let key = resources.key.unwrap();
        assert_eq!(key.values, ["k1"]);
        assert_eq!(key.is_recursive, Some(true));
    }
}
