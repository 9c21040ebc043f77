//! Filesystem ACL fallback.
//!
//! When a root has no source policies at all, its effective permissions
//! are reconstructed from filesystem ACLs (`getfacl` text). Every
//! generated policy name carries the `_from_hdfs_acls` suffix so operators
//! can tell reconstructed policies from translated ones at a glance.
//!
//! This module is fail-closed: an unreachable path or unparseable ACL
//! yields fewer policies, never an error. The provider trait mirrors that
//! by returning `Option`/`Vec` instead of `Result`.

use std::collections::BTreeSet;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::access::{translate_posix, PosixBits};
use crate::policy::{
    AccessGrant, AccessKind, PolicyItem, RootIdentifier, TargetPolicy, TargetResources,
};

/// One entry of a parsed ACL document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclEntry {
    User { name: String, bits: PosixBits },
    Group { name: String, bits: PosixBits },
}

/// A parsed `getfacl` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AclDocument {
    pub entries: Vec<AclEntry>,
}

impl AclDocument {
    /// Parse `getfacl` output.
    ///
    /// `# owner:` and `# group:` header lines provide the names for the
    /// unnamed `user::` and `group::` entries. Lines that match no known
    /// shape are skipped, so parsing never fails.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut owner = String::new();
        let mut primary_group = String::new();
        for line in text.lines() {
            let line = line.trim();
            if let Some(name) = line.strip_prefix("# owner:") {
                owner = name.trim().to_string();
            } else if let Some(name) = line.strip_prefix("# group:") {
                primary_group = name.trim().to_string();
            }
        }

        let mut entries = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parts: Vec<&str> = line.split(':').collect();
            if parts.len() < 3 {
                continue;
            }
            let bits = PosixBits::parse(parts[2]);
            match parts[0] {
                "user" => {
                    let name = if parts[1].is_empty() { &owner } else { parts[1] };
                    if !name.is_empty() {
                        entries.push(AclEntry::User {
                            name: name.to_string(),
                            bits,
                        });
                    }
                }
                "group" => {
                    let name = if parts[1].is_empty() {
                        &primary_group
                    } else {
                        parts[1]
                    };
                    if !name.is_empty() {
                        entries.push(AclEntry::Group {
                            name: name.to_string(),
                            bits,
                        });
                    }
                }
                _ => {}
            }
        }
        Self { entries }
    }

    /// Users and groups with at least read permission, in ACL order,
    /// deduplicated.
    #[must_use]
    pub fn read_principals(&self) -> (Vec<String>, Vec<String>) {
        let mut users: Vec<String> = Vec::new();
        let mut groups: Vec<String> = Vec::new();
        for entry in &self.entries {
            match entry {
                AclEntry::User { name, bits } if bits.read => {
                    if !users.contains(name) {
                        users.push(name.clone());
                    }
                }
                AclEntry::Group { name, bits } if bits.read => {
                    if !groups.contains(name) {
                        groups.push(name.clone());
                    }
                }
                _ => {}
            }
        }
        (users, groups)
    }

    /// One policy item per principal, each carrying that principal's own
    /// translated permissions. Principals whose permissions translate to
    /// nothing are dropped; the first entry wins when a principal repeats.
    #[must_use]
    pub fn policy_items(&self) -> Vec<PolicyItem> {
        let mut items = Vec::new();
        let mut seen_users = BTreeSet::new();
        let mut seen_groups = BTreeSet::new();
        for entry in &self.entries {
            let (name, bits, is_user) = match entry {
                AclEntry::User { name, bits } => (name, *bits, true),
                AclEntry::Group { name, bits } => (name, *bits, false),
            };
            let seen = if is_user {
                &mut seen_users
            } else {
                &mut seen_groups
            };
            if !seen.insert(name.clone()) {
                continue;
            }
            let accesses = translate_posix(bits);
            if accesses.is_empty() {
                continue;
            }
            items.push(PolicyItem {
                accesses,
                users: if is_user { vec![name.clone()] } else { Vec::new() },
                groups: if is_user { Vec::new() } else { vec![name.clone()] },
                roles: Vec::new(),
                ..PolicyItem::default()
            });
        }
        items
    }
}

/// Read access to filesystem ACL metadata.
#[async_trait]
pub trait AclProvider: Send + Sync {
    /// ACL document for a path, or `None` when the path is missing or
    /// unreadable.
    async fn get_acl(&self, path: &str) -> Option<AclDocument>;

    /// Names of immediate child directories, empty on any failure.
    async fn list_child_dirs(&self, path: &str) -> Vec<String>;
}

/// Reconstruct target policies for one root from filesystem ACLs.
///
/// `root_path` is the directory backing the root (e.g. `/data/fid3`).
/// Volume and bucket policies grant read to every principal with read on
/// the root directory; each child directory becomes a bucket and gets a
/// key policy with that directory's own per-principal permissions.
pub async fn resolve_from_acls(
    provider: &dyn AclProvider,
    root: &RootIdentifier,
    root_path: &str,
    target_service: &str,
) -> Vec<TargetPolicy> {
    let Some(root_acl) = provider.get_acl(root_path).await else {
        warn!(root = %root, path = root_path, "no filesystem acls available");
        return Vec::new();
    };

    let (users, groups) = root_acl.read_principals();
    if users.is_empty() && groups.is_empty() {
        warn!(root = %root, path = root_path, "no read permissions in filesystem acls");
        return Vec::new();
    }

    let read_item = PolicyItem {
        accesses: vec![AccessGrant::allowed(AccessKind::Read)],
        users,
        groups,
        roles: Vec::new(),
        ..PolicyItem::default()
    };

    let mut policies = vec![TargetPolicy {
        service: target_service.to_string(),
        name: format!("{root}_volume_policy_from_hdfs_acls"),
        description: Some(format!("Created from HDFS ACLs for {root_path}")),
        resources: TargetResources::volume(root),
        policy_items: vec![read_item.clone()],
    }];

    let buckets = provider.list_child_dirs(root_path).await;
    if buckets.is_empty() {
        warn!(root = %root, path = root_path, "no bucket directories found");
        return policies;
    }
    debug!(root = %root, buckets = buckets.join(","), "found bucket directories");

    let bucket_set: BTreeSet<String> = buckets.iter().cloned().collect();
    if let Some(resources) = TargetResources::buckets(root, &bucket_set) {
        policies.push(TargetPolicy {
            service: target_service.to_string(),
            name: format!("{root}_bucket_policy_from_hdfs_acls"),
            description: Some(format!(
                "Created from HDFS ACLs for buckets: {}",
                buckets.join(", ")
            )),
            resources,
            policy_items: vec![read_item],
        });
    }

    for bucket in &buckets {
        let bucket_path = format!("{root_path}/{bucket}");
        let Some(bucket_acl) = provider.get_acl(&bucket_path).await else {
            continue;
        };
        let items = bucket_acl.policy_items();
        if items.is_empty() {
            continue;
        }
        policies.push(TargetPolicy {
            service: target_service.to_string(),
            name: format!("{root}_{bucket}_key_policy_from_hdfs_acls"),
            description: Some(format!("Created from HDFS ACLs for {bucket_path}")),
            resources: TargetResources::key(root, bucket, "*"),
            policy_items: items,
        });
    }

    info!(
        root = %root,
        count = policies.len(),
        "reconstructed policies from filesystem acls"
    );
    policies
}
