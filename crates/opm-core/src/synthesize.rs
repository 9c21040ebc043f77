//! Target policy synthesis: one root identifier's worth of path-based
//! source policies becomes a minimal, deterministically named set of
//! volume/bucket/key policies.

use std::collections::BTreeSet;

use tracing::debug;

use crate::access::translate_accesses;
use crate::path::{classify, root_identifier, split_bucket_and_key, PathLevel};
use crate::policy::{
    AccessGrant, AccessKind, PolicyItem, RootIdentifier, SourcePolicy, TargetPolicy,
    TargetResources,
};

/// Root identifiers referenced by any path of any policy, minus excludes,
/// narrowed to includes when given. Sorted for reproducible processing.
#[must_use]
pub fn collect_roots(
    policies: &[SourcePolicy],
    include: Option<&[String]>,
    exclude: Option<&[String]>,
) -> BTreeSet<RootIdentifier> {
    let mut roots: BTreeSet<RootIdentifier> = policies
        .iter()
        .flat_map(|policy| policy.path_values())
        .filter_map(|path| root_identifier(path))
        .collect();

    if let Some(include) = include {
        roots.retain(|root| include.iter().any(|name| name == root.as_str()));
    }
    if let Some(exclude) = exclude {
        roots.retain(|root| !exclude.iter().any(|name| name == root.as_str()));
    }
    roots
}

/// Policies with at least one path under the given root.
#[must_use]
pub fn policies_for_root<'a>(
    root: &RootIdentifier,
    policies: &'a [SourcePolicy],
) -> Vec<&'a SourcePolicy> {
    policies
        .iter()
        .filter(|policy| {
            policy
                .path_values()
                .iter()
                .any(|path| root_identifier(path).as_ref() == Some(root))
        })
        .collect()
}

/// Levels a policy's paths imply. A policy with paths at several depths
/// belongs to every level any of them implies, not just the first.
fn levels(policy: &SourcePolicy) -> BTreeSet<PathLevel> {
    policy
        .path_values()
        .iter()
        .filter_map(|path| classify(path))
        .collect()
}

/// Synthesize the target policy set for one root identifier.
///
/// Volume and bucket policies coalesce every principal named anywhere in
/// the inputs into a single read grant; key policies are translated per
/// source policy and per path because their permission sets may differ.
/// Names are derived deterministically so re-running synthesis on the same
/// inputs re-submits identically named policies (upsert at the store).
#[must_use]
pub fn synthesize(
    root: &RootIdentifier,
    policies: &[&SourcePolicy],
    target_service: &str,
) -> Vec<TargetPolicy> {
    let mut output = Vec::new();

    let mut users = BTreeSet::new();
    let mut groups = BTreeSet::new();
    let mut roles = BTreeSet::new();
    for policy in policies {
        for item in &policy.policy_items {
            users.extend(item.users.iter().cloned());
            groups.extend(item.groups.iter().cloned());
            roles.extend(item.roles.iter().cloned());
        }
    }

    let coalesced_item = PolicyItem {
        accesses: vec![AccessGrant::allowed(AccessKind::Read)],
        users: users.into_iter().collect(),
        groups: groups.into_iter().collect(),
        roles: roles.into_iter().collect(),
        ..PolicyItem::default()
    };
    let has_principals = !coalesced_item.users.is_empty()
        || !coalesced_item.groups.is_empty()
        || !coalesced_item.roles.is_empty();

    if has_principals {
        output.push(TargetPolicy {
            service: target_service.to_string(),
            name: format!("{root}_volume_policy"),
            description: None,
            resources: TargetResources::volume(root),
            policy_items: vec![coalesced_item.clone()],
        });
    }

    let buckets: BTreeSet<String> = policies
        .iter()
        .filter(|policy| {
            levels(policy)
                .iter()
                .any(|level| matches!(level, PathLevel::Bucket | PathLevel::Key))
        })
        .flat_map(|policy| policy.path_values())
        .filter_map(|path| split_bucket_and_key(path, root))
        .map(|(bucket, _)| bucket)
        .collect();

    if let Some(resources) = TargetResources::buckets(root, &buckets) {
        output.push(TargetPolicy {
            service: target_service.to_string(),
            name: format!("{root}_bucket_policy"),
            description: None,
            resources,
            policy_items: vec![coalesced_item],
        });
    }

    for policy in policies {
        if !levels(policy).contains(&PathLevel::Key) {
            continue;
        }
        for path in policy.path_values() {
            if classify(path) != Some(PathLevel::Key) {
                continue;
            }
            let Some((bucket, key)) = split_bucket_and_key(path, root) else {
                continue;
            };
            output.push(key_policy(root, &bucket, &key, policy, target_service));
        }
    }

    debug!(
        root = %root,
        sources = policies.len(),
        targets = output.len(),
        "synthesized target policies"
    );
    output
}

fn key_policy(
    root: &RootIdentifier,
    bucket: &str,
    key: &str,
    source: &SourcePolicy,
    target_service: &str,
) -> TargetPolicy {
    let policy_items = source
        .policy_items
        .iter()
        .map(|item| {
            let accesses = translate_accesses(&item.accesses);
            if accesses.is_empty() {
                debug!(
                    policy = %source.name,
                    bucket,
                    key,
                    "policy item translated to no grants (execute-only input)"
                );
            }
            PolicyItem {
                accesses,
                users: item.users.clone(),
                groups: item.groups.clone(),
                roles: item.roles.clone(),
                ..PolicyItem::default()
            }
        })
        .collect();

    // Keys can span multiple segments; names stay flat.
    let key_fragment = key.replace('/', "_");
    TargetPolicy {
        service: target_service.to_string(),
        name: format!("{root}_{bucket}_{key_fragment}_key_policy"),
        description: None,
        resources: TargetResources::key(root, bucket, key),
        policy_items,
    }
}
