//! Policy classification and translation engine.
//!
//! Converts path-hierarchical filesystem access policies into
//! volume/bucket/key object-store policies. The crate is pure logic over
//! in-memory policy documents; fetching policies from a store and reading
//! filesystem ACLs live behind the seams in `opm-ranger` and `opm-hdfs`.

#![forbid(unsafe_code)]

pub mod access;
pub mod acl;
pub mod clone;
pub mod filter;
pub mod path;
pub mod policy;
pub mod synthesize;

pub use access::{translate_accesses, translate_posix, PosixBits};
pub use acl::{resolve_from_acls, AclDocument, AclEntry, AclProvider};
pub use clone::{clone_for_object_store, CloneOutcome};
pub use filter::{
    filter_policies, has_opaque_resource, is_boilerplate, partition_for_cleanup, ScopeFilter,
    RESERVED_DATABASES,
};
pub use path::{
    classify, parse_hive_location, root_identifier, split_bucket_and_key, Layer,
    ParsedHiveLocation, PathLevel,
};
pub use policy::{
    AccessGrant, AccessKind, PolicyFile, PolicyItem, ResourceValues, RootIdentifier, SourcePolicy,
    TargetPolicy, TargetResources,
};
pub use synthesize::{collect_roots, policies_for_root, synthesize};
