//! Hierarchical path classification and Hive location URL parsing.
//!
//! HDFS paths follow a fixed two-level namespace prefix convention,
//! `/<namespace>/<root>/...` (e.g. `/data/fid1/raw/key1`): the third
//! segment is the root identifier, the fourth the bucket, anything deeper
//! a key. Hive warehouse locations come in two recognized URL shapes,
//! parsed here as named rules rather than inline patterns so new shapes
//! can be added without touching translation logic.

use crate::policy::RootIdentifier;

/// Resource level implied by a hierarchical path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PathLevel {
    /// `/<namespace>/<root>` — volume-equivalent.
    Volume,
    /// `/<namespace>/<root>/<bucket>` — bucket-equivalent.
    Bucket,
    /// Any deeper path — key-equivalent.
    Key,
}

fn segments(path: &str) -> Vec<&str> {
    path.trim_end_matches('/').split('/').collect()
}

/// Classify a path by its depth. Paths shallower than a volume (including
/// relative paths without a namespace prefix) classify as `None`.
#[must_use]
pub fn classify(path: &str) -> Option<PathLevel> {
    let parts = segments(path);
    if parts.first() != Some(&"") {
        return None;
    }
    match parts.len() {
        0..=2 => None,
        3 => Some(PathLevel::Volume),
        4 => Some(PathLevel::Bucket),
        _ => Some(PathLevel::Key),
    }
}

/// Extract the root identifier (third segment) from a path.
#[must_use]
pub fn root_identifier(path: &str) -> Option<RootIdentifier> {
    let parts = segments(path);
    if parts.first() != Some(&"") {
        return None;
    }
    parts
        .get(2)
        .filter(|segment| !segment.is_empty())
        .map(|segment| RootIdentifier::new(*segment))
}

/// Split the remainder after `/<namespace>/<root>/` into bucket and key.
///
/// The key is everything below the bucket, or `*` when the path stops at
/// the bucket. Returns `None` when the path does not belong to `root` or
/// has no bucket segment.
#[must_use]
pub fn split_bucket_and_key(path: &str, root: &RootIdentifier) -> Option<(String, String)> {
    let parts = segments(path);
    if parts.first() != Some(&"") || parts.get(2) != Some(&root.as_str()) {
        return None;
    }
    let bucket = parts.get(3).filter(|segment| !segment.is_empty())?;
    let key = if parts.len() > 4 {
        parts[4..].join("/")
    } else {
        "*".to_string()
    };
    Some(((*bucket).to_string(), key))
}

/// Warehouse layer vocabulary recognized inside Hive location URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Raw,
    Managed,
    Work,
}

impl Layer {
    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "raw" => Some(Self::Raw),
            "managed" => Some(Self::Managed),
            "work" => Some(Self::Work),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Managed => "managed",
            Self::Work => "work",
        }
    }
}

/// A Hive warehouse location successfully matched against a known shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHiveLocation {
    pub root: String,
    pub layer: Layer,
    pub database: String,
}

/// Parse the legacy-filesystem shape
/// `hdfs://<host>/data/<root>/<layer>/hive/<database>`.
///
/// Trailing segments after the database are tolerated and ignored.
#[must_use]
pub fn parse_hdfs_location(url: &str) -> Option<ParsedHiveLocation> {
    let rest = url.trim().strip_prefix("hdfs://")?;
    let parts: Vec<&str> = rest.split('/').collect();
    // [host, "data", root, layer, "hive", database, ...]
    if parts.len() < 6 || parts[1] != "data" || parts[4] != "hive" {
        return None;
    }
    parse_location_tail(parts[2], parts[3], parts[5])
}

/// Parse the object-store shape
/// `ofs://<service>/<root>/<layer>/hive/<database>`.
#[must_use]
pub fn parse_ofs_location(url: &str) -> Option<ParsedHiveLocation> {
    let rest = url.trim().strip_prefix("ofs://")?;
    let parts: Vec<&str> = rest.split('/').collect();
    // [service, root, layer, "hive", database, ...]
    if parts.len() < 5 || parts[3] != "hive" {
        return None;
    }
    parse_location_tail(parts[1], parts[2], parts[4])
}

/// Parse either recognized shape.
#[must_use]
pub fn parse_hive_location(url: &str) -> Option<ParsedHiveLocation> {
    parse_hdfs_location(url).or_else(|| parse_ofs_location(url))
}

fn parse_location_tail(root: &str, layer: &str, database: &str) -> Option<ParsedHiveLocation> {
    if root.is_empty() || database.is_empty() {
        return None;
    }
    Some(ParsedHiveLocation {
        root: root.to_string(),
        layer: Layer::from_segment(layer)?,
        database: database.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classify_by_depth() {
        assert_eq!(classify("/data/fid1"), Some(PathLevel::Volume));
        assert_eq!(classify("/data/fid1/"), Some(PathLevel::Volume));
        assert_eq!(classify("/data/fid1/raw"), Some(PathLevel::Bucket));
        assert_eq!(classify("/data/fid1/raw/k1"), Some(PathLevel::Key));
        assert_eq!(classify("/data/fid1/raw/k1/sub"), Some(PathLevel::Key));
        assert_eq!(classify("/data"), None);
        assert_eq!(classify("data/fid1"), None);
    }

    #[test]
    fn root_identifier_is_third_segment() {
        assert_eq!(
            root_identifier("/data/fid7/raw/x"),
            Some(RootIdentifier::new("fid7"))
        );
        assert_eq!(root_identifier("/data/fid7"), Some(RootIdentifier::new("fid7")));
        assert_eq!(root_identifier("/data"), None);
        assert_eq!(root_identifier("fid7"), None);
    }

    #[test]
    fn split_bucket_and_key_variants() {
        let root = RootIdentifier::new("fid1");
        assert_eq!(
            split_bucket_and_key("/data/fid1/raw/key1/sub", &root),
            Some(("raw".to_string(), "key1/sub".to_string()))
        );
        assert_eq!(
            split_bucket_and_key("/data/fid1/raw", &root),
            Some(("raw".to_string(), "*".to_string()))
        );
        assert_eq!(split_bucket_and_key("/data/fid1", &root), None);
        assert_eq!(split_bucket_and_key("/data/other/raw", &root), None);
    }

    #[test]
    fn hdfs_location_shape() {
        let parsed = parse_hdfs_location("hdfs://ns1/data/fid2/raw/hive/hdfs_db4").unwrap();
        assert_eq!(parsed.root, "fid2");
        assert_eq!(parsed.layer, Layer::Raw);
        assert_eq!(parsed.database, "hdfs_db4");

        assert!(parse_hdfs_location("hdfs://ns1/other/fid2/raw/hive/db").is_none());
        assert!(parse_hdfs_location("hdfs://ns1/data/fid2/archive/hive/db").is_none());
        assert!(parse_hdfs_location("ofs://svc/fid2/raw/hive/db").is_none());
    }

    #[test]
    fn ofs_location_shape() {
        let parsed = parse_ofs_location("ofs://ozone1756774157/fid2/managed/hive/hdfs_db5").unwrap();
        assert_eq!(parsed.root, "fid2");
        assert_eq!(parsed.layer, Layer::Managed);
        assert_eq!(parsed.database, "hdfs_db5");

        assert!(parse_ofs_location("ofs://svc/fid2/stage/hive/db").is_none());
    }

    #[test]
    fn either_shape_parses() {
        assert!(parse_hive_location("hdfs://ns1/data/fid2/work/hive/db").is_some());
        assert!(parse_hive_location("ofs://svc/fid2/work/hive/db").is_some());
        assert!(parse_hive_location("s3a://bucket/db").is_none());
    }
}
