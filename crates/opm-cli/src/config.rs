//! Migration settings loaded from a TOML file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level settings file.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub ranger: RangerSettings,
    #[serde(default)]
    pub services: ServiceSettings,
    #[serde(default)]
    pub ozone: OzoneSettings,
    #[serde(default)]
    pub acl_fallback: AclFallbackSettings,
    #[serde(default)]
    pub filters: FilterSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing settings file {}", path.display()))
    }
}

/// Ranger connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RangerSettings {
    /// Base URL including port, e.g. `https://ranger.example.com:6182`.
    pub url: String,
    pub username: String,
    pub password: String,
    /// Accept self-signed certificates.
    #[serde(default)]
    pub accept_invalid_certs: bool,
    #[serde(default = "default_export_timeout_secs")]
    pub export_timeout_secs: u64,
    #[serde(default = "default_rpc_timeout_secs")]
    pub import_timeout_secs: u64,
    #[serde(default = "default_rpc_timeout_secs")]
    pub delete_timeout_secs: u64,
}

impl RangerSettings {
    #[must_use]
    pub const fn export_timeout(&self) -> Duration {
        Duration::from_secs(self.export_timeout_secs)
    }

    #[must_use]
    pub const fn import_timeout(&self) -> Duration {
        Duration::from_secs(self.import_timeout_secs)
    }

    #[must_use]
    pub const fn delete_timeout(&self) -> Duration {
        Duration::from_secs(self.delete_timeout_secs)
    }
}

const fn default_export_timeout_secs() -> u64 {
    300 // exports of large services take a while
}

const fn default_rpc_timeout_secs() -> u64 {
    60
}

/// Ranger service names per engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub hive: String,
    pub hdfs: String,
    pub ozone: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            hive: "cm_hive".to_string(),
            hdfs: "cm_hdfs".to_string(),
            ozone: "cm_ozone".to_string(),
        }
    }
}

/// Ozone-side naming parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OzoneSettings {
    /// Prefix for cloned database names.
    pub prefix: Option<String>,
    /// Service id used in rewritten `ofs://` URLs.
    pub service_id: Option<String>,
}

/// Filesystem ACL fallback settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AclFallbackSettings {
    pub enabled: bool,
    pub keytab_path: Option<PathBuf>,
    pub principal: Option<String>,
    /// Directory prefix the root identifier is appended to.
    pub root_dir_prefix: String,
}

impl Default for AclFallbackSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            keytab_path: None,
            principal: None,
            root_dir_prefix: "/data/".to_string(),
        }
    }
}

/// Default database filter list files.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub databases_file: Option<PathBuf>,
    pub exclude_databases_file: Option<PathBuf>,
}

/// Report output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory report files are written under, in per-day subdirectories.
    pub report_dir: PathBuf,
    /// Concurrent roots processed during conversion.
    pub concurrency: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            report_dir: PathBuf::from("/tmp/policy_migration"),
            concurrency: 4,
        }
    }
}
