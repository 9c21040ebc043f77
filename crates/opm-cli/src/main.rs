//! `opm` migrates Ranger HDFS/Hive policies to Ozone.
//!
//! The tool runs in one of three modes (hive, hdfs, both) and performs a
//! single action per invocation, from a read-only export up to a full
//! import of translated policies back into Ranger.

#![forbid(unsafe_code)]

mod config;
mod lists;
mod report;
mod run;
mod summary;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Which policy engine(s) an invocation processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Clone Hive database policies.
    Hive,
    /// Convert HDFS path policies.
    Hdfs,
    /// Both engines in one run.
    Both,
}

impl Mode {
    #[must_use]
    pub fn includes_hive(self) -> bool {
        matches!(self, Self::Hive | Self::Both)
    }

    #[must_use]
    pub fn includes_hdfs(self) -> bool {
        matches!(self, Self::Hdfs | Self::Both)
    }
}

/// How far the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// Export policies and stop.
    Export,
    /// Export and filter, then stop (hive only).
    Filter,
    /// Produce cloned Hive policies without importing (hive only).
    Clone,
    /// Produce translated policies without importing.
    Convert,
    /// Produce and import policies back into Ranger.
    Import,
    /// Delete superseded source policies (hive only).
    Cleanup,
}

/// Ranger HDFS/Hive to Ozone policy migration.
#[derive(Debug, Parser)]
#[command(name = "opm", version, about)]
pub struct Cli {
    /// Path to the TOML settings file.
    #[arg(long)]
    pub config: PathBuf,

    /// Operation mode.
    #[arg(long, value_enum)]
    pub mode: Mode,

    /// Action to perform.
    #[arg(long, value_enum)]
    pub action: Action,

    /// Ranger Hive service name (overrides settings).
    #[arg(long)]
    pub hive_service: Option<String>,

    /// Ranger HDFS service name (overrides settings).
    #[arg(long)]
    pub hdfs_service: Option<String>,

    /// Ranger Ozone service name (overrides settings).
    #[arg(long)]
    pub ozone_service: Option<String>,

    /// Prefix for cloned Ozone databases (overrides settings).
    #[arg(long)]
    pub ozone_prefix: Option<String>,

    /// Ozone service id for rewritten ofs:// URLs (overrides settings).
    #[arg(long)]
    pub ozone_service_id: Option<String>,

    /// Comma-separated database names to include (hive).
    #[arg(long)]
    pub databases: Option<String>,

    /// File of database names to include (hive).
    #[arg(long, conflicts_with = "databases")]
    pub databases_file: Option<PathBuf>,

    /// Comma-separated database names to exclude (hive).
    #[arg(long)]
    pub exclude_databases: Option<String>,

    /// File of database names to exclude (hive).
    #[arg(long, conflicts_with = "exclude_databases")]
    pub exclude_databases_file: Option<PathBuf>,

    /// Comma-separated root identifiers to include (hdfs).
    #[arg(long)]
    pub roots: Option<String>,

    /// Comma-separated root identifiers to exclude (hdfs).
    #[arg(long)]
    pub exclude_roots: Option<String>,

    /// Enable the filesystem ACL fallback (overrides settings).
    #[arg(long)]
    pub enable_acl_fallback: bool,

    /// Disable the filesystem ACL fallback (overrides settings).
    #[arg(long, conflicts_with = "enable_acl_fallback")]
    pub disable_acl_fallback: bool,

    /// Kerberos keytab path for the ACL fallback (overrides settings).
    #[arg(long)]
    pub keytab: Option<PathBuf>,

    /// Kerberos principal for the ACL fallback (overrides settings).
    #[arg(long)]
    pub principal: Option<String>,

    /// Write JSON report files for each stage.
    #[arg(long)]
    pub save_json: bool,

    /// Answer yes to confirmation prompts.
    #[arg(long, short = 'y')]
    pub yes: bool,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run::execute(cli).await
}
