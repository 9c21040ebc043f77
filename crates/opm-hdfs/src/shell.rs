//! Shelling out to the HDFS client tools.
//!
//! The migration host is expected to carry a configured Hadoop client;
//! everything here runs `kinit`, `hdfs`, and `hadoop` as subprocesses
//! rather than speaking the NameNode protocol directly.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use opm_core::acl::{AclDocument, AclProvider};

use crate::error::{HdfsError, HdfsResult};

/// Keytab-based Kerberos identity.
#[derive(Debug, Clone)]
pub struct KerberosAuth {
    pub keytab_path: PathBuf,
    pub principal: String,
}

impl KerberosAuth {
    #[must_use]
    pub fn new(keytab_path: impl Into<PathBuf>, principal: impl Into<String>) -> Self {
        Self {
            keytab_path: keytab_path.into(),
            principal: principal.into(),
        }
    }

    /// Obtain a ticket for the configured principal.
    ///
    /// # Errors
    ///
    /// Returns an error when `kinit` is missing or exits unsuccessfully.
    pub async fn kinit(&self) -> HdfsResult<()> {
        let output = run(
            "kinit",
            Command::new("kinit")
                .arg("-kt")
                .arg(&self.keytab_path)
                .arg(&self.principal),
        )
        .await?;
        if !output.status.success() {
            return Err(command_failed("kinit", &output));
        }
        info!(principal = %self.principal, "kerberos authentication successful");
        Ok(())
    }
}

/// ACL access via the `hdfs` and `hadoop` command-line tools.
///
/// When an identity is configured, every operation re-authenticates
/// first; tickets are cheap and this avoids tracking ticket lifetime.
#[derive(Debug, Clone)]
pub struct HdfsShell {
    auth: Option<KerberosAuth>,
}

impl HdfsShell {
    #[must_use]
    pub const fn new(auth: Option<KerberosAuth>) -> Self {
        Self { auth }
    }

    async fn ensure_auth(&self) -> HdfsResult<()> {
        match &self.auth {
            Some(auth) => auth.kinit().await,
            None => Ok(()),
        }
    }

    /// Whether a path exists, via `hadoop fs -test -e`.
    ///
    /// # Errors
    ///
    /// Returns an error when authentication fails or the tool is missing.
    pub async fn path_exists(&self, path: &str) -> HdfsResult<bool> {
        self.ensure_auth().await?;
        let output = run(
            "hadoop",
            Command::new("hadoop").args(["fs", "-test", "-e", path]),
        )
        .await?;
        Ok(output.status.success())
    }

    /// Raw `getfacl` output for a path.
    ///
    /// # Errors
    ///
    /// Returns an error when authentication fails, the path is missing,
    /// or the tool exits unsuccessfully.
    pub async fn getfacl(&self, path: &str) -> HdfsResult<String> {
        self.ensure_auth().await?;
        let output = run("hdfs", Command::new("hdfs").args(["dfs", "-getfacl", path])).await?;
        if !output.status.success() {
            return Err(command_failed("hdfs", &output));
        }
        utf8("hdfs", output.stdout)
    }

    /// Names of immediate child directories, via `hdfs dfs -ls`.
    ///
    /// # Errors
    ///
    /// Returns an error when authentication fails or the tool exits
    /// unsuccessfully.
    pub async fn list_dirs(&self, path: &str) -> HdfsResult<Vec<String>> {
        self.ensure_auth().await?;
        let output = run("hdfs", Command::new("hdfs").args(["dfs", "-ls", path])).await?;
        if !output.status.success() {
            return Err(command_failed("hdfs", &output));
        }
        Ok(parse_ls_directories(&utf8("hdfs", output.stdout)?))
    }
}

#[async_trait]
impl AclProvider for HdfsShell {
    async fn get_acl(&self, path: &str) -> Option<AclDocument> {
        match self.path_exists(path).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(path, "path does not exist");
                return None;
            }
            Err(error) => {
                warn!(path, %error, "existence check failed");
                return None;
            }
        }
        match self.getfacl(path).await {
            Ok(text) => Some(AclDocument::parse(&text)),
            Err(error) => {
                warn!(path, %error, "getfacl failed");
                None
            }
        }
    }

    async fn list_child_dirs(&self, path: &str) -> Vec<String> {
        match self.list_dirs(path).await {
            Ok(dirs) => dirs,
            Err(error) => {
                warn!(path, %error, "directory listing failed");
                Vec::new()
            }
        }
    }
}

/// Extract directory names from `hdfs dfs -ls` output: one `d`-flagged
/// line per directory, path in the last column.
#[must_use]
pub fn parse_ls_directories(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter(|line| line.starts_with('d'))
        .filter_map(|line| line.split_whitespace().next_back())
        .filter_map(|full_path| {
            Path::new(full_path)
                .file_name()
                .and_then(|name| name.to_str())
        })
        .map(ToString::to_string)
        .collect()
}

async fn run(command: &'static str, prepared: &mut Command) -> HdfsResult<Output> {
    debug!(command, "running client tool");
    prepared.output().await.map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            HdfsError::CommandNotFound { command, source }
        } else {
            HdfsError::Io(source)
        }
    })
}

fn command_failed(command: &'static str, output: &Output) -> HdfsError {
    HdfsError::CommandFailed {
        command,
        status: output.status,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

fn utf8(command: &'static str, bytes: Vec<u8>) -> HdfsResult<String> {
    String::from_utf8(bytes).map_err(|_| HdfsError::InvalidOutput { command })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ls_parsing_keeps_only_directories() {
        let listing = "\
Found 3 items
drwxr-xr-x   - hdfs supergroup          0 2024-01-05 09:12 /data/fid1/raw
-rw-r--r--   3 hdfs supergroup       1024 2024-01-05 09:12 /data/fid1/README
drwxrwx---   - etl  etl                 0 2024-02-11 17:40 /data/fid1/work
";
        assert_eq!(parse_ls_directories(listing), ["raw", "work"]);
    }

    #[test]
    fn ls_parsing_handles_empty_output() {
        assert_eq!(parse_ls_directories(""), Vec::<String>::new());
        assert_eq!(parse_ls_directories("Found 0 items\n"), Vec::<String>::new());
    }
}
