//! HDFS shell error types.

use std::process::ExitStatus;

/// Errors from driving the HDFS client tools.
#[derive(Debug, thiserror::Error)]
pub enum HdfsError {
    /// A client tool exited unsuccessfully.
    #[error("{command} failed with {status}: {stderr}")]
    CommandFailed {
        /// Program that failed (kinit, hdfs, hadoop).
        command: &'static str,
        /// Exit status it returned.
        status: ExitStatus,
        /// Captured stderr, trimmed.
        stderr: String,
    },

    /// A client tool is not installed on this host.
    #[error("{command} not found, install the corresponding client")]
    CommandNotFound {
        command: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A client tool produced non-UTF-8 output.
    #[error("{command} produced invalid UTF-8 output")]
    InvalidOutput { command: &'static str },

    /// Spawning or waiting on a process failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for HDFS shell operations.
pub type HdfsResult<T> = Result<T, HdfsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_not_found_display() {
        let e = HdfsError::CommandNotFound {
            command: "kinit",
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(
            e.to_string(),
            "kinit not found, install the corresponding client"
        );
    }
}
