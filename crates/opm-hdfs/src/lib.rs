//! HDFS client tool integration.
//!
//! Provides the filesystem side of the ACL fallback: Kerberos
//! authentication via keytab and ACL/directory reads through the
//! installed `hdfs` and `hadoop` command-line tools.

#![forbid(unsafe_code)]

mod error;
mod shell;

pub use error::*;
pub use shell::*;
