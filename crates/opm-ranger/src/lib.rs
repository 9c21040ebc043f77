//! Ranger policy store client.
//!
//! Thin async wrapper over the three REST operations the migration needs:
//! export a service's policies, import a policy, delete a policy by id.
//! All calls use basic auth; self-signed certificates can be accepted
//! explicitly for internal deployments.

#![forbid(unsafe_code)]

mod client;
mod error;

pub use client::*;
pub use error::*;
