//! Permission model translation between HDFS and Ozone.
//!
//! HDFS grants read/write/execute; Ozone grants read/write/list/create/
//! delete. The mapping is lossy by design: execute alone has no Ozone
//! equivalent because nothing in the target model represents directory
//! traversal independent of listing.

use crate::policy::{AccessGrant, AccessKind};

/// POSIX permission bits as found in an ACL entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PosixBits {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl PosixBits {
    /// Parse an `rwx`-style permission string (e.g. `r-x`).
    #[must_use]
    pub fn parse(perms: &str) -> Self {
        Self {
            read: perms.contains('r'),
            write: perms.contains('w'),
            execute: perms.contains('x'),
        }
    }
}

/// Translate a source policy item's grants into Ozone grants.
///
/// Rules: read ⇒ read, write ⇒ write, read∧execute ⇒ +list,
/// write∧execute ⇒ +create +delete. Only allowed grants count; unknown
/// kinds are ignored. Output order is fixed and each kind appears at most
/// once, so the result is set-like regardless of input ordering.
#[must_use]
pub fn translate_accesses(accesses: &[AccessGrant]) -> Vec<AccessGrant> {
    let mut bits = PosixBits::default();
    for access in accesses {
        if !access.is_allowed {
            continue;
        }
        match access.kind {
            AccessKind::Read => bits.read = true,
            AccessKind::Write => bits.write = true,
            AccessKind::Execute => bits.execute = true,
            _ => {}
        }
    }
    translate_posix(bits)
}

/// Translate POSIX bits into Ozone grants using the same derivation table
/// as [`translate_accesses`].
#[must_use]
pub fn translate_posix(bits: PosixBits) -> Vec<AccessGrant> {
    let mut grants = Vec::new();
    if bits.read {
        grants.push(AccessGrant::allowed(AccessKind::Read));
    }
    if bits.write {
        grants.push(AccessGrant::allowed(AccessKind::Write));
    }
    if bits.read && bits.execute {
        grants.push(AccessGrant::allowed(AccessKind::List));
    }
    if bits.write && bits.execute {
        grants.push(AccessGrant::allowed(AccessKind::Create));
        grants.push(AccessGrant::allowed(AccessKind::Delete));
    }
    grants
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn kinds(grants: &[AccessGrant]) -> Vec<AccessKind> {
        grants.iter().map(|g| g.kind.clone()).collect()
    }

    #[test]
    fn read_alone_maps_to_read() {
        let out = translate_accesses(&[AccessGrant::allowed(AccessKind::Read)]);
        assert_eq!(kinds(&out), [AccessKind::Read]);
    }

    #[test]
    fn read_and_execute_adds_list() {
        let out = translate_accesses(&[
            AccessGrant::allowed(AccessKind::Read),
            AccessGrant::allowed(AccessKind::Execute),
        ]);
        assert_eq!(kinds(&out), [AccessKind::Read, AccessKind::List]);
    }

    #[test]
    fn write_and_execute_adds_create_and_delete() {
        let out = translate_accesses(&[
            AccessGrant::allowed(AccessKind::Write),
            AccessGrant::allowed(AccessKind::Execute),
        ]);
        assert_eq!(
            kinds(&out),
            [AccessKind::Write, AccessKind::Create, AccessKind::Delete]
        );
    }

    #[test]
    fn execute_alone_maps_to_nothing() {
        let out = translate_accesses(&[AccessGrant::allowed(AccessKind::Execute)]);
        assert!(out.is_empty());
    }

    #[test]
    fn disallowed_grants_are_ignored() {
        let out = translate_accesses(&[AccessGrant {
            kind: AccessKind::Read,
            is_allowed: false,
        }]);
        assert!(out.is_empty());
    }

    #[test]
    fn unknown_kinds_are_ignored() {
        let out = translate_accesses(&[
            AccessGrant::allowed(AccessKind::Other("select".to_string())),
            AccessGrant::allowed(AccessKind::Read),
        ]);
        assert_eq!(kinds(&out), [AccessKind::Read]);
    }

    #[test]
    fn posix_parse_matches_bit_letters() {
        assert_eq!(
            PosixBits::parse("r-x"),
            PosixBits {
                read: true,
                write: false,
                execute: true
            }
        );
        assert_eq!(PosixBits::parse("---"), PosixBits::default());
    }

    proptest! {
        /// Adding an input permission never removes an output permission.
        #[test]
        fn translation_is_monotonic(read in any::<bool>(), write in any::<bool>(), execute in any::<bool>()) {
            let base = PosixBits { read, write, execute };
            let base_out: std::collections::BTreeSet<_> =
                translate_posix(base).into_iter().map(|g| g.kind).collect();

            for grown in [
                PosixBits { read: true, ..base },
                PosixBits { write: true, ..base },
                PosixBits { execute: true, ..base },
            ] {
                let grown_out: std::collections::BTreeSet<_> =
                    translate_posix(grown).into_iter().map(|g| g.kind).collect();
                prop_assert!(base_out.is_subset(&grown_out));
            }
        }

        /// Every emitted grant is allowed and each kind appears at most once.
        #[test]
        fn output_is_set_like(read in any::<bool>(), write in any::<bool>(), execute in any::<bool>()) {
            let out = translate_posix(PosixBits { read, write, execute });
            let unique: std::collections::BTreeSet<_> =
                out.iter().map(|g| g.kind.clone()).collect();
            prop_assert_eq!(unique.len(), out.len());
            prop_assert!(out.iter().all(|g| g.is_allowed));
        }
    }
}
