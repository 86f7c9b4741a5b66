//! The reconciliation comparisons.
//!
//! Two pure, single-pass set differences over the in-memory inventories.
//! Neither function mutates its inputs, both tolerate empty inputs, and both
//! sort their output so repeated runs over unchanged inputs are identical
//! byte for byte.
//!
//! Join keys (AD `dNSHostName` vs WSUS `FullDomainName`) are compared
//! case-insensitively: the two systems routinely disagree on casing for the
//! same machine, and an exact-match join would report false discrepancies.
//! Output records keep their original casing.

use std::collections::HashSet;

use crate::inventory::{DirectoryComputer, PatchServerComputer, ScopeFilter};

fn join_key(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Directory computers, after scope filtering, that the patch server does not
/// manage.
///
/// Callers are expected to pass enabled accounts only; disabled accounts are
/// decommissioned machines and their absence from the patch server is normal.
pub fn find_missing_from_patch_server(
    directory: &[DirectoryComputer],
    patch_server: &[PatchServerComputer],
    scope: ScopeFilter,
) -> Vec<DirectoryComputer> {
    let known: HashSet<String> = patch_server
        .iter()
        .map(|t| join_key(&t.full_domain_name))
        .collect();

    let mut missing: Vec<DirectoryComputer> = directory
        .iter()
        .filter(|c| scope.matches(&c.operating_system))
        .filter(|c| !known.contains(&join_key(&c.dns_host_name)))
        .cloned()
        .collect();

    missing.sort_by(|a, b| a.dns_host_name.cmp(&b.dns_host_name));
    missing
}

/// Patch-server targets with no counterpart in the given directory accounts.
///
/// Callers are expected to pass *disabled* accounts, so a hit means "the
/// patch server still tracks this machine but its account is disabled" —
/// likely decommissioned. Intentionally unscoped by OS type.
pub fn find_stale_in_patch_server(
    directory: &[DirectoryComputer],
    patch_server: &[PatchServerComputer],
) -> Vec<PatchServerComputer> {
    let known: HashSet<String> = directory
        .iter()
        .map(|c| join_key(&c.dns_host_name))
        .collect();

    let mut stale: Vec<PatchServerComputer> = patch_server
        .iter()
        .filter(|t| !known.contains(&join_key(&t.full_domain_name)))
        .cloned()
        .collect();

    stale.sort_by(|a, b| a.full_domain_name.cmp(&b.full_domain_name));
    stale
}
