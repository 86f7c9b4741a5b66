//! Inventory record types and the source abstractions that produce them.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod directory;
pub mod patch_server;

pub use directory::{DirectorySource, LdapDirectorySource, MockDirectorySource};
pub use patch_server::{MockPatchServerSource, PatchServerSource, WsusClient};

/// One computer account as known to the directory service.
///
/// Read-only snapshot fetched once per run. `dns_host_name` is the join key
/// against the patch-server inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryComputer {
    /// Fully-qualified domain name.
    #[serde(rename = "DNSHostName")]
    pub dns_host_name: String,
    /// Free-text OS description, e.g. "Windows Server 2019 Standard".
    #[serde(rename = "OperatingSystem")]
    pub operating_system: String,
    /// Whether the account is active in the directory.
    #[serde(rename = "Enabled")]
    pub enabled: bool,
}

/// One computer target as known to the patch server.
///
/// Everything except `full_domain_name` is descriptive and carried through to
/// output unchanged; none of it participates in comparison logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchServerComputer {
    /// Fully-qualified domain name; the join key.
    #[serde(rename = "FullDomainName")]
    pub full_domain_name: String,
    #[serde(rename = "IPAddress")]
    pub ip_address: String,
    /// Last time the target synced with the patch server, if ever.
    #[serde(rename = "LastSyncTime")]
    pub last_sync_time: Option<DateTime<Utc>>,
    #[serde(rename = "LastSyncResult")]
    pub last_sync_result: String,
    #[serde(rename = "LastReportedStatusTime")]
    pub last_reported_status_time: Option<DateTime<Utc>>,
}

/// Which subset of directory computers participates in the
/// missing-from-patch-server comparison.
///
/// Classification is by substring: an `operating_system` containing "server"
/// (case-insensitive) is a server, everything else is a workstation. The
/// stale-in-patch-server comparison is intentionally unscoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeFilter {
    #[default]
    All,
    Servers,
    Computers,
}

impl ScopeFilter {
    /// Whether a directory computer with this OS description is in scope.
    pub fn matches(&self, operating_system: &str) -> bool {
        match self {
            ScopeFilter::All => true,
            ScopeFilter::Servers => is_server_os(operating_system),
            ScopeFilter::Computers => !is_server_os(operating_system),
        }
    }
}

fn is_server_os(operating_system: &str) -> bool {
    operating_system.to_ascii_lowercase().contains("server")
}

impl fmt::Display for ScopeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeFilter::All => write!(f, "all"),
            ScopeFilter::Servers => write!(f, "servers"),
            ScopeFilter::Computers => write!(f, "computers"),
        }
    }
}

impl FromStr for ScopeFilter {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(ScopeFilter::All),
            "servers" => Ok(ScopeFilter::Servers),
            "computers" => Ok(ScopeFilter::Computers),
            other => Err(crate::Error::Parse(format!(
                "invalid scope '{other}', expected all, servers or computers"
            ))),
        }
    }
}
