//! Directory service source.
//!
//! Trait-based abstraction over the directory query so the pipeline can be
//! tested without a domain controller, plus the real LDAP implementation.

use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use tracing::{debug, info, warn};

use crate::config::DirectoryConfig;
use crate::inventory::DirectoryComputer;
use crate::{Error, Result};

/// ACCOUNTDISABLE bit of the AD userAccountControl attribute.
const UAC_ACCOUNT_DISABLE: u32 = 0x2;

/// Source of directory computer accounts.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// Fetch all computer accounts with the given enabled state.
    async fn get_computers(&self, enabled: bool) -> Result<Vec<DirectoryComputer>>;
}

/// Real implementation querying Active Directory over LDAP.
pub struct LdapDirectorySource {
    config: DirectoryConfig,
}

impl LdapDirectorySource {
    pub fn new(config: DirectoryConfig) -> Result<Self> {
        if config.base_dn.is_empty() {
            return Err(Error::Config(
                "directory.base_dn is required for LDAP queries".to_string(),
            ));
        }
        Ok(Self { config })
    }

    fn url(&self) -> String {
        let protocol = if self.config.use_tls { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", protocol, self.config.host, self.config.port)
    }
}

#[async_trait]
impl DirectorySource for LdapDirectorySource {
    async fn get_computers(&self, enabled: bool) -> Result<Vec<DirectoryComputer>> {
        let url = self.url();
        debug!(url = %url, "connecting to directory server");

        let settings = LdapConnSettings::new();
        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url).await?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        let bind_password = self.config.bind_password.as_deref().unwrap_or("");
        debug!(bind_dn = %self.config.bind_dn, "performing LDAP bind");
        ldap.simple_bind(&self.config.bind_dn, bind_password)
            .await?
            .success()
            .map_err(|e| Error::Query(format!("LDAP bind failed for {}: {e}", self.config.bind_dn)))?;

        // 1.2.840.113556.1.4.803 is the AD bitwise-AND matching rule; bit 2
        // of userAccountControl marks a disabled account.
        let filter = if enabled {
            "(&(objectClass=computer)(!(userAccountControl:1.2.840.113556.1.4.803:=2)))"
        } else {
            "(&(objectClass=computer)(userAccountControl:1.2.840.113556.1.4.803:=2))"
        };

        let (entries, _res) = ldap
            .search(
                &self.config.base_dn,
                Scope::Subtree,
                filter,
                vec!["dNSHostName", "operatingSystem", "userAccountControl"],
            )
            .await?
            .success()
            .map_err(|e| Error::Query(format!("LDAP computer search failed: {e}")))?;

        let mut computers = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = SearchEntry::construct(entry);
            let Some(dns_host_name) = single_attr(&entry, "dNSHostName") else {
                // Freshly joined or broken accounts can lack a DNS name;
                // they cannot be joined against the patch server anyway.
                warn!(dn = %entry.dn, "skipping computer account without dNSHostName");
                continue;
            };
            let operating_system = single_attr(&entry, "operatingSystem").unwrap_or_default();
            let enabled = single_attr(&entry, "userAccountControl")
                .and_then(|v| v.parse::<u32>().ok())
                .map(|uac| uac & UAC_ACCOUNT_DISABLE == 0)
                .unwrap_or(enabled);

            computers.push(DirectoryComputer {
                dns_host_name,
                operating_system,
                enabled,
            });
        }

        ldap.unbind().await?;

        info!(
            count = computers.len(),
            enabled, "fetched directory computer accounts"
        );
        Ok(computers)
    }
}

fn single_attr(entry: &SearchEntry, name: &str) -> Option<String> {
    entry
        .attrs
        .get(name)
        .and_then(|values| values.first())
        .cloned()
}

/// In-memory source for tests.
#[derive(Default)]
pub struct MockDirectorySource {
    computers: Vec<DirectoryComputer>,
    fail: bool,
}

impl MockDirectorySource {
    pub fn new(computers: Vec<DirectoryComputer>) -> Self {
        Self {
            computers,
            fail: false,
        }
    }

    /// A source whose query always fails.
    pub fn failing() -> Self {
        Self {
            computers: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl DirectorySource for MockDirectorySource {
    async fn get_computers(&self, enabled: bool) -> Result<Vec<DirectoryComputer>> {
        if self.fail {
            return Err(Error::Query("mock directory query failure".to_string()));
        }
        Ok(self
            .computers
            .iter()
            .filter(|c| c.enabled == enabled)
            .cloned()
            .collect())
    }
}
