//! Run configuration.
//!
//! All knobs live in one explicit [`RunConfig`] value handed to the pipeline;
//! nothing is read from ambient state. Values come from an optional TOML file
//! with CLI flags layered on top (see `main.rs`), and every field has the
//! documented default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::inventory::ScopeFilter;
use crate::Result;

/// Configuration for one reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Patch server host name.
    #[serde(default = "default_server")]
    pub server: String,

    /// Patch server port (8530 plain, 8531 TLS by convention).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Use HTTPS when talking to the patch server.
    #[serde(default)]
    pub use_tls: bool,

    /// Which directory computers participate in the missing-from-patch-server
    /// comparison.
    #[serde(default)]
    pub scope: ScopeFilter,

    /// Directory the two CSV files are written into (created if absent).
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File name for directory computers missing from the patch server.
    #[serde(default = "default_missing_file")]
    pub missing_file: String,

    /// File name for patch-server targets with a disabled directory account.
    #[serde(default = "default_stale_file")]
    pub stale_file: String,

    /// Render result tables to stdout in addition to writing CSVs.
    #[serde(default)]
    pub interactive: bool,

    /// Directory service connection settings.
    #[serde(default)]
    pub directory: DirectoryConfig,
}

/// Connection settings for the directory service (LDAP).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Directory server hostname or IP address.
    #[serde(default = "default_server")]
    pub host: String,

    /// LDAP port (389 plain, 636 LDAPS).
    #[serde(default = "default_ldap_port")]
    pub port: u16,

    /// Use LDAPS.
    #[serde(default)]
    pub use_tls: bool,

    /// Base DN searched for computer accounts, e.g. "dc=corp,dc=local".
    #[serde(default)]
    pub base_dn: String,

    /// Bind DN, e.g. "cn=svc-recon,ou=service,dc=corp,dc=local".
    #[serde(default)]
    pub bind_dn: String,

    /// Bind password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_password: Option<String>,
}

fn default_server() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8530
}

fn default_ldap_port() -> u16 {
    389
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("Output")
}

fn default_missing_file() -> String {
    "MissingFromWsus.csv".to_string()
}

fn default_stale_file() -> String {
    "StaleInWsus.csv".to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            port: default_port(),
            use_tls: false,
            scope: ScopeFilter::default(),
            output_dir: default_output_dir(),
            missing_file: default_missing_file(),
            stale_file: default_stale_file(),
            interactive: false,
            directory: DirectoryConfig::default(),
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            host: default_server(),
            port: default_ldap_port(),
            use_tls: false,
            base_dn: String::new(),
            bind_dn: String::new(),
            bind_password: None,
        }
    }
}

impl RunConfig {
    /// Load configuration from a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Full paths of the two output files.
    pub fn missing_path(&self) -> PathBuf {
        self.output_dir.join(&self.missing_file)
    }

    pub fn stale_path(&self) -> PathBuf {
        self.output_dir.join(&self.stale_file)
    }

    /// Base URL of the patch server API endpoint.
    pub fn patch_server_url(&self) -> String {
        let protocol = if self.use_tls { "https" } else { "http" };
        format!("{}://{}:{}", protocol, self.server, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = RunConfig::default();
        assert_eq!(config.server, "localhost");
        assert_eq!(config.port, 8530);
        assert!(!config.use_tls);
        assert_eq!(config.scope, ScopeFilter::All);
        assert_eq!(config.output_dir, PathBuf::from("Output"));
        assert_eq!(config.missing_file, "MissingFromWsus.csv");
        assert_eq!(config.stale_file, "StaleInWsus.csv");
        assert!(!config.interactive);
        assert_eq!(config.directory.port, 389);
    }

    #[test]
    fn file_values_override_defaults_and_missing_keys_keep_them() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
server = "wsus.corp.local"
port = 8531
use_tls = true
scope = "servers"

[directory]
host = "dc01.corp.local"
base_dn = "dc=corp,dc=local"
"#
        )
        .unwrap();

        let config = RunConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server, "wsus.corp.local");
        assert_eq!(config.port, 8531);
        assert!(config.use_tls);
        assert_eq!(config.scope, ScopeFilter::Servers);
        // untouched keys fall back to defaults
        assert_eq!(config.missing_file, "MissingFromWsus.csv");
        assert_eq!(config.directory.host, "dc01.corp.local");
        assert_eq!(config.directory.port, 389);
    }

    #[test]
    fn patch_server_url_reflects_tls_flag() {
        let mut config = RunConfig::default();
        assert_eq!(config.patch_server_url(), "http://localhost:8530");
        config.use_tls = true;
        config.port = 8531;
        assert_eq!(config.patch_server_url(), "https://localhost:8531");
    }
}
