//! # wsus-recon
//!
//! Reconciles two inventories of networked computers — computer accounts from
//! Active Directory and computer targets from a WSUS patch server — and
//! reports the discrepancies that matter for IT hygiene:
//!
//! - enabled directory accounts that the patch server does not manage
//! - patch-server targets whose directory account is disabled
//!
//! ## Usage
//!
//! ```bash
//! wsus-recon --server wsus.corp.local --port 8531 --use-tls --scope servers
//! ```
//!
//! ## Modules
//!
//! - `config` - Run configuration (CLI flags layered over an optional TOML file)
//! - `inventory` - Record types and the directory/patch-server source traits
//! - `recon` - The two pure comparison functions
//! - `report` - CSV export and plain-text table rendering
//! - `pipeline` - Fetch, compare, and export orchestration

pub mod config;
pub mod error;
pub mod inventory;
pub mod pipeline;
pub mod recon;
pub mod report;

pub use config::{DirectoryConfig, RunConfig};
pub use error::{Error, Result};
pub use inventory::{DirectoryComputer, PatchServerComputer, ScopeFilter};
pub use pipeline::{run, RunReport};
