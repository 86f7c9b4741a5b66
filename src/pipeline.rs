//! Fetch, compare, export.
//!
//! The pipeline takes its configuration and both sources explicitly, returns
//! a [`RunReport`] on success, and leaves exit behavior to the caller. Output
//! is all-or-nothing: both CSV files are written or neither is.

use tracing::{debug, info};

use crate::config::RunConfig;
use crate::inventory::{DirectoryComputer, DirectorySource, PatchServerComputer, PatchServerSource};
use crate::recon::{find_missing_from_patch_server, find_stale_in_patch_server};
use crate::report;
use crate::Result;

/// Outcome of a successful reconciliation run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Enabled directory computers (after scope filtering) the patch server
    /// does not manage.
    pub missing: Vec<DirectoryComputer>,
    /// Patch-server targets whose directory account is disabled.
    pub stale: Vec<PatchServerComputer>,
}

/// Fetch both inventories and run both comparisons.
///
/// The missing comparison runs against enabled accounts; the stale comparison
/// runs against disabled accounts, since a target whose account is disabled is
/// the one likely decommissioned.
pub async fn run(
    config: &RunConfig,
    directory: &dyn DirectorySource,
    patch_server: &dyn PatchServerSource,
) -> Result<RunReport> {
    let (enabled, disabled, targets) = tokio::join!(
        directory.get_computers(true),
        directory.get_computers(false),
        patch_server.get_computer_targets(),
    );
    let (enabled, disabled, targets) = (enabled?, disabled?, targets?);

    debug!(
        enabled = enabled.len(),
        disabled = disabled.len(),
        targets = targets.len(),
        "inventories fetched"
    );

    let missing = find_missing_from_patch_server(&enabled, &targets, config.scope);
    let stale = find_stale_in_patch_server(&disabled, &targets);

    info!(
        missing = missing.len(),
        stale = stale.len(),
        scope = %config.scope,
        "reconciliation complete"
    );

    Ok(RunReport { missing, stale })
}

/// Write both CSV reports.
///
/// Both reports are serialized in memory before the first byte hits disk, so
/// a serialization failure leaves no partial output behind.
pub fn export(config: &RunConfig, report: &RunReport) -> Result<()> {
    let missing_bytes = report::to_csv_bytes(&report.missing)?;
    let stale_bytes = report::to_csv_bytes(&report.stale)?;

    std::fs::create_dir_all(&config.output_dir)?;
    report::write_report(&config.missing_path(), &missing_bytes, report.missing.len())?;
    report::write_report(&config.stale_path(), &stale_bytes, report.stale.len())?;
    Ok(())
}
