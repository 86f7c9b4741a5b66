//! End-to-end pipeline tests with mock sources and a temporary output
//! directory.

use tempfile::TempDir;

use wsus_recon::inventory::{
    DirectoryComputer, MockDirectorySource, MockPatchServerSource, PatchServerComputer,
    ScopeFilter,
};
use wsus_recon::{pipeline, RunConfig};

fn ad(name: &str, os: &str, enabled: bool) -> DirectoryComputer {
    DirectoryComputer {
        dns_host_name: name.to_string(),
        operating_system: os.to_string(),
        enabled,
    }
}

fn wsus(name: &str, ip: &str) -> PatchServerComputer {
    PatchServerComputer {
        full_domain_name: name.to_string(),
        ip_address: ip.to_string(),
        last_sync_time: None,
        last_sync_result: "Succeeded".to_string(),
        last_reported_status_time: None,
    }
}

fn config_in(dir: &TempDir) -> RunConfig {
    RunConfig {
        output_dir: dir.path().join("Output"),
        ..RunConfig::default()
    }
}

#[tokio::test]
async fn writes_both_csv_reports_with_headers_and_rows() {
    let temp = TempDir::new().unwrap();
    let config = config_in(&temp);

    let directory = MockDirectorySource::new(vec![
        ad("srv01.corp.local", "Windows Server 2019", true),
        ad("ws02.corp.local", "Windows 10", true),
        ad("retired.corp.local", "Windows Server 2012", false),
    ]);
    let patch_server = MockPatchServerSource::new(vec![
        wsus("srv01.corp.local", "10.0.0.11"),
        wsus("ghost.corp.local", "10.0.0.99"),
    ]);

    let report = pipeline::run(&config, &directory, &patch_server)
        .await
        .unwrap();
    pipeline::export(&config, &report).unwrap();

    let missing = std::fs::read_to_string(config.missing_path()).unwrap();
    let lines: Vec<&str> = missing.lines().collect();
    assert_eq!(lines[0], "DNSHostName,OperatingSystem,Enabled");
    assert_eq!(lines[1], "ws02.corp.local,Windows 10,true");
    assert_eq!(lines.len(), 2);

    let stale = std::fs::read_to_string(config.stale_path()).unwrap();
    let lines: Vec<&str> = stale.lines().collect();
    assert_eq!(
        lines[0],
        "FullDomainName,IPAddress,LastSyncTime,LastSyncResult,LastReportedStatusTime"
    );
    assert_eq!(lines[1], "ghost.corp.local,10.0.0.99,,Succeeded,");
    assert_eq!(lines.len(), 2);
}

#[tokio::test]
async fn scope_servers_excludes_workstations_from_the_missing_report() {
    let temp = TempDir::new().unwrap();
    let config = RunConfig {
        scope: ScopeFilter::Servers,
        ..config_in(&temp)
    };

    let directory = MockDirectorySource::new(vec![
        ad("srv01.corp.local", "Windows Server 2019", true),
        ad("ws02.corp.local", "Windows 10", true),
    ]);
    let patch_server = MockPatchServerSource::new(vec![]);

    let report = pipeline::run(&config, &directory, &patch_server)
        .await
        .unwrap();
    assert_eq!(report.missing.len(), 1);
    assert_eq!(report.missing[0].dns_host_name, "srv01.corp.local");
}

#[tokio::test]
async fn empty_inventories_produce_empty_reports_not_errors() {
    let temp = TempDir::new().unwrap();
    let config = config_in(&temp);

    let directory = MockDirectorySource::new(vec![]);
    let patch_server = MockPatchServerSource::new(vec![]);

    let report = pipeline::run(&config, &directory, &patch_server)
        .await
        .unwrap();
    assert!(report.missing.is_empty());
    assert!(report.stale.is_empty());

    pipeline::export(&config, &report).unwrap();

    // empty reports still carry the header row
    let missing = std::fs::read_to_string(config.missing_path()).unwrap();
    assert_eq!(missing, "DNSHostName,OperatingSystem,Enabled\n");
    let stale = std::fs::read_to_string(config.stale_path()).unwrap();
    assert_eq!(
        stale,
        "FullDomainName,IPAddress,LastSyncTime,LastSyncResult,LastReportedStatusTime\n"
    );
}

#[tokio::test]
async fn failed_directory_query_leaves_no_output_files() {
    let temp = TempDir::new().unwrap();
    let config = config_in(&temp);

    let directory = MockDirectorySource::failing();
    let patch_server = MockPatchServerSource::new(vec![wsus("srv01.corp.local", "10.0.0.11")]);

    let result = pipeline::run(&config, &directory, &patch_server).await;
    assert!(result.is_err());
    assert!(!config.output_dir.exists());
}

#[tokio::test]
async fn failed_patch_server_query_leaves_no_output_files() {
    let temp = TempDir::new().unwrap();
    let config = config_in(&temp);

    let directory = MockDirectorySource::new(vec![ad("srv01.corp.local", "Windows Server", true)]);
    let patch_server = MockPatchServerSource::failing();

    let result = pipeline::run(&config, &directory, &patch_server).await;
    assert!(result.is_err());
    assert!(!config.output_dir.exists());
}

#[tokio::test]
async fn reruns_over_unchanged_inputs_write_identical_files() {
    let temp = TempDir::new().unwrap();
    let config = config_in(&temp);

    let directory = MockDirectorySource::new(vec![
        ad("b.corp.local", "Windows 10", true),
        ad("a.corp.local", "Windows Server 2019", true),
    ]);
    let patch_server = MockPatchServerSource::new(vec![wsus("zz.corp.local", "10.0.0.5")]);

    let first = pipeline::run(&config, &directory, &patch_server)
        .await
        .unwrap();
    pipeline::export(&config, &first).unwrap();
    let missing_first = std::fs::read(config.missing_path()).unwrap();
    let stale_first = std::fs::read(config.stale_path()).unwrap();

    let second = pipeline::run(&config, &directory, &patch_server)
        .await
        .unwrap();
    pipeline::export(&config, &second).unwrap();
    assert_eq!(std::fs::read(config.missing_path()).unwrap(), missing_first);
    assert_eq!(std::fs::read(config.stale_path()).unwrap(), stale_first);
}
