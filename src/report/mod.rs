//! Result export and display.
//!
//! CSV files carry a header row from the record's serde field names, one
//! record per line, UTF-8, no type-descriptor line. The table renderer is the
//! terminal stand-in for the original interactive grid view.

use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::inventory::{DirectoryComputer, PatchServerComputer};
use crate::Result;

/// Serialize records to CSV bytes without touching the filesystem.
///
/// Keeping serialization separate from file writes lets the pipeline stage
/// both reports in memory and write all or nothing. The header row is written
/// unconditionally so an empty report still carries the record shape.
pub fn to_csv_bytes<T: Serialize + TableRow>(records: &[T]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(T::headers())?;
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| crate::Error::Csv(e.into_error().into()))
}

/// Write one staged CSV report to disk.
pub fn write_report(path: &Path, bytes: &[u8], rows: usize) -> Result<()> {
    std::fs::write(path, bytes)?;
    info!(path = %path.display(), rows, "wrote report");
    Ok(())
}

/// Rows for the plain-text table view.
pub trait TableRow {
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

impl TableRow for DirectoryComputer {
    fn headers() -> &'static [&'static str] {
        &["DNSHostName", "OperatingSystem", "Enabled"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.dns_host_name.clone(),
            self.operating_system.clone(),
            self.enabled.to_string(),
        ]
    }
}

impl TableRow for PatchServerComputer {
    fn headers() -> &'static [&'static str] {
        &[
            "FullDomainName",
            "IPAddress",
            "LastSyncTime",
            "LastSyncResult",
            "LastReportedStatusTime",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.full_domain_name.clone(),
            self.ip_address.clone(),
            self.last_sync_time
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            self.last_sync_result.clone(),
            self.last_reported_status_time
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
        ]
    }
}

/// Render records as an aligned plain-text table with a title line.
pub fn render_table<T: TableRow>(title: &str, records: &[T]) -> String {
    let headers = T::headers();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    let rows: Vec<Vec<String>> = records.iter().map(TableRow::cells).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let mut out = String::new();
    out.push_str(&format!("{title} ({} rows)\n", rows.len()));
    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{h:<width$}", width = widths[i]))
        .collect();
    out.push_str(&header_line.join("  "));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');
    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{cell:<width$}", width = widths[i]))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_directory() -> Vec<DirectoryComputer> {
        vec![DirectoryComputer {
            dns_host_name: "b.corp.local".to_string(),
            operating_system: "Windows 10".to_string(),
            enabled: true,
        }]
    }

    #[test]
    fn csv_has_header_row_and_one_line_per_record() {
        let bytes = to_csv_bytes(&sample_directory()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "DNSHostName,OperatingSystem,Enabled");
        assert_eq!(lines[1], "b.corp.local,Windows 10,true");
    }

    #[test]
    fn csv_of_empty_input_is_header_only() {
        let bytes = to_csv_bytes::<PatchServerComputer>(&[]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "FullDomainName,IPAddress,LastSyncTime,LastSyncResult,LastReportedStatusTime\n"
        );

        let bytes = to_csv_bytes::<DirectoryComputer>(&[]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "DNSHostName,OperatingSystem,Enabled\n");
    }

    #[test]
    fn missing_sync_times_serialize_as_empty_fields() {
        let targets = vec![PatchServerComputer {
            full_domain_name: "ws17.corp.local".to_string(),
            ip_address: "10.0.1.17".to_string(),
            last_sync_time: None,
            last_sync_result: "NotYetSynced".to_string(),
            last_reported_status_time: None,
        }];
        let text = String::from_utf8(to_csv_bytes(&targets).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "FullDomainName,IPAddress,LastSyncTime,LastSyncResult,LastReportedStatusTime"
        );
        assert_eq!(lines[1], "ws17.corp.local,10.0.1.17,,NotYetSynced,");
    }

    #[test]
    fn table_is_aligned_and_counts_rows() {
        let table = render_table("Missing from WSUS", &sample_directory());
        assert!(table.starts_with("Missing from WSUS (1 rows)\n"));
        assert!(table.contains("DNSHostName   OperatingSystem  Enabled"));
        assert!(table.contains("b.corp.local  Windows 10       true"));
    }
}
