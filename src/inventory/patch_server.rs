//! Patch server (WSUS) source.
//!
//! WSUS exposes its API over a SOAP endpoint. The client here speaks just
//! enough of it to list computer targets; everything else the API offers is
//! out of scope for reconciliation.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, info};

use crate::inventory::PatchServerComputer;
use crate::{Error, Result};

const API_PATH: &str = "/ApiRemoting30/WebService.asmx";
const SOAP_NS: &str = "http://www.microsoft.com/SoftwareDistribution/Server/ApiRemotingWebService";

/// Source of patch-server computer targets.
#[async_trait]
pub trait PatchServerSource: Send + Sync {
    /// Fetch every computer target registered with the patch server.
    async fn get_computer_targets(&self) -> Result<Vec<PatchServerComputer>>;
}

/// Real implementation talking to the WSUS API endpoint.
pub struct WsusClient {
    base_url: String,
    client: reqwest::Client,
}

impl WsusClient {
    /// `base_url` is `http(s)://server:port`, no trailing slash.
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn request_body() -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <GetComputerTargets xmlns="{SOAP_NS}" />
  </soap:Body>
</soap:Envelope>"#
        )
    }
}

#[async_trait]
impl PatchServerSource for WsusClient {
    async fn get_computer_targets(&self) -> Result<Vec<PatchServerComputer>> {
        let url = format!("{}{}", self.base_url, API_PATH);
        debug!(url = %url, "requesting computer targets from patch server");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{SOAP_NS}/GetComputerTargets\""))
            .body(Self::request_body())
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        let targets = parse_computer_targets(&body)?;

        info!(count = targets.len(), "fetched patch server computer targets");
        Ok(targets)
    }
}

/// Pull `ComputerTarget` records out of a SOAP response body.
pub fn parse_computer_targets(xml: &str) -> Result<Vec<PatchServerComputer>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut targets = Vec::new();
    let mut current: Option<PatchServerComputer> = None;
    let mut field: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if name == "ComputerTarget" {
                    current = Some(PatchServerComputer {
                        full_domain_name: String::new(),
                        ip_address: String::new(),
                        last_sync_time: None,
                        last_sync_result: String::new(),
                        last_reported_status_time: None,
                    });
                } else if current.is_some() {
                    field = Some(name);
                }
            }
            Event::Text(t) => {
                if let (Some(target), Some(name)) = (current.as_mut(), field.as_deref()) {
                    let text = t
                        .unescape()
                        .map_err(|e| Error::Parse(format!("bad XML text node: {e}")))?
                        .to_string();
                    match name {
                        "FullDomainName" => target.full_domain_name = text,
                        "IPAddress" => target.ip_address = text,
                        "LastSyncTime" => target.last_sync_time = parse_wsus_time(&text),
                        "LastSyncResult" => target.last_sync_result = text,
                        "LastReportedStatusTime" => {
                            target.last_reported_status_time = parse_wsus_time(&text);
                        }
                        _ => {}
                    }
                }
            }
            Event::End(e) => {
                let name = e.local_name();
                if name.as_ref() == b"ComputerTarget" {
                    if let Some(target) = current.take() {
                        if target.full_domain_name.is_empty() {
                            return Err(Error::Parse(
                                "ComputerTarget element without FullDomainName".to_string(),
                            ));
                        }
                        targets.push(target);
                    }
                } else {
                    field = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(targets)
}

/// WSUS reports times as ISO 8601; targets that never synced carry the .NET
/// epoch (year 1), mapped to `None` here.
fn parse_wsus_time(text: &str) -> Option<DateTime<Utc>> {
    if text.is_empty() || text.starts_with("0001-") {
        return None;
    }
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// In-memory source for tests.
#[derive(Default)]
pub struct MockPatchServerSource {
    targets: Vec<PatchServerComputer>,
    fail: bool,
}

impl MockPatchServerSource {
    pub fn new(targets: Vec<PatchServerComputer>) -> Self {
        Self {
            targets,
            fail: false,
        }
    }

    /// A source whose query always fails.
    pub fn failing() -> Self {
        Self {
            targets: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl PatchServerSource for MockPatchServerSource {
    async fn get_computer_targets(&self) -> Result<Vec<PatchServerComputer>> {
        if self.fail {
            return Err(Error::Query("mock patch server query failure".to_string()));
        }
        Ok(self.targets.clone())
    }
}
