use serde::de;
use serde_json::Deserializer;
use std::io::{BufReader, Read};
use tracing::trace;

use crate::error::ScanError;
use crate::model::ScanReport;

/// Decodes trivy's JSON output and collects every target's vulnerabilities
/// into a single report.
///
/// The aggregate takes the first report's target; the other targets are
/// dropped. Vulnerabilities keep their order within and across reports.
///
/// # Errors
///
/// - [`ScanError::ReportDecode`] if the input does not start with a JSON
///   array of reports
/// - [`ScanError::EmptyReport`] if the array is empty
///
/// # Example
///
/// ```
/// use imgscan::scanner::parse_scan_reports;
///
/// let json = r#"[
///     {"Target": "alpine:3.10 (alpine 3.10.2)", "Vulnerabilities": [{"VulnerabilityID": "CVE-2019-0001"}]},
///     {"Target": "app/package-lock.json", "Vulnerabilities": [{"VulnerabilityID": "CVE-2020-0002"}]}
/// ]"#;
///
/// let report = parse_scan_reports(json.as_bytes()).unwrap();
/// assert_eq!(report.target, "alpine:3.10 (alpine 3.10.2)");
/// assert_eq!(report.vulnerabilities.len(), 2);
/// ```
pub fn parse_scan_reports<R: Read>(reader: R) -> Result<ScanReport, ScanError> {
    // Only the first JSON value is read; anything after it is ignored
    let scan_reports: Vec<ScanReport> = Deserializer::from_reader(BufReader::new(reader))
        .into_iter::<Vec<ScanReport>>()
        .next()
        .unwrap_or_else(|| Err(de::Error::custom("scan report file is empty")))
        .map_err(ScanError::ReportDecode)?;

    let Some(first) = scan_reports.first() else {
        return Err(ScanError::EmptyReport);
    };

    // Collect all vulnerabilities into a single report
    let mut report = ScanReport::new(first.target.clone());
    for scan_report in scan_reports {
        trace!(scan_target = %scan_report.target, "Parsing vulnerabilities");
        report.vulnerabilities.extend(scan_report.vulnerabilities);
    }

    Ok(report)
}
