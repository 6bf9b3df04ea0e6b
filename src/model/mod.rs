//! Core data types for scan requests and scan reports.
//!
//! - [`RegistryAuth`] - Credentials handed to the scanner for a private registry
//! - [`ScanReport`] - A trivy report for one target, or the aggregate of several
//! - [`Vulnerability`] - A single finding, passed through as trivy wrote it
//! - [`Severity`] - Parsed severity level, used for display and summaries
//!
//! # Example
//!
//! ```
//! use imgscan::{ScanReport, Severity};
//!
//! let report: ScanReport = serde_json::from_str(
//!     r#"{"Target":"alpine:3.10","Vulnerabilities":[{"VulnerabilityID":"CVE-2019-0001","Severity":"HIGH"}]}"#,
//! ).unwrap();
//!
//! assert_eq!(report.vulnerabilities[0].severity(), Severity::High);
//! ```

mod auth;
mod report;

pub use auth::*;
pub use report::*;
