//! Container image scanning through an external scanner executable.
//!
//! This module provides the [`Wrapper`] trait and the trivy-backed
//! implementation, [`TrivyWrapper`].
//!
//! A scan is a two-step pipeline: the wrapper runs the scanner, which
//! writes a JSON file with one report per target, then
//! [`parse_scan_reports`] flattens those reports into a single
//! [`ScanReport`].
//!
//! # Example
//!
//! ```no_run
//! use imgscan::{Config, RegistryAuth, TrivyWrapper, Wrapper};
//!
//! let wrapper = TrivyWrapper::new(Config::load()?);
//! let report = wrapper.run("alpine:3.10", &RegistryAuth::anonymous(), false)?;
//!
//! println!("{}: {} vulnerabilities", report.target, report.vulnerabilities.len());
//! # Ok::<(), anyhow::Error>(())
//! ```

mod lookup;
mod parse;
mod report_file;
mod trivy;

pub use lookup::find_executable;
pub use parse::parse_scan_reports;
pub use trivy::{build_args, registry_env, TrivyWrapper};

use crate::error::ScanError;
use crate::model::{RegistryAuth, ScanReport};

/// Runs a vulnerability scan of one image reference.
///
/// Calls are synchronous and independent of each other; the calling thread
/// blocks until the scanner exits. Nothing is retried.
pub trait Wrapper: Send + Sync {
    fn run(
        &self,
        image_ref: &str,
        auth: &RegistryAuth,
        insecure_registry: bool,
    ) -> Result<ScanReport, ScanError>;
}
