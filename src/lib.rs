pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod scanner;

pub use config::Config;
pub use error::ScanError;
pub use model::{RegistryAuth, ScanReport, Severity, SeveritySummary, Vulnerability};
pub use scanner::{TrivyWrapper, Wrapper};
