//! Configuration file handling.
//!
//! This module provides loading and saving of the scanner configuration
//! from a TOML file, with `SCANNER_TRIVY_*` environment variables taking
//! precedence over the file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/imgscan/config.toml`
//! - macOS: `~/Library/Application Support/imgscan/config.toml`
//! - Windows: `%APPDATA%\imgscan\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! executable = "trivy"
//! reports_dir = "/var/lib/imgscan/reports"
//! cache_dir = "/var/lib/imgscan/trivy"
//! severity = "HIGH,CRITICAL"
//! vuln_type = "os,library"
//! ignore_unfixed = true
//! debug_mode = false
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const ENV_PREFIX: &str = "SCANNER_TRIVY_";

/// Scanner configuration.
///
/// Owned by the caller and handed to [`TrivyWrapper::new`](crate::TrivyWrapper::new);
/// nothing in this crate reads it from global state.
///
/// # Example
///
/// ```no_run
/// use imgscan::Config;
///
/// let config = Config::load().unwrap();
///
/// println!("Reports dir: {}", config.reports_dir.display());
/// println!("Severity: {}", config.severity);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name or path of the scanner executable.
    ///
    /// Default: "trivy"
    pub executable: String,

    /// Directory holding the temporary JSON report of each scan.
    pub reports_dir: PathBuf,

    /// Directory for the scanner's vulnerability database cache.
    pub cache_dir: PathBuf,

    /// Comma-separated severities passed to `--severity`.
    ///
    /// Default: "UNKNOWN,LOW,MEDIUM,HIGH,CRITICAL"
    pub severity: String,

    /// Comma-separated vulnerability types passed to `--vuln-type`.
    ///
    /// Default: "os"
    pub vuln_type: String,

    /// Only report vulnerabilities that have a fix.
    pub ignore_unfixed: bool,

    /// Run the scanner with `--debug`.
    pub debug_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        let cache_root = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            executable: "trivy".to_string(),
            reports_dir: cache_root.join("imgscan").join("reports"),
            cache_dir: cache_root.join("trivy"),
            severity: "UNKNOWN,LOW,MEDIUM,HIGH,CRITICAL".to_string(),
            vuln_type: "os".to_string(),
            ignore_unfixed: false,
            debug_mode: false,
        }
    }
}

impl Config {
    /// Loads configuration from the config file, then applies environment
    /// overrides.
    ///
    /// If the config file doesn't exist, defaults are used as the base.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies `SCANNER_TRIVY_*` overrides from `lookup`.
    ///
    /// Boolean values that don't parse as `true`/`false` are ignored.
    ///
    /// # Example
    ///
    /// ```
    /// use imgscan::Config;
    ///
    /// let mut config = Config::default();
    /// config.apply_overrides(|key| match key {
    ///     "SCANNER_TRIVY_SEVERITY" => Some("CRITICAL".to_string()),
    ///     _ => None,
    /// });
    /// assert_eq!(config.severity, "CRITICAL");
    /// ```
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(format!("{ENV_PREFIX}{name}").as_str());
        let flag = |name: &str| var(name).and_then(|v| v.trim().to_lowercase().parse::<bool>().ok());

        if let Some(v) = var("EXECUTABLE") {
            self.executable = v;
        }
        if let Some(v) = var("REPORTS_DIR") {
            self.reports_dir = PathBuf::from(v);
        }
        if let Some(v) = var("CACHE_DIR") {
            self.cache_dir = PathBuf::from(v);
        }
        if let Some(v) = var("SEVERITY") {
            self.severity = v;
        }
        if let Some(v) = var("VULN_TYPE") {
            self.vuln_type = v;
        }
        if let Some(v) = flag("IGNORE_UNFIXED") {
            self.ignore_unfixed = v;
        }
        if let Some(v) = flag("DEBUG_MODE") {
            self.debug_mode = v;
        }
    }

    /// Creates the reports and cache directories if they are missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.reports_dir, &self.cache_dir] {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    ///
    /// # Example
    ///
    /// ```
    /// use imgscan::Config;
    ///
    /// let path = Config::config_path();
    /// assert!(path.ends_with("imgscan/config.toml"));
    /// ```
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("imgscan")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
