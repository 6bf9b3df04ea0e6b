use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, error, trace};

use super::lookup::find_executable;
use super::parse::parse_scan_reports;
use super::report_file::ReportFile;
use crate::config::Config;
use crate::error::ScanError;
use crate::model::{RegistryAuth, ScanReport};

pub const ENV_USERNAME: &str = "TRIVY_USERNAME";
pub const ENV_PASSWORD: &str = "TRIVY_PASSWORD";
pub const ENV_NON_SSL: &str = "TRIVY_NON_SSL";

/// Runs the trivy executable and normalizes its report.
///
/// Holds no mutable state, so one instance can serve concurrent scans; each
/// scan gets its own uniquely named report file.
///
/// # Example
///
/// ```no_run
/// use imgscan::{Config, RegistryAuth, TrivyWrapper, Wrapper};
///
/// let wrapper = TrivyWrapper::new(Config::default());
/// let auth = RegistryAuth::new("robot$scanner", "s3cret");
///
/// match wrapper.run("registry.local:5000/library/nginx:1.17", &auth, true) {
///     Ok(report) => println!("{} vulnerabilities", report.vulnerabilities.len()),
///     Err(e) => eprintln!("scan failed: {}", e),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TrivyWrapper {
    config: Config,
    search_path: Option<OsString>,
}

impl TrivyWrapper {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            search_path: None,
        }
    }

    /// Overrides the executable search path, which otherwise comes from
    /// `PATH` at the time of each scan.
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn resolve_executable(&self) -> Result<PathBuf, ScanError> {
        let search_path = match &self.search_path {
            Some(path) => path.clone(),
            None => std::env::var_os("PATH").unwrap_or_default(),
        };

        find_executable(&self.config.executable, &search_path).ok_or_else(|| {
            ScanError::ExecutableNotFound {
                name: self.config.executable.clone(),
            }
        })
    }
}

impl super::Wrapper for TrivyWrapper {
    fn run(
        &self,
        image_ref: &str,
        auth: &RegistryAuth,
        insecure_registry: bool,
    ) -> Result<ScanReport, ScanError> {
        debug!(image_ref, "Started scanning");

        let executable = self.resolve_executable()?;
        let report_file = ReportFile::create_in(&self.config.reports_dir)?;

        let args = build_args(&self.config, report_file.path(), image_ref);
        trace!(cmd = %executable.display(), args = ?args, "Exec command with args");

        let output = Command::new(&executable)
            .args(&args)
            .envs(registry_env(auth, insecure_registry))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                error!(image_ref, error = %e, "Starting trivy failed");
                ScanError::ScanExecution {
                    reason: e.to_string(),
                    stderr: String::new(),
                    stdout: String::new(),
                    exit_code: None,
                    source: Some(e),
                }
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let exit_code = output.status.code();

        if !output.status.success() {
            error!(
                image_ref,
                exit_code = ?exit_code,
                std_err = %stderr,
                std_out = %stdout,
                "Running trivy failed"
            );
            return Err(ScanError::ScanExecution {
                reason: output.status.to_string(),
                stderr,
                stdout,
                exit_code,
                source: None,
            });
        }

        debug!(
            image_ref,
            exit_code = ?exit_code,
            std_err = %stderr,
            std_out = %stdout,
            "Running trivy finished"
        );

        let file = File::open(report_file.path()).map_err(|source| ScanError::ReportRead {
            path: report_file.path().to_path_buf(),
            source,
        })?;
        parse_scan_reports(file)
    }
}

/// Builds the trivy command line for one scan.
///
/// The image reference is always the last argument. `--ignore-unfixed` and
/// `--debug` are prepended in that order, so `--debug` comes first when both
/// are set.
pub fn build_args(config: &Config, report_path: &Path, image_ref: &str) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--no-progress".into(),
        "--cache-dir".into(),
        config.cache_dir.clone().into(),
        "--severity".into(),
        config.severity.clone().into(),
        "--vuln-type".into(),
        config.vuln_type.clone().into(),
        "--format".into(),
        "json".into(),
        "--output".into(),
        report_path.into(),
        image_ref.into(),
    ];

    if config.ignore_unfixed {
        args.insert(0, "--ignore-unfixed".into());
    }

    if config.debug_mode {
        args.insert(0, "--debug".into());
    }

    args
}

/// Environment variables layered over the inherited environment of the
/// scanner process.
///
/// Credentials are only passed when both username and password are set.
pub fn registry_env(auth: &RegistryAuth, insecure_registry: bool) -> Vec<(&'static str, String)> {
    let mut env = Vec::new();

    if auth.is_present() {
        env.push((ENV_USERNAME, auth.username.clone()));
        env.push((ENV_PASSWORD, auth.password.clone()));
    }

    if insecure_registry {
        env.push((ENV_NON_SSL, "true".to_string()));
    }

    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Wrapper;

    fn test_config() -> Config {
        Config {
            executable: "trivy".to_string(),
            reports_dir: PathBuf::from("/tmp/reports"),
            cache_dir: PathBuf::from("/tmp/cache"),
            severity: "HIGH,CRITICAL".to_string(),
            vuln_type: "os,library".to_string(),
            ignore_unfixed: false,
            debug_mode: false,
        }
    }

    fn as_strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    fn lookup<'a>(env: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        env.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_build_args_base() {
        let args = build_args(
            &test_config(),
            Path::new("/tmp/reports/scan_report_1.json"),
            "alpine:3.10",
        );

        assert_eq!(
            as_strings(&args),
            vec![
                "--no-progress",
                "--cache-dir",
                "/tmp/cache",
                "--severity",
                "HIGH,CRITICAL",
                "--vuln-type",
                "os,library",
                "--format",
                "json",
                "--output",
                "/tmp/reports/scan_report_1.json",
                "alpine:3.10",
            ]
        );
    }

    #[test]
    fn test_build_args_ignore_unfixed() {
        let config = Config {
            ignore_unfixed: true,
            ..test_config()
        };
        let args = as_strings(&build_args(&config, Path::new("/r.json"), "alpine:3.10"));

        assert_eq!(args[0], "--ignore-unfixed");
        assert_eq!(args[1], "--no-progress");
        assert_eq!(args.last().map(String::as_str), Some("alpine:3.10"));
        assert!(!args.contains(&"--debug".to_string()));
    }

    #[test]
    fn test_build_args_debug_and_ignore_unfixed() {
        let config = Config {
            ignore_unfixed: true,
            debug_mode: true,
            ..test_config()
        };
        let args = as_strings(&build_args(&config, Path::new("/r.json"), "alpine:3.10"));

        assert_eq!(&args[..3], &["--debug", "--ignore-unfixed", "--no-progress"]);
        assert_eq!(args.len(), 14);
        assert_eq!(args.last().map(String::as_str), Some("alpine:3.10"));
    }

    #[test]
    fn test_build_args_debug_only() {
        let config = Config {
            debug_mode: true,
            ..test_config()
        };
        let args = as_strings(&build_args(&config, Path::new("/r.json"), "alpine:3.10"));

        assert_eq!(&args[..2], &["--debug", "--no-progress"]);
        assert_eq!(args.len(), 13);
    }

    #[test]
    fn test_registry_env_with_credentials() {
        let env = registry_env(&RegistryAuth::new("admin", "Harbor12345"), false);

        assert_eq!(env.len(), 2);
        assert_eq!(lookup(&env, ENV_USERNAME), Some("admin"));
        assert_eq!(lookup(&env, ENV_PASSWORD), Some("Harbor12345"));
        assert_eq!(lookup(&env, ENV_NON_SSL), None);
    }

    #[test]
    fn test_registry_env_partial_credentials_are_dropped() {
        for auth in [
            RegistryAuth::new("admin", ""),
            RegistryAuth::new("", "Harbor12345"),
            RegistryAuth::anonymous(),
        ] {
            let env = registry_env(&auth, false);
            assert!(env.is_empty(), "unexpected env for {:?}: {:?}", auth, env);
        }
    }

    #[test]
    fn test_registry_env_insecure() {
        let env = registry_env(&RegistryAuth::anonymous(), true);
        assert_eq!(env, vec![(ENV_NON_SSL, "true".to_string())]);

        let env = registry_env(&RegistryAuth::new("admin", "Harbor12345"), true);
        assert_eq!(env.len(), 3);
        assert_eq!(lookup(&env, ENV_NON_SSL), Some("true"));
    }

    #[test]
    fn test_run_without_executable() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            reports_dir: dir.path().to_path_buf(),
            ..test_config()
        };
        let wrapper = TrivyWrapper::new(config).with_search_path(dir.path());

        let err = wrapper
            .run("alpine:3.10", &RegistryAuth::anonymous(), false)
            .unwrap_err();
        assert!(matches!(err, ScanError::ExecutableNotFound { ref name } if name == "trivy"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
