use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by a single scan invocation.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("executable {name} not found in search path")]
    ExecutableNotFound { name: String },

    #[error("creating scan report file in {}: {source}", dir.display())]
    TempFileCreation {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scanner failed to start or exited with a non-zero status.
    ///
    /// Only `reason` and `stderr` make it into the message; the exit code
    /// and stdout are kept for diagnostics. `source` is set when the process
    /// could not be started at all.
    #[error("running trivy: {reason}: {stderr}")]
    ScanExecution {
        reason: String,
        stderr: String,
        stdout: String,
        exit_code: Option<i32>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("reading scan report file {}: {source}", path.display())]
    ReportRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("decoding scan report from file: {0}")]
    ReportDecode(#[source] serde_json::Error),

    #[error("expected at least one report")]
    EmptyReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_execution_message_contains_stderr() {
        let err = ScanError::ScanExecution {
            reason: "exit status: 1".to_string(),
            stderr: "unable to pull image".to_string(),
            stdout: String::new(),
            exit_code: Some(1),
            source: None,
        };

        assert_eq!(
            err.to_string(),
            "running trivy: exit status: 1: unable to pull image"
        );
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_scan_execution_keeps_spawn_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let err = ScanError::ScanExecution {
            reason: io_err.to_string(),
            stderr: String::new(),
            stdout: String::new(),
            exit_code: None,
            source: Some(io_err),
        };

        let source = std::error::Error::source(&err)
            .and_then(|e| e.downcast_ref::<std::io::Error>())
            .unwrap();
        assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_executable_not_found_message() {
        let err = ScanError::ExecutableNotFound {
            name: "trivy".to_string(),
        };
        assert_eq!(err.to_string(), "executable trivy not found in search path");
    }
}
