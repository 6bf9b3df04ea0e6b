use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::ScanError;

const REPORT_PREFIX: &str = "scan_report_";
const REPORT_SUFFIX: &str = ".json";

/// Temporary file the scanner writes its report into.
///
/// The file is removed when the guard is dropped, whatever the outcome of
/// the scan. A failed removal is logged and otherwise ignored.
pub(crate) struct ReportFile {
    file: Option<NamedTempFile>,
    path: PathBuf,
}

impl ReportFile {
    pub(crate) fn create_in(dir: &Path) -> Result<Self, ScanError> {
        let file = tempfile::Builder::new()
            .prefix(REPORT_PREFIX)
            .suffix(REPORT_SUFFIX)
            .tempfile_in(dir)
            .map_err(|source| ScanError::TempFileCreation {
                dir: dir.to_path_buf(),
                source,
            })?;
        let path = file.path().to_path_buf();
        debug!(path = %path.display(), "Saving scan report to tmp file");

        Ok(Self {
            file: Some(file),
            path,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ReportFile {
    fn drop(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };
        debug!(path = %self.path.display(), "Removing scan report tmp file");
        if let Err(e) = file.close() {
            warn!(path = %self.path.display(), error = %e, "Error while removing scan report file");
        }
    }
}
