use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Resolves an executable name against a search path.
///
/// A name containing a path separator is taken as a path and only checked
/// for existence. Otherwise each directory of `search_path` (in the
/// platform's `PATH` format) is tried in order.
///
/// # Example
///
/// ```no_run
/// use imgscan::scanner::find_executable;
///
/// let path = std::env::var_os("PATH").unwrap_or_default();
/// if let Some(trivy) = find_executable("trivy", &path) {
///     println!("found {}", trivy.display());
/// }
/// ```
pub fn find_executable(name: &str, search_path: &OsStr) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| candidates(&dir, name))
        .find(|path| is_executable(path))
}

#[cfg(windows)]
fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    vec![dir.join(name), dir.join(format!("{}.exe", name))]
}

#[cfg(not(windows))]
fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    vec![dir.join(name)]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
