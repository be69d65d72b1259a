//! Shared filesystem helpers

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Write `contents` next to `path` and rename it into place, so readers never
/// observe a half-written file.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, contents)?;
    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }
    Ok(())
}

/// Resolve a project-relative asset path against `root`.
///
/// Returns `None` for absolute paths and paths escaping the root.
pub(crate) fn resolve_asset_path(root: &Path, asset_path: &str) -> Option<PathBuf> {
    let normalized = asset_path.replace('\\', "/");
    let relative = normalized.trim_start_matches("./");
    if relative.is_empty() || relative.starts_with('/') || relative.contains(':') {
        return None;
    }
    if relative.split('/').any(|segment| segment == "..") {
        return None;
    }
    Some(root.join(relative))
}
