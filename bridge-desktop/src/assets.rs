//! Project-directory Asset Database
//!
//! Treats every regular file under the project root as an asset, except the
//! side-car records themselves and anything inside a hidden directory. The
//! handle of an asset is its project-relative path.
//!
//! There is no importer on desktop: [`AssetDatabase::notify_changed`] queues
//! the path, and the queue is drained by [`AssetDatabase::take_changed`] so the
//! caller can re-ingest the record the way an editor's post-import hook would.

use bridge_traits::{
    asset::{AssetDatabase, AssetHandle},
    error::Result,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::fs_util::resolve_asset_path;

/// Filesystem-backed asset database
pub struct FsAssetDatabase {
    root: PathBuf,
    record_extension: String,
    pending: Mutex<Vec<String>>,
}

impl FsAssetDatabase {
    pub fn new(root: impl AsRef<Path>, record_extension: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            record_extension: record_extension.into(),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_record(&self, name: &str) -> bool {
        name.ends_with(&self.record_extension)
    }

    /// Collect matching assets below `dir`.
    ///
    /// An unreadable subdirectory or entry is logged and skipped; only a
    /// failure to list the project root itself is an error.
    fn walk(&self, dir: &Path, prefix: &str, filter: &str, found: &mut Vec<String>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if !prefix.is_empty() => {
                warn!(dir = prefix, error = %err, "Skipping unreadable directory");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(dir = prefix, error = %err, "Skipping unreadable entry");
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            let relative = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", prefix, name)
            };

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(err) => {
                    warn!(asset = %relative, error = %err, "Skipping entry of unknown type");
                    continue;
                }
            };
            if file_type.is_dir() {
                self.walk(&entry.path(), &relative, filter, found)?;
            } else if file_type.is_file()
                && !self.is_record(&name)
                && name.to_lowercase().contains(filter)
            {
                found.push(relative);
            }
        }
        Ok(())
    }
}

impl AssetDatabase for FsAssetDatabase {
    fn path_of(&self, handle: &AssetHandle) -> Option<String> {
        let path = resolve_asset_path(&self.root, handle.as_str())?;
        let is_asset = path.is_file()
            && path
                .file_name()
                .map(|name| !self.is_record(&name.to_string_lossy()))
                .unwrap_or(false);
        if !is_asset {
            return None;
        }
        let relative = path.strip_prefix(&self.root).ok()?;
        Some(
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
        )
    }

    fn notify_changed(&self, asset_path: &str) -> Result<()> {
        let mut pending = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Pending reimport queue was poisoned; recovering");
                poisoned.into_inner()
            }
        };
        if !pending.iter().any(|p| p == asset_path) {
            pending.push(asset_path.to_string());
            debug!(asset = asset_path, "Queued reimport");
        }
        Ok(())
    }

    fn find_assets(&self, filter: &str) -> Result<Vec<String>> {
        let mut found = Vec::new();
        if self.root.is_dir() {
            self.walk(&self.root, "", &filter.to_lowercase(), &mut found)?;
        }
        found.sort();
        debug!(filter, count = found.len(), "Listed assets");
        Ok(found)
    }

    fn take_changed(&self) -> Vec<String> {
        match self.pending.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}
