//! JSON file container for the label index

use bridge_traits::{error::Result, storage::IndexContainer};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::fs_util::write_atomically;

/// Stores the serialized index in a single file
///
/// The file is created empty by `ensure_container_exists`; an empty file
/// loads as an empty index.
pub struct JsonFileContainer {
    path: PathBuf,
}

impl JsonFileContainer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IndexContainer for JsonFileContainer {
    fn ensure_container_exists(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        write_atomically(&self.path, b"")?;
        info!(path = ?self.path, "Created label container");
        Ok(())
    }

    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                debug!(bytes = contents.len(), "Loaded label container");
                Ok(Some(contents))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, contents: &str) -> Result<()> {
        write_atomically(&self.path, contents.as_bytes())?;
        debug!(bytes = contents.len(), "Saved label container");
        Ok(())
    }
}
