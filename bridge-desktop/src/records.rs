//! Side-car record files on disk
//!
//! The record of `Assets/crate.prefab` is `Assets/crate.prefab.meta`. Lines are
//! handed out without terminators. On write, every line position that existed
//! before keeps its own terminator (`\n`, `\r\n` or none), so records with
//! mixed line endings come back byte-identical outside the edited line.

use bridge_traits::{
    error::{BridgeError, Result},
    storage::RecordStore,
};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::fs_util::{resolve_asset_path, write_atomically};

/// Terminator of one record line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    Lf,
    CrLf,
    /// Last line of a file without a trailing newline
    Missing,
}

impl Ending {
    fn as_str(self) -> &'static str {
        match self {
            Ending::Lf => "\n",
            Ending::CrLf => "\r\n",
            Ending::Missing => "",
        }
    }
}

/// Split `contents` into lines and their own terminators.
fn split_lines(contents: &str) -> Vec<(&str, Ending)> {
    contents
        .split_inclusive('\n')
        .map(|segment| {
            if let Some(text) = segment.strip_suffix("\r\n") {
                (text, Ending::CrLf)
            } else if let Some(text) = segment.strip_suffix('\n') {
                (text, Ending::Lf)
            } else {
                (segment, Ending::Missing)
            }
        })
        .collect()
}

/// Line endings of an existing record, reused position by position on write.
///
/// Lines past the end of the original record get the file's most common
/// ending; the last line keeps the file's trailing-newline convention.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LineLayout {
    endings: Vec<Ending>,
    main: Ending,
    trailing_newline: bool,
}

impl Default for LineLayout {
    fn default() -> Self {
        Self {
            endings: Vec::new(),
            main: Ending::Lf,
            trailing_newline: true,
        }
    }
}

impl LineLayout {
    fn detect(contents: &str) -> Self {
        let endings: Vec<Ending> = split_lines(contents).into_iter().map(|(_, e)| e).collect();
        let crlf = endings.iter().filter(|e| **e == Ending::CrLf).count();
        let lf = endings.iter().filter(|e| **e == Ending::Lf).count();
        Self {
            main: if crlf > lf { Ending::CrLf } else { Ending::Lf },
            trailing_newline: endings.last().map_or(true, |e| *e != Ending::Missing),
            endings,
        }
    }

    fn ending_at(&self, position: usize, is_last: bool) -> Ending {
        match self.endings.get(position) {
            Some(Ending::Missing) if !is_last => self.main,
            Some(ending) => *ending,
            None if is_last && !self.trailing_newline => Ending::Missing,
            None => self.main,
        }
    }

    fn render(&self, lines: &[String]) -> String {
        let mut contents = String::new();
        for (position, line) in lines.iter().enumerate() {
            contents.push_str(line);
            let is_last = position + 1 == lines.len();
            contents.push_str(self.ending_at(position, is_last).as_str());
        }
        contents
    }
}

/// Filesystem record store rooted at a project directory
pub struct FsRecordStore {
    root: PathBuf,
    extension: String,
}

impl FsRecordStore {
    pub fn new(root: impl AsRef<Path>, extension: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extension: extension.into(),
        }
    }

    /// Location of the record belonging to `asset_path`.
    pub fn record_path(&self, asset_path: &str) -> Result<PathBuf> {
        let asset = resolve_asset_path(&self.root, asset_path).ok_or_else(|| {
            BridgeError::OperationFailed(format!("Invalid asset path: {}", asset_path))
        })?;
        let mut name = asset.into_os_string();
        name.push(&self.extension);
        Ok(PathBuf::from(name))
    }

    fn read_existing(&self, path: &Path, asset_path: &str) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(asset = asset_path, "No record on disk");
                Ok(None)
            }
            Err(err) => Err(BridgeError::Io(err)),
        }
    }
}

impl RecordStore for FsRecordStore {
    fn read_record_lines(&self, asset_path: &str) -> Result<Vec<String>> {
        let path = self.record_path(asset_path)?;
        let contents = self
            .read_existing(&path, asset_path)?
            .ok_or_else(|| BridgeError::NotFound(asset_path.to_string()))?;

        let lines: Vec<String> = split_lines(&contents)
            .into_iter()
            .map(|(text, _)| text.to_string())
            .collect();
        debug!(asset = asset_path, lines = lines.len(), "Read record");
        Ok(lines)
    }

    fn write_record_lines(&self, asset_path: &str, lines: &[String]) -> Result<()> {
        let path = self.record_path(asset_path)?;
        let layout = self
            .read_existing(&path, asset_path)?
            .map(|existing| LineLayout::detect(&existing))
            .unwrap_or_default();

        write_atomically(&path, layout.render(lines).as_bytes())?;
        debug!(asset = asset_path, lines = lines.len(), "Wrote record");
        Ok(())
    }
}
