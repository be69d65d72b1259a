//! Host Asset Database Abstraction
//!
//! The host owns the mapping between opaque asset handles and on-disk asset
//! paths, decides which assets are tracked, and reimports an asset when its
//! side-car record changes. The label core only talks to the host through
//! [`AssetDatabase`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Opaque reference to an asset as the host knows it (a GUID, an object id,
/// or a project-relative path, depending on the host).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetHandle(pub String);

impl AssetHandle {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetHandle {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Host asset database
///
/// Abstracts the host's knowledge of which files are assets:
/// - Game editors: the editor's asset database (GUID ↔ path)
/// - Desktop: a project directory walked on demand
///
/// # Example
///
/// ```ignore
/// use bridge_traits::asset::{AssetDatabase, AssetHandle};
///
/// fn describe(db: &dyn AssetDatabase, handle: &AssetHandle) -> String {
///     db.path_of(handle).unwrap_or_else(|| "<untracked>".to_string())
/// }
/// ```
pub trait AssetDatabase: Send + Sync {
    /// Resolve a handle to its asset path.
    ///
    /// Returns `None` when the handle is not a tracked asset.
    fn path_of(&self, handle: &AssetHandle) -> Option<String>;

    /// Tell the host that the side-car record of `asset_path` changed and the
    /// asset should be reloaded/reimported.
    fn notify_changed(&self, asset_path: &str) -> Result<()>;

    /// List asset paths whose name matches `filter` (case-insensitive
    /// substring). An empty filter lists every asset.
    fn find_assets(&self, filter: &str) -> Result<Vec<String>>;

    /// Drain asset paths whose records were reported changed and have not
    /// been reimported yet.
    ///
    /// Hosts that reimport on their own and call back into the core return
    /// nothing here.
    fn take_changed(&self) -> Vec<String> {
        Vec::new()
    }
}
