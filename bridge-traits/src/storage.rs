//! Record and Index Storage Abstractions
//!
//! Provides platform-agnostic traits for side-car record I/O and for the
//! persistent container holding the label index.

use crate::error::Result;

/// Side-car metadata record access
///
/// Each asset has a line-oriented text record owned by the host (e.g. a
/// `.meta` file next to the asset). Implementations must hand lines back
/// exactly as stored, without trailing line terminators, and must write them
/// back using the record's existing line-ending convention.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::RecordStore;
///
/// fn has_user_data(store: &dyn RecordStore, path: &str) -> Result<bool> {
///     let lines = store.read_record_lines(path)?;
///     Ok(lines.iter().any(|l| l.starts_with("  userData:")))
/// }
/// ```
pub trait RecordStore: Send + Sync {
    /// Read the record belonging to `asset_path`.
    ///
    /// Returns [`BridgeError::NotFound`](crate::BridgeError::NotFound) when the
    /// asset has no record.
    fn read_record_lines(&self, asset_path: &str) -> Result<Vec<String>>;

    /// Replace the record belonging to `asset_path` with `lines`.
    fn write_record_lines(&self, asset_path: &str, lines: &[String]) -> Result<()>;
}

/// Persistent container for the label index
///
/// The container is created lazily: [`ensure_container_exists`] is called once
/// before the first write and must be idempotent.
///
/// [`ensure_container_exists`]: IndexContainer::ensure_container_exists
pub trait IndexContainer: Send + Sync {
    /// Create the storage container if it does not exist yet.
    fn ensure_container_exists(&self) -> Result<()>;

    /// Load the serialized index. `Ok(None)` means no container yet.
    fn load(&self) -> Result<Option<String>>;

    /// Persist the serialized index.
    fn save(&self, contents: &str) -> Result<()>;
}
