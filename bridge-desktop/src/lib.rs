//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for a project laid out on the
//! local filesystem (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides filesystem implementations of the host traits:
//! - `AssetDatabase` by walking the project directory ([`FsAssetDatabase`])
//! - `RecordStore` over `<asset><extension>` side-car files ([`FsRecordStore`])
//! - `IndexContainer` as a single JSON file ([`JsonFileContainer`])
//!
//! Asset paths are project-relative and always use `/` separators.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FsAssetDatabase, FsRecordStore, JsonFileContainer};
//!
//! let database = FsAssetDatabase::new("/path/to/project", ".meta");
//! let records = FsRecordStore::new("/path/to/project", ".meta");
//! let container = JsonFileContainer::new("/path/to/project/Resources/labels.json");
//! ```

mod assets;
mod container;
mod fs_util;
mod records;

pub use assets::FsAssetDatabase;
pub use container::JsonFileContainer;
pub use records::FsRecordStore;
