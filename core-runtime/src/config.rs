//! # Core Configuration Module
//!
//! Provides configuration management for the label core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `LabelsConfig`
//! instance that holds the host bridges and settings the core needs. It
//! enforces fail-fast validation so a misconfigured host is rejected before
//! any record is touched.
//!
//! ## Required Settings
//!
//! - `project_root` - Directory that asset paths are relative to
//!
//! ## Bridges (with desktop defaults)
//!
//! - `AssetDatabase` - Handle resolution, reimport requests, asset listing
//! - `RecordStore` - Side-car record line I/O
//! - `IndexContainer` - Persistent container for the label index
//!
//! When the `desktop-shims` feature is enabled, filesystem implementations
//! from `bridge-desktop` are injected for any bridge that is not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::LabelsConfig;
//!
//! let config = LabelsConfig::builder()
//!     .project_root("/path/to/project")
//!     .search_result_limit(50)
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{AssetDatabase, IndexContainer, RecordStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default side-car record extension.
pub const DEFAULT_RECORD_EXTENSION: &str = ".meta";

/// Default location of the index container, relative to the project root.
pub const DEFAULT_CONTAINER_PATH: &str = "Resources/AssetLabelCollection.json";

/// Default maximum number of search hits.
pub const DEFAULT_SEARCH_RESULT_LIMIT: usize = 100;

const MAX_SEARCH_RESULT_LIMIT: usize = 10_000;

/// Core configuration for the label core.
///
/// Use [`LabelsConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct LabelsConfig {
    /// Directory asset paths are relative to
    pub project_root: PathBuf,

    /// Extension appended to an asset path to locate its record
    pub record_extension: String,

    /// Index container location; relative paths resolve against `project_root`
    pub container_path: PathBuf,

    /// Maximum number of hits a search returns
    pub search_result_limit: usize,

    /// Buffer size of the event bus channel
    pub event_buffer_size: usize,

    /// Host asset database
    pub asset_database: Arc<dyn AssetDatabase>,

    /// Side-car record access
    pub record_store: Arc<dyn RecordStore>,

    /// Label index container
    pub index_container: Arc<dyn IndexContainer>,
}

impl std::fmt::Debug for LabelsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelsConfig")
            .field("project_root", &self.project_root)
            .field("record_extension", &self.record_extension)
            .field("container_path", &self.container_path)
            .field("search_result_limit", &self.search_result_limit)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("asset_database", &"AssetDatabase { ... }")
            .field("record_store", &"RecordStore { ... }")
            .field("index_container", &"IndexContainer { ... }")
            .finish()
    }
}

impl LabelsConfig {
    /// Creates a new builder for constructing a `LabelsConfig`.
    pub fn builder() -> LabelsConfigBuilder {
        LabelsConfigBuilder::default()
    }

    /// Absolute location of the index container file.
    pub fn container_file(&self) -> PathBuf {
        resolve_container_path(&self.project_root, &self.container_path)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Project root and container path are not empty
    /// - Record extension looks like `.ext`
    /// - Search limit and event buffer size are in range
    pub fn validate(&self) -> Result<()> {
        if self.project_root.as_os_str().is_empty() {
            return Err(Error::Config("Project root cannot be empty".to_string()));
        }

        if self.container_path.as_os_str().is_empty() {
            return Err(Error::Config("Container path cannot be empty".to_string()));
        }

        if !self.record_extension.starts_with('.') || self.record_extension.len() < 2 {
            return Err(Error::Config(format!(
                "Record extension must look like '.meta', got '{}'",
                self.record_extension
            )));
        }

        if self.search_result_limit == 0 {
            return Err(Error::Config(
                "Search result limit must be greater than 0".to_string(),
            ));
        }

        if self.search_result_limit > MAX_SEARCH_RESULT_LIMIT {
            return Err(Error::Config(format!(
                "Search result limit exceeds maximum of {}",
                MAX_SEARCH_RESULT_LIMIT
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn resolve_container_path(project_root: &Path, container_path: &Path) -> PathBuf {
    if container_path.is_absolute() {
        container_path.to_path_buf()
    } else {
        project_root.join(container_path)
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn bridge_missing_error(capability: &str, purpose: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "{} implementation is required for {}. \
             Desktop: ensure the 'desktop-shims' feature is enabled to use the filesystem default. \
             Editors: inject the host adapter.",
            capability, purpose
        ),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_asset_database(root: &Path, extension: &str) -> Result<Arc<dyn AssetDatabase>> {
    use bridge_desktop::FsAssetDatabase;

    let database: Arc<dyn AssetDatabase> = Arc::new(FsAssetDatabase::new(root, extension));
    Ok(database)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_asset_database(
    _root: &Path,
    _extension: &str,
) -> Result<Arc<dyn AssetDatabase>> {
    Err(bridge_missing_error("AssetDatabase", "resolving assets"))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_record_store(root: &Path, extension: &str) -> Result<Arc<dyn RecordStore>> {
    use bridge_desktop::FsRecordStore;

    let store: Arc<dyn RecordStore> = Arc::new(FsRecordStore::new(root, extension));
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_record_store(_root: &Path, _extension: &str) -> Result<Arc<dyn RecordStore>> {
    Err(bridge_missing_error("RecordStore", "reading side-car records"))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_index_container(path: PathBuf) -> Result<Arc<dyn IndexContainer>> {
    use bridge_desktop::JsonFileContainer;

    let container: Arc<dyn IndexContainer> = Arc::new(JsonFileContainer::new(path));
    Ok(container)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_index_container(_path: PathBuf) -> Result<Arc<dyn IndexContainer>> {
    Err(bridge_missing_error("IndexContainer", "persisting the label index"))
}

/// Builder for constructing [`LabelsConfig`] instances.
///
/// Call [`build()`](LabelsConfigBuilder::build) to validate and create the
/// final config.
#[derive(Default)]
pub struct LabelsConfigBuilder {
    project_root: Option<PathBuf>,
    record_extension: Option<String>,
    container_path: Option<PathBuf>,
    search_result_limit: Option<usize>,
    event_buffer_size: Option<usize>,
    asset_database: Option<Arc<dyn AssetDatabase>>,
    record_store: Option<Arc<dyn RecordStore>>,
    index_container: Option<Arc<dyn IndexContainer>>,
}

impl LabelsConfigBuilder {
    /// Sets the project root directory (required).
    pub fn project_root<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.project_root = Some(path.into());
        self
    }

    /// Sets the side-car record extension.
    ///
    /// Default: `.meta`
    pub fn record_extension(mut self, extension: impl Into<String>) -> Self {
        self.record_extension = Some(extension.into());
        self
    }

    /// Sets the index container location.
    ///
    /// Default: `Resources/AssetLabelCollection.json` under the project root
    pub fn container_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.container_path = Some(path.into());
        self
    }

    /// Sets the maximum number of search hits.
    ///
    /// Default: 100
    pub fn search_result_limit(mut self, limit: usize) -> Self {
        self.search_result_limit = Some(limit);
        self
    }

    /// Sets the event bus buffer size.
    ///
    /// Default: 100
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the asset database implementation.
    pub fn asset_database(mut self, database: Arc<dyn AssetDatabase>) -> Self {
        self.asset_database = Some(database);
        self
    }

    /// Sets the record store implementation.
    pub fn record_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.record_store = Some(store);
        self
    }

    /// Sets the index container implementation.
    pub fn index_container(mut self, container: Arc<dyn IndexContainer>) -> Self {
        self.index_container = Some(container);
        self
    }

    /// Builds the final `LabelsConfig` instance.
    ///
    /// Returns an error if:
    /// - The project root is missing
    /// - A bridge is missing and no desktop default is available
    /// - Configuration values are invalid
    pub fn build(self) -> Result<LabelsConfig> {
        let project_root = self.project_root.ok_or_else(|| {
            Error::Config("Project root is required. Use .project_root() to set it.".to_string())
        })?;

        let record_extension = self
            .record_extension
            .unwrap_or_else(|| DEFAULT_RECORD_EXTENSION.to_string());
        let container_path = self
            .container_path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTAINER_PATH));

        let asset_database = match self.asset_database {
            Some(database) => database,
            None => provide_default_asset_database(&project_root, &record_extension)?,
        };

        let record_store = match self.record_store {
            Some(store) => store,
            None => provide_default_record_store(&project_root, &record_extension)?,
        };

        let index_container = match self.index_container {
            Some(container) => container,
            None => provide_default_index_container(resolve_container_path(
                &project_root,
                &container_path,
            ))?,
        };

        let config = LabelsConfig {
            project_root,
            record_extension,
            container_path,
            search_result_limit: self
                .search_result_limit
                .unwrap_or(DEFAULT_SEARCH_RESULT_LIMIT),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            asset_database,
            record_store,
            index_container,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::AssetHandle;

    struct NullDatabase;

    impl AssetDatabase for NullDatabase {
        fn path_of(&self, _handle: &AssetHandle) -> Option<String> {
            None
        }

        fn notify_changed(&self, _asset_path: &str) -> BridgeResult<()> {
            Ok(())
        }

        fn find_assets(&self, _filter: &str) -> BridgeResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    struct NullRecords;

    impl RecordStore for NullRecords {
        fn read_record_lines(&self, asset_path: &str) -> BridgeResult<Vec<String>> {
            Err(bridge_traits::BridgeError::NotFound(asset_path.to_string()))
        }

        fn write_record_lines(&self, _asset_path: &str, _lines: &[String]) -> BridgeResult<()> {
            Ok(())
        }
    }

    struct NullContainer;

    impl IndexContainer for NullContainer {
        fn ensure_container_exists(&self) -> BridgeResult<()> {
            Ok(())
        }

        fn load(&self) -> BridgeResult<Option<String>> {
            Ok(None)
        }

        fn save(&self, _contents: &str) -> BridgeResult<()> {
            Ok(())
        }
    }

    fn with_bridges(builder: LabelsConfigBuilder) -> LabelsConfigBuilder {
        builder
            .asset_database(Arc::new(NullDatabase))
            .record_store(Arc::new(NullRecords))
            .index_container(Arc::new(NullContainer))
    }

    #[test]
    fn test_builder_defaults() {
        let config = with_bridges(LabelsConfig::builder().project_root("/project"))
            .build()
            .unwrap();

        assert_eq!(config.record_extension, ".meta");
        assert_eq!(config.search_result_limit, 100);
        assert_eq!(config.event_buffer_size, 100);
        assert_eq!(
            config.container_file(),
            PathBuf::from("/project/Resources/AssetLabelCollection.json")
        );
    }

    #[test]
    fn test_absolute_container_path_is_kept() {
        let config = with_bridges(
            LabelsConfig::builder()
                .project_root("/project")
                .container_path("/elsewhere/labels.json"),
        )
        .build()
        .unwrap();
        assert_eq!(config.container_file(), PathBuf::from("/elsewhere/labels.json"));
    }

    #[test]
    fn test_missing_project_root() {
        let result = with_bridges(LabelsConfig::builder()).build();
        match result {
            Err(Error::Config(message)) => assert!(message.contains("Project root")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad_extension = with_bridges(
            LabelsConfig::builder()
                .project_root("/project")
                .record_extension("meta"),
        )
        .build();
        assert!(matches!(bad_extension, Err(Error::Config(_))));

        let zero_limit = with_bridges(
            LabelsConfig::builder()
                .project_root("/project")
                .search_result_limit(0),
        )
        .build();
        assert!(matches!(zero_limit, Err(Error::Config(_))));

        let zero_buffer = with_bridges(
            LabelsConfig::builder()
                .project_root("/project")
                .event_buffer_size(0),
        )
        .build();
        assert!(matches!(zero_buffer, Err(Error::Config(_))));
    }

    #[test]
    fn test_debug_hides_bridges() {
        let config = with_bridges(LabelsConfig::builder().project_root("/project"))
            .build()
            .unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("AssetDatabase { ... }"));
        assert!(debug.contains("/project"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_bridge_is_capability_error() {
        let result = LabelsConfig::builder()
            .project_root("/project")
            .record_store(Arc::new(NullRecords))
            .index_container(Arc::new(NullContainer))
            .build();
        match result {
            Err(Error::CapabilityMissing { capability, message }) => {
                assert_eq!(capability, "AssetDatabase");
                assert!(message.contains("desktop-shims"));
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_defaults_are_injected() {
        let config = LabelsConfig::builder()
            .project_root(std::env::temp_dir())
            .build()
            .unwrap();
        assert!(config.asset_database.path_of(&AssetHandle::new("")).is_none());
    }
}
