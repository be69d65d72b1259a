//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (asset database,
//! record store, index container) into the label core and exposes a single
//! [`LabelService`] to host applications. Desktop apps typically enable the
//! `desktop-shims` feature, which lets the configuration fall back to the
//! filesystem bridges from `bridge-desktop`.
//!
//! ## Lifecycle
//!
//! ```ignore
//! use core_service::{bootstrap_desktop, Label};
//!
//! let mut labels = bootstrap_desktop("/path/to/project")?;
//! labels.rebuild_index()?;
//! labels.set_labels("Assets/Props/crate.prefab", &[Label::new("Hero Prop")])?;
//! labels.shutdown()?;
//! ```
//!
//! The service is single-threaded: every mutating call takes `&mut self` and
//! runs to completion before returning. Hosts observe changes through
//! [`LabelService::subscribe`].

pub mod error;

pub use error::{CoreError, Result};

pub use core_library::{Label, LabelColor, LabelEntry, LabelId, LabelIndex, LabelQuery, SearchHit};
pub use core_runtime::config::LabelsConfig;
pub use core_runtime::events::{CoreEvent, EventStream, LabelEvent};
pub use core_sync::{BatchReport, IngestOutcome, IngestReport, SetLabelsOutcome};

use bridge_traits::asset::AssetHandle;
use bridge_traits::BridgeError;
use core_library::{LabelStore, LibraryError};
use core_runtime::events::EventBus;
use core_runtime::logging::strip_path;
use core_sync::{SyncEngine, SyncError};
use tracing::{debug, info, instrument, warn};

/// Primary façade exposed to host applications.
pub struct LabelService {
    config: LabelsConfig,
    store: LabelStore,
    engine: SyncEngine,
    events: EventBus,
}

impl LabelService {
    /// Create a service from a built configuration, loading the index from
    /// the configured container.
    #[instrument(skip_all)]
    pub fn new(config: LabelsConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;

        let events = EventBus::new(config.event_buffer_size);
        let store = LabelStore::open(config.index_container.clone())?;
        let engine = SyncEngine::new(config.asset_database.clone(), config.record_store.clone())
            .with_events(events.clone());

        info!(
            labels = store.index().len(),
            container = %strip_path(&config.container_file().to_string_lossy()),
            "Label service ready"
        );
        Ok(Self {
            config,
            store,
            engine,
            events,
        })
    }

    pub fn config(&self) -> &LabelsConfig {
        &self.config
    }

    pub fn index(&self) -> &LabelIndex {
        self.store.index()
    }

    /// Subscribe to label events published from now on.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    fn emit(&self, event: LabelEvent) {
        let _ = self.events.emit(CoreEvent::Label(event));
    }

    // ------------------------------------------------------------------
    // Label catalog
    // ------------------------------------------------------------------

    /// Declare a label by display name, returning the stored label.
    ///
    /// Declaring an existing label returns it unchanged, including its color.
    pub fn declare_label(&mut self, name: &str, color: Option<LabelColor>) -> Result<Label> {
        let is_new = !self.store.index().contains_label(name);
        let label = self.store.declare_label(name, color)?;
        if is_new {
            self.emit(LabelEvent::LabelCreated {
                id: label.id().to_string(),
                name: label.name.clone(),
                implicit: false,
            });
        }
        Ok(label)
    }

    pub fn rename_label(&mut self, id: &str, new_name: &str) -> Result<()> {
        Ok(self.store.rename_label(id, new_name)?)
    }

    pub fn recolor_label(&mut self, id: &str, color: Option<LabelColor>) -> Result<()> {
        Ok(self.store.recolor_label(id, color)?)
    }

    /// Delete a label entry from the index.
    ///
    /// Records that still name the label recreate it on their next ingest.
    pub fn remove_label_entry(&mut self, id: &str) -> Result<LabelEntry> {
        let entry = self
            .store
            .index_mut()
            .remove_label(id)
            .ok_or_else(|| LibraryError::NotFound { id: id.to_string() })?;

        for asset_path in &entry.assets {
            let labels = self
                .store
                .index()
                .labels_of(asset_path)
                .map(|label| label.id().to_string())
                .collect();
            self.emit(LabelEvent::AssetLabelsChanged {
                asset_path: asset_path.clone(),
                labels,
            });
        }
        info!(label = %entry.label.id(), assets = entry.assets.len(), "Removed label");
        Ok(entry)
    }

    /// Drop every label no asset carries. Returns the number removed.
    pub fn prune_empty(&mut self) -> usize {
        let removed = self.store.index_mut().prune_empty();
        if removed > 0 {
            info!(removed, "Pruned empty labels");
        }
        removed
    }

    pub fn find_by_identifier(&self, id: &str) -> Option<&Label> {
        self.store.index().find_by_identifier(id)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn labels_of(&self, asset_path: &str) -> Vec<Label> {
        self.store.index().labels_of(asset_path).cloned().collect()
    }

    pub fn labels_of_many<S: AsRef<str>>(&self, asset_paths: &[S]) -> Vec<Label> {
        self.store.index().labels_of_many(asset_paths)
    }

    pub fn catalog_for<S: AsRef<str>>(&self, selection: &[S]) -> Vec<&Label> {
        self.store.index().catalog_for(selection)
    }

    pub fn has_any_label(&self, asset_path: &str) -> bool {
        self.store.index().has_any_label(asset_path)
    }

    /// Search assets whose name contains `text` and that pass `query`.
    ///
    /// The hit count is capped by both the query and the configured limit.
    #[instrument(skip(self, query), fields(required = query.required.len()))]
    pub fn search(&self, text: &str, query: &LabelQuery) -> Result<Vec<SearchHit>> {
        let candidates = self.config.asset_database.find_assets(text)?;
        let limit = query.limit.min(self.config.search_result_limit);
        let hits = query
            .clone()
            .with_limit(limit)
            .apply(self.store.index(), &candidates);
        debug!(candidates = candidates.len(), hits = hits.len(), "Search finished");
        Ok(hits)
    }

    // ------------------------------------------------------------------
    // Record synchronization
    // ------------------------------------------------------------------

    pub fn ingest(&mut self, asset_path: &str) -> Result<IngestOutcome> {
        Ok(self.engine.ingest(&mut self.store, asset_path)?)
    }

    pub fn ingest_handle(&mut self, handle: &AssetHandle) -> Result<IngestOutcome> {
        Ok(self.engine.ingest_handle(&mut self.store, handle)?)
    }

    pub fn ingest_all<S: AsRef<str>>(&mut self, asset_paths: &[S]) -> IngestReport {
        self.engine.ingest_all(&mut self.store, asset_paths)
    }

    pub fn set_labels(&mut self, asset_path: &str, labels: &[Label]) -> Result<SetLabelsOutcome> {
        Ok(self.engine.set_labels(&mut self.store, asset_path, labels)?)
    }

    pub fn set_labels_for_handle(
        &mut self,
        handle: &AssetHandle,
        labels: &[Label],
    ) -> Result<SetLabelsOutcome> {
        Ok(self
            .engine
            .set_labels_for_handle(&mut self.store, handle, labels)?)
    }

    pub fn add_label<S: AsRef<str>>(&mut self, asset_paths: &[S], label: &Label) -> BatchReport {
        self.engine.add_label(&mut self.store, asset_paths, label)
    }

    pub fn remove_label<S: AsRef<str>>(&mut self, asset_paths: &[S], label: &Label) -> BatchReport {
        self.engine.remove_label(&mut self.store, asset_paths, label)
    }

    pub fn asset_moved(&mut self, from: &str, to: &str) -> usize {
        self.engine.asset_moved(&mut self.store, from, to)
    }

    pub fn asset_deleted(&mut self, asset_path: &str) -> usize {
        self.engine.asset_deleted(&mut self.store, asset_path)
    }

    /// Ingest every record the host reported as changed since the last call.
    pub fn process_pending(&mut self) -> IngestReport {
        let pending = self.config.asset_database.take_changed();
        if pending.is_empty() {
            return IngestReport::default();
        }
        debug!(count = pending.len(), "Processing pending reimports");
        self.engine.ingest_all(&mut self.store, &pending)
    }

    /// Ingest the record of every asset the host knows about.
    ///
    /// Assets without a record carry no labels and are skipped.
    #[instrument(skip(self))]
    pub fn rebuild_index(&mut self) -> Result<IngestReport> {
        let assets = self.config.asset_database.find_assets("")?;
        let mut report = self.engine.ingest_all(&mut self.store, &assets);
        report.failures.retain(|(asset_path, err)| {
            let missing = matches!(err, SyncError::Bridge(BridgeError::NotFound(_)));
            if missing {
                debug!(asset = %asset_path, "No record, skipping");
            }
            !missing
        });
        if !report.failures.is_empty() {
            warn!(failed = report.failures.len(), "Some records could not be ingested");
        }
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Write the index to its container if it changed.
    pub fn save(&mut self) -> Result<bool> {
        let written = self.store.save()?;
        if written {
            let label_count = self.store.index().len();
            info!(
                labels = label_count,
                container = %strip_path(&self.config.container_file().to_string_lossy()),
                "Persisted label index"
            );
            self.emit(LabelEvent::IndexSaved { label_count });
        }
        Ok(written)
    }

    /// Save and release the service.
    pub fn shutdown(mut self) -> Result<()> {
        self.save()?;
        info!("Label service shut down");
        Ok(())
    }
}

/// Convenience bootstrapper for desktop hosts: filesystem bridges rooted at
/// `project_root` with default settings.
///
/// ```no_run
/// # #[cfg(feature = "desktop-shims")]
/// # fn example() -> core_service::Result<()> {
/// use core_service::bootstrap_desktop;
///
/// let labels = bootstrap_desktop("/path/to/project")?;
/// println!("{} labels", labels.index().len());
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(project_root: impl Into<std::path::PathBuf>) -> Result<LabelService> {
    let config = LabelsConfig::builder().project_root(project_root).build()?;
    LabelService::new(config)
}
