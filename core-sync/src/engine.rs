//! # Label Sync Engine
//!
//! Keeps side-car records and the label index consistent.
//!
//! ## Overview
//!
//! Two directions of flow meet here:
//!
//! - **Ingest** (record → index): whenever the host (re)observes an asset's
//!   record, its labels field is read and the index gains every label and
//!   assignment it does not hold yet. Ingest never removes anything.
//! - **Write-back** (index → record): [`SyncEngine::set_labels`] rewrites the
//!   labels field, persists the record and asks the host to reimport the
//!   asset, and only then makes the index match the new label set exactly.
//!
//! ## Failure Model
//!
//! Every failure before the record is persisted (unreadable record, missing
//! userData line, unencodable identifier, container creation) aborts the call
//! with the index untouched. A failed reimport request after a successful
//! write is reported as a warning and the index is still updated, since the
//! record on disk already holds the new labels.
//!
//! ## Workflow
//!
//! ```text
//! set_labels ─► read record ─► rewrite field ─► write record ─► notify host
//!                                                                    │
//!                     index updated (unassign / get-or-create / assign)
//! ```

use crate::error::{Result, SyncError};
use bridge_traits::asset::{AssetDatabase, AssetHandle};
use bridge_traits::storage::RecordStore;
use core_library::{Label, LabelId, LabelStore};
use core_metadata::MetadataRecord;
use core_runtime::events::{CoreEvent, EventBus, LabelEvent};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Result of ingesting one record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Labels the index did not know and created implicitly
    pub created: Vec<Label>,
    /// Labels newly assigned to the asset
    pub assigned: Vec<LabelId>,
}

impl IngestOutcome {
    /// Whether the ingest left the index unchanged.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.assigned.is_empty()
    }
}

/// Result of rewriting one asset's labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetLabelsOutcome {
    pub asset_path: String,
    /// Identifiers now carried by the asset, in the requested order
    pub labels: Vec<LabelId>,
    pub added: Vec<LabelId>,
    pub removed: Vec<LabelId>,
    /// Labels that did not exist in the index before this call
    pub created: Vec<Label>,
    /// Whether the record changed on disk
    pub record_written: bool,
    /// Whether the host accepted the reimport request
    pub reimport_requested: bool,
}

/// Result of ingesting many records
#[derive(Debug, Default)]
pub struct IngestReport {
    pub ingested: Vec<(String, IngestOutcome)>,
    pub failures: Vec<(String, SyncError)>,
}

impl IngestReport {
    /// Number of labels created across all records.
    pub fn created_count(&self) -> usize {
        self.ingested.iter().map(|(_, o)| o.created.len()).sum()
    }
}

/// Result of applying one label change to a selection of assets
#[derive(Debug, Default)]
pub struct BatchReport {
    pub changed: Vec<SetLabelsOutcome>,
    /// Assets already in the requested state
    pub unchanged: Vec<String>,
    pub failures: Vec<(String, SyncError)>,
}

/// Reconciles side-car records with the label index
pub struct SyncEngine {
    assets: Arc<dyn AssetDatabase>,
    records: Arc<dyn RecordStore>,
    events: Option<EventBus>,
}

impl SyncEngine {
    pub fn new(assets: Arc<dyn AssetDatabase>, records: Arc<dyn RecordStore>) -> Self {
        Self {
            assets,
            records,
            events: None,
        }
    }

    /// Publish label events on `bus`.
    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn asset_database(&self) -> &Arc<dyn AssetDatabase> {
        &self.assets
    }

    fn emit(&self, event: LabelEvent) {
        if let Some(bus) = &self.events {
            // no subscribers is not an error
            let _ = bus.emit(CoreEvent::Label(event));
        }
    }

    fn emit_labels_changed(&self, store: &LabelStore, asset_path: &str) {
        let labels = store
            .index()
            .labels_of(asset_path)
            .map(|label| label.id().to_string())
            .collect();
        self.emit(LabelEvent::AssetLabelsChanged {
            asset_path: asset_path.to_string(),
            labels,
        });
    }

    fn emit_created(&self, label: &Label, implicit: bool) {
        self.emit(LabelEvent::LabelCreated {
            id: label.id().to_string(),
            name: label.name.clone(),
            implicit,
        });
    }

    fn load_record(&self, asset_path: &str) -> Result<MetadataRecord> {
        let lines = self.records.read_record_lines(asset_path)?;
        Ok(MetadataRecord::new(asset_path, lines))
    }

    fn report_ingest_failure(&self, asset_path: &str, err: &SyncError) {
        error!(asset = asset_path, error = %err, "Failed to ingest record");
        self.emit(LabelEvent::IngestFailed {
            asset_path: asset_path.to_string(),
            message: err.to_string(),
        });
    }

    /// Merge the labels stored in an asset's record into the index.
    ///
    /// Unknown identifiers create labels implicitly (display name = identifier,
    /// no color). Running it again on an unchanged record is a no-op.
    #[instrument(skip(self, store))]
    pub fn ingest(&self, store: &mut LabelStore, asset_path: &str) -> Result<IngestOutcome> {
        let ids = match self
            .load_record(asset_path)
            .and_then(|record| record.read_labels().map_err(SyncError::from))
        {
            Ok(ids) => ids,
            Err(err) => {
                self.report_ingest_failure(asset_path, &err);
                return Err(err);
            }
        };

        let needs_container = ids.iter().any(|id| !store.index().contains_label(id));
        if needs_container {
            if let Err(err) = store.ensure_container() {
                let err = SyncError::from(err);
                self.report_ingest_failure(asset_path, &err);
                return Err(err);
            }
        }

        let mut outcome = IngestOutcome::default();
        for id in &ids {
            let index = store.index_mut();
            let label = match index.find_by_identifier(id) {
                Some(existing) => existing.clone(),
                None => {
                    let created = index.get_or_insert(Label::from_identifier(id));
                    self.emit_created(&created, true);
                    outcome.created.push(created.clone());
                    created
                }
            };
            if index.assign(&label, asset_path) {
                outcome.assigned.push(label.id().clone());
            }
        }

        if !outcome.assigned.is_empty() {
            self.emit_labels_changed(store, asset_path);
        }
        debug!(
            created = outcome.created.len(),
            assigned = outcome.assigned.len(),
            "Ingested record"
        );
        Ok(outcome)
    }

    /// Ingest the record of a host asset handle.
    pub fn ingest_handle(&self, store: &mut LabelStore, handle: &AssetHandle) -> Result<IngestOutcome> {
        let asset_path = self.resolve(handle)?;
        self.ingest(store, &asset_path)
    }

    /// Ingest many records, collecting per-asset failures.
    #[instrument(skip_all, fields(count = asset_paths.len()))]
    pub fn ingest_all<S: AsRef<str>>(&self, store: &mut LabelStore, asset_paths: &[S]) -> IngestReport {
        let mut report = IngestReport::default();
        for asset_path in asset_paths {
            let asset_path = asset_path.as_ref();
            match self.ingest(store, asset_path) {
                Ok(outcome) => report.ingested.push((asset_path.to_string(), outcome)),
                Err(err) => report.failures.push((asset_path.to_string(), err)),
            }
        }
        info!(
            ingested = report.ingested.len(),
            failed = report.failures.len(),
            created = report.created_count(),
            "Bulk ingest finished"
        );
        report
    }

    /// Replace the full label set of an asset.
    ///
    /// Duplicate labels (by identifier) are collapsed, keeping the first
    /// occurrence. The record is written before the index is touched.
    #[instrument(skip(self, store, labels), fields(count = labels.len()))]
    pub fn set_labels(
        &self,
        store: &mut LabelStore,
        asset_path: &str,
        labels: &[Label],
    ) -> Result<SetLabelsOutcome> {
        let mut targets: Vec<Label> = Vec::with_capacity(labels.len());
        for label in labels {
            if !targets.contains(label) {
                targets.push(label.clone());
            }
        }
        let target_ids: Vec<LabelId> = targets.iter().map(|l| l.id().clone()).collect();

        let mut record = self.load_record(asset_path)?;
        let before = record.lines().to_vec();
        record.write_labels(&target_ids)?;

        if targets
            .iter()
            .any(|label| !store.index().contains_label(label.id().as_str()))
        {
            store.ensure_container()?;
        }

        let record_written = record.lines() != before.as_slice();
        let mut reimport_requested = false;
        if record_written {
            self.records.write_record_lines(asset_path, record.lines())?;
            match self.assets.notify_changed(asset_path) {
                Ok(()) => reimport_requested = true,
                Err(err) => {
                    warn!(asset = asset_path, error = %err, "Reimport request failed");
                    self.emit(LabelEvent::ReimportFailed {
                        asset_path: asset_path.to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }

        let index = store.index_mut();
        let carried: Vec<Label> = index.labels_of(asset_path).cloned().collect();
        let mut removed = Vec::new();
        for label in carried.iter().filter(|l| !targets.contains(l)) {
            if index.unassign(label, asset_path) {
                removed.push(label.id().clone());
            }
        }

        let mut added = Vec::new();
        let mut created = Vec::new();
        for label in &targets {
            let is_new = !index.contains_label(label.id().as_str());
            let stored = index.get_or_insert(label.clone());
            if is_new {
                self.emit_created(&stored, false);
                created.push(stored.clone());
            }
            if index.assign(&stored, asset_path) {
                added.push(stored.id().clone());
            }
        }

        if !added.is_empty() || !removed.is_empty() {
            self.emit_labels_changed(store, asset_path);
        }
        info!(
            asset = asset_path,
            added = added.len(),
            removed = removed.len(),
            record_written,
            "Updated asset labels"
        );

        Ok(SetLabelsOutcome {
            asset_path: asset_path.to_string(),
            labels: target_ids,
            added,
            removed,
            created,
            record_written,
            reimport_requested,
        })
    }

    /// Replace the label set of a host asset handle.
    pub fn set_labels_for_handle(
        &self,
        store: &mut LabelStore,
        handle: &AssetHandle,
        labels: &[Label],
    ) -> Result<SetLabelsOutcome> {
        let asset_path = self.resolve(handle)?;
        self.set_labels(store, &asset_path, labels)
    }

    /// Attach `label` to every asset in `asset_paths` that lacks it.
    pub fn add_label<S: AsRef<str>>(
        &self,
        store: &mut LabelStore,
        asset_paths: &[S],
        label: &Label,
    ) -> BatchReport {
        self.apply_to_each(store, asset_paths, |current| {
            if current.contains(label) {
                return None;
            }
            let mut next = current.to_vec();
            next.push(label.clone());
            Some(next)
        })
    }

    /// Detach `label` from every asset in `asset_paths` that carries it.
    pub fn remove_label<S: AsRef<str>>(
        &self,
        store: &mut LabelStore,
        asset_paths: &[S],
        label: &Label,
    ) -> BatchReport {
        self.apply_to_each(store, asset_paths, |current| {
            if !current.contains(label) {
                return None;
            }
            Some(current.iter().filter(|l| *l != label).cloned().collect())
        })
    }

    fn apply_to_each<S, F>(&self, store: &mut LabelStore, asset_paths: &[S], next_labels: F) -> BatchReport
    where
        S: AsRef<str>,
        F: Fn(&[Label]) -> Option<Vec<Label>>,
    {
        let mut report = BatchReport::default();
        for asset_path in asset_paths {
            let asset_path = asset_path.as_ref();
            let current: Vec<Label> = store.index().labels_of(asset_path).cloned().collect();
            let Some(next) = next_labels(&current) else {
                report.unchanged.push(asset_path.to_string());
                continue;
            };
            match self.set_labels(store, asset_path, &next) {
                Ok(outcome) => report.changed.push(outcome),
                Err(err) => {
                    warn!(asset = asset_path, error = %err, "Skipping asset in batch");
                    report.failures.push((asset_path.to_string(), err));
                }
            }
        }
        report
    }

    /// Carry an asset's assignments over to its new path after a move.
    ///
    /// The record travels with the asset, so only the index changes.
    pub fn asset_moved(&self, store: &mut LabelStore, from: &str, to: &str) -> usize {
        let moved = store.index_mut().rename_asset(from, to);
        if moved > 0 {
            self.emit(LabelEvent::AssetMoved {
                from: from.to_string(),
                to: to.to_string(),
            });
            self.emit_labels_changed(store, to);
        }
        moved
    }

    /// Drop every assignment of an asset that no longer exists.
    pub fn asset_deleted(&self, store: &mut LabelStore, asset_path: &str) -> usize {
        let removed = store.index_mut().forget_asset(asset_path);
        if removed > 0 {
            self.emit_labels_changed(store, asset_path);
        }
        removed
    }

    fn resolve(&self, handle: &AssetHandle) -> Result<String> {
        self.assets.path_of(handle).ok_or_else(|| {
            warn!(handle = %handle, "Refusing untracked asset");
            SyncError::UntrackedAsset {
                handle: handle.to_string(),
            }
        })
    }
}
