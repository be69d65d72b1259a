//! # Label Index
//!
//! In-memory store of label → asset-path associations.
//!
//! ## Overview
//!
//! The index keeps an insertion-ordered list of [`LabelEntry`] values, at most
//! one per [`LabelId`], plus a derived "has-label" set answering whether an
//! asset carries any label at all.
//!
//! The has-label set is never patched incrementally. Every membership change
//! drops it and the next [`LabelIndex::has_any_label`] call rebuilds it with a
//! full scan.

use crate::models::{Label, LabelColor, LabelEntry, LabelId};
use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Ordered label → asset-path index with a lazily rebuilt reverse lookup
#[derive(Debug, Default)]
pub struct LabelIndex {
    entries: Vec<LabelEntry>,
    positions: HashMap<LabelId, usize>,
    has_label: OnceCell<HashSet<String>>,
    dirty: bool,
}

impl LabelIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from persisted entries.
    ///
    /// Entries whose identifiers collide are merged: the first entry's label
    /// keeps its display attributes and the asset lists are unioned.
    pub fn from_entries(entries: impl IntoIterator<Item = LabelEntry>) -> Self {
        let mut index = Self::new();
        for entry in entries {
            let position = match index.positions.get(entry.label.id()) {
                Some(&position) => {
                    debug!(label = %entry.label.id(), "Merging duplicate label entry");
                    position
                }
                None => index.push_entry(LabelEntry::new(entry.label.clone())),
            };
            for asset in &entry.assets {
                index.entries[position].insert(asset);
            }
        }
        index.dirty = false;
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LabelEntry] {
        &self.entries
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> + Clone + '_ {
        self.entries.iter().map(|entry| &entry.label)
    }

    /// Whether the index changed since it was loaded or last saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Resolve `name` to its label, creating an empty entry if needed.
    ///
    /// Display attributes are first-writer-wins: when the identifier already
    /// exists the requested color is ignored and the stored label is returned.
    pub fn get_or_create(&mut self, name: &str, color: Option<LabelColor>) -> Label {
        let mut label = Label::new(name);
        label.color = color;
        self.get_or_insert(label)
    }

    /// Resolve a pre-built label, inserting it if its identifier is unknown.
    pub fn get_or_insert(&mut self, label: Label) -> Label {
        if let Some(&position) = self.positions.get(label.id()) {
            return self.entries[position].label.clone();
        }
        debug!(label = %label.id(), "Created label");
        self.push_entry(LabelEntry::new(label.clone()));
        label
    }

    pub fn find_by_identifier(&self, id: &str) -> Option<&Label> {
        self.entry(id).map(|entry| &entry.label)
    }

    pub fn contains_label(&self, id: &str) -> bool {
        self.positions.contains_key(&LabelId::normalize(id))
    }

    pub fn entry(&self, id: &str) -> Option<&LabelEntry> {
        self.positions
            .get(&LabelId::normalize(id))
            .map(|&position| &self.entries[position])
    }

    /// Asset paths carrying the label, in assignment order.
    pub fn assets_of(&self, id: &str) -> &[String] {
        self.entry(id).map(|entry| entry.assets.as_slice()).unwrap_or(&[])
    }

    /// Mutable display attributes of a stored label.
    ///
    /// Marks the index dirty as soon as the label is borrowed, whether or not
    /// the caller changes it. Compare first when a no-op write is likely.
    pub fn label_mut(&mut self, id: &str) -> Option<&mut Label> {
        let position = *self.positions.get(&LabelId::normalize(id))?;
        self.dirty = true;
        Some(&mut self.entries[position].label)
    }

    /// Attach `label` to `asset_path`.
    ///
    /// Unknown labels are inserted first. Returns `false` when the asset
    /// already carried the label.
    pub fn assign(&mut self, label: &Label, asset_path: &str) -> bool {
        let position = match self.positions.get(label.id()) {
            Some(&position) => position,
            None => self.push_entry(LabelEntry::new(label.clone())),
        };
        let changed = self.entries[position].insert(asset_path);
        self.invalidate();
        if changed {
            trace!(label = %label.id(), asset = asset_path, "Assigned label");
            self.dirty = true;
        }
        changed
    }

    /// Detach `label` from `asset_path`. Returns `false` when nothing changed.
    pub fn unassign(&mut self, label: &Label, asset_path: &str) -> bool {
        let Some(&position) = self.positions.get(label.id()) else {
            return false;
        };
        let changed = self.entries[position].remove(asset_path);
        self.invalidate();
        if changed {
            trace!(label = %label.id(), asset = asset_path, "Unassigned label");
            self.dirty = true;
        }
        changed
    }

    /// Labels carried by `asset_path`, in index order.
    ///
    /// The returned iterator is lazy and can be cloned to restart it.
    pub fn labels_of<'a>(&'a self, asset_path: &'a str) -> LabelsOf<'a> {
        LabelsOf {
            entries: self.entries.iter(),
            asset_path,
        }
    }

    /// Distinct labels carried by any of `asset_paths`, in index order.
    pub fn labels_of_many<S: AsRef<str>>(&self, asset_paths: &[S]) -> Vec<Label> {
        self.entries
            .iter()
            .filter(|entry| asset_paths.iter().any(|p| entry.contains(p.as_ref())))
            .map(|entry| entry.label.clone())
            .collect()
    }

    /// Every label, ordered for display next to a selection: labels the
    /// selection does not carry come first, then by identifier.
    pub fn catalog_for<S: AsRef<str>>(&self, selection: &[S]) -> Vec<&Label> {
        let carried: HashSet<&LabelId> = self
            .entries
            .iter()
            .filter(|entry| selection.iter().any(|p| entry.contains(p.as_ref())))
            .map(|entry| entry.label.id())
            .collect();

        let mut catalog: Vec<&Label> = self.labels().collect();
        catalog.sort_by(|a, b| {
            carried
                .contains(a.id())
                .cmp(&carried.contains(b.id()))
                .then_with(|| a.id().cmp(b.id()))
        });
        catalog
    }

    /// Whether `asset_path` carries at least one label.
    ///
    /// Rebuilds the reverse lookup first if a mutation invalidated it.
    pub fn has_any_label(&self, asset_path: &str) -> bool {
        self.has_label
            .get_or_init(|| {
                let lookup: HashSet<String> = self
                    .entries
                    .iter()
                    .flat_map(|entry| entry.assets.iter().cloned())
                    .collect();
                trace!(assets = lookup.len(), "Rebuilt has-label lookup");
                lookup
            })
            .contains(asset_path)
    }

    /// Move every assignment of `old_path` to `new_path`.
    ///
    /// Returns the number of labels that moved.
    pub fn rename_asset(&mut self, old_path: &str, new_path: &str) -> usize {
        let mut moved = 0;
        for entry in &mut self.entries {
            if entry.remove(old_path) {
                entry.insert(new_path);
                moved += 1;
            }
        }
        self.invalidate();
        if moved > 0 {
            self.dirty = true;
        }
        moved
    }

    /// Drop every assignment of `asset_path`. Returns the number removed.
    pub fn forget_asset(&mut self, asset_path: &str) -> usize {
        let removed = self
            .entries
            .iter_mut()
            .map(|entry| entry.remove(asset_path))
            .filter(|removed| *removed)
            .count();
        self.invalidate();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    /// Delete one label entry together with its assignments.
    pub fn remove_label(&mut self, id: &str) -> Option<LabelEntry> {
        let position = self.positions.remove(&LabelId::normalize(id))?;
        let removed = self.entries.remove(position);
        self.reindex();
        self.invalidate();
        self.dirty = true;
        Some(removed)
    }

    /// Delete every entry that has no assets. Returns the number removed.
    pub fn prune_empty(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.assets.is_empty());
        let removed = before - self.entries.len();
        if removed > 0 {
            self.reindex();
            self.invalidate();
            self.dirty = true;
        }
        removed
    }

    fn push_entry(&mut self, entry: LabelEntry) -> usize {
        let position = self.entries.len();
        self.positions.insert(entry.label.id().clone(), position);
        self.entries.push(entry);
        self.dirty = true;
        position
    }

    fn reindex(&mut self) {
        self.positions = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.label.id().clone(), position))
            .collect();
    }

    fn invalidate(&mut self) {
        self.has_label.take();
    }
}

/// Lazy iterator over the labels carried by one asset path
#[derive(Debug, Clone)]
pub struct LabelsOf<'a> {
    entries: std::slice::Iter<'a, LabelEntry>,
    asset_path: &'a str,
}

impl<'a> Iterator for LabelsOf<'a> {
    type Item = &'a Label;

    fn next(&mut self) -> Option<Self::Item> {
        let asset_path = self.asset_path;
        self.entries
            .by_ref()
            .find(|entry| entry.contains(asset_path))
            .map(|entry| &entry.label)
    }
}
