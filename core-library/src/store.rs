//! # Label Store
//!
//! Owns the [`LabelIndex`] for a project and its persistent container.
//!
//! ## Overview
//!
//! The store has an explicit lifecycle:
//!
//! 1. [`LabelStore::open`] loads the index from an [`IndexContainer`]
//! 2. Callers mutate it through `&mut LabelStore`
//! 3. [`LabelStore::save`] writes it back when dirty; [`LabelStore::close`]
//!    saves and consumes the store
//!
//! The container itself is created lazily by [`LabelStore::ensure_container`],
//! at most once per store, before the first label-creating write.
//!
//! ## Container Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "labels": [
//!     { "label": { "id": "hero_prop", "name": "Hero Prop", "color": null },
//!       "assets": ["Assets/crate.prefab"] }
//!   ]
//! }
//! ```

use crate::error::{LibraryError, Result};
use crate::index::LabelIndex;
use crate::models::{Label, LabelColor, LabelEntry, LabelId};
use bridge_traits::storage::IndexContainer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Current container document version.
pub const CONTAINER_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ContainerDocument {
    version: u32,
    #[serde(default)]
    labels: Vec<LabelEntry>,
}

/// Persistent owner of a project's label index
pub struct LabelStore {
    index: LabelIndex,
    container: Arc<dyn IndexContainer>,
    container_ready: bool,
}

impl LabelStore {
    /// Load the index from `container`.
    ///
    /// A container that does not exist yet, or is empty, yields an empty index.
    #[instrument(skip(container))]
    pub fn open(container: Arc<dyn IndexContainer>) -> Result<Self> {
        let index = match container.load()? {
            Some(contents) if !contents.trim().is_empty() => {
                let document: ContainerDocument = serde_json::from_str(&contents)?;
                if document.version > CONTAINER_VERSION {
                    return Err(LibraryError::UnsupportedVersion {
                        found: document.version,
                        supported: CONTAINER_VERSION,
                    });
                }
                LabelIndex::from_entries(document.labels)
            }
            _ => LabelIndex::new(),
        };

        info!(labels = index.len(), "Opened label store");
        Ok(Self {
            index,
            container,
            container_ready: false,
        })
    }

    pub fn index(&self) -> &LabelIndex {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut LabelIndex {
        &mut self.index
    }

    /// Create the backing container if this store has not done so yet.
    pub fn ensure_container(&mut self) -> Result<()> {
        if !self.container_ready {
            self.container.ensure_container_exists()?;
            self.container_ready = true;
            debug!("Index container ready");
        }
        Ok(())
    }

    /// Declare a label by display name, resolving to the stored label when
    /// its identifier already exists.
    pub fn declare_label(&mut self, name: &str, color: Option<LabelColor>) -> Result<Label> {
        if LabelId::normalize(name).is_empty() {
            return Err(LibraryError::InvalidInput {
                field: "name".to_string(),
                message: "label name must not be empty".to_string(),
            });
        }
        if !self.index.contains_label(name) {
            self.ensure_container()?;
        }
        Ok(self.index.get_or_create(name, color))
    }

    /// Rename a label's display name. Its identifier is unchanged.
    pub fn rename_label(&mut self, id: &str, new_name: &str) -> Result<()> {
        if self.stored(id)?.name == new_name {
            return Ok(());
        }
        if let Some(label) = self.index.label_mut(id) {
            label.name = new_name.to_string();
        }
        Ok(())
    }

    /// Change or clear a label's color.
    pub fn recolor_label(&mut self, id: &str, color: Option<LabelColor>) -> Result<()> {
        if self.stored(id)?.color == color {
            return Ok(());
        }
        if let Some(label) = self.index.label_mut(id) {
            label.color = color;
        }
        Ok(())
    }

    fn stored(&self, id: &str) -> Result<&Label> {
        self.index
            .find_by_identifier(id)
            .ok_or_else(|| LibraryError::NotFound { id: id.to_string() })
    }

    /// Persist the index if it changed since the last save.
    ///
    /// Returns whether anything was written.
    #[instrument(skip(self))]
    pub fn save(&mut self) -> Result<bool> {
        if !self.index.is_dirty() {
            return Ok(false);
        }
        self.ensure_container()?;

        let document = ContainerDocument {
            version: CONTAINER_VERSION,
            labels: self.index.entries().to_vec(),
        };
        let contents = serde_json::to_string_pretty(&document)?;
        self.container.save(&contents)?;
        self.index.mark_clean();

        info!(labels = self.index.len(), "Saved label index");
        Ok(true)
    }

    /// Save and release the store.
    pub fn close(mut self) -> Result<()> {
        self.save()?;
        Ok(())
    }
}
