//! # Label Library
//!
//! Owns the label model and the label → asset index for a project.
//!
//! ## Overview
//!
//! This crate manages:
//! - Label identity (`LabelId` normalization, identity-only equality)
//! - The in-memory [`LabelIndex`] with its lazily rebuilt has-label lookup
//! - [`LabelStore`], which loads and saves the index through a host
//!   [`IndexContainer`](bridge_traits::IndexContainer)
//! - [`LabelQuery`] search over candidate asset paths
//!
//! Side-car record parsing lives in `core-metadata`; keeping records and the
//! index in step is the job of `core-sync`.

pub mod error;
pub mod index;
pub mod models;
pub mod query;
pub mod store;

pub use error::{LibraryError, Result};
pub use index::{LabelIndex, LabelsOf};
pub use models::{Label, LabelColor, LabelEntry, LabelId};
pub use query::{LabelQuery, SearchHit, DEFAULT_RESULT_LIMIT};
pub use store::{LabelStore, CONTAINER_VERSION};
