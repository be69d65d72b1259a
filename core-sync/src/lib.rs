//! # Label Sync Module
//!
//! Reconciles per-asset side-car records with the label index.
//!
//! ## Overview
//!
//! This module manages:
//! - Ingesting the labels field of a record into the index
//! - Writing a new label set back to a record and updating the index
//! - Batch add/remove of one label across a selection of assets
//! - Following asset moves and deletions reported by the host
//!
//! ## Components
//!
//! - **Sync Engine** (`engine`): entry points for every record/index transition

pub mod engine;
pub mod error;

pub use engine::{BatchReport, IngestOutcome, IngestReport, SetLabelsOutcome, SyncEngine};
pub use error::{Result, SyncError};
