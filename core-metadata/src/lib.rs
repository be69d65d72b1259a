//! # Side-car Record Metadata
//!
//! Reads and rewrites the `labels={...}` field inside an asset's side-car
//! metadata record.
//!
//! ## Overview
//!
//! Records are line-oriented text owned by the host. Only one field on the
//! first `  userData:` line is ever touched; every other byte of the record is
//! handed back unchanged.
//!
//! - [`codec::read_labels`] / [`codec::write_labels`] work on raw lines
//! - [`codec::MetadataRecord`] pairs lines with their asset path and reports
//!   malformed records with that path attached

pub mod codec;
pub mod error;

pub use codec::{read_labels, write_labels, MetadataRecord, USER_DATA_PREFIX};
pub use error::{MetadataError, Result};
