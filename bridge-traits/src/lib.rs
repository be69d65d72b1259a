//! # Host Bridge Traits
//!
//! Host abstraction traits that must be implemented by each host integration.
//!
//! ## Overview
//!
//! This crate defines the contract between the label core and the host that
//! owns the assets. Each trait represents a capability the core requires but
//! that differs per host (a game editor's asset database, a plain project
//! directory on desktop, a test fake).
//!
//! ## Traits
//!
//! ### Assets
//! - [`AssetDatabase`](asset::AssetDatabase) - Handle → path resolution, reimport notification, asset listing
//!
//! ### Storage
//! - [`RecordStore`](storage::RecordStore) - Raw side-car record line I/O
//! - [`IndexContainer`](storage::IndexContainer) - Persistent container for the label index
//!
//! ### Utilities
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Host Implementations
//!
//! | Host     | Implementation Crate | Status |
//! |----------|----------------------|--------|
//! | Desktop  | `bridge-desktop`     | ✅ Available |
//! | Editor   | Host-provided        | 📋 Planned |
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing:
//!
//! ```ignore
//! use core_runtime::error::Error;
//!
//! let record_store = config.record_store
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "RecordStore".to_string(),
//!         message: "No record store provided. \
//!                  Desktop: enable the 'desktop-shims' feature. \
//!                  Editors: inject the host adapter.".to_string()
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Host
//! implementations should:
//!
//! - Convert host-specific errors to `BridgeError`
//! - Report a missing record as `BridgeError::NotFound`
//! - Include the asset path in error messages
//!
//! ## Thread Safety
//!
//! Bridge traits require `Send + Sync` so a host may keep them behind `Arc`.
//! The core itself calls them from a single thread.

pub mod asset;
pub mod error;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use asset::{AssetDatabase, AssetHandle};
pub use storage::{IndexContainer, RecordStore};
pub use time::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
