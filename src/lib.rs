//! Workspace umbrella crate.
//!
//! Exposes feature flags that map to the individual workspace crates so a
//! host can depend on `asset-labels-workspace` alone:
//!
//! - `desktop-shims` (default): the full [`service`] façade with filesystem bridges
//! - `codec-only`: just the side-car record codec as [`metadata`]
//! - `index-only`: just the label model and index as [`library`]

#[cfg(feature = "desktop-shims")]
pub use core_service as service;

#[cfg(feature = "codec-only")]
pub use core_metadata as metadata;

#[cfg(feature = "index-only")]
pub use core_library as library;
