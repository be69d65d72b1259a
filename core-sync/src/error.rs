use bridge_traits::error::BridgeError;
use core_library::LibraryError;
use core_metadata::MetadataError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Asset handle {handle} is not tracked by the asset database")]
    UntrackedAsset { handle: String },

    #[error("Malformed record for {path}: no userData line")]
    MalformedRecord { path: String },

    #[error("Metadata error: {0}")]
    Metadata(#[source] MetadataError),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl From<MetadataError> for SyncError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::MalformedRecord { path } => SyncError::MalformedRecord { path },
            other => SyncError::Metadata(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
