use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Record has no userData line")]
    MissingUserData,

    #[error("Malformed record for {path}: no userData line")]
    MalformedRecord { path: String },

    #[error("Label identifier cannot be encoded in a record: {id:?}")]
    UnencodableIdentifier { id: String },

    #[error("Regex error: {0}")]
    Regex(String),
}

impl MetadataError {
    /// Attach the asset path to a context-free codec error.
    pub fn for_asset(self, asset_path: &str) -> Self {
        match self {
            MetadataError::MissingUserData => MetadataError::MalformedRecord {
                path: asset_path.to_string(),
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;
