use crate::api::ApiError;

/// Errors surfaced by climate entities and entity setup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("device command failed: {0}")]
    Api(#[from] ApiError),

    #[error("unknown preset '{preset}' for {entity_id}")]
    UnknownPreset { entity_id: String, preset: String },

    #[error("invalid device descriptor: {0}")]
    InvalidDevice(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
