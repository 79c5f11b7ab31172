use std::path::PathBuf;

use cg_script::LoadError;

#[derive(Debug, thiserror::Error)]
pub enum CgError {
    /// The chapter's stage or script asks for something that does not exist.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid script: {0}")]
    Script(#[from] LoadError),

    #[error("malformed stage manifest: {0}")]
    Manifest(#[from] toml::de::Error),

    #[error("resource not ready: {0}")]
    ResourceNotReady(String),

    #[error("player is not initialized")]
    NotInitialized,

    #[error("player is already playing")]
    AlreadyPlaying,

    #[error("io error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("animation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, CgError>;
