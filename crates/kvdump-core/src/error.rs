use std::io;
use std::path::PathBuf;

use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    /// A folder listed moments earlier no longer exists. Only the root of a
    /// mount may legitimately be missing.
    #[error("path vanished while listing mount {mount}: {path}")]
    VanishedPath { mount: String, path: String },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("unsupported kv version {version:?} on mount {mount}")]
    UnsupportedKvVersion { mount: String, version: String },
    #[error("malformed secret {mount}/{path}: {message}")]
    Malformed {
        mount: String,
        path: String,
        message: String,
    },
    #[error(
        "secret {file} and folder of secret {folder} both map to {}",
        path.display()
    )]
    OutputCollision {
        path: PathBuf,
        file: String,
        folder: String,
    },
    #[error("refusing unsafe output path: {path}")]
    UnsafePath { path: String },
    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
