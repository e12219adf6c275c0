//! Error taxonomy for loading, describing and writing type inventories.

use crate::types::Diagnostic;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The directory handed to the loader could not be listed.
    #[error("failed to list directory {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The type-info provider could not resolve a source file.
    #[error("failed to resolve {}: {diagnostic}", path.display())]
    Resolution {
        path: PathBuf,
        #[source]
        diagnostic: Diagnostic,
    },

    /// A single file resolved to more than one package.
    #[error("file {} resolves to multiple packages: {}", path.display(), packages.join(", "))]
    AmbiguousPackage { path: PathBuf, packages: Vec<String> },

    #[error("struct not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}
