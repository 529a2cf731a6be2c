use std::io;

use thiserror::Error;

use crate::contract::CollaboratorError;

/// Failures in the storage, analysis and file glue around the tree engine.
///
/// The tree transformations themselves never fail; these only describe I/O.
#[derive(Debug, Error)]
pub enum GlueError {
    #[error("blob storage call failed for '{target}': {source}")]
    Storage {
        target: String,
        #[source]
        source: CollaboratorError,
    },
    #[error("document analysis failed for '{document}': {source}")]
    Analysis {
        document: String,
        #[source]
        source: CollaboratorError,
    },
    #[error("'{0}' is not a PDF according to its file extension")]
    NotPdf(String),
    #[error("invalid blob url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("blob '{0}' is not valid UTF-8")]
    NotUtf8(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}
