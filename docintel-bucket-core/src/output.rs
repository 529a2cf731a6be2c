//! Writing payloads to blob storage and reading/writing local files.
//!
//! Every function here logs its own failures and reports them as `false` or
//! `None`, so a batch can treat a failed write as a skipped step.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{error, info};

use crate::contract::BlobStore;
use crate::error::GlueError;

/// How a payload is encoded on its way to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// Plain text. String values are written as-is, anything else as compact JSON.
    Text,
    /// Serialized JSON.
    Json,
}

impl PayloadFormat {
    pub fn encode(self, payload: &Value) -> Result<Vec<u8>, GlueError> {
        match self {
            PayloadFormat::Json => Ok(serde_json::to_vec(payload)?),
            PayloadFormat::Text => Ok(match payload {
                Value::String(text) => text.clone().into_bytes(),
                other => other.to_string().into_bytes(),
            }),
        }
    }
}

/// `container/virtual_directory/file_name`, the blob name used for writes.
pub fn blob_path(container: &str, virtual_directory: &str, file_name: &str) -> String {
    format!("{container}/{virtual_directory}/{file_name}")
}

/// Encode `payload` and upload it to `container` under [`blob_path`].
pub async fn write_to_blob<S>(
    store: &S,
    container: &str,
    virtual_directory: &str,
    file_name: &str,
    payload: &Value,
    format: PayloadFormat,
) -> bool
where
    S: BlobStore + ?Sized,
{
    let blob_name = blob_path(container, virtual_directory, file_name);
    let body = match format.encode(payload) {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, file = file_name, blob = %blob_name, "Failed to encode payload for upload");
            return false;
        }
    };

    match store.upload(container, &blob_name, body).await {
        Ok(()) => {
            info!(file = file_name, blob = %blob_name, ?format, "Uploaded blob");
            true
        }
        Err(e) => {
            error!(error = ?e, file = file_name, blob = %blob_name, "Error uploading blob");
            false
        }
    }
}

/// Write `payload` to `dir/file_name_with_extension`.
pub fn local_file_write(payload: &Value, format: PayloadFormat, dir: &Path, file_name_with_extension: &str) -> bool {
    let path = dir.join(file_name_with_extension);
    let result = format
        .encode(payload)
        .and_then(|body| fs::write(&path, body).map_err(GlueError::from));
    match result {
        Ok(()) => {
            info!(path = %path.display(), ?format, "File successfully written");
            true
        }
        Err(e) => {
            error!(error = %e, path = %path.display(), "Failed to write file");
            false
        }
    }
}

/// Read `path` as text (returned as a JSON string) or as parsed JSON.
pub fn local_file_read(path: &Path, format: PayloadFormat) -> Option<Value> {
    let read = || -> Result<Value, GlueError> {
        let text = fs::read_to_string(path)?;
        Ok(match format {
            PayloadFormat::Text => Value::String(text),
            PayloadFormat::Json => serde_json::from_str(&text)?,
        })
    };
    match read() {
        Ok(value) => Some(value),
        Err(e) => {
            error!(error = %e, path = %path.display(), "Failed to read file");
            None
        }
    }
}
