//! Blob catalog: container listings grouped by file extension, plus loading.
//!
//! A [`BlobCatalog`] is `{container: {extension: {blob name: BlobEntry}}}`. It is
//! built from a [`BlobStore`] listing and queried with a [`BlobFilter`] to pick
//! the blobs to fetch. Fetch failures are logged and skipped; nothing here aborts
//! a batch.

use std::collections::BTreeMap;

use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::contract::BlobStore;
use crate::error::GlueError;

/// Name and fetch URL of one cataloged blob.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BlobEntry {
    pub file_name: String,
    pub blob_url: String,
}

/// Blob name -> entry.
pub type ExtensionGroup = BTreeMap<String, BlobEntry>;
/// Extension (with leading dot, or empty) -> blobs.
pub type ContainerGroup = BTreeMap<String, ExtensionGroup>;

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct BlobCatalog {
    containers: BTreeMap<String, ContainerGroup>,
}

/// Optional narrowing of a catalog query. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlobFilter<'a> {
    pub container: Option<&'a str>,
    pub file_type: Option<&'a str>,
    pub file_name: Option<&'a str>,
}

impl<'a> BlobFilter<'a> {
    pub fn container(mut self, container: &'a str) -> Self {
        self.container = Some(container);
        self
    }

    pub fn file_type(mut self, file_type: &'a str) -> Self {
        self.file_type = Some(file_type);
        self
    }

    pub fn file_name(mut self, file_name: &'a str) -> Self {
        self.file_name = Some(file_name);
        self
    }
}

/// Extension of `name` including the dot, `""` if there is none.
///
/// Leading dots of a file name do not count, so `.env` has no extension.
pub fn file_extension(name: &str) -> &str {
    let base_start = name.rfind('/').map(|i| i + 1).unwrap_or(0);
    let base = &name[base_start..];
    let stem_start = base.len() - base.trim_start_matches('.').len();
    match base[stem_start..].rfind('.') {
        Some(dot) => &base[stem_start + dot..],
        None => "",
    }
}

impl BlobCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one blob under `container`, grouped by its extension.
    pub fn insert(&mut self, container: &str, blob: BlobEntry) {
        let extension = file_extension(&blob.file_name).to_string();
        self.containers
            .entry(container.to_string())
            .or_default()
            .entry(extension)
            .or_default()
            .insert(blob.file_name.clone(), blob);
    }

    /// Make sure `container` is present, even with no blobs.
    pub fn ensure_container(&mut self, container: &str) {
        self.containers.entry(container.to_string()).or_default();
    }

    /// Fold another catalog into this one. Entries in `other` win on name clashes.
    pub fn merge(&mut self, other: BlobCatalog) {
        for (container, groups) in other.containers {
            let target = self.containers.entry(container).or_default();
            for (extension, blobs) in groups {
                target.entry(extension).or_default().extend(blobs);
            }
        }
    }

    pub fn container(&self, container: &str) -> Option<&ContainerGroup> {
        self.containers.get(container)
    }

    pub fn containers(&self) -> impl Iterator<Item = &str> {
        self.containers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.containers
            .values()
            .flat_map(|groups| groups.values())
            .map(|blobs| blobs.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries matching `filter`, in container, extension, name order.
    pub fn select(&self, filter: &BlobFilter<'_>) -> Vec<&BlobEntry> {
        let containers: Vec<(&String, &ContainerGroup)> = match filter.container {
            Some(name) => match self.containers.get_key_value(name) {
                Some(found) => vec![found],
                None => {
                    warn!(container = name, "Container not found in blob catalog");
                    return Vec::new();
                }
            },
            None => self.containers.iter().collect(),
        };

        let mut selected = Vec::new();
        for (container, groups) in containers {
            let blobs: Vec<&BlobEntry> = match filter.file_type {
                Some(file_type) => match groups.get(file_type) {
                    Some(blobs) => blobs.values().collect(),
                    None => {
                        debug!(container = %container, file_type, "File type not found in container");
                        continue;
                    }
                },
                None => groups.values().flat_map(|blobs| blobs.values()).collect(),
            };
            selected.extend(
                blobs
                    .into_iter()
                    .filter(|blob| filter.file_name.map_or(true, |name| blob.file_name == name)),
            );
        }
        selected
    }
}

/// List `container` and group its blobs by extension.
pub async fn build_catalog<S>(store: &S, container: &str) -> Result<BlobCatalog, GlueError>
where
    S: BlobStore + ?Sized,
{
    info!(container, "Listing blobs for catalog");
    let blobs = store.list_blobs(container).await.map_err(|e| {
        error!(error = ?e, container, "Could not list blobs in container");
        GlueError::Storage {
            target: container.to_string(),
            source: e,
        }
    })?;

    let mut catalog = BlobCatalog::new();
    catalog.ensure_container(container);
    for blob in blobs {
        debug!(file = %blob.name, url = %blob.url, "Adding blob to catalog");
        catalog.insert(
            container,
            BlobEntry {
                file_name: blob.name,
                blob_url: blob.url,
            },
        );
    }
    info!(container, blobs = catalog.len(), "Blob catalog built");
    Ok(catalog)
}

/// Decoded blob contents.
#[derive(Debug, Clone, PartialEq)]
pub enum BlobContent {
    /// `.json` blobs, parsed.
    Json(Value),
    /// `.txt` blobs, decoded as UTF-8.
    Text(String),
    /// Everything else, untouched.
    Bytes(Vec<u8>),
}

impl BlobContent {
    /// Decode `bytes` according to the extension of `file_name`.
    pub fn decode(file_name: &str, bytes: Vec<u8>) -> Result<Self, GlueError> {
        match file_extension(file_name) {
            ".json" => Ok(BlobContent::Json(serde_json::from_slice(&bytes)?)),
            ".txt" => String::from_utf8(bytes)
                .map(BlobContent::Text)
                .map_err(|_| GlueError::NotUtf8(file_name.to_string())),
            _ => Ok(BlobContent::Bytes(bytes)),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            BlobContent::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            BlobContent::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Fetch and decode the first blob matching `filter`.
///
/// Returns `None` when nothing matches or when the fetch or decode fails.
pub async fn load_blob<S>(store: &S, catalog: &BlobCatalog, filter: &BlobFilter<'_>) -> Option<BlobContent>
where
    S: BlobStore + ?Sized,
{
    let Some(entry) = catalog.select(filter).into_iter().next() else {
        warn!(
            container = ?filter.container,
            file_type = ?filter.file_type,
            file_name = ?filter.file_name,
            "No blob in catalog matches filter"
        );
        return None;
    };

    let bytes = match store.fetch(&entry.blob_url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = ?e, file = %entry.file_name, "Failed to download blob");
            return None;
        }
    };

    match BlobContent::decode(&entry.file_name, bytes) {
        Ok(content) => {
            info!(file = %entry.file_name, "Loaded blob");
            Some(content)
        }
        Err(e) => {
            error!(error = %e, file = %entry.file_name, "Failed to decode blob");
            None
        }
    }
}

/// A raw blob yielded by [`load_blobs`].
#[derive(Debug, Clone)]
pub struct LoadedBlob {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Lazily fetch every blob matching `filter`, one at a time, as raw bytes.
///
/// Blobs that fail to download are logged and left out of the stream.
pub fn load_blobs<'a, S>(
    store: &'a S,
    catalog: &'a BlobCatalog,
    filter: BlobFilter<'a>,
) -> impl Stream<Item = LoadedBlob> + 'a
where
    S: BlobStore + ?Sized,
{
    stream::iter(catalog.select(&filter)).filter_map(move |entry| async move {
        match store.fetch(&entry.blob_url).await {
            Ok(content) => Some(LoadedBlob {
                file_name: entry.file_name.clone(),
                content,
            }),
            Err(e) => {
                error!(error = ?e, file = %entry.file_name, "Failed to download blob");
                None
            }
        }
    })
}
