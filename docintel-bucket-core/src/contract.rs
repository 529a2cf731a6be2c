#![allow(unused)]

//! # contract: interfaces to blob storage and document analysis
//!
//! The core never talks to a cloud SDK directly. It depends on two async traits:
//! - [`BlobStore`]: list a container, fetch a blob by URL, upload a blob.
//! - [`DocumentAnalyzer`]: submit a document URL to an analysis model and wait
//!   for the JSON result.
//!
//! Concrete HTTP clients live in the `docintel-bucket` binary crate. Tests use the
//! `mockall` mocks generated here (`MockBlobStore`, `MockDocumentAnalyzer`), which
//! are exported under the `test-export-mocks` feature so other crates can use them.
//!
//! All trait methods return boxed errors; callers in this crate log them and
//! turn them into skipped steps rather than aborting a batch.

use async_trait::async_trait;
use mockall::{automock, predicate::*};
use serde_json::Value;

/// Boxed error used at every collaborator seam.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// One object in a blob container, as returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobDescriptor {
    /// Blob name, including any virtual directory prefix.
    pub name: String,
    /// URL from which the blob can be fetched.
    pub url: String,
}

/// Opaque reference to a finished analysis operation (for example its
/// operation location URL).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisHandle(pub String);

impl AnalysisHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A completed analysis: the handle and the JSON form of the result.
#[derive(Debug, Clone)]
pub struct AnalyzedDocument {
    pub handle: AnalysisHandle,
    pub result: Value,
}

/// Blob storage operations the pipeline needs.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// List every blob in `container`.
    async fn list_blobs(&self, container: &str) -> Result<Vec<BlobDescriptor>, CollaboratorError>;

    /// Download the full contents of the blob at `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CollaboratorError>;

    /// Write `body` to `blob_name` inside `container`, replacing any existing blob.
    async fn upload(
        &self,
        container: &str,
        blob_name: &str,
        body: Vec<u8>,
    ) -> Result<(), CollaboratorError>;
}

/// Document analysis service.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    /// Submit `document_url` to `model_id` and wait until the result is ready.
    async fn analyze_from_url(
        &self,
        model_id: &str,
        document_url: &str,
    ) -> Result<AnalyzedDocument, CollaboratorError>;
}
