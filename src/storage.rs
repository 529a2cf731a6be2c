//! # Azure Blob Storage client
//!
//! [`AzureBlobClient`] implements the core [`BlobStore`] trait over the Blob
//! service REST API using `reqwest`:
//! - List Blobs (`GET {account}/{container}?restype=container&comp=list`), following `NextMarker`
//! - Get Blob (`GET` on the blob URL returned by the listing)
//! - Put Blob (`PUT` with `x-ms-blob-type: BlockBlob`)
//!
//! The account URL may carry a query string (for example a pre-issued SAS). It is
//! passed along verbatim on every request and on every blob URL handed out by the
//! listing, so those URLs can be fetched or given to the analysis service as-is.
//! Issuing or refreshing such tokens is not done here.
//!
//! Construct with [`AzureBlobClient::new`] or from `AZURE_STORAGE_ACCOUNT_URL`
//! via [`AzureBlobClient::new_from_env`].

use std::env;

use async_trait::async_trait;
use docintel_bucket_core::contract::{BlobDescriptor, BlobStore, CollaboratorError};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::{Client, Url};

const API_VERSION: &str = "2023-11-03";

pub struct AzureBlobClient {
    http: Client,
    account_url: Url,
    access_query: Option<String>,
}

impl AzureBlobClient {
    pub fn new(account_url: &str) -> Result<Self, CollaboratorError> {
        let mut url = Url::parse(account_url).map_err(|e| {
            tracing::error!(error = ?e, "Failed to parse storage account URL");
            e
        })?;
        let access_query = url.query().map(str::to_string);
        url.set_query(None);
        tracing::info!(
            account = %url,
            access_query_set = access_query.is_some(),
            "Initialized AzureBlobClient"
        );
        Ok(Self {
            http: Client::new(),
            account_url: url,
            access_query,
        })
    }

    pub fn new_from_env() -> Result<Self, CollaboratorError> {
        dotenvy::dotenv().ok();
        match env::var("AZURE_STORAGE_ACCOUNT_URL") {
            Ok(account_url) => Self::new(&account_url),
            Err(e) => {
                tracing::error!(error = ?e, "AZURE_STORAGE_ACCOUNT_URL missing in environment");
                Err(Box::new(e))
            }
        }
    }

    /// URL of `blob_name` inside `container`, with the account query attached.
    pub fn blob_url(&self, container: &str, blob_name: &str) -> Result<Url, CollaboratorError> {
        let mut url = self.account_url.clone();
        url.path_segments_mut()
            .map_err(|_| format!("account URL cannot be a base: {}", self.account_url))?
            .pop_if_empty()
            .push(container)
            .extend(blob_name.split('/'));
        url.set_query(self.access_query.as_deref());
        Ok(url)
    }

    fn list_url(&self, container: &str, marker: Option<&str>) -> Result<Url, CollaboratorError> {
        let mut url = self.account_url.clone();
        url.path_segments_mut()
            .map_err(|_| format!("account URL cannot be a base: {}", self.account_url))?
            .pop_if_empty()
            .push(container);
        url.set_query(self.access_query.as_deref());
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("restype", "container").append_pair("comp", "list");
            if let Some(marker) = marker {
                pairs.append_pair("marker", marker);
            }
        }
        Ok(url)
    }
}

/// One page of a List Blobs response.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BlobListPage {
    pub names: Vec<String>,
    pub next_marker: Option<String>,
}

/// Parse the `EnumerationResults` XML body of a List Blobs call.
pub fn parse_blob_list(xml: &str) -> Result<BlobListPage, quick_xml::Error> {
    // No text trimming: blob names may start or end with spaces.
    let mut reader = Reader::from_str(xml);

    let mut page = BlobListPage::default();
    let mut element_stack: Vec<String> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                element_stack.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
            }
            Event::Text(e) => {
                let text = e.unescape()?.to_string();
                let path: Vec<&str> = element_stack.iter().map(String::as_str).collect();
                match path.as_slice() {
                    [.., "Blob", "Name"] => page.names.push(text),
                    ["EnumerationResults", "NextMarker"] if !text.trim().is_empty() => {
                        page.next_marker = Some(text)
                    }
                    _ => {}
                }
            }
            Event::End(_) => {
                element_stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(page)
}

#[async_trait]
impl BlobStore for AzureBlobClient {
    async fn list_blobs(&self, container: &str) -> Result<Vec<BlobDescriptor>, CollaboratorError> {
        tracing::info!(container, "Listing blobs in container");
        let mut blobs = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let url = self.list_url(container, marker.as_deref())?;
            let response = self
                .http
                .get(url)
                .header("x-ms-version", API_VERSION)
                .send()
                .await?;
            let status = response.status();
            let body = response.text().await?;
            if !status.is_success() {
                tracing::error!(status = %status, container, "List Blobs returned error. Response body: {body}");
                return Err(format!("List Blobs failed with {status}: {body}").into());
            }

            let page = parse_blob_list(&body)?;
            for name in page.names {
                let url = self.blob_url(container, &name)?;
                tracing::debug!(file = %name, "Blob listed");
                blobs.push(BlobDescriptor {
                    name,
                    url: url.to_string(),
                });
            }

            match page.next_marker {
                Some(next) => marker = Some(next),
                None => break,
            }
        }

        tracing::info!(container, count = blobs.len(), "Listed blobs");
        Ok(blobs)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CollaboratorError> {
        let response = self
            .http
            .get(url)
            .header("x-ms-version", API_VERSION)
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;
        tracing::debug!(size = bytes.len(), "Downloaded blob");
        Ok(bytes.to_vec())
    }

    async fn upload(
        &self,
        container: &str,
        blob_name: &str,
        body: Vec<u8>,
    ) -> Result<(), CollaboratorError> {
        let url = self.blob_url(container, blob_name)?;
        let size = body.len();
        let response = self
            .http
            .put(url)
            .header("x-ms-version", API_VERSION)
            .header("x-ms-blob-type", "BlockBlob")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            tracing::error!(status = %status, container, blob = blob_name, "Put Blob returned error. Response body: {text}");
            return Err(format!("Put Blob failed with {status}: {text}").into());
        }
        tracing::info!(container, blob = blob_name, size, "Uploaded blob");
        Ok(())
    }
}
