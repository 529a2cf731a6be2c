//! # Document Intelligence client
//!
//! [`DocIntelClient`] implements the core [`DocumentAnalyzer`] trait over the
//! Azure Document Intelligence REST API. A document URL is submitted to
//! `documentModels/{model}:analyze`, then the returned `Operation-Location` is
//! polled at a fixed interval until the operation succeeds or fails.
//!
//! The REST API answers in camelCase (`boundingRegions`, `pageNumber`). The SDK
//! dictionaries this tool's key sets are written against use snake_case, so the
//! `analyzeResult` keys are converted before the result is handed back.
//!
//! Construct with `DOCINTEL_ENDPOINT` and `OCP_APIM_SUBSCRIPTION_KEY` via
//! [`DocIntelClient::new_from_env`].

use std::env;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use docintel_bucket_core::contract::{
    AnalysisHandle, AnalyzedDocument, CollaboratorError, DocumentAnalyzer,
};
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Map, Value};

pub const DEFAULT_API_VERSION: &str = "2023-07-31";
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

pub struct DocIntelClient {
    http: Client,
    endpoint: String,
    api_key: String,
    api_version: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl DocIntelClient {
    pub fn new(endpoint: &str, api_key: String) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            api_version: DEFAULT_API_VERSION.to_string(),
            poll_interval: Duration::from_secs(1),
            max_polls: 300,
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_polling(mut self, poll_interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = poll_interval;
        self.max_polls = max_polls;
        self
    }

    pub fn new_from_env() -> Result<Self, CollaboratorError> {
        dotenvy::dotenv().ok();
        match (env::var("DOCINTEL_ENDPOINT"), env::var("OCP_APIM_SUBSCRIPTION_KEY")) {
            (Ok(endpoint), Ok(api_key)) => {
                tracing::info!(
                    endpoint = %endpoint,
                    api_key_set = !api_key.is_empty(),
                    "Initialized DocIntelClient from environment"
                );
                Ok(Self::new(&endpoint, api_key))
            }
            (Err(e), _) => {
                tracing::error!(error = ?e, "DOCINTEL_ENDPOINT missing in environment");
                Err(Box::new(e))
            }
            (_, Err(e)) => {
                tracing::error!(error = ?e, "OCP_APIM_SUBSCRIPTION_KEY missing in environment");
                Err(Box::new(e))
            }
        }
    }

    fn analyze_url(&self, model_id: &str) -> String {
        format!(
            "{}/formrecognizer/documentModels/{}:analyze?api-version={}",
            self.endpoint, model_id, self.api_version
        )
    }

    async fn submit(&self, model_id: &str, document_url: &str) -> Result<String, CollaboratorError> {
        let response = self
            .http
            .post(self.analyze_url(model_id))
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .json(&json!({ "urlSource": document_url }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            tracing::error!(status = %status, model = model_id, "Analyze request rejected. Response body: {text}");
            return Err(format!("Analyze request failed with {status}: {text}").into());
        }

        let operation_location = response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or("Analyze response carried no Operation-Location header")?;
        tracing::debug!(operation = %operation_location, "Analyze request accepted");
        Ok(operation_location)
    }

    async fn wait_for_result(&self, operation_location: &str) -> Result<Value, CollaboratorError> {
        for attempt in 1..=self.max_polls {
            tokio::time::sleep(self.poll_interval).await;

            let body: Value = self
                .http
                .get(operation_location)
                .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            match body.get("status").and_then(Value::as_str) {
                Some("succeeded") => {
                    tracing::info!(attempt, "Analyze operation succeeded");
                    return Ok(body.get("analyzeResult").cloned().unwrap_or(Value::Null));
                }
                Some("failed") => {
                    let error = body.get("error").cloned().unwrap_or(Value::Null);
                    tracing::error!(%error, "Analyze operation failed");
                    return Err(format!("Analyze operation failed: {error}").into());
                }
                status => {
                    tracing::debug!(attempt, ?status, "Analyze operation still running");
                }
            }
        }
        Err(format!("Analyze operation did not finish after {} polls", self.max_polls).into())
    }
}

#[async_trait]
impl DocumentAnalyzer for DocIntelClient {
    async fn analyze_from_url(
        &self,
        model_id: &str,
        document_url: &str,
    ) -> Result<AnalyzedDocument, CollaboratorError> {
        tracing::info!(model = model_id, "Submitting document for analysis");
        let operation_location = self.submit(model_id, document_url).await?;
        let result = self.wait_for_result(&operation_location).await?;
        Ok(AnalyzedDocument {
            handle: AnalysisHandle(operation_location),
            result: snake_case_keys(result),
        })
    }
}

fn camel_boundary() -> &'static Regex {
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    BOUNDARY.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").expect("static pattern compiles"))
}

/// `boundingRegions` → `bounding_regions`.
pub fn to_snake_case(key: &str) -> String {
    camel_boundary().replace_all(key, "${1}_${2}").to_lowercase()
}

/// Rename every object key in `value` to snake_case, recursively.
pub fn snake_case_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (to_snake_case(&key), snake_case_keys(value)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(snake_case_keys).collect()),
        other => other,
    }
}
