use reqwest::Url;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::catalog::file_extension;
use crate::contract::{AnalysisHandle, DocumentAnalyzer};
use crate::error::GlueError;

/// Which parts of a finished analysis the caller wants back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultForm {
    Handle,
    Json,
    Both,
}

#[derive(Debug, Clone)]
pub enum AnalysisOutput {
    Handle(AnalysisHandle),
    Json(Value),
    Both(AnalysisHandle, Value),
}

impl AnalysisOutput {
    pub fn json(&self) -> Option<&Value> {
        match self {
            AnalysisOutput::Json(value) | AnalysisOutput::Both(_, value) => Some(value),
            AnalysisOutput::Handle(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            AnalysisOutput::Json(value) | AnalysisOutput::Both(_, value) => Some(value),
            AnalysisOutput::Handle(_) => None,
        }
    }

    pub fn handle(&self) -> Option<&AnalysisHandle> {
        match self {
            AnalysisOutput::Handle(handle) | AnalysisOutput::Both(handle, _) => Some(handle),
            AnalysisOutput::Json(_) => None,
        }
    }
}

/// Last path segment of a blob URL, ignoring any query string.
pub fn blob_name_from_url(blob_url: &str) -> Result<String, GlueError> {
    let url = Url::parse(blob_url).map_err(|e| GlueError::InvalidUrl {
        url: blob_url.to_string(),
        reason: e.to_string(),
    })?;
    let name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    Ok(name.to_string())
}

/// Analyze the PDF at `blob_url` and return the parts selected by `form`.
///
/// Only blobs whose name ends in `.pdf` are submitted; anything else is logged
/// and `None` is returned without calling the analyzer. Analyzer failures are
/// logged and also give `None`.
pub async fn analyze_pdf<A>(
    analyzer: &A,
    model_id: &str,
    file_name: &str,
    blob_url: &str,
    form: ResultForm,
) -> Option<AnalysisOutput>
where
    A: DocumentAnalyzer + ?Sized,
{
    match try_analyze_pdf(analyzer, model_id, file_name, blob_url, form).await {
        Ok(output) => Some(output),
        Err(GlueError::NotPdf(_)) => {
            warn!(file = file_name, "File is not a PDF according to the file extension");
            None
        }
        Err(e) => {
            error!(error = %e, file = file_name, "Document analysis failed");
            None
        }
    }
}

/// [`analyze_pdf`] with the failure reason kept.
pub async fn try_analyze_pdf<A>(
    analyzer: &A,
    model_id: &str,
    file_name: &str,
    blob_url: &str,
    form: ResultForm,
) -> Result<AnalysisOutput, GlueError>
where
    A: DocumentAnalyzer + ?Sized,
{
    let blob_name = blob_name_from_url(blob_url)?;
    if file_extension(&blob_name) != ".pdf" {
        return Err(GlueError::NotPdf(file_name.to_string()));
    }

    let analyzed = analyzer
        .analyze_from_url(model_id, blob_url)
        .await
        .map_err(|e| GlueError::Analysis {
            document: file_name.to_string(),
            source: e,
        })?;

    info!(
        file = file_name,
        model = model_id,
        handle = analyzed.handle.as_str(),
        "File was analyzed by the document analysis service"
    );

    Ok(match form {
        ResultForm::Handle => AnalysisOutput::Handle(analyzed.handle),
        ResultForm::Json => AnalysisOutput::Json(analyzed.result),
        ResultForm::Both => AnalysisOutput::Both(analyzed.handle, analyzed.result),
    })
}
