//! Batch pipeline: catalog → analyze → store raw → normalize → store processed.
//!
//! [`run_pipeline`] walks every `.pdf` blob in the source container, sends it to
//! the document analyzer, stores the raw JSON result, normalizes it with
//! [`normalize`] and stores the normalized JSON next to it.
//!
//! # Error Handling
//! Only a failed listing of the source container stops the run. A document that
//! cannot be analyzed or written is recorded in the report as skipped, with the
//! step that failed, and the batch moves on.

use serde_json::Value;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::analysis::{analyze_pdf, AnalysisOutput, ResultForm};
use crate::catalog::{build_catalog, file_extension, BlobFilter};
use crate::config::PipelineConfig;
use crate::contract::{BlobStore, DocumentAnalyzer};
use crate::output::{blob_path, write_to_blob, PayloadFormat};
use crate::tree::{project, pruned, KeySet};

/// How to reduce an analysis result.
#[derive(Debug, Clone, Default)]
pub struct NormalizeConfig {
    /// Keys removed anywhere in the tree.
    pub remove: KeySet,
    /// Optional projection applied after pruning.
    pub select: Option<KeySet>,
}

impl From<&PipelineConfig> for NormalizeConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            remove: config.remove_keys.clone(),
            select: config.select_keys.clone(),
        }
    }
}

/// Prune `tree` (removing keys and hoisting page numbers), then project it if a
/// selection is configured.
pub fn normalize(tree: Value, config: &NormalizeConfig) -> Value {
    let tree = pruned(tree, &config.remove);
    match &config.select {
        Some(selection) => project(&tree, selection),
        None => tree,
    }
}

#[derive(Debug)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub documents: Vec<DocumentReport>,
    pub skipped: Vec<SkippedDocument>,
}

#[derive(Debug)]
pub struct DocumentReport {
    pub file_name: String,
    pub raw_blob: String,
    pub processed_blob: String,
}

#[derive(Debug)]
pub struct SkippedDocument {
    pub file_name: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Analysis,
    RawWrite,
    ProcessedWrite,
}

/// `report.pdf` → `report.json`; names without an extension just gain `.json`.
pub fn output_file_name(file_name: &str) -> String {
    let stem = &file_name[..file_name.len() - file_extension(file_name).len()];
    format!("{stem}.json")
}

pub async fn run_pipeline<S, A>(
    store: &S,
    analyzer: &A,
    config: &PipelineConfig,
) -> Result<PipelineReport, String>
where
    S: BlobStore + ?Sized,
    A: DocumentAnalyzer + ?Sized,
{
    let run_id = Uuid::new_v4();
    let span = info_span!("pipeline", %run_id, source = %config.source_container);
    run(store, analyzer, config, run_id).instrument(span).await
}

async fn run<S, A>(
    store: &S,
    analyzer: &A,
    config: &PipelineConfig,
    run_id: Uuid,
) -> Result<PipelineReport, String>
where
    S: BlobStore + ?Sized,
    A: DocumentAnalyzer + ?Sized,
{
    info!("[PIPELINE] Starting document pipeline");

    let catalog = match build_catalog(store, &config.source_container).await {
        Ok(catalog) => catalog,
        Err(e) => {
            error!(error = %e, "[PIPELINE][ERROR] Could not catalog source container");
            return Err(format!("Could not catalog source container: {e}"));
        }
    };

    let filter = BlobFilter::default()
        .container(&config.source_container)
        .file_type(".pdf");
    let pdfs = catalog.select(&filter);
    info!(documents = pdfs.len(), "[PIPELINE] PDFs found in source container");

    let normalize_config = NormalizeConfig::from(config);
    let mut report = PipelineReport {
        run_id,
        documents: Vec::new(),
        skipped: Vec::new(),
    };

    for entry in pdfs {
        let file_name = entry.file_name.as_str();
        let skip = |reason| SkippedDocument {
            file_name: file_name.to_string(),
            reason,
        };

        let analysis = analyze_pdf(
            analyzer,
            &config.model_id,
            file_name,
            &entry.blob_url,
            ResultForm::Json,
        )
        .await;
        let Some(raw) = analysis.and_then(AnalysisOutput::into_json) else {
            warn!(file = file_name, "[PIPELINE] Skipping document, analysis unavailable");
            report.skipped.push(skip(SkipReason::Analysis));
            continue;
        };

        let output_name = output_file_name(file_name);
        if !write_to_blob(
            store,
            &config.output_container,
            &config.raw_directory,
            &output_name,
            &raw,
            PayloadFormat::Json,
        )
        .await
        {
            report.skipped.push(skip(SkipReason::RawWrite));
            continue;
        }

        let processed = normalize(raw, &normalize_config);
        if !write_to_blob(
            store,
            &config.output_container,
            &config.processed_directory,
            &output_name,
            &processed,
            PayloadFormat::Json,
        )
        .await
        {
            report.skipped.push(skip(SkipReason::ProcessedWrite));
            continue;
        }

        info!(file = file_name, "[PIPELINE] Document processed");
        report.documents.push(DocumentReport {
            file_name: file_name.to_string(),
            raw_blob: blob_path(&config.output_container, &config.raw_directory, &output_name),
            processed_blob: blob_path(&config.output_container, &config.processed_directory, &output_name),
        });
    }

    info!(
        processed = report.documents.len(),
        skipped = report.skipped.len(),
        "[PIPELINE] Document pipeline finished"
    );
    Ok(report)
}
