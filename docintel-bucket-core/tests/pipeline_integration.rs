use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use docintel_bucket_core::config::PipelineConfig;
use docintel_bucket_core::contract::{
    AnalysisHandle, AnalyzedDocument, BlobDescriptor, MockBlobStore, MockDocumentAnalyzer,
};
use docintel_bucket_core::pipeline::{run_pipeline, SkipReason};
use serde_json::{json, Value};

type Uploads = Arc<Mutex<HashMap<String, Vec<u8>>>>;

fn config() -> PipelineConfig {
    serde_json::from_value(json!({
        "source_container": "raw",
        "output_container": "processed",
        "remove_keys": ["confidence", "spans"]
    }))
    .expect("config should deserialize with defaults")
}

fn descriptor(name: &str) -> BlobDescriptor {
    BlobDescriptor {
        name: name.to_string(),
        url: format!("https://acct.blob.core.windows.net/raw/{name}?sv=2022"),
    }
}

fn analysis_for(url: &str) -> Value {
    json!({
        "model_id": "prebuilt-layout",
        "content": url,
        "paragraphs": [{
            "content": "hello",
            "confidence": 0.5,
            "spans": [{"offset": 0, "length": 5}],
            "bounding_regions": [{"page_number": 1}]
        }]
    })
}

fn recording_store(blobs: Vec<BlobDescriptor>, uploads: &Uploads) -> MockBlobStore {
    let mut store = MockBlobStore::new();
    store
        .expect_list_blobs()
        .withf(|container| container == "raw")
        .return_once(move |_| Ok(blobs));
    let sink = uploads.clone();
    store.expect_upload().returning(move |container, blob_name, body| {
        assert_eq!(container, "processed");
        sink.lock().unwrap().insert(blob_name.to_string(), body);
        Ok(())
    });
    store
}

#[tokio::test]
async fn pipeline_analyzes_pdfs_and_writes_raw_and_normalized_json() {
    let uploads: Uploads = Arc::default();
    let store = recording_store(
        vec![descriptor("a.pdf"), descriptor("notes.txt"), descriptor("b.pdf")],
        &uploads,
    );

    let mut analyzer = MockDocumentAnalyzer::new();
    analyzer
        .expect_analyze_from_url()
        .times(2)
        .withf(|model, url| model == "prebuilt-layout" && url.contains(".pdf?"))
        .returning(|_, url| {
            Ok(AnalyzedDocument {
                handle: AnalysisHandle(format!("op:{url}")),
                result: analysis_for(url),
            })
        });

    let report = run_pipeline(&store, &analyzer, &config())
        .await
        .expect("pipeline should run");

    assert_eq!(report.documents.len(), 2);
    assert!(report.skipped.is_empty());
    assert_eq!(report.documents[0].processed_blob, "processed/dictionaries/a.json");

    let uploads = uploads.lock().unwrap();
    assert_eq!(uploads.len(), 4);

    let raw: Value = serde_json::from_slice(&uploads["processed/raw_results/b.json"]).unwrap();
    assert!(raw["paragraphs"][0].get("bounding_regions").is_some());

    let processed: Value = serde_json::from_slice(&uploads["processed/dictionaries/b.json"]).unwrap();
    assert_eq!(
        processed["paragraphs"],
        json!([{"content": "hello", "page_number": 1}])
    );
}

#[tokio::test]
async fn analysis_failure_skips_document_and_continues() {
    let uploads: Uploads = Arc::default();
    let store = recording_store(vec![descriptor("bad.pdf"), descriptor("good.pdf")], &uploads);

    let mut analyzer = MockDocumentAnalyzer::new();
    analyzer
        .expect_analyze_from_url()
        .withf(|_, url| url.contains("bad.pdf"))
        .returning(|_, _| Err("model not found".into()));
    analyzer
        .expect_analyze_from_url()
        .withf(|_, url| url.contains("good.pdf"))
        .returning(|_, url| {
            Ok(AnalyzedDocument {
                handle: AnalysisHandle("op".into()),
                result: analysis_for(url),
            })
        });

    let report = run_pipeline(&store, &analyzer, &config()).await.unwrap();

    assert_eq!(report.documents.len(), 1);
    assert_eq!(report.documents[0].file_name, "good.pdf");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].file_name, "bad.pdf");
    assert_eq!(report.skipped[0].reason, SkipReason::Analysis);
    assert_eq!(uploads.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn upload_failure_is_reported_as_skipped() {
    let mut store = MockBlobStore::new();
    store
        .expect_list_blobs()
        .return_once(|_| Ok(vec![descriptor("a.pdf")]));
    store
        .expect_upload()
        .withf(|_, blob_name, _| blob_name.contains("/raw_results/"))
        .returning(|_, _, _| Ok(()));
    store
        .expect_upload()
        .withf(|_, blob_name, _| blob_name.contains("/dictionaries/"))
        .returning(|_, _, _| Err("409 conflict".into()));

    let mut analyzer = MockDocumentAnalyzer::new();
    analyzer.expect_analyze_from_url().returning(|_, url| {
        Ok(AnalyzedDocument {
            handle: AnalysisHandle("op".into()),
            result: analysis_for(url),
        })
    });

    let report = run_pipeline(&store, &analyzer, &config()).await.unwrap();
    assert!(report.documents.is_empty());
    assert_eq!(report.skipped[0].reason, SkipReason::ProcessedWrite);
}

#[tokio::test]
async fn listing_failure_aborts_the_run() {
    let mut store = MockBlobStore::new();
    store
        .expect_list_blobs()
        .return_once(|_| Err("container not found".into()));
    store.expect_upload().never();

    let mut analyzer = MockDocumentAnalyzer::new();
    analyzer.expect_analyze_from_url().never();

    let result = run_pipeline(&store, &analyzer, &config()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn selection_further_reduces_normalized_output() {
    let uploads: Uploads = Arc::default();
    let store = recording_store(vec![descriptor("a.pdf")], &uploads);

    let mut analyzer = MockDocumentAnalyzer::new();
    analyzer.expect_analyze_from_url().returning(|_, url| {
        Ok(AnalyzedDocument {
            handle: AnalysisHandle("op".into()),
            result: analysis_for(url),
        })
    });

    let mut config = config();
    config.select_keys = Some(["paragraphs.page_number"].into_iter().collect());

    run_pipeline(&store, &analyzer, &config).await.unwrap();

    let uploads = uploads.lock().unwrap();
    let processed: Value = serde_json::from_slice(&uploads["processed/dictionaries/a.json"]).unwrap();
    assert_eq!(processed, json!({"paragraphs": [{"page_number": 1}]}));
}
