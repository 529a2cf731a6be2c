use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use std::fs::{read_to_string, write};
use tempfile::tempdir;

const ANALYSIS: &str = r#"{
  "content": "Total 10",
  "paragraphs": [
    {"content": "Total 10", "confidence": 0.7, "bounding_regions": [{"page_number": 1}, {"page_number": 2}]}
  ]
}"#;

#[test]
fn keys_prints_every_dotted_path() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("analysis.json");
    write(&input, ANALYSIS).unwrap();

    let mut cmd = Command::cargo_bin("docintel-bucket").expect("Binary exists");
    cmd.arg("keys").arg("--input").arg(&input);

    cmd.assert().success().stdout(
        predicate::str::contains("paragraphs.bounding_regions.page_number")
            .and(predicate::str::contains("paragraphs.confidence"))
            .and(predicate::str::contains("content")),
    );
}

#[test]
fn normalize_writes_pruned_and_projected_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("analysis.json");
    write(&input, ANALYSIS).unwrap();

    let mut cmd = Command::cargo_bin("docintel-bucket").expect("Binary exists");
    cmd.arg("normalize")
        .arg("--input")
        .arg(&input)
        .arg("--output-dir")
        .arg(dir.path())
        .arg("--output-name")
        .arg("normalized.json")
        .arg("--remove")
        .arg("confidence")
        .arg("--select")
        .arg("paragraphs.content")
        .arg("--select")
        .arg("paragraphs.page_number");
    cmd.assert().success();

    let written: serde_json::Value =
        serde_json::from_str(&read_to_string(dir.path().join("normalized.json")).unwrap()).unwrap();
    assert_eq!(
        written,
        serde_json::json!({"paragraphs": [{"content": "Total 10", "page_number": 2}]})
    );
}

#[test]
fn normalize_fails_on_unreadable_input() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("docintel-bucket").expect("Binary exists");
    cmd.arg("normalize")
        .arg("--input")
        .arg(dir.path().join("missing.json"))
        .arg("--output-dir")
        .arg(dir.path())
        .arg("--output-name")
        .arg("out.json");
    cmd.assert().failure();
}

#[test]
#[serial]
fn sync_fails_without_storage_environment() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    write(
        &config,
        "pipeline:\n  source_container: raw\n  output_container: processed\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("docintel-bucket").expect("Binary exists");
    cmd.current_dir(dir.path())
        .env_remove("AZURE_STORAGE_ACCOUNT_URL")
        .arg("sync")
        .arg("--config")
        .arg(&config);
    cmd.assert().failure();
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use docintel_bucket::cli::{run, Cli, Commands};

    let cli = Cli {
        command: Commands::Keys {
            input: std::path::PathBuf::from("dummy.json"),
        },
    };

    let result = run(cli).await;
    assert!(result.is_err(), "dummy input should not be readable");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
