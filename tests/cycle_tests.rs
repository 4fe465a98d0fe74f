//! End-to-end evaluation cycles through the public kernel API.

use std::sync::Arc;

use parking_lot::Mutex;

use shacl_kernel::error::Result;
use shacl_kernel::graph::GraphKind;
use shacl_kernel::model::{CycleStatus, Notification, StreamName};
use shacl_kernel::router::Kernel;
use shacl_kernel::sparql::{QueryConfig, QueryExecutor};

const DATA: &str = "\
@prefix ex: <http://example.org/> .
ex:alice a ex:Person ;
    ex:name \"Alice\" .
";

const SHAPES: &str = "\
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix ex: <http://example.org/> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
ex:PersonShape a sh:NodeShape ;
    sh:targetClass ex:Person ;
    sh:property [
        sh:path ex:name ;
        sh:minCount 1 ;
        sh:datatype xsd:string ;
    ] .
";

/// Records every query it is asked to run, with its cycle sequence.
#[derive(Clone, Default)]
struct RecordingExecutor {
    queries: Arc<Mutex<Vec<(u64, String)>>>,
}

impl QueryExecutor for RecordingExecutor {
    fn execute(&self, query: &str, seq: u64, _cfg: &QueryConfig) -> Result<String> {
        self.queries.lock().push((seq, query.to_string()));
        Ok("stub result".to_string())
    }
}

fn kernel_with_recorder() -> (Kernel, RecordingExecutor) {
    let executor = RecordingExecutor::default();
    let kernel = Kernel::with_executor(Box::new(executor.clone())).unwrap();
    (kernel, executor)
}

fn stdout_text(notification: &Notification) -> &str {
    match notification {
        Notification::Stream {
            name: StreamName::Stdout,
            text,
        } => text,
        other => panic!("expected stdout notification, got {other:?}"),
    }
}

#[test]
fn clear_alone_reports_and_succeeds() {
    let (mut kernel, _) = kernel_with_recorder();
    let result = kernel.execute("%clear", false);
    assert!(result.outcome.is_ok());
    assert_eq!(stdout_text(&result.notifications[0]), "Cleared all graphs.");
}

#[test]
fn load_then_clear_leaves_zero_triples() {
    let (mut kernel, _) = kernel_with_recorder();
    kernel.execute(&format!("%data\n{DATA}"), false);
    assert_eq!(kernel.graphs().count(GraphKind::Data).unwrap(), 2);
    kernel.execute("%clear", false);
    assert_eq!(kernel.graphs().count(GraphKind::Data).unwrap(), 0);
    assert_eq!(kernel.graphs().count(GraphKind::Shapes).unwrap(), 0);
}

#[test]
fn malformed_turtle_fails_cycle_and_keeps_count() {
    let (mut kernel, _) = kernel_with_recorder();
    kernel.execute(&format!("%data\n{DATA}"), false);
    let before = kernel.graphs().count(GraphKind::Data).unwrap();

    let result = kernel.execute("this is : not turtle at all", false);
    assert_eq!(result.outcome.status, CycleStatus::Error);
    assert_eq!(result.outcome.error_name.as_deref(), Some("ParseError"));
    assert_eq!(kernel.graphs().count(GraphKind::Data).unwrap(), before);
}

#[test]
fn two_cycles_populate_both_graphs_without_fallthrough() {
    let (mut kernel, executor) = kernel_with_recorder();
    let first = kernel.execute(&format!("%data\n{DATA}"), false);
    let second = kernel.execute(&format!("%shapes\n{SHAPES}"), false);
    assert!(first.outcome.is_ok());
    assert!(second.outcome.is_ok());
    assert!(kernel.graphs().count(GraphKind::Data).unwrap() > 0);
    assert!(kernel.graphs().count(GraphKind::Shapes).unwrap() > 0);
    // Neither cycle may reinterpret the magic's content as a payload.
    assert!(executor.queries.lock().is_empty());
    assert_eq!(first.notifications.len(), 1);
    assert_eq!(second.notifications.len(), 1);
}

#[test]
fn appends_accumulate_like_a_single_load() {
    let (mut kernel, _) = kernel_with_recorder();
    kernel.execute(
        "@prefix ex: <http://example.org/> . ex:a ex:p ex:b .",
        false,
    );
    kernel.execute(
        "@prefix ex: <http://example.org/> . ex:c ex:p ex:d .",
        false,
    );
    assert_eq!(kernel.graphs().count(GraphKind::Data).unwrap(), 2);

    let (mut fresh, _) = kernel_with_recorder();
    fresh.execute(
        "@prefix ex: <http://example.org/> .\nex:a ex:p ex:b .\nex:c ex:p ex:d .",
        false,
    );
    assert_eq!(fresh.graphs().count(GraphKind::Data).unwrap(), 2);
}

#[test]
fn validate_without_shapes_never_reaches_the_validator() {
    let (mut kernel, _) = kernel_with_recorder();
    kernel.execute(&format!("%data\n{DATA}"), false);
    let result = kernel.execute("%validate", false);
    assert_eq!(result.outcome.status, CycleStatus::Error);
    assert_eq!(
        result.outcome.error_name.as_deref(),
        Some("PreconditionError")
    );
    assert!(
        result
            .outcome
            .error_message
            .as_deref()
            .unwrap()
            .contains("No shapes graph loaded")
    );
}

#[test]
fn conforming_data_validates_as_passed() {
    let (mut kernel, _) = kernel_with_recorder();
    kernel.execute(&format!("%data\n{DATA}"), false);
    kernel.execute(&format!("%shapes\n{SHAPES}"), false);
    let result = kernel.execute("%validate", false);
    assert!(result.outcome.is_ok());
    let text = stdout_text(&result.notifications[0]);
    assert!(text.starts_with("Validation PASSED"));
    assert!(text.contains("Conforms: True"));
}

#[test]
fn violating_data_validates_as_failed_but_cycle_is_ok() {
    let (mut kernel, _) = kernel_with_recorder();
    kernel.execute(
        "%data\n@prefix ex: <http://example.org/> .\nex:bob a ex:Person .",
        false,
    );
    kernel.execute(&format!("%shapes\n{SHAPES}"), false);
    let result = kernel.execute("%validate", false);
    assert!(result.outcome.is_ok());
    let text = stdout_text(&result.notifications[0]);
    assert!(text.starts_with("Validation FAILED"));
    assert!(text.contains("Conforms: False"));
}

#[test]
fn query_payload_reaches_the_executor_with_config_magics() {
    let (mut kernel, executor) = kernel_with_recorder();
    let result = kernel.execute(
        "%endpoint http://example.org/sparql\nSELECT * WHERE { ?s ?p ?o }",
        false,
    );
    assert!(result.outcome.is_ok());
    let queries = executor.queries.lock();
    assert_eq!(queries.len(), 1);
    let (seq, query) = &queries[0];
    assert_eq!(*seq, 1);
    assert!(query.starts_with("SELECT"));
    assert_eq!(
        kernel.query_config().endpoint.as_ref().unwrap().as_str(),
        "http://example.org/sparql"
    );
}

#[test]
fn unknown_magic_is_reported_but_does_not_fail() {
    let (mut kernel, _) = kernel_with_recorder();
    let result = kernel.execute("%bogus something", false);
    assert!(result.outcome.is_ok());
    match &result.notifications[0] {
        Notification::Display { data } => {
            let text = data["text/plain"].as_str().unwrap();
            assert!(text.starts_with("Unknown magic command: %bogus"));
        }
        other => panic!("expected display notification, got {other:?}"),
    }
}

#[test]
fn sequence_increases_across_cycles() {
    let (mut kernel, _) = kernel_with_recorder();
    let first = kernel.execute("", false);
    let second = kernel.execute("", true);
    let third = kernel.execute("%clear", false);
    assert_eq!(first.outcome.sequence, 1);
    assert_eq!(second.outcome.sequence, 2);
    assert_eq!(third.outcome.sequence, 3);
}

#[test]
fn help_lists_both_magic_families() {
    let (mut kernel, _) = kernel_with_recorder();
    let result = kernel.execute("%help", false);
    let text = stdout_text(&result.notifications[0]);
    assert!(text.contains("%validate"));
    assert!(text.contains("%endpoint"));
    assert!(text.contains("%lsmagics"));
}
