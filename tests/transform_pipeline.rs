// tests/transform_pipeline.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use buildrig::errors::BuildrigError;
use buildrig::fs::RealFileSystem;
use buildrig::transform::{ConvertedDocument, TransformJob, TransformPipeline};
use buildrig_test_utils::fake::{invocation_log, log_entries, FakeConverter, InvocationLog};
use buildrig_test_utils::init_tracing;
use tempfile::TempDir;

fn write_doc(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).expect("writing fixture document");
}

fn pipeline(
    tmp: &TempDir,
    converter: FakeConverter,
) -> (TransformPipeline, std::path::PathBuf) {
    let src_dir = tmp.path().join("forms");
    fs::create_dir_all(&src_dir).expect("creating fixture dir");
    let out = tmp.path().join("build").join("forms.json");

    let job = TransformJob {
        src_dir,
        extension: "xml".to_string(),
        out: out.clone(),
    };

    (
        TransformPipeline::new(Arc::new(RealFileSystem), Arc::new(converter), job),
        out,
    )
}

fn fixture_calls() -> InvocationLog {
    invocation_log()
}

/// Both documents succeed: the artifact holds the keyed mapping of both
/// results.
#[tokio::test]
async fn success_aggregates_all_documents() {
    init_tracing();

    let tmp = TempDir::new().expect("tempdir");
    let calls = fixture_calls();
    let converter = FakeConverter::new(calls.clone())
        .with_output("<a/>", "pA", "sA")
        .with_output("<b/>", "pB", "sB");

    let (pipeline, out) = pipeline(&tmp, converter);
    write_doc(&pipeline.job().src_dir, "a.xml", "<a/>");
    write_doc(&pipeline.job().src_dir, "b.xml", "<b/>");
    // Non-matching entries are ignored by discovery.
    write_doc(&pipeline.job().src_dir, "notes.txt", "not a form");
    fs::create_dir_all(pipeline.job().src_dir.join("nested")).expect("nested dir");

    pipeline.execute().await.expect("pipeline should succeed");

    let artifact = fs::read_to_string(&out).expect("artifact should exist");
    let parsed: BTreeMap<String, ConvertedDocument> =
        serde_json::from_str(&artifact).expect("artifact should be valid JSON");

    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed["a.xml"].rendered, "pA");
    assert_eq!(parsed["a.xml"].model, "sA");
    assert_eq!(parsed["b.xml"].rendered, "pB");
    assert_eq!(parsed["b.xml"].model, "sB");

    // Strictly serial, in identifier order.
    assert_eq!(log_entries(&calls), vec!["<a/>", "<b/>"]);
}

/// A failing document aborts the job: later documents are never converted
/// and no artifact is written.
#[tokio::test]
async fn failure_aborts_without_writing_artifact() {
    init_tracing();

    let tmp = TempDir::new().expect("tempdir");
    let calls = fixture_calls();
    let converter = FakeConverter::new(calls.clone()).fail_on("<b/>");

    let (pipeline, out) = pipeline(&tmp, converter);
    write_doc(&pipeline.job().src_dir, "a.xml", "<a/>");
    write_doc(&pipeline.job().src_dir, "b.xml", "<b/>");
    write_doc(&pipeline.job().src_dir, "c.xml", "<c/>");

    let err = pipeline.execute().await.expect_err("pipeline should abort");

    match err {
        BuildrigError::TransformAbort { document, .. } => assert_eq!(document, "b.xml"),
        other => panic!("expected TransformAbort, got {other:?}"),
    }

    assert!(!out.exists(), "artifact must not be written on abort");
    assert_eq!(
        log_entries(&calls),
        vec!["<a/>", "<b/>"],
        "converter saw a then b, never c"
    );
}

/// An abort leaves a pre-existing artifact untouched.
#[tokio::test]
async fn failure_preserves_previous_artifact() {
    init_tracing();

    let tmp = TempDir::new().expect("tempdir");
    let converter = FakeConverter::new(fixture_calls()).fail_on("<a/>");

    let (pipeline, out) = pipeline(&tmp, converter);
    write_doc(&pipeline.job().src_dir, "a.xml", "<a/>");
    fs::create_dir_all(out.parent().expect("out parent")).expect("out dir");
    fs::write(&out, "previous artifact").expect("seeding artifact");

    pipeline.execute().await.expect_err("pipeline should abort");

    let content = fs::read_to_string(&out).expect("artifact still present");
    assert_eq!(content, "previous artifact");
}

/// Re-running on unchanged inputs reproduces the artifact byte for byte.
#[tokio::test]
async fn reruns_are_byte_identical() {
    init_tracing();

    let tmp = TempDir::new().expect("tempdir");
    let converter = FakeConverter::new(fixture_calls())
        .with_output("<a/>", "pA", "sA")
        .with_output("<b/>", "pB", "sB");

    let (pipeline, out) = pipeline(&tmp, converter);
    write_doc(&pipeline.job().src_dir, "a.xml", "<a/>");
    write_doc(&pipeline.job().src_dir, "b.xml", "<b/>");

    pipeline.execute().await.expect("first run");
    let first = fs::read(&out).expect("first artifact");

    pipeline.execute().await.expect("second run");
    let second = fs::read(&out).expect("second artifact");

    assert_eq!(first, second);
}

/// The staging file used for the atomic write does not linger.
#[tokio::test]
async fn no_staging_file_left_behind() {
    init_tracing();

    let tmp = TempDir::new().expect("tempdir");
    let converter = FakeConverter::new(fixture_calls());

    let (pipeline, out) = pipeline(&tmp, converter);
    write_doc(&pipeline.job().src_dir, "a.xml", "<a/>");

    pipeline.execute().await.expect("pipeline should succeed");

    assert!(out.exists());
    let staged = out.with_file_name("forms.json.tmp");
    assert!(!staged.exists(), "staging file must be renamed away");
}
