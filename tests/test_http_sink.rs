//! HTTP sink and job client against a wiremock server

mod common;

use std::time::Duration;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chunkpost::errors::ChunkpostError;
use chunkpost::job::{create_job, JobRequest};
use chunkpost::pipeline::{Chunk, ChunkedDeliveryPipeline, PipelineOptions, ScanHandle};
use chunkpost::sink::{DeliveryOutcome, HttpSink, Sink};

use common::{create_temp_file, HELLO_TEXT};

fn sink_for(server: &MockServer, timeout: Option<Duration>) -> HttpSink {
    let url = Url::parse(&format!("{}/msg/notif", server.uri())).unwrap();
    HttpSink::new(url, timeout).unwrap()
}

fn chunk(text: &'static str) -> Chunk {
    Chunk::new(0, 0, bytes::Bytes::from_static(text.as_bytes()))
}

// ============================================================================
// HttpSink
// ============================================================================

#[tokio::test]
async fn test_posts_msg_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/msg/notif"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({"msg": "Hello, Wor"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"success"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = sink_for(&server, None).deliver(chunk("Hello, Wor")).await;

    assert_eq!(
        outcome,
        DeliveryOutcome::Delivered {
            status_code: 200,
            body: r#"{"status":"success"}"#.to_string(),
        }
    );
}

#[tokio::test]
async fn test_non_success_status_is_failed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("broker down"))
        .mount(&server)
        .await;

    let outcome = sink_for(&server, None).deliver(chunk("x")).await;

    match outcome {
        DeliveryOutcome::Failed { reason } => {
            assert!(reason.contains("500"), "reason: {}", reason);
            assert!(reason.contains("broker down"), "reason: {}", reason);
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_is_failed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let outcome = sink_for(&server, Some(Duration::from_millis(200)))
        .deliver(chunk("x"))
        .await;

    assert!(!outcome.is_delivered());
}

#[tokio::test]
async fn test_unreachable_sink_is_failed() {
    // bind then drop to get a port with nothing listening
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let url = Url::parse(&format!("http://127.0.0.1:{}/msg/notif", port)).unwrap();

    let outcome = HttpSink::new(url, Some(Duration::from_secs(2)))
        .unwrap()
        .deliver(chunk("x"))
        .await;

    assert!(matches!(outcome, DeliveryOutcome::Failed { .. }));
}

#[tokio::test]
async fn test_scan_posts_every_chunk() {
    let server = MockServer::start().await;

    for text in ["Hello, Wor", "ld! This i", "s a test f", "ile."] {
        Mock::given(method("POST"))
            .and(path("/msg/notif"))
            .and(body_json(serde_json::json!({"msg": text})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
    }

    let (_dir, file) = create_temp_file(HELLO_TEXT.as_bytes());
    let pipeline = ChunkedDeliveryPipeline::new(
        sink_for(&server, None),
        PipelineOptions {
            chunk_size: 10,
            inter_chunk_delay: Duration::from_millis(10),
        },
    )
    .unwrap();

    let report = pipeline.scan(ScanHandle::open(&file).await.unwrap()).await.unwrap();
    assert_eq!(report.chunks, 4);
    assert_eq!(report.delivered, 4);
    // expectations are verified when the server drops
}

#[tokio::test]
async fn test_scan_survives_rejecting_sink() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let (_dir, file) = create_temp_file(HELLO_TEXT.as_bytes());
    let pipeline = ChunkedDeliveryPipeline::new(
        sink_for(&server, None),
        PipelineOptions {
            chunk_size: 10,
            inter_chunk_delay: Duration::ZERO,
        },
    )
    .unwrap();

    let report = pipeline.scan(ScanHandle::open(&file).await.unwrap()).await.unwrap();
    assert_eq!(report.chunks, 4);
    assert_eq!(report.bytes, HELLO_TEXT.len() as u64);
    assert_eq!(report.failed, 4);
}

// ============================================================================
// Job creation
// ============================================================================

#[tokio::test]
async fn test_create_job_posts_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/jobs"))
        .and(body_json(serde_json::json!({
            "app_id": "app-7",
            "event": "print_doc.pdf",
            "form_body": {"key": "value"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 42})))
        .expect(1)
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/jobs", server.uri())).unwrap();
    let request = JobRequest::new(Some("app-7".to_string()), "print_doc.pdf", vec![]);
    let response = create_job(&url, &request, None, None).await.unwrap();

    assert_eq!(response, serde_json::json!({"id": 42}));
}

#[tokio::test]
async fn test_create_job_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/jobs", server.uri())).unwrap();
    let request = JobRequest::new(None, "print_doc.pdf", vec![]);
    let err = create_job(&url, &request, None, None).await.unwrap_err();

    match err {
        ChunkpostError::Job(msg) => assert_eq!(msg, "422 Unprocessable Entity"),
        other => panic!("expected Job error, got {:?}", other),
    }
}
