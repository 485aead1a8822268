use std::sync::{Arc, Mutex};
use std::time::Duration;

use pdfdesk_engine::{
    Delivery, EngineEvent, FailureKind, Job, ProgressSink, ReqwestTransport, Transport,
    TransportSettings, UploadPart,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    fn percents(&self) -> Vec<f32> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                EngineEvent::Progress { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn transport_for(server: &MockServer) -> ReqwestTransport {
    ReqwestTransport::new(TransportSettings {
        base_url: server.uri(),
        ..TransportSettings::default()
    })
}

fn pdf(name: &str) -> UploadPart {
    UploadPart::new(name, Arc::from(b"%PDF-1.4 sample".as_slice()))
}

#[tokio::test]
async fn compress_posts_file_and_level_and_returns_inline_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compress-pdf"))
        .and(body_string_contains("name=\"compression_level\""))
        .and(body_string_contains("filename=\"report.pdf\""))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-small", "application/pdf"))
        .expect(1)
        .mount(&server)
        .await;

    let sink = TestSink::default();
    let job = Job::Compress {
        file: pdf("report.pdf"),
        level: 3,
    };
    let delivery = transport_for(&server).submit(1, &job, &sink).await.unwrap();

    assert_eq!(delivery, Delivery::Inline(b"%PDF-small".to_vec()));
    let percents = sink.percents();
    assert_eq!(percents.last().copied(), Some(100.0));
}

#[tokio::test]
async fn merge_sends_every_file_under_files() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/merge"))
        .and(body_string_contains("filename=\"a.pdf\""))
        .and(body_string_contains("filename=\"b.pdf\""))
        .and(body_string_contains("name=\"files\""))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-merged", "application/pdf"))
        .expect(1)
        .mount(&server)
        .await;

    let job = Job::Merge {
        files: vec![pdf("a.pdf"), pdf("b.pdf")],
    };
    let delivery = transport_for(&server)
        .submit(2, &job, &TestSink::default())
        .await
        .unwrap();
    assert_eq!(delivery, Delivery::Inline(b"%PDF-merged".to_vec()));
}

#[tokio::test]
async fn split_all_sends_flag_and_range_sends_pages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/split"))
        .and(body_string_contains("name=\"split_all\""))
        .respond_with(ResponseTemplate::new(200).set_body_raw("PK-all", "application/zip"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/split"))
        .and(body_string_contains("1-3,5"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("PK-range", "application/zip"))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let all = Job::Split {
        file: pdf("book.pdf"),
        pages: None,
    };
    let range = Job::Split {
        file: pdf("book.pdf"),
        pages: Some("1-3,5".to_string()),
    };

    let sink = TestSink::default();
    assert_eq!(
        transport.submit(3, &all, &sink).await.unwrap(),
        Delivery::Inline(b"PK-all".to_vec())
    );
    assert_eq!(
        transport.submit(4, &range, &sink).await.unwrap(),
        Delivery::Inline(b"PK-range".to_vec())
    );
}

#[tokio::test]
async fn error_status_carries_service_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/split"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_raw(r#"{"detail":"Invalid page range"}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let job = Job::Split {
        file: pdf("book.pdf"),
        pages: Some("9-1".to_string()),
    };
    let err = transport_for(&server)
        .submit(5, &job, &TestSink::default())
        .await
        .unwrap_err();

    assert_eq!(
        err.kind,
        FailureKind::HttpStatus {
            status: 400,
            detail: Some("Invalid page range".to_string())
        }
    );
    assert_eq!(err.detail(), Some("Invalid page range"));
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn error_without_detail_leaves_it_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/merge"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let job = Job::Merge {
        files: vec![pdf("a.pdf"), pdf("b.pdf")],
    };
    let err = transport_for(&server)
        .submit(6, &job, &TestSink::default())
        .await
        .unwrap_err();
    assert_eq!(err.detail(), None);
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn json_reference_is_resolved_against_base_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compress-pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"download_url":"/files/out.pdf"}"#, "application/json"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/out.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-ref", "application/pdf"))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let job = Job::Compress {
        file: pdf("report.pdf"),
        level: 2,
    };
    let delivery = transport
        .submit(7, &job, &TestSink::default())
        .await
        .unwrap();
    let Delivery::Reference(location) = delivery else {
        panic!("expected a reference, got {delivery:?}");
    };
    assert_eq!(location, "/files/out.pdf");

    let bytes = transport.fetch_reference(&location).await.unwrap();
    assert_eq!(bytes, b"%PDF-ref");
}

#[tokio::test]
async fn missing_reference_target_is_an_http_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/gone.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .fetch_reference("/files/gone.pdf")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn empty_success_body_is_empty_delivery() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compress-pdf"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let job = Job::Compress {
        file: pdf("report.pdf"),
        level: 1,
    };
    let delivery = transport_for(&server)
        .submit(8, &job, &TestSink::default())
        .await
        .unwrap();
    assert_eq!(delivery, Delivery::Empty);
}

#[tokio::test]
async fn slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compress-pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(300))
                .set_body_string("late"),
        )
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(TransportSettings {
        base_url: server.uri(),
        request_timeout: Duration::from_millis(50),
        ..TransportSettings::default()
    });
    let job = Job::Compress {
        file: pdf("report.pdf"),
        level: 2,
    };
    let err = transport
        .submit(9, &job, &TestSink::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn oversized_result_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/merge"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Length", "11")
                .set_body_string("01234567890"),
        )
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(TransportSettings {
        base_url: server.uri(),
        max_bytes: 10,
        ..TransportSettings::default()
    });
    let job = Job::Merge {
        files: vec![pdf("a.pdf"), pdf("b.pdf")],
    };
    let err = transport
        .submit(10, &job, &TestSink::default())
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn unparsable_base_url_is_invalid() {
    let transport = ReqwestTransport::new(TransportSettings {
        base_url: "not a url".to_string(),
        ..TransportSettings::default()
    });
    let job = Job::Compress {
        file: pdf("report.pdf"),
        level: 2,
    };
    let err = transport
        .submit(11, &job, &TestSink::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
