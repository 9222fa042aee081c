//! Chained suite runs against a local mock server
//!
//! Drives the full setup / assert / teardown cycle over the wire: a login
//! request captures a token, later requests use it, and captured ids feed
//! typed request bodies.

use pm_harness::request::{HttpMethod, RequestDescriptor, SendConfig};
use pm_harness::runner::{run_case, run_suite, CaptureSource, TestCase, TestOutcome};
use pm_harness::session::Session;
use pm_harness::store::Scalar;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn start_api() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth"))
        .and(body_json(json!({"email": "tester@example.com", "password": "pw"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"access_token": "tok-1"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/events"))
        .and(header("Authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "evt-1", "name": "Opening Night"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/events/evt-1/ticket_types"))
        .and(header("Authorization", "Bearer tok-1"))
        .and(body_json(json!({"quantity": 2, "status": "Cancelled"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updated": true})))
        .mount(&server)
        .await;

    server
}

#[tokio::test]
async fn test_chained_suite_run() {
    let server = start_api().await;

    let mut session = Session::new();
    session.set_environment("server", server.uri());
    session.capture("quantity", 2i64);

    let cases = vec![
        TestCase::new(
            "login",
            RequestDescriptor::new(HttpMethod::POST, "{{server}}/auth").json_body(json!({
                "email": "tester@example.com",
                "password": "pw"
            })),
        )
        .expect_status(201)
        .capture("token", CaptureSource::BodyPointer("/access_token".into())),
        TestCase::new(
            "list events",
            RequestDescriptor::new(HttpMethod::GET, "{{server}}/events")
                .header("Authorization", "Bearer {{token}}"),
        )
        .expect_status(200)
        .check(|response| {
            let body = response.json().map_err(|e| e.to_string())?;
            if body["data"][0]["name"] == "Opening Night" {
                Ok(())
            } else {
                Err(format!("unexpected event list: {}", body))
            }
        })
        .capture("last_event_id", CaptureSource::BodyPointer("/data/0/id".into())),
        TestCase::new(
            "cancel ticket types",
            RequestDescriptor::new(
                HttpMethod::PATCH,
                "{{server}}/events/{{last_event_id}}/ticket_types",
            )
            .header("Authorization", "Bearer {{token}}")
            .json_body(json!({"quantity": "{{quantity}}", "status": "Cancelled"})),
        )
        .expect_status(200),
    ];

    let outcomes = run_suite(&cases, &mut session, &SendConfig::default()).await;

    for (name, outcome) in &outcomes {
        assert!(outcome.is_passed(), "case '{}' did not pass: {}", name, outcome);
    }

    // Captures landed in the variables namespace.
    assert_eq!(session.resolve("{{token}}").unwrap(), "tok-1");
    assert_eq!(session.resolve("{{last_event_id}}").unwrap(), "evt-1");
}

#[tokio::test]
async fn test_status_and_header_captures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Request-Id", "req-77")
                .set_body_json(json!({})),
        )
        .mount(&server)
        .await;

    let mut session = Session::new();
    session.set_environment("server", server.uri());

    let case = TestCase::new(
        "status capture",
        RequestDescriptor::new(HttpMethod::GET, "{{server}}/status"),
    )
    .capture("last_status", CaptureSource::Status)
    .capture("request_id", CaptureSource::Header("x-request-id".into()));

    let outcome = run_case(&case, &mut session, &SendConfig::default()).await;
    assert!(outcome.is_passed());

    assert_eq!(
        session.resolve_typed("{{last_status}}").unwrap(),
        Scalar::Num(200.into())
    );
    assert_eq!(session.resolve("{{request_id}}").unwrap(), "req-77");
}

#[tokio::test]
async fn test_suite_continues_past_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({})))
        .mount(&server)
        .await;

    let mut session = Session::new();
    session.set_environment("server", server.uri());

    let cases = vec![
        TestCase::new(
            "assertion failure",
            RequestDescriptor::new(HttpMethod::GET, "{{server}}/broken"),
        )
        .expect_status(200),
        TestCase::new(
            "broken fixture",
            RequestDescriptor::new(HttpMethod::GET, "{{server}}/{{undefined_path}}"),
        ),
        TestCase::new(
            "still runs",
            RequestDescriptor::new(HttpMethod::GET, "{{server}}/ok"),
        )
        .expect_status(200),
    ];

    let outcomes = run_suite(&cases, &mut session, &SendConfig::default()).await;

    assert!(matches!(outcomes[0].1, TestOutcome::Failed { .. }));
    assert!(matches!(outcomes[1].1, TestOutcome::Errored { .. }));
    assert!(outcomes[2].1.is_passed());
}

#[tokio::test]
async fn test_missing_capture_pointer_is_errored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let mut session = Session::new();
    session.set_environment("server", server.uri());

    let case = TestCase::new(
        "capture from empty list",
        RequestDescriptor::new(HttpMethod::GET, "{{server}}/events"),
    )
    .capture("last_event_id", CaptureSource::BodyPointer("/data/0/id".into()));

    let outcome = run_case(&case, &mut session, &SendConfig::default()).await;
    match outcome {
        TestOutcome::Errored { message } => {
            assert!(message.contains("last_event_id"));
        }
        other => panic!("expected Errored, got {:?}", other),
    }

    // Nothing was written for the failed capture.
    assert!(session.resolve("{{last_event_id}}").is_err());
}
