use reqwest::StatusCode;
use serde_json::{Value, json};
use std::time::Duration;

mod common;

use common::{RecordingChannel, TestApp, message_of, valid_payload};

#[tokio::test]
async fn test_valid_submission_is_delivered() {
    let app = TestApp::spawn().await;

    let resp = app.post_json(&valid_payload(), "1.1.1.1").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get("x-request-id").is_some(), "Request id should be propagated");
    assert_eq!(message_of(resp).await, "Email sent successfully");

    let sent = app.channel.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "New message from Ada Lovelace");
    assert_eq!(sent[0].reply_to, "ada@example.com");
}

#[tokio::test]
async fn test_full_name_without_last_name() {
    let app = TestApp::spawn().await;

    let mut payload = valid_payload();
    payload.as_object_mut().unwrap().remove("lastName");
    let resp = app.post_json(&payload, "1.1.1.1").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let mut payload = valid_payload();
    payload["lastName"] = json!("");
    let resp = app.post_json(&payload, "1.1.1.1").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let subjects: Vec<_> = app.channel.sent().into_iter().map(|email| email.subject).collect();
    assert_eq!(subjects, vec!["New message from Ada", "New message from Ada"]);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let app = TestApp::spawn().await;

    for body in ["{not json", "[1, 2]", "", r#"{"firstName": 12}"#] {
        let resp = app.post_raw(body, "1.1.1.1").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(message_of(resp).await, "Invalid JSON in request body");
    }
    assert!(app.channel.sent().is_empty());
}

#[tokio::test]
async fn test_validation_failure_reports_joined_messages() {
    let app = TestApp::spawn().await;

    let payload = json!({
        "firstName": "Ada",
        "lastName": "L0velace",
        "email": "ada@example.com",
        "message": "Please visit www.example.com soon"
    });
    let resp = app.post_json(&payload, "1.1.1.1").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Validation failed: Last name must be 2-50 characters and contain only letters., Message must not contain URLs."
    );
    assert_eq!(body["errors"]["message"], "Message must not contain URLs.");
    assert!(body["errors"].get("firstName").is_none());
    assert!(app.channel.sent().is_empty());
}

#[tokio::test]
async fn test_missing_required_fields_are_validation_errors() {
    let app = TestApp::spawn().await;

    let resp = app.post_json(&json!({}), "1.1.1.1").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"]["firstName"], "First name is required.");
    assert_eq!(body["errors"]["email"], "Email is required.");
    assert_eq!(body["errors"]["message"], "Message is required.");
}

#[tokio::test]
async fn test_decoy_field_gets_generic_rejection() {
    let app = TestApp::spawn().await;

    let payload = json!({ "firstName": "1", "email": "bad", "honeypot": "i am a bot" });
    let resp = app.post_json(&payload, "1.1.1.1").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Unable to process submission." }), "No validation detail may leak");
    assert!(app.channel.sent().is_empty());
}

#[tokio::test]
async fn test_unconfigured_channel_returns_503() {
    let channel = RecordingChannel { unconfigured: true, ..Default::default() };
    let app = TestApp::spawn_with(common::get_test_config(), channel).await;

    let resp = app.post_json(&valid_payload(), "1.1.1.1").await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(message_of(resp).await, "Email service not configured");
}

#[tokio::test]
async fn test_placeholder_api_key_counts_as_unconfigured() {
    let mut config = common::get_test_config();
    config.delivery.api_key = Some("dummy-key-for-build".to_string());
    let app = contact_relay::AppBuilder::new(config).build().await.unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.router.into_make_service_with_connect_info::<std::net::SocketAddr>()).await.unwrap();
    });

    let resp = reqwest::Client::new().post(format!("http://{addr}/api/send")).json(&valid_payload()).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_delivery_failure_hides_details() {
    let channel = RecordingChannel { fail: true, ..Default::default() };
    let app = TestApp::spawn_with(common::get_test_config(), channel).await;

    let resp = app.post_json(&valid_payload(), "1.1.1.1").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let text = resp.text().await.unwrap();
    assert!(!text.contains("upstream secret detail"));
    assert!(text.contains("Error sending email. Please try again later."));
}

#[tokio::test]
async fn test_slow_delivery_times_out() {
    let mut config = common::get_test_config();
    config.delivery.timeout_ms = 100;
    let channel = RecordingChannel { delay: Some(Duration::from_secs(3)), ..Default::default() };
    let app = TestApp::spawn_with(config, channel).await;

    let resp = app.post_json(&valid_payload(), "1.1.1.1").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.channel.sent().is_empty());
}

#[tokio::test]
async fn test_oversized_body_is_refused() {
    let mut config = common::get_test_config();
    config.server.max_body_bytes = 64;
    let app = TestApp::spawn_with_config(config).await;

    let resp = app.post_json(&valid_payload(), "1.1.1.1").await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(message_of(resp).await, "Request body too large");
    assert!(app.channel.sent().is_empty());
}

#[tokio::test]
async fn test_submission_completes_after_client_disconnects() {
    let mut config = common::get_test_config();
    config.delivery.timeout_ms = 5_000;
    let channel = RecordingChannel { delay: Some(Duration::from_millis(500)), ..Default::default() };
    let app = TestApp::spawn_with(config, channel).await;

    let impatient = reqwest::Client::builder().timeout(Duration::from_millis(100)).build().unwrap();
    let result = impatient.post(app.send_url()).json(&valid_payload()).send().await;
    assert!(result.is_err(), "Client should give up before delivery finishes");

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(app.channel.sent().len(), 1, "Delivery must finish without the client");
}

#[tokio::test]
async fn test_request_timeout_has_json_body_and_delivery_still_finishes() {
    let mut config = common::get_test_config();
    config.server.request_timeout_secs = 1;
    config.delivery.timeout_ms = 5_000;
    let channel = RecordingChannel { delay: Some(Duration::from_millis(1_500)), ..Default::default() };
    let app = TestApp::spawn_with(config, channel).await;

    let resp = app.post_json(&valid_payload(), "1.1.1.1").await;
    assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);
    assert_eq!(message_of(resp).await, "Request timed out. Please try again later.");

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(app.channel.sent().len(), 1);
}
