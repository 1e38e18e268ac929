use contact_relay::config::ClientIpMode;
use futures::future::join_all;
use reqwest::StatusCode;
use serde_json::json;

mod common;

use common::{TestApp, message_of, valid_payload};

#[tokio::test]
async fn test_sixth_request_is_throttled() {
    let app = TestApp::spawn().await;

    for i in 1..=5 {
        let resp = app.post_json(&valid_payload(), "1.1.1.1").await;
        assert_eq!(resp.status(), StatusCode::OK, "Request {i} should be admitted");
    }

    let resp = app.post_json(&valid_payload(), "1.1.1.1").await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = resp.headers().get("retry-after").unwrap().to_str().unwrap().parse().unwrap();
    assert!((1..=60).contains(&retry_after));
    assert_eq!(message_of(resp).await, "Too many requests. Please try again later.");
    assert_eq!(app.channel.sent().len(), 5);
}

#[tokio::test]
async fn test_rate_limit_isolation() {
    let mut config = common::get_test_config();
    config.rate_limit.max_requests = 1;
    let app = TestApp::spawn_with_config(config).await;

    assert_eq!(app.post_json(&valid_payload(), "1.1.1.1").await.status(), StatusCode::OK);
    assert_eq!(app.post_json(&valid_payload(), "1.1.1.1").await.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(app.post_json(&valid_payload(), "2.2.2.2").await.status(), StatusCode::OK, "Other clients unaffected");
}

#[tokio::test]
async fn test_rejected_attempts_consume_quota() {
    let mut config = common::get_test_config();
    config.rate_limit.max_requests = 2;
    let app = TestApp::spawn_with_config(config).await;

    assert_eq!(app.post_raw("{broken", "3.3.3.3").await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.post_json(&json!({ "firstName": "A" }), "3.3.3.3").await.status(), StatusCode::BAD_REQUEST);

    let resp = app.post_json(&valid_payload(), "3.3.3.3").await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS, "Earlier failures count against the window");
}

#[tokio::test]
async fn test_throttled_request_skips_validation() {
    let mut config = common::get_test_config();
    config.rate_limit.max_requests = 1;
    let app = TestApp::spawn_with_config(config).await;

    app.post_json(&valid_payload(), "4.4.4.4").await;
    let resp = app.post_raw("{broken", "4.4.4.4").await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_spam_does_not_consume_quota() {
    let mut config = common::get_test_config();
    config.rate_limit.max_requests = 1;
    let app = TestApp::spawn_with_config(config).await;

    for _ in 0..3 {
        let resp = app.post_json(&json!({ "honeypot": "x" }), "5.5.5.5").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
    assert_eq!(app.post_json(&valid_payload(), "5.5.5.5").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_window_recovery() {
    let mut config = common::get_test_config();
    config.rate_limit.window_secs = 1;
    config.rate_limit.max_requests = 1;
    let app = TestApp::spawn_with_config(config).await;

    assert_eq!(app.post_json(&valid_payload(), "6.6.6.6").await.status(), StatusCode::OK);
    assert_eq!(app.post_json(&valid_payload(), "6.6.6.6").await.status(), StatusCode::TOO_MANY_REQUESTS);

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    assert_eq!(app.post_json(&valid_payload(), "6.6.6.6").await.status(), StatusCode::OK, "Should recover");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_share_one_slot() {
    let mut config = common::get_test_config();
    config.rate_limit.max_requests = 3;
    let app = TestApp::spawn_with_config(config).await;

    for _ in 0..2 {
        assert_eq!(app.post_json(&valid_payload(), "7.7.7.7").await.status(), StatusCode::OK);
    }

    let tasks = (0..2).map(|_| {
        let client = app.client.clone();
        let url = app.send_url();
        tokio::spawn(async move {
            client.post(url).header("X-Forwarded-For", "7.7.7.7").json(&valid_payload()).send().await.unwrap().status()
        })
    });

    let statuses: Vec<StatusCode> = join_all(tasks).await.into_iter().map(Result::unwrap).collect();
    let admitted = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let throttled = statuses.iter().filter(|s| **s == StatusCode::TOO_MANY_REQUESTS).count();
    assert_eq!((admitted, throttled), (1, 1), "Exactly one racer may take the last slot: {statuses:?}");
}

#[tokio::test]
async fn test_first_forwarded_hop_is_the_key() {
    let mut config = common::get_test_config();
    config.rate_limit.max_requests = 1;
    let app = TestApp::spawn_with_config(config).await;

    assert_eq!(app.post_json(&valid_payload(), "8.8.8.8, 10.0.0.1").await.status(), StatusCode::OK);
    let resp = app.post_json(&valid_payload(), "8.8.8.8, 10.0.0.2").await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_fallback_to_peer_ip() {
    let mut config = common::get_test_config();
    config.rate_limit.max_requests = 1;
    let app = TestApp::spawn_with_config(config).await;

    let send = || app.client.post(app.send_url()).json(&valid_payload()).send();
    assert_eq!(send().await.unwrap().status(), StatusCode::OK);
    assert_eq!(send().await.unwrap().status(), StatusCode::TOO_MANY_REQUESTS, "Peer address is the key");
}

#[tokio::test]
async fn test_trusted_proxy_mode_uses_rightmost_untrusted_hop() {
    let mut config = common::get_test_config();
    config.rate_limit.max_requests = 1;
    config.rate_limit.client_ip_mode = ClientIpMode::TrustedProxies;
    let app = TestApp::spawn_with_config(config).await;

    assert_eq!(app.post_json(&valid_payload(), "1.2.3.4, 5.6.7.8").await.status(), StatusCode::OK);

    let resp = app.post_json(&valid_payload(), "9.9.9.9, 5.6.7.8").await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS, "Spoofed leading hops are ignored");

    assert_eq!(app.post_json(&valid_payload(), "1.2.3.4").await.status(), StatusCode::OK);
}
