#![allow(dead_code)]

use async_trait::async_trait;
use contact_relay::AppBuilder;
use contact_relay::adapters::redis::RedisClient;
use contact_relay::config::{
    ClientIpMode, Config, DeliveryConfig, LogFormat, RateLimitConfig, RateStoreBackend, ServerConfig, TelemetryConfig,
};
use contact_relay::services::delivery::{DeliveryChannel, DeliveryError, OutboundEmail};
use reqwest::Client;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("contact_relay=debug".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

pub fn get_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            mgmt_port: 0,
            request_timeout_secs: 10,
            max_body_bytes: 16_384,
            shutdown_timeout_secs: 1,
        },
        rate_limit: RateLimitConfig {
            window_secs: 60,
            max_requests: 5,
            backend: RateStoreBackend::Memory,
            redis_url: None,
            sweep_interval_secs: 300,
            client_ip_mode: ClientIpMode::FirstHop,
            trusted_proxies: vec!["127.0.0.1/32".parse().unwrap(), "::1/128".parse().unwrap()],
        },
        delivery: DeliveryConfig {
            api_key: Some("re_test_key".to_string()),
            api_url: "http://127.0.0.1:9".to_string(),
            from: "Contact <noreply@example.com>".to_string(),
            to: "owner@example.com".to_string(),
            timeout_ms: 500,
        },
        telemetry: TelemetryConfig { log_format: LogFormat::Text, otlp_endpoint: None },
    }
}

pub fn test_redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
}

pub async fn get_test_redis() -> Arc<RedisClient> {
    setup_tracing();
    RedisClient::new(&test_redis_url()).await.expect("Failed to connect to Redis. Is Redis running?")
}

/// Delivery channel that records what it was asked to send.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    pub unconfigured: bool,
    pub fail: bool,
    pub delay: Option<Duration>,
    pub sent: Mutex<Vec<OutboundEmail>>,
}

impl RecordingChannel {
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryChannel for RecordingChannel {
    fn is_configured(&self) -> bool {
        !self.unconfigured
    }

    async fn deliver(&self, email: &OutboundEmail) -> Result<(), DeliveryError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(DeliveryError::Rejected { status: 500, body: "upstream secret detail".to_string() });
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub server_url: String,
    pub mgmt_url: String,
    pub client: Client,
    pub channel: Arc<RecordingChannel>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(get_test_config(), RecordingChannel::default()).await
    }

    pub async fn spawn_with_config(config: Config) -> Self {
        Self::spawn_with(config, RecordingChannel::default()).await
    }

    pub async fn spawn_with(config: Config, channel: RecordingChannel) -> Self {
        setup_tracing();

        let channel = Arc::new(channel);
        let app = AppBuilder::new(config)
            .with_delivery_channel(channel.clone())
            .build()
            .await
            .expect("Failed to build app");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app.router.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });

        let mgmt_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mgmt_addr = mgmt_listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(mgmt_listener, app.mgmt_router.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .unwrap();
        });

        Self {
            server_url: format!("http://{addr}"),
            mgmt_url: format!("http://{mgmt_addr}"),
            client: Client::new(),
            channel,
        }
    }

    pub fn send_url(&self) -> String {
        format!("{}/api/send", self.server_url)
    }

    pub async fn post_json(&self, body: &Value, client_ip: &str) -> reqwest::Response {
        self.client.post(self.send_url()).header("X-Forwarded-For", client_ip).json(body).send().await.unwrap()
    }

    pub async fn post_raw(&self, body: &'static str, client_ip: &str) -> reqwest::Response {
        self.client
            .post(self.send_url())
            .header("X-Forwarded-For", client_ip)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap()
    }
}

pub fn valid_payload() -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "ada@example.com",
        "message": "I enjoyed your talk on analytical engines."
    })
}

pub async fn message_of(response: reqwest::Response) -> String {
    let body: Value = response.json().await.unwrap();
    body["message"].as_str().unwrap().to_string()
}
