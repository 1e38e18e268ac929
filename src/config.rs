use clap::{Args, Parser, ValueEnum};
use ipnetwork::IpNetwork;

/// Value shipped in build environments where no real delivery credential exists.
pub const PLACEHOLDER_API_KEY: &str = "dummy-key-for-build";

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub rate_limit: RateLimitConfig,

    #[command(flatten)]
    pub delivery: DeliveryConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "CONTACT_RELAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "CONTACT_RELAY_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Port for the management server (health checks)
    #[arg(long, env = "CONTACT_RELAY_MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// Upper bound on the time spent handling a single request
    #[arg(long, env = "CONTACT_RELAY_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Maximum accepted request body size in bytes
    #[arg(long, env = "CONTACT_RELAY_MAX_BODY_BYTES", default_value_t = 16_384)]
    pub max_body_bytes: usize,

    /// How long to wait for background tasks during shutdown
    #[arg(long, env = "CONTACT_RELAY_SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RateStoreBackend {
    /// Process-local map, swept periodically
    Memory,
    /// Shared Redis instance with native key expiry
    Redis,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ClientIpMode {
    /// Use the first X-Forwarded-For entry as sent by the caller
    FirstHop,
    /// Honour forwarding headers only when the peer is a trusted proxy
    TrustedProxies,
}

#[derive(Clone, Debug, Args)]
pub struct RateLimitConfig {
    /// Length of the fixed admission window in seconds
    #[arg(
        long = "rate-limit-window-secs",
        env = "CONTACT_RELAY_RATE_LIMIT_WINDOW_SECS",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub window_secs: u64,

    /// Submissions admitted per client within one window
    #[arg(
        long = "rate-limit-max-requests",
        env = "CONTACT_RELAY_RATE_LIMIT_MAX_REQUESTS",
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_requests: u32,

    /// Where rate records live
    #[arg(
        long = "rate-limit-backend",
        env = "CONTACT_RELAY_RATE_LIMIT_BACKEND",
        value_enum,
        default_value_t = RateStoreBackend::Memory
    )]
    pub backend: RateStoreBackend,

    /// Redis connection URL (required for the redis backend)
    #[arg(long, env = "CONTACT_RELAY_REDIS_URL")]
    pub redis_url: Option<String>,

    /// How often expired in-memory records are swept
    #[arg(long, env = "CONTACT_RELAY_SWEEP_INTERVAL_SECS", default_value_t = 300)]
    pub sweep_interval_secs: u64,

    /// How the client identifier is derived from the request
    #[arg(long, env = "CONTACT_RELAY_CLIENT_IP_MODE", value_enum, default_value_t = ClientIpMode::FirstHop)]
    pub client_ip_mode: ClientIpMode,

    /// Comma-separated list of CIDRs to trust for X-Forwarded-For IP extraction
    #[arg(
        long,
        env = "CONTACT_RELAY_TRUSTED_PROXIES",
        default_value = "10.0.0.0/8,172.16.0.0/12,192.168.0.0/16,127.0.0.1/32",
        value_delimiter = ','
    )]
    pub trusted_proxies: Vec<IpNetwork>,
}

#[derive(Clone, Debug, Args)]
pub struct DeliveryConfig {
    /// API key for the email delivery service
    #[arg(long = "delivery-api-key", env = "CONTACT_RELAY_DELIVERY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the email delivery API
    #[arg(long = "delivery-api-url", env = "CONTACT_RELAY_DELIVERY_API_URL", default_value = "https://api.resend.com")]
    pub api_url: String,

    /// Sender mailbox for relayed messages
    #[arg(
        long = "delivery-from",
        env = "CONTACT_RELAY_DELIVERY_FROM",
        default_value = "Contact Form <noreply@example.com>"
    )]
    pub from: String,

    /// Mailbox that receives relayed messages
    #[arg(long = "delivery-to", env = "CONTACT_RELAY_DELIVERY_TO", default_value = "owner@example.com")]
    pub to: String,

    /// Upper bound on a single delivery attempt in milliseconds
    #[arg(long = "delivery-timeout-ms", env = "CONTACT_RELAY_DELIVERY_TIMEOUT_MS", default_value_t = 10_000)]
    pub timeout_ms: u64,
}

impl DeliveryConfig {
    /// Returns the API key when one is set to a usable value.
    #[must_use]
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|key| !key.is_empty() && *key != PLACEHOLDER_API_KEY)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "CONTACT_RELAY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; export is disabled when unset
    #[arg(long, env = "CONTACT_RELAY_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
