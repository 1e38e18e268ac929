use std::sync::Arc;

pub mod rate_store;

pub use rate_store::RedisRateStore;

#[derive(Debug)]
pub struct RedisClient {
    connection: redis::aio::ConnectionManager,
}

impl RedisClient {
    /// Connects to Redis and keeps a managed, auto-reconnecting connection.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the initial connection fails.
    pub async fn new(url: &str) -> anyhow::Result<Arc<Self>> {
        let client = redis::Client::open(url)?;
        let connection = client.get_connection_manager().await?;
        Ok(Arc::new(Self { connection }))
    }

    /// Returns a connection handle; clones share the underlying multiplexed connection.
    #[must_use]
    pub fn connection(&self) -> redis::aio::ConnectionManager {
        self.connection.clone()
    }

    /// Round-trips a `PING`.
    ///
    /// # Errors
    /// Returns an error if Redis does not answer.
    pub async fn ping(&self) -> redis::RedisResult<()> {
        let mut conn = self.connection();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
