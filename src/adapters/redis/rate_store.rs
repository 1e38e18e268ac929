use crate::adapters::redis::RedisClient;
use crate::services::admission::{Admission, RatePolicy, RateStore, StoreError};
use async_trait::async_trait;
use redis::Script;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

// KEYS[1] = counter key, ARGV[1] = window in ms, ARGV[2] = capacity.
// Returns {admitted, remaining window in ms}.
static FIXED_WINDOW: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
local current = redis.call('GET', KEYS[1])
if not current then
    redis.call('SET', KEYS[1], 1, 'PX', ARGV[1])
    return {1, tonumber(ARGV[1])}
end
if tonumber(current) >= tonumber(ARGV[2]) then
    return {0, redis.call('PTTL', KEYS[1])}
end
redis.call('INCR', KEYS[1])
return {1, redis.call('PTTL', KEYS[1])}
",
    )
});

/// Rate store shared between instances.
///
/// The fixed-window logic runs as a server-side script so check-and-increment is atomic across
/// every client of the same Redis. Records expire natively, so `sweep` has nothing to do and the
/// `now` argument is ignored in favour of the Redis clock.
#[derive(Debug, Clone)]
pub struct RedisRateStore {
    redis: Arc<RedisClient>,
    prefix: String,
}

impl RedisRateStore {
    #[must_use]
    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis, prefix: "contact:rate:".to_string() }
    }
}

#[async_trait]
impl RateStore for RedisRateStore {
    async fn hit(&self, key: &str, _now: Instant, policy: RatePolicy) -> Result<Admission, StoreError> {
        let mut conn = self.redis.connection();
        let full_key = format!("{}{key}", self.prefix);
        let window_ms = u64::try_from(policy.window.as_millis()).unwrap_or(u64::MAX).max(1);

        let (admitted, ttl_ms): (i64, i64) =
            FIXED_WINDOW.key(full_key).arg(window_ms).arg(policy.capacity).invoke_async(&mut conn).await?;

        if admitted == 1 {
            return Ok(Admission::Admitted);
        }

        // PTTL is negative when the key has no expiry or vanished between calls.
        let retry_after = u64::try_from(ttl_ms).ok().map(Duration::from_millis);
        Ok(Admission::Throttled { retry_after })
    }

    async fn sweep(&self, _now: Instant) -> Result<usize, StoreError> {
        Ok(0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.redis.ping().await?;
        Ok(())
    }
}
