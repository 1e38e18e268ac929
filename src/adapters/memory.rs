use crate::services::admission::{Admission, RatePolicy, RateRecord, RateStore, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::time::Instant;

/// Process-local rate store.
///
/// Check-and-increment runs under the shard write lock held by the entry guard, so concurrent
/// hits on one key are serialized. Memory grows with distinct identifiers until the sweeper
/// drops expired records.
#[derive(Debug, Default)]
pub struct MemoryRateStore {
    records: DashMap<String, RateRecord>,
}

impl MemoryRateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn record(&self, key: &str) -> Option<RateRecord> {
        self.records.get(key).map(|record| *record)
    }
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn hit(&self, key: &str, now: Instant, policy: RatePolicy) -> Result<Admission, StoreError> {
        let admission = match self.records.entry(key.to_string()) {
            Entry::Occupied(mut entry) => entry.get_mut().register(now, policy),
            Entry::Vacant(entry) => {
                entry.insert(RateRecord::fresh(now, policy));
                Admission::Admitted
            }
        };
        Ok(admission)
    }

    async fn sweep(&self, now: Instant) -> Result<usize, StoreError> {
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired(now));
        Ok(before.saturating_sub(self.records.len()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
