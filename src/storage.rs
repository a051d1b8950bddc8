use crate::app::ports::BookingStore;
use crate::error::{Result, SyncError};
use crate::types::{BookingKey, BookingRecord, UpsertOutcome};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

/// In-memory booking store for development/testing.
///
/// Records are keyed by natural key, and each upsert runs under a single lock
/// acquisition, so concurrent upserts of one key cannot both insert.
#[derive(Clone, Default)]
pub struct InMemoryBookingStore {
    records: Arc<Mutex<HashMap<BookingKey, BookingRecord>>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<BookingKey, BookingRecord>>> {
        self.records
            .lock()
            .map_err(|_| SyncError::Storage("booking store lock poisoned".to_string()))
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn find(&self, key: &BookingKey) -> Result<Option<BookingRecord>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn upsert(&self, record: &BookingRecord) -> Result<UpsertOutcome> {
        let mut records = self.lock()?;
        match records.get_mut(&record.key()) {
            Some(existing) => {
                existing.occupants = record.occupants.clone();
                existing.partner = record.partner.clone();
                existing.last_seen_at = record.last_seen_at;
                debug!(
                    "Updated booking {} {} {}",
                    existing.court, existing.date, existing.start_time
                );
                Ok(UpsertOutcome::Updated)
            }
            None => {
                let mut stored = record.clone();
                let id = *stored.id.get_or_insert_with(Uuid::new_v4);
                records.insert(stored.key(), stored);
                debug!("Created booking with id {}", id);
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    async fn list(&self) -> Result<Vec<BookingRecord>> {
        let mut all: Vec<BookingRecord> = self.lock()?.values().cloned().collect();
        all.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.start_time.cmp(&a.start_time))
                .then_with(|| a.court.cmp(&b.court))
        });
        Ok(all)
    }
}
