use crate::error::Result;
use crate::types::{BookingKey, BookingRecord, Sport, UpsertOutcome};
use async_trait::async_trait;

/// Persistent store for reconciled bookings.
///
/// Implementations must make `upsert` atomic per natural key: two concurrent
/// upserts of the same key leave exactly one record, and exactly one of them
/// reports `Inserted`.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn find(&self, key: &BookingKey) -> Result<Option<BookingRecord>>;

    /// Insert `record`, or if its key exists overwrite occupants, partner and
    /// last-seen time of the stored row.
    async fn upsert(&self, record: &BookingRecord) -> Result<UpsertOutcome>;

    /// All bookings, newest date and start time first
    async fn list(&self) -> Result<Vec<BookingRecord>>;
}

/// Source of raw schedule pages
#[async_trait]
pub trait HtmlSource: Send + Sync {
    /// `day_token` comes from a previously parsed day tab; `None` is today.
    async fn fetch_schedule(&self, sport: Sport, day_token: Option<&str>) -> Result<String>;
}
