use crate::app::availability_use_case::AvailabilityUseCase;
use crate::app::ports::BookingStore;
use crate::dates::resolve_day_label;
use crate::error::{Result, SyncError};
use crate::metrics::SyncMetrics;
use crate::ownership::extract_partner;
use crate::types::{
    AvailabilityModel, BookingKey, BookingRecord, Slot, Sport, SyncOutcome, UpsertOutcome,
};
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Reconciles the caller's bookings from a parsed schedule into the store.
///
/// Stateless between calls; running it twice on the same model updates the
/// same rows instead of adding new ones.
pub struct SyncUseCase {
    store: Arc<dyn BookingStore>,
}

impl SyncUseCase {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Upsert every "mine" slot of `model`.
    ///
    /// `now` supplies both the reference day for resolving the active tab and
    /// the last-seen timestamp. A storage error aborts the remaining slots;
    /// upserts already made are kept.
    #[instrument(skip(self, model, now))]
    pub async fn reconcile(
        &self,
        sport: Sport,
        model: &AvailabilityModel,
        display_name: Option<&str>,
        now: DateTime<FixedOffset>,
    ) -> Result<SyncOutcome> {
        let result = self.reconcile_model(sport, model, display_name, now).await;
        match &result {
            Ok(outcome) => {
                SyncMetrics::record_run(sport.as_str(), outcome.inserted, outcome.updated)
            }
            Err(e) => SyncMetrics::record_failure(failure_kind(e)),
        }
        result
    }

    /// Fetch, parse and reconcile one sport/day.
    pub async fn sync(
        &self,
        availability: &AvailabilityUseCase,
        sport: Sport,
        day_token: Option<&str>,
        display_name: Option<&str>,
        now: DateTime<FixedOffset>,
    ) -> Result<SyncOutcome> {
        // Fail before any network traffic
        let display_name = require_identity(display_name)?;
        let model = availability.availability(sport, day_token, Some(display_name)).await?;
        self.reconcile(sport, &model, Some(display_name), now).await
    }

    async fn reconcile_model(
        &self,
        sport: Sport,
        model: &AvailabilityModel,
        display_name: Option<&str>,
        now: DateTime<FixedOffset>,
    ) -> Result<SyncOutcome> {
        let display_name = require_identity(display_name)?;
        let label = active_day_label(model)?;
        let date = resolve_day_label(label, now.date_naive())?;

        let mine: Vec<&Slot> = model.mine().collect();
        if mine.is_empty() {
            info!(%date, "No bookings for {} on this day", display_name);
            return Ok(SyncOutcome {
                inserted: 0,
                updated: 0,
                date,
                total: 0,
            });
        }

        let seen_at = now.with_timezone(&Utc);
        let mut inserted = 0;
        let mut updated = 0;

        for slot in &mine {
            let key = BookingKey {
                sport,
                court: slot.court.clone(),
                date,
                start_time: slot.start_time.clone(),
            };
            let existing = self.store.find(&key).await?;
            let record = BookingRecord {
                id: existing.as_ref().and_then(|r| r.id),
                sport,
                court: key.court,
                date,
                start_time: key.start_time,
                end_time: slot.end_time.clone(),
                occupants: slot.occupants.clone(),
                partner: slot
                    .occupants
                    .as_deref()
                    .and_then(|o| extract_partner(o, display_name)),
                last_seen_at: seen_at,
            };

            // The store decides the branch atomically; `existing` can be stale
            // when another run touches the same key in between.
            match self.store.upsert(&record).await? {
                UpsertOutcome::Inserted => {
                    if existing.is_some() {
                        debug!(
                            court = %record.court,
                            start = %record.start_time,
                            "Booking vanished before upsert"
                        );
                    }
                    inserted += 1;
                }
                UpsertOutcome::Updated => {
                    if existing.is_none() {
                        debug!(
                            court = %record.court,
                            start = %record.start_time,
                            "Booking inserted concurrently"
                        );
                    }
                    updated += 1;
                }
            }
        }

        info!(%date, inserted, updated, total = mine.len(), "Reconciled bookings");
        Ok(SyncOutcome {
            inserted,
            updated,
            date,
            total: mine.len(),
        })
    }
}

fn require_identity(display_name: Option<&str>) -> Result<&str> {
    display_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(SyncError::MissingIdentity)
}

/// Label of the single active day tab
fn active_day_label(model: &AvailabilityModel) -> Result<&str> {
    let mut active = model.days.iter().filter(|d| d.active);
    match (active.next(), active.next()) {
        (Some(day), None) => Ok(&day.label),
        (None, _) => Err(SyncError::AmbiguousDate("no active day in the date bar".into())),
        (Some(_), Some(_)) => Err(SyncError::AmbiguousDate(
            "more than one active day in the date bar".into(),
        )),
    }
}

fn failure_kind(err: &SyncError) -> &'static str {
    match err {
        SyncError::MissingIdentity => "missing_identity",
        SyncError::AmbiguousDate(_) => "ambiguous_date",
        SyncError::Storage(_) => "storage",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryBookingStore;
    use crate::types::{DayNav, SlotStatus};
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wraps the in-memory store, counting calls and optionally failing the n-th upsert
    struct ProbeStore {
        inner: InMemoryBookingStore,
        calls: AtomicUsize,
        upserts: AtomicUsize,
        fail_on_upsert: Option<usize>,
    }

    impl ProbeStore {
        fn new(fail_on_upsert: Option<usize>) -> Self {
            Self {
                inner: InMemoryBookingStore::new(),
                calls: AtomicUsize::new(0),
                upserts: AtomicUsize::new(0),
                fail_on_upsert,
            }
        }
    }

    #[async_trait]
    impl BookingStore for ProbeStore {
        async fn find(&self, key: &BookingKey) -> Result<Option<BookingRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find(key).await
        }

        async fn upsert(&self, record: &BookingRecord) -> Result<UpsertOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let n = self.upserts.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on_upsert == Some(n) {
                return Err(SyncError::Storage("disk full".into()));
            }
            self.inner.upsert(record).await
        }

        async fn list(&self) -> Result<Vec<BookingRecord>> {
            self.inner.list().await
        }
    }

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2026, 2, 24, 10, 15, 0)
            .unwrap()
    }

    fn slot(court: &str, start: &str, status: SlotStatus, occupants: Option<&str>) -> Slot {
        Slot {
            court: court.to_string(),
            start_time: start.to_string(),
            end_time: crate::parser::cell::add_one_hour(start),
            status,
            occupants: occupants.map(str::to_string),
            booking_url: None,
        }
    }

    fn model(slots: Vec<Slot>) -> AvailabilityModel {
        AvailabilityModel {
            display_date: "Ve 27".to_string(),
            days: vec![
                DayNav {
                    label: "Ma 24".to_string(),
                    active: false,
                    date_token: None,
                },
                DayNav {
                    label: "Ve 27".to_string(),
                    active: true,
                    date_token: Some("tok27".to_string()),
                },
            ],
            times: vec!["08:00".to_string(), "09:00".to_string()],
            courts: vec!["Court 1".to_string(), "Court 2".to_string()],
            slots,
        }
    }

    fn two_bookings() -> AvailabilityModel {
        model(vec![
            slot("Court 1", "08:00", SlotStatus::Free, None),
            slot("Court 1", "09:00", SlotStatus::Mine, Some("C Berchier / P Dupont")),
            slot("Court 2", "08:00", SlotStatus::Booked, Some("A Martin")),
            slot("Court 2", "09:00", SlotStatus::Mine, Some("C Berchier")),
        ])
    }

    #[tokio::test]
    async fn missing_identity_fails_before_touching_storage() {
        let store = Arc::new(ProbeStore::new(None));
        let use_case = SyncUseCase::new(store.clone());

        for name in [None, Some(""), Some("   ")] {
            let err = use_case
                .reconcile(Sport::Squash, &two_bookings(), name, now())
                .await
                .unwrap_err();
            assert!(matches!(err, SyncError::MissingIdentity));
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn no_active_day_is_ambiguous() {
        let store = Arc::new(ProbeStore::new(None));
        let use_case = SyncUseCase::new(store.clone());
        let mut m = two_bookings();
        m.days.iter_mut().for_each(|d| d.active = false);

        let err = use_case.reconcile(Sport::Squash, &m, Some("Berchier"), now()).await.unwrap_err();
        assert!(matches!(err, SyncError::AmbiguousDate(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn two_active_days_are_ambiguous() {
        let use_case = SyncUseCase::new(Arc::new(ProbeStore::new(None)));
        let mut m = two_bookings();
        m.days.iter_mut().for_each(|d| d.active = true);

        let err = use_case.reconcile(Sport::Squash, &m, Some("Berchier"), now()).await.unwrap_err();
        assert!(matches!(err, SyncError::AmbiguousDate(_)));
    }

    #[tokio::test]
    async fn zero_owned_slots_skips_storage() {
        let store = Arc::new(ProbeStore::new(None));
        let use_case = SyncUseCase::new(store.clone());
        let m = model(vec![slot("Court 1", "08:00", SlotStatus::Booked, Some("A Martin"))]);

        let outcome = use_case.reconcile(Sport::Padel, &m, Some("Berchier"), now()).await.unwrap();
        assert_eq!(
            outcome,
            SyncOutcome {
                inserted: 0,
                updated: 0,
                date: NaiveDate::from_ymd_opt(2026, 2, 27).unwrap(),
                total: 0,
            }
        );
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn second_run_updates_instead_of_inserting() {
        let store = Arc::new(ProbeStore::new(None));
        let use_case = SyncUseCase::new(store.clone());
        let m = two_bookings();

        let first = use_case
            .reconcile(Sport::TennisIndoor, &m, Some("Berchier"), now())
            .await
            .unwrap();
        assert_eq!((first.inserted, first.updated, first.total), (2, 0, 2));

        let second = use_case
            .reconcile(Sport::TennisIndoor, &m, Some("Berchier"), now())
            .await
            .unwrap();
        assert_eq!((second.inserted, second.updated, second.total), (0, 2, 2));

        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 2);
        let shared = records.iter().find(|r| r.court == "Court 1").unwrap();
        assert_eq!(shared.partner.as_deref(), Some("P Dupont"));
        assert_eq!(shared.date, NaiveDate::from_ymd_opt(2026, 2, 27).unwrap());
        assert_eq!(shared.end_time, "10:00");
        let solo = records.iter().find(|r| r.court == "Court 2").unwrap();
        assert_eq!(solo.partner, None);
    }

    #[tokio::test]
    async fn update_overwrites_occupants_and_partner() {
        let store = Arc::new(InMemoryBookingStore::new());
        let use_case = SyncUseCase::new(store.clone());
        let before = model(vec![slot("Court 1", "09:00", SlotStatus::Mine, Some("C Berchier"))]);
        let after = model(vec![slot(
            "Court 1",
            "09:00",
            SlotStatus::Mine,
            Some("C Berchier / L Meier"),
        )]);

        use_case.reconcile(Sport::Badminton, &before, Some("Berchier"), now()).await.unwrap();
        let first_id = store.list().await.unwrap()[0].id;
        let later = now() + chrono::Duration::minutes(5);
        let outcome = use_case
            .reconcile(Sport::Badminton, &after, Some("Berchier"), later)
            .await
            .unwrap();

        assert_eq!(outcome.updated, 1);
        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, first_id);
        assert_eq!(records[0].occupants.as_deref(), Some("C Berchier / L Meier"));
        assert_eq!(records[0].partner.as_deref(), Some("L Meier"));
        assert_eq!(records[0].last_seen_at, later.with_timezone(&Utc));
    }

    #[tokio::test]
    async fn storage_failure_aborts_remaining_slots() {
        let store = Arc::new(ProbeStore::new(Some(2)));
        let use_case = SyncUseCase::new(store.clone());

        let err = use_case
            .reconcile(Sport::TennisOutdoor, &two_bookings(), Some("Berchier"), now())
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Storage(_)));
        // The first upsert stays applied
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_runs_never_duplicate_a_key() {
        let store = Arc::new(InMemoryBookingStore::new());
        let use_case = Arc::new(SyncUseCase::new(store.clone()));
        let m = Arc::new(two_bookings());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let use_case = use_case.clone();
                let m = m.clone();
                tokio::spawn(async move {
                    use_case
                        .reconcile(Sport::Squash, &m, Some("Berchier"), now())
                        .await
                })
            })
            .collect();

        let mut inserted = 0;
        let mut updated = 0;
        for handle in handles {
            let outcome = handle.await.unwrap().unwrap();
            inserted += outcome.inserted;
            updated += outcome.updated;
        }

        assert_eq!(inserted, 2);
        assert_eq!(updated, 14);
        assert_eq!(store.list().await.unwrap().len(), 2);
    }
}
