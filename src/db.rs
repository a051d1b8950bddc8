use crate::app::ports::BookingStore;
use crate::error::{Result, SyncError};
use crate::types::{BookingKey, BookingRecord, Sport, UpsertOutcome};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA: &str = r#"
    PRAGMA journal_mode=WAL;
    PRAGMA busy_timeout=5000;
    CREATE TABLE IF NOT EXISTS bookings (
        id            TEXT PRIMARY KEY,
        sport         TEXT NOT NULL,
        court         TEXT NOT NULL,
        date          TEXT NOT NULL,
        start_time    TEXT NOT NULL,
        end_time      TEXT NOT NULL,
        occupants     TEXT,
        partner       TEXT,
        last_seen_at  TEXT NOT NULL,
        UNIQUE (sport, court, date, start_time)
    );
    CREATE INDEX IF NOT EXISTS bookings_by_day ON bookings (date DESC, start_time DESC);
"#;

const COLUMNS: &str =
    "id, sport, court, date, start_time, end_time, occupants, partner, last_seen_at";

const KEY_FILTER: &str = "sport = ?1 AND court = ?2 AND date = ?3 AND start_time = ?4";

/// SQLite-backed booking store.
///
/// The `UNIQUE` constraint on the natural key plus an IMMEDIATE transaction
/// around each upsert keep one row per key, also across processes sharing
/// the file.
pub struct SqliteBookingStore {
    conn: Mutex<Connection>,
}

impl SqliteBookingStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        info!("Opened booking store at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SyncError::Storage("sqlite connection lock poisoned".to_string()))
    }
}

fn corrupt(column: &str, value: &str) -> SyncError {
    SyncError::Storage(format!("unreadable {} '{}' in bookings table", column, value))
}

fn row_to_record(row: &Row<'_>) -> Result<BookingRecord> {
    let id: String = row.get(0)?;
    let sport: String = row.get(1)?;
    let date: String = row.get(3)?;
    let last_seen_at: String = row.get(8)?;

    Ok(BookingRecord {
        id: Some(Uuid::parse_str(&id).map_err(|_| corrupt("id", &id))?),
        sport: sport.parse::<Sport>().map_err(|_| corrupt("sport", &sport))?,
        court: row.get(2)?,
        date: NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|_| corrupt("date", &date))?,
        start_time: row.get(4)?,
        end_time: row.get(5)?,
        occupants: row.get(6)?,
        partner: row.get(7)?,
        last_seen_at: DateTime::parse_from_rfc3339(&last_seen_at)
            .map_err(|_| corrupt("last_seen_at", &last_seen_at))?
            .with_timezone(&Utc),
    })
}

#[async_trait]
impl BookingStore for SqliteBookingStore {
    async fn find(&self, key: &BookingKey) -> Result<Option<BookingRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM bookings WHERE {}",
            COLUMNS, KEY_FILTER
        ))?;
        let date = key.date.format(DATE_FORMAT).to_string();
        let mut rows = stmt.query(params![key.sport.as_str(), key.court, date, key.start_time])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row_to_record(row)?))
        } else {
            Ok(None)
        }
    }

    async fn upsert(&self, record: &BookingRecord) -> Result<UpsertOutcome> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let date = record.date.format(DATE_FORMAT).to_string();

        let exists = tx
            .prepare(&format!("SELECT 1 FROM bookings WHERE {}", KEY_FILTER))?
            .exists(params![record.sport.as_str(), record.court, date, record.start_time])?;

        let id = record.id.unwrap_or_else(Uuid::new_v4).to_string();
        tx.execute(
            "INSERT INTO bookings
                (id, sport, court, date, start_time, end_time, occupants, partner, last_seen_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(sport, court, date, start_time) DO UPDATE SET
                occupants = excluded.occupants,
                partner = excluded.partner,
                last_seen_at = excluded.last_seen_at",
            params![
                id,
                record.sport.as_str(),
                record.court,
                date,
                record.start_time,
                record.end_time,
                record.occupants,
                record.partner,
                record.last_seen_at.to_rfc3339(),
            ],
        )?;
        tx.commit()?;

        debug!(
            "{} booking {} {} {}",
            if exists { "Updated" } else { "Inserted" },
            record.court,
            date,
            record.start_time
        );
        Ok(if exists {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    async fn list(&self) -> Result<Vec<BookingRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM bookings ORDER BY date DESC, start_time DESC, court ASC",
            COLUMNS
        ))?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(row_to_record(row)?);
        }
        Ok(out)
    }
}
