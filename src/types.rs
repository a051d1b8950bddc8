use crate::error::SyncError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The five sport pages published by the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sport {
    #[serde(rename = "tennis_int")]
    TennisIndoor,
    #[serde(rename = "tennis_ext")]
    TennisOutdoor,
    #[serde(rename = "squash")]
    Squash,
    #[serde(rename = "badminton")]
    Badminton,
    #[serde(rename = "padel")]
    Padel,
}

impl Sport {
    pub const ALL: [Sport; 5] = [
        Sport::TennisIndoor,
        Sport::TennisOutdoor,
        Sport::Squash,
        Sport::Badminton,
        Sport::Padel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::TennisIndoor => "tennis_int",
            Sport::TennisOutdoor => "tennis_ext",
            Sport::Squash => "squash",
            Sport::Badminton => "badminton",
            Sport::Padel => "padel",
        }
    }

    /// Human-readable tab label
    pub fn label(&self) -> &'static str {
        match self {
            Sport::TennisIndoor => "Tennis INT",
            Sport::TennisOutdoor => "Bulle",
            Sport::Squash => "Squash",
            Sport::Badminton => "Badminton",
            Sport::Padel => "Padel",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sport {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Sport::ALL
            .into_iter()
            .find(|sport| sport.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SyncError::UnknownSport(wanted.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Free,
    Booked,
    Unavailable,
    Mine,
}

/// One selectable day tab of the date bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayNav {
    pub label: String,
    pub active: bool,
    /// Portal-encoded date parameter; `None` means today
    pub date_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub court: String,
    pub start_time: String,
    pub end_time: String,
    pub status: SlotStatus,
    pub occupants: Option<String>,
    /// Only ever set on free slots
    pub booking_url: Option<String>,
}

/// Normalized result of parsing one sport/day schedule page.
///
/// `slots` is sparse: a court/time pair with no cell in the page has no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityModel {
    pub display_date: String,
    pub days: Vec<DayNav>,
    pub times: Vec<String>,
    pub courts: Vec<String>,
    pub slots: Vec<Slot>,
}

impl AvailabilityModel {
    /// True when nothing at all could be extracted from the page
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
            && self.times.is_empty()
            && self.courts.is_empty()
            && self.slots.is_empty()
    }

    pub fn mine(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter().filter(|s| s.status == SlotStatus::Mine)
    }
}

/// Natural key of a persisted booking
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingKey {
    pub sport: Sport,
    pub court: String,
    pub date: NaiveDate,
    pub start_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub id: Option<Uuid>,
    pub sport: Sport,
    pub court: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub occupants: Option<String>,
    pub partner: Option<String>,
    pub last_seen_at: DateTime<Utc>,
}

impl BookingRecord {
    pub fn key(&self) -> BookingKey {
        BookingKey {
            sport: self.sport,
            court: self.court.clone(),
            date: self.date,
            start_time: self.start_time.clone(),
        }
    }
}

/// Which branch an atomic upsert took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Summary returned by a reconciliation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub inserted: usize,
    pub updated: usize,
    pub date: NaiveDate,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sport_ids_round_trip_through_from_str() {
        for sport in Sport::ALL {
            assert_eq!(sport.as_str().parse::<Sport>().unwrap(), sport);
        }
        assert!(matches!("golf".parse::<Sport>(), Err(SyncError::UnknownSport(_))));
    }

    #[test]
    fn slot_serializes_with_camel_case_fields() {
        let slot = Slot {
            court: "Tennis n°1".to_string(),
            start_time: "08:30".to_string(),
            end_time: "09:30".to_string(),
            status: SlotStatus::Mine,
            occupants: Some("C Berchier".to_string()),
            booking_url: None,
        };
        let value = serde_json::to_value(&slot).unwrap();
        assert_eq!(value["startTime"], "08:30");
        assert_eq!(value["status"], "mine");
        assert!(value["bookingUrl"].is_null());
    }
}
