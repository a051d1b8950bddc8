use crate::error::{Result, SyncError};
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static TRAILING_DAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\D)(\d{1,2})\s*$").unwrap());

/// Resolve a day tab label such as "Fr 27" or "Di 1" to a calendar date.
///
/// The portal only shows today plus about a week ahead, so a day number
/// smaller than today's means the following month (and year, from December).
pub fn resolve_day_label(label: &str, today: NaiveDate) -> Result<NaiveDate> {
    let day: u32 = TRAILING_DAY
        .captures(label)
        .and_then(|c| c[1].parse().ok())
        .ok_or_else(|| {
            SyncError::AmbiguousDate(format!("no day number in label '{}'", label.trim()))
        })?;

    let (year, month) = if day < today.day() {
        if today.month() == 12 {
            (today.year() + 1, 1)
        } else {
            (today.year(), today.month() + 1)
        }
    } else {
        (today.year(), today.month())
    };

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        SyncError::AmbiguousDate(format!(
            "label '{}' names day {} which does not exist in {}-{:02}",
            label.trim(),
            day,
            year,
            month
        ))
    })
}
