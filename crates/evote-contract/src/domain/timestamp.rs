//! # Transaction Timestamps
//!
//! The platform stamps every transaction with seconds + nanoseconds since the
//! Unix epoch. History queries convert that to milliseconds and render it in
//! Central European Time for display. The rendered string is never hashed or
//! stored.
//!
//! ## Europe/Berlin Rules
//!
//! CET is UTC+1. Summer time (CEST, UTC+2) runs from the last Sunday of March
//! 01:00 UTC until the last Sunday of October 01:00 UTC.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Logical commit time of a transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxTimestamp {
    /// Whole seconds since the Unix epoch.
    pub seconds: i64,
    /// Sub-second part, `0..1_000_000_000`.
    pub nanos: i32,
}

impl TxTimestamp {
    /// Create a timestamp.
    #[must_use]
    pub fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }

    /// Current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            seconds: now.timestamp(),
            nanos: i32::try_from(now.timestamp_subsec_nanos()).unwrap_or(0),
        }
    }

    /// `seconds * 1000 + floor(nanos / 1e6)`.
    #[must_use]
    pub fn to_millis(&self) -> i64 {
        self.seconds
            .saturating_mul(1000)
            .saturating_add(i64::from(self.nanos).div_euclid(1_000_000))
    }

    /// Timestamp advanced by a number of milliseconds.
    #[must_use]
    pub fn plus_millis(&self, millis: i64) -> Self {
        let total_nanos = i64::from(self.nanos) + millis.rem_euclid(1000) * 1_000_000;
        Self {
            seconds: self.seconds + millis.div_euclid(1000) + total_nanos / 1_000_000_000,
            nanos: i32::try_from(total_nanos % 1_000_000_000).unwrap_or(0),
        }
    }

    /// Display string in Central European Time.
    #[must_use]
    pub fn to_cet_string(&self) -> String {
        format_cet(self.to_millis())
    }
}

/// Render epoch milliseconds as `Montag, 5.2.2024, 14:03:07` in CET/CEST.
///
/// Values outside chrono's range fall back to the raw millisecond count.
#[must_use]
pub fn format_cet(millis: i64) -> String {
    let Some(utc) = Utc.timestamp_millis_opt(millis).single() else {
        return millis.to_string();
    };
    let offset_hours = if is_berlin_summer_time(&utc) { 2 } else { 1 };
    let local = utc.naive_utc() + Duration::hours(offset_hours);

    format!(
        "{}, {}.{}.{}, {:02}:{:02}:{:02}",
        weekday_de(local.weekday()),
        local.day(),
        local.month(),
        local.year(),
        local.hour(),
        local.minute(),
        local.second()
    )
}

fn is_berlin_summer_time(utc: &DateTime<Utc>) -> bool {
    let year = utc.year();
    match (switch_instant(year, 3), switch_instant(year, 10)) {
        (Some(start), Some(end)) => *utc >= start && *utc < end,
        _ => false,
    }
}

/// 01:00 UTC on the last Sunday of a 31-day month.
fn switch_instant(year: i32, month: u32) -> Option<DateTime<Utc>> {
    let last_day = NaiveDate::from_ymd_opt(year, month, 31)?;
    let back = i64::from(last_day.weekday().num_days_from_sunday());
    let sunday = last_day - Duration::days(back);
    let naive = sunday.and_hms_opt(1, 0, 0)?;
    Some(Utc.from_utc_datetime(&naive))
}

fn weekday_de(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Montag",
        Weekday::Tue => "Dienstag",
        Weekday::Wed => "Mittwoch",
        Weekday::Thu => "Donnerstag",
        Weekday::Fri => "Freitag",
        Weekday::Sat => "Samstag",
        Weekday::Sun => "Sonntag",
    }
}
