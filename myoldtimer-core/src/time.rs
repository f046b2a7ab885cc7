//! Time utilities: calendar dates, month arithmetic and the injectable "now" source.
//!
//! All scheduling math works on `NaiveDate`, so day differences are exact
//! calendar-day counts and never drift across DST transitions.

use anyhow::Result;
use chrono::{DateTime, Months, NaiveDate, Utc};
use chrono_tz::Tz;

const ISO_DATE: &str = "%Y-%m-%d";

/// Source of the current local calendar date and instant.
pub trait Clock {
    fn today(&self) -> NaiveDate;
    fn now(&self) -> DateTime<Utc>;

    /// Today as `YYYY-MM-DD`.
    fn today_iso(&self) -> String {
        format_local_date(self.today())
    }
}

/// Wall clock, with "today" resolved in a fixed IANA timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant. Used by tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    today: NaiveDate,
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(today: NaiveDate, now: DateTime<Utc>) -> Self {
        Self { today, now }
    }

    /// Clock whose instant is midnight UTC of `today`.
    pub fn at(today: NaiveDate) -> Self {
        let now = today
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or_default();
        Self { today, now }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// Parse an IANA timezone name like "Europe/Vienna".
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {name}"))
}

pub fn format_local_date(date: NaiveDate) -> String {
    date.format(ISO_DATE).to_string()
}

/// Parse a `YYYY-MM-DD` calendar date. Empty or malformed input yields `None`.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, ISO_DATE).ok()
}

/// Add whole calendar months to a date.
///
/// Overflowing days clamp to the last day of the target month:
/// Jan 31 + 1 month is Feb 28 (Feb 29 in leap years), never early March.
/// Fractional month counts truncate toward zero.
pub fn add_months(date: NaiveDate, months: f64) -> Option<NaiveDate> {
    if !months.is_finite() || months < 0.0 || months > u32::MAX as f64 {
        return None;
    }
    date.checked_add_months(Months::new(months.trunc() as u32))
}

/// Whole days from `start` to `end` (negative when `end` is earlier).
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// RFC3339 timestamp used for `createdAt`/`updatedAt`.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_add_months_clamps_to_month_end() {
        assert_eq!(add_months(d(2025, 1, 31), 1.0), Some(d(2025, 2, 28)));
        assert_eq!(add_months(d(2024, 1, 31), 1.0), Some(d(2024, 2, 29)));
        assert_eq!(add_months(d(2024, 8, 31), 1.0), Some(d(2024, 9, 30)));
    }

    #[test]
    fn test_add_months_across_years() {
        assert_eq!(add_months(d(2024, 11, 15), 12.0), Some(d(2025, 11, 15)));
        assert_eq!(add_months(d(2024, 11, 15), 3.0), Some(d(2025, 2, 15)));
    }

    #[test]
    fn test_add_months_truncates_fractions() {
        assert_eq!(add_months(d(2024, 3, 10), 1.9), Some(d(2024, 4, 10)));
        assert_eq!(add_months(d(2024, 3, 10), 0.5), Some(d(2024, 3, 10)));
        assert_eq!(add_months(d(2024, 3, 10), f64::NAN), None);
        assert_eq!(add_months(d(2024, 3, 10), -1.0), None);
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_iso_date("2024-02-29"), Some(d(2024, 2, 29)));
        assert_eq!(parse_iso_date(" 2024-02-01 "), Some(d(2024, 2, 1)));
        assert_eq!(parse_iso_date(""), None);
        assert_eq!(parse_iso_date("2023-02-29"), None);
        assert_eq!(parse_iso_date("yesterday"), None);
    }

    #[test]
    fn test_days_between_is_signed() {
        assert_eq!(days_between(d(2024, 1, 1), d(2024, 3, 1)), 60);
        assert_eq!(days_between(d(2024, 3, 1), d(2024, 1, 1)), -60);
    }

    #[test]
    fn test_parse_timezone() {
        assert!(parse_timezone("Europe/Vienna").is_ok());
        assert!(parse_timezone("Mars/Olympus").is_err());
    }

    #[test]
    fn test_fixed_clock_today_iso() {
        let clock = FixedClock::at(d(2026, 3, 7));
        assert_eq!(clock.today_iso(), "2026-03-07");
        assert_eq!(timestamp(clock.now()), "2026-03-07T00:00:00.000Z");
    }
}
