//! Maintenance scheduling engine.
//!
//! Given a category, today's date and the current odometer reading, decide
//! whether the category is OK, due soon, overdue or cannot be evaluated.
//!
//! Policy:
//! - time dimension: `next_due = last_service + interval_months`; overdue once
//!   past it, due soon within `warning.time_days` of it.
//! - mileage dimension: `next_due = last_mileage + interval_km`; overdue once
//!   strictly past it, due soon in the last `mileage_ratio` share of the interval.
//! - status precedence: overdue > due soon > unknown > ok.
//! - progress: the larger of the per-dimension fractions, clamped to 0..=100.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::category::MaintenanceCategory;
use crate::time::{add_months, days_between, parse_iso_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MaintenanceStatus {
    Ok,
    DueSoon,
    Overdue,
    /// Missing interval, last-service data or odometer reading.
    Unknown,
}

impl MaintenanceStatus {
    /// Urgency weight used for ranking; higher is more urgent.
    pub fn weight(self) -> u8 {
        match self {
            MaintenanceStatus::Overdue => 4,
            MaintenanceStatus::DueSoon => 3,
            MaintenanceStatus::Unknown => 2,
            MaintenanceStatus::Ok => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MaintenanceStatus::Overdue => "Overdue",
            MaintenanceStatus::DueSoon => "Due Soon",
            MaintenanceStatus::Unknown => "Needs Setup",
            MaintenanceStatus::Ok => "OK",
        }
    }
}

/// Warning windows for the due-soon state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WarningConfig {
    /// Days before the due date that count as due soon.
    pub time_days: i64,
    /// Trailing share of the mileage interval that counts as due soon.
    pub mileage_ratio: f64,
}

impl Default for WarningConfig {
    fn default() -> Self {
        Self {
            time_days: 30,
            mileage_ratio: 0.1,
        }
    }
}

/// Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRuntimeState {
    pub status: MaintenanceStatus,
    pub next_due_date: Option<NaiveDate>,
    pub next_due_mileage: Option<f64>,
    pub progress_percentage: Option<u8>,
}

#[derive(Debug, Default)]
struct Dimension {
    overdue: bool,
    due_soon: bool,
    unknown: bool,
    progress: Option<f64>,
}

fn percent(fraction: f64) -> f64 {
    (fraction * 100.0).clamp(0.0, 100.0)
}

fn positive(v: Option<f64>) -> Option<f64> {
    v.filter(|n| n.is_finite() && *n > 0.0)
}

fn time_dimension(
    category: &MaintenanceCategory,
    today: NaiveDate,
    warning: WarningConfig,
) -> (Dimension, Option<NaiveDate>) {
    let mut dim = Dimension::default();

    let (Some(months), Some(last)) = (
        positive(category.interval_months),
        parse_iso_date(&category.last_service_date),
    ) else {
        dim.unknown = true;
        return (dim, None);
    };

    let Some(next_due) = add_months(last, months) else {
        dim.unknown = true;
        return (dim, None);
    };

    let days_until_due = days_between(today, next_due);
    if days_until_due < 0 {
        dim.overdue = true;
    } else if days_until_due <= warning.time_days {
        dim.due_soon = true;
    }

    let total_days = days_between(last, next_due).max(1);
    let elapsed_days = days_between(last, today).max(0);
    dim.progress = Some(percent(elapsed_days as f64 / total_days as f64));

    (dim, Some(next_due))
}

fn mileage_dimension(
    category: &MaintenanceCategory,
    current_mileage: Option<f64>,
    warning: WarningConfig,
) -> (Dimension, Option<f64>) {
    let mut dim = Dimension::default();

    let (Some(interval), Some(last)) = (
        positive(category.interval_kilometers),
        category.last_service_mileage.filter(|m| m.is_finite()),
    ) else {
        dim.unknown = true;
        return (dim, None);
    };

    let next_due = last + interval;

    let Some(now) = current_mileage.filter(|m| m.is_finite()) else {
        dim.unknown = true;
        return (dim, Some(next_due));
    };

    if now > next_due {
        dim.overdue = true;
    } else if now >= next_due - interval * warning.mileage_ratio {
        dim.due_soon = true;
    }

    dim.progress = Some(percent((now - last) / interval));

    (dim, Some(next_due))
}

/// Evaluate one category. Pure and deterministic.
pub fn calculate_category_state(
    category: &MaintenanceCategory,
    today: NaiveDate,
    current_mileage: Option<f64>,
    warning: WarningConfig,
) -> CategoryRuntimeState {
    let mut dims: Vec<Dimension> = Vec::with_capacity(2);
    let mut next_due_date = None;
    let mut next_due_mileage = None;

    if category.interval_type.includes_time() {
        let (dim, due) = time_dimension(category, today, warning);
        next_due_date = due;
        dims.push(dim);
    }

    if category.interval_type.includes_mileage() {
        let (dim, due) = mileage_dimension(category, current_mileage, warning);
        next_due_mileage = due;
        dims.push(dim);
    }

    let status = if dims.iter().any(|d| d.overdue) {
        MaintenanceStatus::Overdue
    } else if dims.iter().any(|d| d.due_soon) {
        MaintenanceStatus::DueSoon
    } else if dims.iter().any(|d| d.unknown) {
        MaintenanceStatus::Unknown
    } else {
        MaintenanceStatus::Ok
    };

    let progress_percentage = dims
        .iter()
        .filter_map(|d| d.progress)
        .reduce(f64::max)
        .map(|p| p.round() as u8);

    CategoryRuntimeState {
        status,
        next_due_date,
        next_due_mileage,
        progress_percentage,
    }
}

/// Number of categories in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub ok: usize,
    pub due_soon: usize,
    pub overdue: usize,
    pub unknown: usize,
}

impl StatusSummary {
    pub fn from_statuses(statuses: impl IntoIterator<Item = MaintenanceStatus>) -> Self {
        let mut s = Self::default();
        for status in statuses {
            match status {
                MaintenanceStatus::Ok => s.ok += 1,
                MaintenanceStatus::DueSoon => s.due_soon += 1,
                MaintenanceStatus::Overdue => s.overdue += 1,
                MaintenanceStatus::Unknown => s.unknown += 1,
            }
        }
        s
    }

    pub fn total(&self) -> usize {
        self.ok + self.due_soon + self.overdue + self.unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::IntervalType;
    use chrono::Duration;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn category(interval_type: IntervalType) -> MaintenanceCategory {
        MaintenanceCategory {
            id: "c1".to_string(),
            name: "Engine Oil".to_string(),
            interval_type,
            interval_months: None,
            interval_kilometers: None,
            last_service_date: String::new(),
            last_service_mileage: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn time_category(last: &str, months: f64) -> MaintenanceCategory {
        let mut c = category(IntervalType::Time);
        c.last_service_date = last.to_string();
        c.interval_months = Some(months);
        c
    }

    fn mileage_category(last: f64, interval: f64) -> MaintenanceCategory {
        let mut c = category(IntervalType::Mileage);
        c.last_service_mileage = Some(last);
        c.interval_kilometers = Some(interval);
        c
    }

    #[test]
    fn test_time_boundaries_around_warning_window() {
        let c = time_category("2024-01-15", 12.0);
        let due = d(2025, 1, 15);
        let w = WarningConfig::default();

        let at = |days_until_due: i64| {
            calculate_category_state(&c, due - Duration::days(days_until_due), None, w)
        };

        assert_eq!(at(200).status, MaintenanceStatus::Ok);
        assert_eq!(at(31).status, MaintenanceStatus::Ok);
        assert_eq!(at(30).status, MaintenanceStatus::DueSoon);
        assert_eq!(at(0).status, MaintenanceStatus::DueSoon);
        assert_eq!(at(-1).status, MaintenanceStatus::Overdue);
        assert_eq!(at(-400).status, MaintenanceStatus::Overdue);
        assert_eq!(at(30).next_due_date, Some(due));
    }

    #[test]
    fn test_time_due_date_clamps_month_end() {
        let c = time_category("2025-01-31", 1.0);
        let s = calculate_category_state(&c, d(2025, 2, 1), None, WarningConfig::default());
        assert_eq!(s.next_due_date, Some(d(2025, 2, 28)));
    }

    #[test]
    fn test_mileage_boundaries() {
        let c = mileage_category(10_000.0, 10_000.0);
        let w = WarningConfig::default();
        let at = |km: f64| calculate_category_state(&c, d(2025, 1, 1), Some(km), w);

        assert_eq!(at(18_999.0).status, MaintenanceStatus::Ok);
        assert_eq!(at(19_000.0).status, MaintenanceStatus::DueSoon);
        assert_eq!(at(20_000.0).status, MaintenanceStatus::DueSoon);
        assert_eq!(at(20_001.0).status, MaintenanceStatus::Overdue);
        assert_eq!(at(19_000.0).next_due_mileage, Some(20_000.0));
        assert_eq!(at(15_000.0).progress_percentage, Some(50));
    }

    #[test]
    fn test_mileage_without_odometer_is_unknown_but_reports_due() {
        let c = mileage_category(10_000.0, 10_000.0);
        let s = calculate_category_state(&c, d(2025, 1, 1), None, WarningConfig::default());
        assert_eq!(s.status, MaintenanceStatus::Unknown);
        assert_eq!(s.next_due_mileage, Some(20_000.0));
        assert_eq!(s.progress_percentage, None);
    }

    #[test]
    fn test_missing_setup_is_unknown_never_ok() {
        let w = WarningConfig::default();
        let today = d(2025, 1, 1);

        let no_months = time_category("2024-01-01", 0.0);
        let s = calculate_category_state(&no_months, today, None, w);
        assert_eq!(s.status, MaintenanceStatus::Unknown);

        let bad_date = time_category("not-a-date", 6.0);
        let s = calculate_category_state(&bad_date, today, None, w);
        assert_eq!(s.status, MaintenanceStatus::Unknown);

        let mut no_last_km = mileage_category(0.0, 5000.0);
        no_last_km.last_service_mileage = None;
        let s = calculate_category_state(&no_last_km, today, Some(1000.0), w);
        assert_eq!(s.status, MaintenanceStatus::Unknown);
        assert_eq!(s.next_due_mileage, None);
    }

    #[test]
    fn test_both_overdue_wins_over_ok() {
        let mut c = category(IntervalType::Both);
        c.last_service_date = "2024-12-01".to_string();
        c.interval_months = Some(12.0);
        c.last_service_mileage = Some(50_000.0);
        c.interval_kilometers = Some(10_000.0);

        let w = WarningConfig::default();
        let s = calculate_category_state(&c, d(2025, 1, 1), Some(61_000.0), w);
        assert_eq!(s.status, MaintenanceStatus::Overdue);
        assert_eq!(s.progress_percentage, Some(100));
    }

    #[test]
    fn test_both_due_soon_beats_unknown() {
        let mut c = category(IntervalType::Both);
        c.last_service_date = "2024-01-20".to_string();
        c.interval_months = Some(12.0);
        c.interval_kilometers = Some(10_000.0);

        let s = calculate_category_state(&c, d(2025, 1, 1), Some(5000.0), WarningConfig::default());
        assert_eq!(s.status, MaintenanceStatus::DueSoon);
    }

    #[test]
    fn test_both_uses_larger_progress() {
        let mut c = category(IntervalType::Both);
        c.last_service_date = "2024-01-01".to_string();
        c.interval_months = Some(12.0);
        c.last_service_mileage = Some(0.0);
        c.interval_kilometers = Some(10_000.0);

        // 2024 is a leap year: 366-day interval, 183 days elapsed -> 50%; 2500 km -> 25%.
        let s = calculate_category_state(&c, d(2024, 7, 2), Some(2500.0), WarningConfig::default());
        assert_eq!(s.status, MaintenanceStatus::Ok);
        assert_eq!(s.progress_percentage, Some(50));
    }

    #[test]
    fn test_progress_clamps_bad_input() {
        let w = WarningConfig::default();

        // odometer rolled back below the last service
        let c = mileage_category(50_000.0, 10_000.0);
        let s = calculate_category_state(&c, d(2025, 1, 1), Some(10_000.0), w);
        assert_eq!(s.progress_percentage, Some(0));

        // last service recorded in the future
        let c = time_category("2030-01-01", 12.0);
        let s = calculate_category_state(&c, d(2025, 1, 1), None, w);
        assert_eq!(s.progress_percentage, Some(0));

        let c = time_category("2010-01-01", 12.0);
        let s = calculate_category_state(&c, d(2025, 1, 1), None, w);
        assert_eq!(s.progress_percentage, Some(100));
    }

    #[test]
    fn test_custom_warning_window() {
        let c = mileage_category(0.0, 1000.0);
        let w = WarningConfig {
            time_days: 7,
            mileage_ratio: 0.25,
        };
        let s = calculate_category_state(&c, d(2025, 1, 1), Some(750.0), w);
        assert_eq!(s.status, MaintenanceStatus::DueSoon);
        let s = calculate_category_state(&c, d(2025, 1, 1), Some(749.0), w);
        assert_eq!(s.status, MaintenanceStatus::Ok);
    }

    #[test]
    fn test_status_summary_counts() {
        let s = StatusSummary::from_statuses([
            MaintenanceStatus::Ok,
            MaintenanceStatus::Overdue,
            MaintenanceStatus::Overdue,
            MaintenanceStatus::Unknown,
        ]);
        assert_eq!(s.overdue, 2);
        assert_eq!(s.due_soon, 0);
        assert_eq!(s.total(), 4);
    }
}
