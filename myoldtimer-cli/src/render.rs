//! Plain-text rendering for terminal output.

use chrono::NaiveDate;
use myoldtimer_core::{CategoryWithState, IntervalType, MaintenanceCategory, StatusSummary};

/// `62000.0` -> `62,000 km`; fractions keep one decimal.
pub fn format_km(v: f64) -> String {
    let tenths = (v * 10.0).round() as i64;
    let whole = tenths / 10;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if tenths < 0 { "-" } else { "" };
    match (tenths % 10).abs() {
        0 => format!("{sign}{grouped} km"),
        tenth => format!("{sign}{grouped}.{tenth} km"),
    }
}

pub fn format_opt_km(v: Option<f64>) -> String {
    v.map(format_km).unwrap_or_else(|| "N/A".to_string())
}

pub fn format_opt_date(d: Option<NaiveDate>) -> String {
    d.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn text_or_na(s: &str) -> &str {
    if s.trim().is_empty() { "N/A" } else { s }
}

pub fn interval_label(c: &MaintenanceCategory) -> String {
    let months = c.interval_months.map(|m| format!("every {m} months"));
    let km = c.interval_kilometers.map(|k| format!("every {}", format_km(k)));
    let parts: Vec<String> = match c.interval_type {
        IntervalType::Time => months.into_iter().collect(),
        IntervalType::Mileage => km.into_iter().collect(),
        IntervalType::Both => months.into_iter().chain(km).collect(),
    };
    if parts.is_empty() {
        "no interval".to_string()
    } else {
        parts.join(" or ")
    }
}

pub fn status_line(item: &CategoryWithState) -> String {
    let mut due = Vec::new();
    if item.category.interval_type.includes_time() {
        due.push(format_opt_date(item.state.next_due_date));
    }
    if item.category.interval_type.includes_mileage() {
        due.push(format_opt_km(item.state.next_due_mileage));
    }
    let progress = item
        .state
        .progress_percentage
        .map(|p| format!(" ({p}%)"))
        .unwrap_or_default();
    format!(
        "[{:<11}] {:<24} next: {}{}",
        item.state.status.label(),
        item.category.name,
        due.join(" / "),
        progress
    )
}

pub fn summary_line(s: &StatusSummary) -> String {
    format!(
        "{} categories: {} overdue, {} due soon, {} need setup, {} ok",
        s.total(),
        s.overdue,
        s.due_soon,
        s.unknown,
        s.ok
    )
}
