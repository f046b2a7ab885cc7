//! Category ranking and the read-side evaluation pipeline
//! (history -> scheduling engine -> ranking).

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::category::MaintenanceCategory;
use crate::history::{
    LastService, effective_last_service, latest_service_by_category, with_effective_last_service,
};
use crate::schedule::{CategoryRuntimeState, StatusSummary, WarningConfig, calculate_category_state};
use crate::service_log::MaintenanceServiceLogEntry;

/// A category together with its effective last service and runtime state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithState {
    #[serde(flatten)]
    pub category: MaintenanceCategory,
    pub effective_last_service: LastService,
    #[serde(flatten)]
    pub state: CategoryRuntimeState,
}

/// Base letters only: decomposed, combining marks dropped, lowercased.
fn base_letters(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Collation-style name order. Base letters decide first ("Ölfilter" sorts
/// with the O's), then accents (unaccented first), then case (lowercase first).
pub fn compare_names(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(&base_letters(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| b.cmp(a))
}

/// Most urgent first (overdue, due soon, needs setup, ok), then by name.
///
/// Identical names fall back to the category id so the order is total.
pub fn rank_categories(mut items: Vec<CategoryWithState>) -> Vec<CategoryWithState> {
    items.sort_by(|a, b| {
        b.state
            .status
            .weight()
            .cmp(&a.state.status.weight())
            .then_with(|| compare_names(&a.category.name, &b.category.name))
            .then_with(|| a.category.id.cmp(&b.category.id))
    });
    items
}

/// Evaluate and rank every category against the service log.
pub fn evaluate_categories(
    categories: &[MaintenanceCategory],
    entries: &[MaintenanceServiceLogEntry],
    today: NaiveDate,
    current_mileage: Option<f64>,
    warning: WarningConfig,
) -> Vec<CategoryWithState> {
    let latest = latest_service_by_category(entries);

    let items = categories
        .iter()
        .map(|category| {
            let last = effective_last_service(category, latest.get(&category.id));
            let runtime = with_effective_last_service(category, &last);
            CategoryWithState {
                state: calculate_category_state(&runtime, today, current_mileage, warning),
                effective_last_service: last,
                category: category.clone(),
            }
        })
        .collect();

    rank_categories(items)
}

pub fn summarize(items: &[CategoryWithState]) -> StatusSummary {
    StatusSummary::from_statuses(items.iter().map(|i| i.state.status))
}
