//! History aggregation: derive each category's effective last service from the log.
//!
//! Ordering used to pick the most recent entry for a category:
//! - a parseable date beats an empty/invalid one, later dates beat earlier ones
//! - on equal dates the higher odometer reading wins (missing counts as -1)
//!
//! Entries that tie on both keys produce identical results, so the reduction is
//! independent of log order.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::category::MaintenanceCategory;
use crate::service_log::{MaintenanceServiceLogEntry, category_names};
use crate::time::{format_local_date, parse_iso_date};

/// Date and odometer reading of a service.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LastService {
    pub date: Option<NaiveDate>,
    pub kilometers: Option<f64>,
}

impl LastService {
    fn of(entry: &MaintenanceServiceLogEntry) -> Self {
        Self {
            date: parse_iso_date(&entry.date),
            kilometers: entry.kilometers,
        }
    }

    fn rank_cmp(&self, other: &Self) -> Ordering {
        let km = |k: Option<f64>| k.unwrap_or(-1.0);
        self.date
            .cmp(&other.date)
            .then_with(|| km(self.kilometers).total_cmp(&km(other.kilometers)))
    }
}

fn fold_best(best: Option<LastService>, candidate: LastService) -> Option<LastService> {
    match best {
        Some(b) if candidate.rank_cmp(&b) != Ordering::Greater => Some(b),
        _ => Some(candidate),
    }
}

/// Most recent service recorded for `category_id`, or `None` if no entry references it.
pub fn aggregate_last_service(
    entries: &[MaintenanceServiceLogEntry],
    category_id: &str,
) -> Option<LastService> {
    entries
        .iter()
        .filter(|e| e.category_ids.iter().any(|id| id == category_id))
        .map(LastService::of)
        .fold(None, fold_best)
}

/// [`aggregate_last_service`] for every referenced category id in one pass.
///
/// Ids that no longer resolve to a category are kept; callers look up only the
/// categories they know about.
pub fn latest_service_by_category(
    entries: &[MaintenanceServiceLogEntry],
) -> HashMap<String, LastService> {
    let mut map: HashMap<String, LastService> = HashMap::new();
    for entry in entries {
        let candidate = LastService::of(entry);
        for id in &entry.category_ids {
            let best = fold_best(map.get(id).copied(), candidate);
            if let Some(best) = best {
                map.insert(id.clone(), best);
            }
        }
    }
    map
}

/// Log-derived values first, field by field; the category's stored seed fills gaps.
pub fn effective_last_service(
    category: &MaintenanceCategory,
    from_log: Option<&LastService>,
) -> LastService {
    LastService {
        date: from_log
            .and_then(|l| l.date)
            .or_else(|| parse_iso_date(&category.last_service_date)),
        kilometers: from_log
            .and_then(|l| l.kilometers)
            .or(category.last_service_mileage),
    }
}

/// Copy of `category` carrying the effective last service, ready for the scheduling engine.
pub fn with_effective_last_service(
    category: &MaintenanceCategory,
    last: &LastService,
) -> MaintenanceCategory {
    MaintenanceCategory {
        last_service_date: last.date.map(format_local_date).unwrap_or_default(),
        last_service_mileage: last.kilometers,
        ..category.clone()
    }
}

/// Re-point every entry at the current category set.
///
/// Dangling ids are dropped and the display-name snapshot is rebuilt. Entries
/// themselves are never removed, even when no reference survives.
pub fn sync_entries_with_categories(
    categories: &[MaintenanceCategory],
    entries: &[MaintenanceServiceLogEntry],
) -> Vec<MaintenanceServiceLogEntry> {
    entries
        .iter()
        .map(|entry| {
            let category_ids: Vec<String> = entry
                .category_ids
                .iter()
                .filter(|id| categories.iter().any(|c| &c.id == *id))
                .cloned()
                .collect();
            if category_ids.len() != entry.category_ids.len() {
                log::debug!(
                    "entry {}: dropped {} dangling category reference(s)",
                    entry.id,
                    entry.category_ids.len() - category_ids.len()
                );
            }
            MaintenanceServiceLogEntry {
                categories: category_names(categories, &category_ids),
                category_ids,
                ..entry.clone()
            }
        })
        .collect()
}
