//! Service-log entries: dated maintenance actions linked to one or more categories.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::category::MaintenanceCategory;
use crate::error::{ValidationError, ValidationResult};
use crate::ids::IdGenerator;
use crate::number::{json_number, parse_non_negative_mileage};
use crate::time::parse_iso_date;

pub const ENTRY_ID_PREFIX: &str = "history";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceServiceLogEntry {
    pub id: String,
    pub category_ids: Vec<String>,
    /// Display names of `category_ids`, recomputed whenever categories change.
    #[serde(default)]
    pub categories: Vec<String>,
    /// `YYYY-MM-DD` or empty.
    #[serde(default)]
    pub date: String,
    #[serde(default, with = "json_number")]
    pub kilometers: Option<f64>,
    #[serde(default)]
    pub comment: String,
}

/// Names of the referenced categories, in reference order. Dangling ids are skipped.
pub fn category_names(categories: &[MaintenanceCategory], ids: &[String]) -> Vec<String> {
    ids.iter()
        .filter_map(|id| categories.iter().find(|c| &c.id == id))
        .map(|c| c.name.clone())
        .collect()
}

/// Editor form for a service-log entry. `kilometers` is raw user text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceLogDraft {
    pub id: Option<String>,
    pub category_ids: Vec<String>,
    pub date: String,
    pub kilometers: String,
    pub comment: String,
}

impl ServiceLogDraft {
    pub fn from_entry(entry: &MaintenanceServiceLogEntry) -> Self {
        Self {
            id: Some(entry.id.clone()),
            category_ids: entry.category_ids.clone(),
            date: entry.date.clone(),
            kilometers: entry.kilometers.map(|k| k.to_string()).unwrap_or_default(),
            comment: entry.comment.clone(),
        }
    }

    /// Add or remove a category reference.
    pub fn toggle_category(&mut self, category_id: &str) {
        if let Some(pos) = self.category_ids.iter().position(|id| id == category_id) {
            self.category_ids.remove(pos);
        } else {
            self.category_ids.push(category_id.to_string());
        }
    }
}

/// Create or update an entry from a draft, returning the next entry list and the saved entry.
pub fn apply_service_log_draft(
    entries: &[MaintenanceServiceLogEntry],
    categories: &[MaintenanceCategory],
    draft: &ServiceLogDraft,
    ids: &dyn IdGenerator,
) -> ValidationResult<(Vec<MaintenanceServiceLogEntry>, MaintenanceServiceLogEntry)> {
    if draft.category_ids.is_empty() {
        return Err(ValidationError::NoCategorySelected);
    }
    if let Some(missing) = draft
        .category_ids
        .iter()
        .find(|id| !categories.iter().any(|c| &c.id == *id))
    {
        return Err(ValidationError::UnknownCategory(missing.clone()));
    }

    let date = draft.date.trim();
    if !date.is_empty() && parse_iso_date(date).is_none() {
        return Err(ValidationError::InvalidDate);
    }

    let kilometers = if draft.kilometers.trim().is_empty() {
        None
    } else {
        let km = parse_non_negative_mileage(&draft.kilometers);
        Some(km.ok_or(ValidationError::InvalidKilometers)?)
    };

    if let Some(id) = &draft.id {
        if !entries.iter().any(|e| &e.id == id) {
            return Err(ValidationError::UnknownEntry(id.clone()));
        }
    }

    let mut category_ids: Vec<String> = Vec::with_capacity(draft.category_ids.len());
    for id in &draft.category_ids {
        if !category_ids.contains(id) {
            category_ids.push(id.clone());
        }
    }

    let saved = MaintenanceServiceLogEntry {
        id: draft.id.clone().unwrap_or_else(|| ids.next_id(ENTRY_ID_PREFIX)),
        categories: category_names(categories, &category_ids),
        category_ids,
        date: date.to_string(),
        kilometers,
        comment: draft.comment.clone(),
    };

    let next = if draft.id.is_some() {
        entries
            .iter()
            .map(|e| if e.id == saved.id { saved.clone() } else { e.clone() })
            .collect()
    } else {
        let mut next = entries.to_vec();
        next.push(saved.clone());
        next
    };

    Ok((next, saved))
}

pub fn remove_entries(
    entries: &[MaintenanceServiceLogEntry],
    ids: &[String],
) -> Vec<MaintenanceServiceLogEntry> {
    entries
        .iter()
        .filter(|e| !ids.contains(&e.id))
        .cloned()
        .collect()
}

/// Entries for display: newest date first, undated entries last.
pub fn newest_first(entries: &[MaintenanceServiceLogEntry]) -> Vec<&MaintenanceServiceLogEntry> {
    let mut out: Vec<&MaintenanceServiceLogEntry> = entries.iter().collect();
    out.sort_by(|a, b| match (parse_iso_date(&a.date), parse_iso_date(&b.date)) {
        (Some(da), Some(db)) => db.cmp(&da),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{IntervalType, MaintenanceCategory};
    use crate::ids::SequentialIds;

    fn cat(id: &str, name: &str) -> MaintenanceCategory {
        MaintenanceCategory {
            id: id.to_string(),
            name: name.to_string(),
            interval_type: IntervalType::Time,
            interval_months: Some(12.0),
            interval_kilometers: None,
            last_service_date: String::new(),
            last_service_mileage: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn draft(ids: &[&str], date: &str, km: &str) -> ServiceLogDraft {
        ServiceLogDraft {
            id: None,
            category_ids: ids.iter().map(|s| s.to_string()).collect(),
            date: date.to_string(),
            kilometers: km.to_string(),
            comment: String::new(),
        }
    }

    #[test]
    fn test_draft_needs_a_category() {
        let ids = SequentialIds::new();
        let cats = [cat("c1", "Oil")];
        let err = apply_service_log_draft(&[], &cats, &draft(&[], "2024-01-01", ""), &ids)
            .unwrap_err();
        assert_eq!(err, ValidationError::NoCategorySelected);
    }

    #[test]
    fn test_draft_snapshot_names_and_kilometers() {
        let ids = SequentialIds::new();
        let cats = [cat("c1", "Oil"), cat("c2", "Coolant")];
        let input = draft(&["c2", "c1", "c2"], "2024-05-01", "81200,5");
        let (entries, saved) = apply_service_log_draft(&[], &cats, &input, &ids).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(saved.id, "history-1");
        assert_eq!(saved.category_ids, vec!["c2", "c1"]);
        assert_eq!(saved.categories, vec!["Coolant", "Oil"]);
        assert_eq!(saved.kilometers, Some(81_200.5));
    }

    #[test]
    fn test_draft_edit_replaces_in_place() {
        let ids = SequentialIds::new();
        let cats = [cat("c1", "Oil")];
        let input = draft(&["c1"], "2024-05-01", "1000");
        let (entries, saved) = apply_service_log_draft(&[], &cats, &input, &ids).unwrap();

        let mut edit = ServiceLogDraft::from_entry(&saved);
        edit.kilometers = "1500".to_string();
        edit.comment = "synthetic 5W-40".to_string();
        let (entries, saved) = apply_service_log_draft(&entries, &cats, &edit, &ids).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kilometers, Some(1500.0));
        assert_eq!(saved.comment, "synthetic 5W-40");
    }

    #[test]
    fn test_draft_rejects_bad_kilometers_and_dates() {
        let ids = SequentialIds::new();
        let cats = [cat("c1", "Oil")];
        let rejected = |d: ServiceLogDraft| {
            apply_service_log_draft(&[], &cats, &d, &ids).unwrap_err()
        };
        assert_eq!(
            rejected(draft(&["c1"], "2024-05-01", "-5")),
            ValidationError::InvalidKilometers
        );
        assert_eq!(
            rejected(draft(&["c1"], "05/01/2024", "")),
            ValidationError::InvalidDate
        );
    }

    #[test]
    fn test_toggle_category() {
        let mut d = draft(&["c1"], "", "");
        d.toggle_category("c2");
        d.toggle_category("c1");
        assert_eq!(d.category_ids, vec!["c2"]);
    }

    #[test]
    fn test_newest_first_puts_undated_last() {
        let mk = |id: &str, date: &str| MaintenanceServiceLogEntry {
            id: id.to_string(),
            category_ids: vec![],
            categories: vec![],
            date: date.to_string(),
            kilometers: None,
            comment: String::new(),
        };
        let entries = vec![mk("a", ""), mk("b", "2023-01-01"), mk("c", "2024-06-30")];
        let order: Vec<&str> = newest_first(&entries).iter().map(|e| e.id.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "a"]);
    }
}
