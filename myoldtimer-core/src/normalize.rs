//! Record normalizer: tolerant migration of persisted JSON into canonical records.
//!
//! Every function here is total. Arbitrary input (wrong types, missing fields,
//! legacy shapes, `null`) yields a well-typed record, and normalizing canonical
//! output again returns it unchanged.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::category::{CATEGORY_ID_PREFIX, IntervalType, MaintenanceCategory};
use crate::ids::IdGenerator;
use crate::number::{parse_non_negative, parse_number};
use crate::service_log::{MaintenanceServiceLogEntry, category_names};
use crate::time::{Clock, timestamp};

/// A non-empty string field. Numbers are accepted and stringified.
pub(crate) fn text(raw: &Value, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Like [`text`], but whitespace-only strings count as missing.
pub(crate) fn non_blank(raw: &Value, key: &str) -> Option<String> {
    text(raw, key).filter(|s| !s.trim().is_empty())
}

/// Non-empty string elements of an array, skipping everything else.
pub(crate) fn string_items(items: &[Value]) -> Vec<&str> {
    items
        .iter()
        .filter_map(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .collect()
}

/// JSON truthiness of a flag field.
pub(crate) fn truthy(raw: &Value, key: &str) -> bool {
    match raw.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// True when `normalized` differs structurally from what was stored, i.e. the
/// migration result must be written back.
pub fn needs_persist<T: Serialize>(raw: &Value, normalized: &T) -> bool {
    match serde_json::to_value(normalized) {
        Ok(v) => v != *raw,
        Err(_) => true,
    }
}

/// Recognized shapes of a stored service-log entry, probed in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceLogShape<'r> {
    /// Current shape: an id list, with legacy names kept as a fallback.
    Linked {
        ids: Vec<&'r str>,
        fallback_names: Vec<&'r str>,
    },
    /// Legacy: a list of category names.
    NameList(Vec<&'r str>),
    /// Legacy: one category name.
    SingleName(&'r str),
    /// No category information at all.
    Unlinked,
}

impl<'r> ServiceLogShape<'r> {
    pub fn probe(raw: &'r Value) -> Self {
        if let Some(ids) = raw.get("categoryIds").and_then(Value::as_array) {
            let fallback_names = match Self::probe_legacy(raw) {
                ServiceLogShape::NameList(names) => names,
                ServiceLogShape::SingleName(name) => vec![name],
                _ => Vec::new(),
            };
            return ServiceLogShape::Linked {
                ids: string_items(ids),
                fallback_names,
            };
        }
        Self::probe_legacy(raw)
    }

    fn probe_legacy(raw: &'r Value) -> Self {
        if let Some(names) = raw.get("categories").and_then(Value::as_array) {
            return ServiceLogShape::NameList(string_items(names));
        }
        match raw.get("category").and_then(Value::as_str) {
            Some(name) if !name.trim().is_empty() => ServiceLogShape::SingleName(name),
            _ => ServiceLogShape::Unlinked,
        }
    }

    /// Resolve to ids of known categories, deduplicated in reference order.
    pub fn resolve(&self, lookup: &CategoryLookup<'_>) -> Vec<String> {
        let by_names = |names: &[&'r str]| -> Vec<String> {
            names
                .iter()
                .filter_map(|n| lookup.id_for_name(n))
                .map(str::to_string)
                .collect()
        };

        let resolved = match self {
            ServiceLogShape::Linked { ids, fallback_names } => {
                let known: Vec<String> = ids
                    .iter()
                    .filter(|id| lookup.contains(id))
                    .map(|id| id.to_string())
                    .collect();
                if known.is_empty() {
                    by_names(fallback_names.as_slice())
                } else {
                    known
                }
            }
            ServiceLogShape::NameList(names) => by_names(names.as_slice()),
            ServiceLogShape::SingleName(name) => by_names(&[*name]),
            ServiceLogShape::Unlinked => Vec::new(),
        };

        let mut out: Vec<String> = Vec::with_capacity(resolved.len());
        for id in resolved {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }
}

/// Category lookups by id and by case-insensitive name.
pub struct CategoryLookup<'a> {
    categories: &'a [MaintenanceCategory],
    by_name: HashMap<String, &'a str>,
}

impl<'a> CategoryLookup<'a> {
    pub fn new(categories: &'a [MaintenanceCategory]) -> Self {
        let mut by_name = HashMap::new();
        for c in categories {
            by_name.entry(c.name.trim().to_lowercase()).or_insert(c.id.as_str());
        }
        Self { categories, by_name }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.categories.iter().any(|c| c.id == id)
    }

    pub fn id_for_name(&self, name: &str) -> Option<&'a str> {
        self.by_name.get(&name.trim().to_lowercase()).copied()
    }

    pub fn categories(&self) -> &'a [MaintenanceCategory] {
        self.categories
    }
}

/// Normalizer bound to an id source and a creation timestamp.
pub struct Normalizer<'a> {
    ids: &'a dyn IdGenerator,
    now: String,
}

impl<'a> Normalizer<'a> {
    pub fn new(ids: &'a dyn IdGenerator, clock: &dyn Clock) -> Self {
        Self {
            ids,
            now: timestamp(clock.now()),
        }
    }

    /// Timestamp stamped onto records missing `createdAt`/`updatedAt`.
    pub fn now(&self) -> &str {
        &self.now
    }

    pub(crate) fn fresh_id(&self, prefix: &str) -> String {
        self.ids.next_id(prefix)
    }

    pub fn category(&self, raw: &Value, index: usize) -> MaintenanceCategory {
        let interval_type = raw
            .get("intervalType")
            .and_then(Value::as_str)
            .and_then(IntervalType::from_tag)
            .unwrap_or(IntervalType::Both);

        MaintenanceCategory {
            id: text(raw, "id")
                .unwrap_or_else(|| self.fresh_id(&format!("{CATEGORY_ID_PREFIX}-{index}"))),
            name: non_blank(raw, "name").unwrap_or_else(|| format!("Category {}", index + 1)),
            interval_type,
            interval_months: raw.get("intervalMonths").and_then(parse_number),
            interval_kilometers: raw.get("intervalKilometers").and_then(parse_number),
            last_service_date: text(raw, "lastServiceDate").unwrap_or_default(),
            last_service_mileage: raw.get("lastServiceMileage").and_then(parse_non_negative),
            created_at: text(raw, "createdAt").unwrap_or_else(|| self.now.clone()),
            updated_at: text(raw, "updatedAt").unwrap_or_else(|| self.now.clone()),
        }
    }

    /// `[]` for anything that is not an array; elements keep their index for fallbacks.
    pub fn categories(&self, raw: &Value) -> Vec<MaintenanceCategory> {
        let Some(items) = raw.as_array() else {
            return Vec::new();
        };
        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.category(item, i))
            .collect()
    }

    pub fn service_log_entry(
        &self,
        raw: &Value,
        index: usize,
        lookup: &CategoryLookup<'_>,
    ) -> MaintenanceServiceLogEntry {
        let shape = ServiceLogShape::probe(raw);
        if !matches!(shape, ServiceLogShape::Linked { .. }) {
            log::debug!("service log entry #{index}: migrating legacy shape {shape:?}");
        }
        let category_ids = shape.resolve(lookup);
        if category_ids.is_empty() && shape != ServiceLogShape::Unlinked {
            log::warn!("service log entry #{index}: no category reference could be resolved");
        }

        MaintenanceServiceLogEntry {
            id: text(raw, "id").unwrap_or_else(|| self.fresh_id(&format!("maintenance-{index}"))),
            categories: category_names(lookup.categories(), &category_ids),
            category_ids,
            date: text(raw, "date").unwrap_or_default(),
            kilometers: raw.get("kilometers").and_then(parse_non_negative),
            comment: text(raw, "comment").unwrap_or_default(),
        }
    }

    /// Normalize the stored service log against the current category set.
    pub fn service_log(
        &self,
        raw: &Value,
        categories: &[MaintenanceCategory],
    ) -> Vec<MaintenanceServiceLogEntry> {
        let Some(items) = raw.as_array() else {
            return Vec::new();
        };
        let lookup = CategoryLookup::new(categories);
        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.service_log_entry(item, i, &lookup))
            .collect()
    }
}
