//! Replaced-parts history.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ValidationError, ValidationResult};
use crate::ids::IdGenerator;
use crate::normalize::{Normalizer, string_items, text};
use crate::number::{json_number, parse_non_negative, parse_non_negative_mileage};
use crate::time::parse_iso_date;

pub const REPLACE_ID_PREFIX: &str = "replace";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceEntry {
    pub id: String,
    pub parts: Vec<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default, with = "json_number")]
    pub kilometers: Option<f64>,
    #[serde(default)]
    pub comment: String,
}

/// Split free text on newlines and commas into trimmed, unique items.
pub fn parse_text_items(value: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in value.split(['\n', ',']).map(str::trim).filter(|s| !s.is_empty()) {
        if !out.iter().any(|o| o == item) {
            out.push(item.to_string());
        }
    }
    out
}

impl Normalizer<'_> {
    /// Older records stored the parts as `categories` or a single `category`.
    pub fn replace_entry(&self, raw: &Value, index: usize) -> ReplaceEntry {
        let parts: Vec<String> = if let Some(parts) = raw.get("parts").and_then(Value::as_array) {
            string_items(parts).into_iter().map(str::to_string).collect()
        } else if let Some(names) = raw.get("categories").and_then(Value::as_array) {
            string_items(names).into_iter().map(str::to_string).collect()
        } else {
            match raw.get("category").and_then(Value::as_str).map(str::trim) {
                Some(name) if !name.is_empty() => vec![name.to_string()],
                _ => Vec::new(),
            }
        };

        ReplaceEntry {
            id: text(raw, "id")
                .unwrap_or_else(|| self.fresh_id(&format!("{REPLACE_ID_PREFIX}-{index}"))),
            parts,
            date: text(raw, "date").unwrap_or_default(),
            kilometers: raw.get("kilometers").and_then(parse_non_negative),
            comment: text(raw, "comment").unwrap_or_default(),
        }
    }

    pub fn replace_history(&self, raw: &Value) -> Vec<ReplaceEntry> {
        let Some(items) = raw.as_array() else {
            return Vec::new();
        };
        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.replace_entry(item, i))
            .collect()
    }
}

/// Editor form. `parts` is free text, one part per line or comma.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReplaceDraft {
    pub id: Option<String>,
    pub parts: String,
    pub date: String,
    pub kilometers: String,
    pub comment: String,
}

impl ReplaceDraft {
    pub fn from_entry(entry: &ReplaceEntry) -> Self {
        Self {
            id: Some(entry.id.clone()),
            parts: entry.parts.join(", "),
            date: entry.date.clone(),
            kilometers: entry.kilometers.map(|k| k.to_string()).unwrap_or_default(),
            comment: entry.comment.clone(),
        }
    }
}

pub fn apply_replace_draft(
    entries: &[ReplaceEntry],
    draft: &ReplaceDraft,
    ids: &dyn IdGenerator,
) -> ValidationResult<(Vec<ReplaceEntry>, ReplaceEntry)> {
    let parts = parse_text_items(&draft.parts);
    if parts.is_empty() {
        return Err(ValidationError::PartsRequired);
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

    let saved = ReplaceEntry {
        id: draft.id.clone().unwrap_or_else(|| ids.next_id(REPLACE_ID_PREFIX)),
        parts,
        date: date.to_string(),
        kilometers,
        comment: draft.comment.clone(),
    };

    let mut next = entries.to_vec();
    match next.iter_mut().find(|e| e.id == saved.id) {
        Some(slot) => *slot = saved.clone(),
        None => next.push(saved.clone()),
    }
    Ok((next, saved))
}

pub fn remove_replace_entries(entries: &[ReplaceEntry], ids: &[String]) -> Vec<ReplaceEntry> {
    entries.iter().filter(|e| !ids.contains(&e.id)).cloned().collect()
}

/// Newest first; undated entries sort last.
pub fn replace_newest_first(entries: &[ReplaceEntry]) -> Vec<&ReplaceEntry> {
    let mut out: Vec<&ReplaceEntry> = entries.iter().collect();
    out.sort_by(|a, b| match (parse_iso_date(&a.date), parse_iso_date(&b.date)) {
        (Some(da), Some(db)) => db.cmp(&da),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    out
}
