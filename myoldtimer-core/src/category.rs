//! Maintenance categories: the recurring items a car needs serviced.

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::ids::IdGenerator;
use crate::number::{json_number, parse_positive_str};

pub const CATEGORY_ID_PREFIX: &str = "maintenance-category";

/// Which due-checks govern a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalType {
    Time,
    Mileage,
    Both,
}

impl IntervalType {
    /// Strict parse of the persisted tag; anything else is `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "time" => Some(IntervalType::Time),
            "mileage" => Some(IntervalType::Mileage),
            "both" => Some(IntervalType::Both),
            _ => None,
        }
    }

    pub fn includes_time(self) -> bool {
        matches!(self, IntervalType::Time | IntervalType::Both)
    }

    pub fn includes_mileage(self) -> bool {
        matches!(self, IntervalType::Mileage | IntervalType::Both)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceCategory {
    pub id: String,
    pub name: String,
    pub interval_type: IntervalType,
    #[serde(default, with = "json_number")]
    pub interval_months: Option<f64>,
    #[serde(default, with = "json_number")]
    pub interval_kilometers: Option<f64>,
    /// `YYYY-MM-DD` or empty. Cold-start seed; the service log overrides it at read time.
    #[serde(default)]
    pub last_service_date: String,
    #[serde(default, with = "json_number")]
    pub last_service_mileage: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Built-in category preset.
#[derive(Debug, Clone, Copy)]
pub struct CategoryTemplate {
    pub name: &'static str,
    pub interval_type: IntervalType,
    pub interval_months: Option<f64>,
    pub interval_kilometers: Option<f64>,
}

pub const DEFAULT_CATEGORY_TEMPLATES: [CategoryTemplate; 5] = [
    CategoryTemplate {
        name: "Engine Oil",
        interval_type: IntervalType::Both,
        interval_months: Some(12.0),
        interval_kilometers: Some(10_000.0),
    },
    CategoryTemplate {
        name: "Brake Fluid",
        interval_type: IntervalType::Time,
        interval_months: Some(24.0),
        interval_kilometers: None,
    },
    CategoryTemplate {
        name: "Coolant",
        interval_type: IntervalType::Time,
        interval_months: Some(36.0),
        interval_kilometers: None,
    },
    CategoryTemplate {
        name: "Air Filter",
        interval_type: IntervalType::Mileage,
        interval_months: None,
        interval_kilometers: Some(15_000.0),
    },
    CategoryTemplate {
        name: "Timing Belt",
        interval_type: IntervalType::Both,
        interval_months: Some(60.0),
        interval_kilometers: Some(90_000.0),
    },
];

/// Fresh categories built from [`DEFAULT_CATEGORY_TEMPLATES`], never serviced.
pub fn default_categories(ids: &dyn IdGenerator, now: &str) -> Vec<MaintenanceCategory> {
    DEFAULT_CATEGORY_TEMPLATES
        .iter()
        .map(|t| MaintenanceCategory {
            id: ids.next_id(CATEGORY_ID_PREFIX),
            name: t.name.to_string(),
            interval_type: t.interval_type,
            interval_months: t.interval_months,
            interval_kilometers: t.interval_kilometers,
            last_service_date: String::new(),
            last_service_mileage: None,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        })
        .collect()
}

/// Editor form for creating (`id == None`) or reconfiguring a category.
///
/// Interval fields hold raw user text.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDraft {
    pub id: Option<String>,
    pub name: String,
    pub interval_type: IntervalType,
    pub interval_months: String,
    pub interval_kilometers: String,
}

impl CategoryDraft {
    pub fn new(name: impl Into<String>, interval_type: IntervalType) -> Self {
        Self {
            id: None,
            name: name.into(),
            interval_type,
            interval_months: String::new(),
            interval_kilometers: String::new(),
        }
    }

    pub fn from_category(category: &MaintenanceCategory) -> Self {
        let text = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();
        Self {
            id: Some(category.id.clone()),
            name: category.name.clone(),
            interval_type: category.interval_type,
            interval_months: text(category.interval_months),
            interval_kilometers: text(category.interval_kilometers),
        }
    }

    pub fn with_months(mut self, months: impl Into<String>) -> Self {
        self.interval_months = months.into();
        self
    }

    pub fn with_kilometers(mut self, kilometers: impl Into<String>) -> Self {
        self.interval_kilometers = kilometers.into();
        self
    }

    /// Returns the parsed `(months, kilometers)` the interval type requires.
    /// Sub-intervals the type does not use come back as `None`.
    pub fn validate(&self) -> ValidationResult<(Option<f64>, Option<f64>)> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::CategoryNameRequired);
        }

        let months = if self.interval_type.includes_time() {
            Some(
                parse_positive_str(&self.interval_months)
                    .ok_or(ValidationError::IntervalMonthsRequired)?,
            )
        } else {
            None
        };

        let kilometers = if self.interval_type.includes_mileage() {
            Some(
                parse_positive_str(&self.interval_kilometers)
                    .ok_or(ValidationError::IntervalKilometersRequired)?,
            )
        } else {
            None
        };

        Ok((months, kilometers))
    }
}

/// Create or update a category from a draft, returning the next category list
/// and the saved category.
///
/// Updates keep the stored last-service seed and `createdAt`.
pub fn apply_category_draft(
    categories: &[MaintenanceCategory],
    draft: &CategoryDraft,
    ids: &dyn IdGenerator,
    now: &str,
) -> ValidationResult<(Vec<MaintenanceCategory>, MaintenanceCategory)> {
    let (interval_months, interval_kilometers) = draft.validate()?;

    let existing = match &draft.id {
        Some(id) => Some(
            categories
                .iter()
                .find(|c| &c.id == id)
                .ok_or_else(|| ValidationError::UnknownCategory(id.clone()))?,
        ),
        None => None,
    };

    let saved = MaintenanceCategory {
        id: existing
            .map(|c| c.id.clone())
            .unwrap_or_else(|| ids.next_id(CATEGORY_ID_PREFIX)),
        name: draft.name.trim().to_string(),
        interval_type: draft.interval_type,
        interval_months,
        interval_kilometers,
        last_service_date: existing.map(|c| c.last_service_date.clone()).unwrap_or_default(),
        last_service_mileage: existing.and_then(|c| c.last_service_mileage),
        created_at: existing
            .map(|c| c.created_at.clone())
            .unwrap_or_else(|| now.to_string()),
        updated_at: now.to_string(),
    };

    let next = if existing.is_some() {
        categories
            .iter()
            .map(|c| if c.id == saved.id { saved.clone() } else { c.clone() })
            .collect()
    } else {
        let mut next = categories.to_vec();
        next.push(saved.clone());
        next
    };

    Ok((next, saved))
}

/// Drop the given categories. Callers must cascade to the service log.
pub fn remove_categories(
    categories: &[MaintenanceCategory],
    ids: &[String],
) -> Vec<MaintenanceCategory> {
    categories
        .iter()
        .filter(|c| !ids.contains(&c.id))
        .cloned()
        .collect()
}
