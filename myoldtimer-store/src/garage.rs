//! The store handle: every read/modify/write of maintenance data goes through [`Garage`].
//!
//! Loads never write. They return [`Loaded`] values flagged with whether the
//! normalized form differs from what is stored; callers persist migrations
//! explicitly, so a load whose result is discarded leaves the store untouched.

use serde::Serialize;
use serde_json::{Value, json};

use myoldtimer_core::category::{
    CategoryDraft, apply_category_draft, default_categories, remove_categories,
};
use myoldtimer_core::checklist::{
    Checklist, TaskDraft, apply_task_draft, mark_subtask_done, remove_tasks, unmark_subtask,
    update_subtask_details,
};
use myoldtimer_core::history::sync_entries_with_categories;
use myoldtimer_core::ids::IdGenerator;
use myoldtimer_core::normalize::{Normalizer, needs_persist};
use myoldtimer_core::number::{parse_non_negative, parse_non_negative_mileage, to_json_number};
use myoldtimer_core::ranking::{CategoryWithState, evaluate_categories};
use myoldtimer_core::replace_history::{
    ReplaceDraft, ReplaceEntry, apply_replace_draft, remove_replace_entries,
};
use myoldtimer_core::schedule::WarningConfig;
use myoldtimer_core::service_log::{ServiceLogDraft, apply_service_log_draft, remove_entries};
use myoldtimer_core::time::{Clock, timestamp};
use myoldtimer_core::{MaintenanceCategory, MaintenanceServiceLogEntry, ValidationError};

use crate::backend::KeyValueStore;
use crate::error::{GarageResult, StoreResult};
use crate::keys;

/// A normalized value and whether it must be written back.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub value: T,
    pub needs_persist: bool,
}

impl<T: Serialize> Loaded<T> {
    fn compare(raw: &Value, value: T) -> Self {
        let needs_persist = needs_persist(raw, &value);
        Self { value, needs_persist }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceSnapshot {
    pub categories: Loaded<Vec<MaintenanceCategory>>,
    pub entries: Loaded<Vec<MaintenanceServiceLogEntry>>,
    pub current_mileage: Option<f64>,
}

/// Which keys a migration pass rewrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MigrationReport {
    pub categories: bool,
    pub service_log: bool,
    pub checklist: bool,
    pub replace_history: bool,
}

impl MigrationReport {
    pub fn any(&self) -> bool {
        self.categories || self.service_log || self.checklist || self.replace_history
    }
}

/// Outcome of a save that may have raised the current mileage.
#[derive(Debug, Clone, PartialEq)]
pub struct Saved<T> {
    pub value: T,
    pub mileage_raised: bool,
}

pub struct Garage<'a, S: KeyValueStore + ?Sized> {
    store: &'a S,
    ids: &'a dyn IdGenerator,
    clock: &'a dyn Clock,
    warning: WarningConfig,
}

impl<'a, S: KeyValueStore + ?Sized> Garage<'a, S> {
    pub fn new(store: &'a S, ids: &'a dyn IdGenerator, clock: &'a dyn Clock) -> Self {
        Self {
            store,
            ids,
            clock,
            warning: WarningConfig::default(),
        }
    }

    pub fn with_warning(mut self, warning: WarningConfig) -> Self {
        self.warning = warning;
        self
    }

    pub fn warning(&self) -> WarningConfig {
        self.warning
    }

    fn normalizer(&self) -> Normalizer<'a> {
        Normalizer::new(self.ids, self.clock)
    }

    fn now(&self) -> String {
        timestamp(self.clock.now())
    }

    async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let json = serde_json::to_value(value)?;
        self.store.set(key, &json).await
    }

    // ---- maintenance ----

    /// Stored categories, or the default set when none survive normalization.
    pub async fn load_categories(&self) -> StoreResult<Loaded<Vec<MaintenanceCategory>>> {
        let raw = self.store.get_or(keys::MAINTENANCE_CATEGORIES, json!([])).await?;
        let categories = self.normalizer().categories(&raw);
        if categories.is_empty() {
            log::info!("no maintenance categories stored; seeding defaults");
            return Ok(Loaded {
                value: default_categories(self.ids, &self.now()),
                needs_persist: true,
            });
        }
        Ok(Loaded::compare(&raw, categories))
    }

    pub async fn load_service_log(
        &self,
        categories: &[MaintenanceCategory],
    ) -> StoreResult<Loaded<Vec<MaintenanceServiceLogEntry>>> {
        let raw = self.store.get_or(keys::MAINTENANCE_HISTORY, json!([])).await?;
        let entries = self.normalizer().service_log(&raw, categories);
        Ok(Loaded::compare(&raw, entries))
    }

    pub async fn load_maintenance(&self) -> StoreResult<MaintenanceSnapshot> {
        let categories = self.load_categories().await?;
        let entries = self.load_service_log(&categories.value).await?;
        let current_mileage = self.current_mileage().await?;
        Ok(MaintenanceSnapshot {
            categories,
            entries,
            current_mileage,
        })
    }

    /// Write back whatever the snapshot's load migrated. Categories go first.
    pub async fn persist_maintenance(
        &self,
        snapshot: &MaintenanceSnapshot,
    ) -> StoreResult<MigrationReport> {
        let mut report = MigrationReport::default();
        if snapshot.categories.needs_persist {
            self.write(keys::MAINTENANCE_CATEGORIES, &snapshot.categories.value).await?;
            report.categories = true;
        }
        if snapshot.entries.needs_persist {
            self.write(keys::MAINTENANCE_HISTORY, &snapshot.entries.value).await?;
            report.service_log = true;
        }
        Ok(report)
    }

    /// Categories with their runtime state, most urgent first.
    pub fn evaluate(&self, snapshot: &MaintenanceSnapshot) -> Vec<CategoryWithState> {
        evaluate_categories(
            &snapshot.categories.value,
            &snapshot.entries.value,
            self.clock.today(),
            snapshot.current_mileage,
            self.warning,
        )
    }

    async fn write_categories_cascading(
        &self,
        categories: &[MaintenanceCategory],
        entries: &[MaintenanceServiceLogEntry],
    ) -> StoreResult<()> {
        self.write(keys::MAINTENANCE_CATEGORIES, categories).await?;
        let synced = sync_entries_with_categories(categories, entries);
        self.write(keys::MAINTENANCE_HISTORY, &synced).await
    }

    pub async fn save_category(&self, draft: &CategoryDraft) -> GarageResult<MaintenanceCategory> {
        let snapshot = self.load_maintenance().await?;
        let (categories, saved) =
            apply_category_draft(&snapshot.categories.value, draft, self.ids, &self.now())?;
        self.write_categories_cascading(&categories, &snapshot.entries.value)
            .await?;
        log::info!("saved category {} ({})", saved.name, saved.id);
        Ok(saved)
    }

    /// Remove categories; log entries lose the references but are kept.
    pub async fn delete_categories(&self, ids: &[String]) -> GarageResult<usize> {
        let snapshot = self.load_maintenance().await?;
        let before = snapshot.categories.value.len();
        let categories = remove_categories(&snapshot.categories.value, ids);
        let removed = before - categories.len();
        if removed == 0 {
            return Err(ValidationError::UnknownCategory(ids.join(", ")).into());
        }
        self.write_categories_cascading(&categories, &snapshot.entries.value)
            .await?;
        Ok(removed)
    }

    /// Reset the category list to the built-in defaults. Log references are dropped.
    pub async fn restore_default_categories(&self) -> StoreResult<Vec<MaintenanceCategory>> {
        let entries = self.load_maintenance().await?.entries.value;
        let categories = default_categories(self.ids, &self.now());
        self.write_categories_cascading(&categories, &entries).await?;
        Ok(categories)
    }

    pub async fn save_service_log_entry(
        &self,
        draft: &ServiceLogDraft,
    ) -> GarageResult<Saved<MaintenanceServiceLogEntry>> {
        let snapshot = self.load_maintenance().await?;
        if snapshot.categories.needs_persist {
            self.write(keys::MAINTENANCE_CATEGORIES, &snapshot.categories.value)
                .await?;
        }
        let (entries, saved) = apply_service_log_draft(
            &snapshot.entries.value,
            &snapshot.categories.value,
            draft,
            self.ids,
        )?;
        self.write(keys::MAINTENANCE_HISTORY, &entries).await?;
        let mileage_raised = self.sync_mileage_if_higher(saved.kilometers).await?;
        Ok(Saved {
            value: saved,
            mileage_raised,
        })
    }

    pub async fn delete_service_log_entries(&self, ids: &[String]) -> GarageResult<usize> {
        let snapshot = self.load_maintenance().await?;
        let before = snapshot.entries.value.len();
        let entries = remove_entries(&snapshot.entries.value, ids);
        let removed = before - entries.len();
        if removed == 0 {
            return Err(ValidationError::UnknownEntry(ids.join(", ")).into());
        }
        self.write(keys::MAINTENANCE_HISTORY, &entries).await?;
        Ok(removed)
    }

    // ---- mileage ----

    pub async fn current_mileage(&self) -> StoreResult<Option<f64>> {
        let raw = self.store.get_or(keys::CURRENT_MILEAGE, json!("")).await?;
        Ok(parse_non_negative(&raw))
    }

    pub async fn set_current_mileage(&self, input: &str) -> GarageResult<f64> {
        let mileage = parse_non_negative_mileage(input).ok_or(ValidationError::InvalidMileage)?;
        self.store
            .set(keys::CURRENT_MILEAGE, &to_json_number(mileage))
            .await?;
        Ok(mileage)
    }

    /// Raise the stored odometer reading to `candidate` when it is higher or unset.
    pub async fn sync_mileage_if_higher(&self, candidate: Option<f64>) -> StoreResult<bool> {
        let Some(candidate) = candidate.filter(|c| c.is_finite() && *c >= 0.0) else {
            return Ok(false);
        };
        match self.current_mileage().await? {
            Some(current) if candidate <= current => Ok(false),
            _ => {
                self.store
                    .set(keys::CURRENT_MILEAGE, &to_json_number(candidate))
                    .await?;
                log::debug!("current mileage raised to {candidate}");
                Ok(true)
            }
        }
    }

    // ---- checklist ----

    pub async fn load_checklist(&self) -> StoreResult<Loaded<Checklist>> {
        let raw = self.store.get_or(keys::CHECKLIST, json!({"todo": [], "done": []})).await?;
        let checklist = self.normalizer().checklist(&raw);
        Ok(Loaded::compare(&raw, checklist))
    }

    pub async fn save_checklist(&self, checklist: &Checklist) -> StoreResult<()> {
        self.write(keys::CHECKLIST, checklist).await
    }

    pub async fn save_task(&self, draft: &TaskDraft) -> GarageResult<Checklist> {
        let current = self.load_checklist().await?.value;
        let next = apply_task_draft(&current, draft, self.ids)?;
        self.save_checklist(&next).await?;
        Ok(next)
    }

    /// Mark a sub-item done; a recorded odometer reading feeds the current mileage.
    pub async fn complete_subtask(
        &self,
        task_id: &str,
        subtask_id: &str,
        date: &str,
        kilometers: &str,
    ) -> GarageResult<Saved<Checklist>> {
        let current = self.load_checklist().await?.value;
        let next = mark_subtask_done(&current, task_id, subtask_id, date, kilometers)?;
        self.save_checklist(&next).await?;
        let mileage_raised = self
            .sync_mileage_if_higher(parse_non_negative_mileage(kilometers))
            .await?;
        Ok(Saved {
            value: next,
            mileage_raised,
        })
    }

    pub async fn reopen_subtask(&self, task_id: &str, subtask_id: &str) -> GarageResult<Checklist> {
        let current = self.load_checklist().await?.value;
        let next = unmark_subtask(&current, task_id, subtask_id)?;
        self.save_checklist(&next).await?;
        Ok(next)
    }

    pub async fn edit_subtask(
        &self,
        task_id: &str,
        subtask_id: &str,
        name: &str,
        date: &str,
        kilometers: &str,
    ) -> GarageResult<Saved<Checklist>> {
        let current = self.load_checklist().await?.value;
        let next = update_subtask_details(&current, task_id, subtask_id, name, date, kilometers)?;
        self.save_checklist(&next).await?;
        let mileage_raised = self
            .sync_mileage_if_higher(parse_non_negative_mileage(kilometers))
            .await?;
        Ok(Saved {
            value: next,
            mileage_raised,
        })
    }

    pub async fn delete_tasks(&self, ids: &[String]) -> GarageResult<Checklist> {
        let current = self.load_checklist().await?.value;
        let next = remove_tasks(&current, ids);
        if next == current {
            return Err(ValidationError::UnknownTask(ids.join(", ")).into());
        }
        self.save_checklist(&next).await?;
        Ok(next)
    }

    // ---- replaced parts ----

    pub async fn load_replace_history(&self) -> StoreResult<Loaded<Vec<ReplaceEntry>>> {
        let raw = self.store.get_or(keys::REPLACE_HISTORY, json!([])).await?;
        let entries = self.normalizer().replace_history(&raw);
        Ok(Loaded::compare(&raw, entries))
    }

    pub async fn save_replace_entry(
        &self,
        draft: &ReplaceDraft,
    ) -> GarageResult<Saved<ReplaceEntry>> {
        let current = self.load_replace_history().await?.value;
        let (entries, saved) = apply_replace_draft(&current, draft, self.ids)?;
        self.write(keys::REPLACE_HISTORY, &entries).await?;
        let mileage_raised = self.sync_mileage_if_higher(saved.kilometers).await?;
        Ok(Saved {
            value: saved,
            mileage_raised,
        })
    }

    pub async fn delete_replace_entries(&self, ids: &[String]) -> GarageResult<usize> {
        let current = self.load_replace_history().await?.value;
        let next = remove_replace_entries(&current, ids);
        let removed = current.len() - next.len();
        if removed == 0 {
            return Err(ValidationError::UnknownEntry(ids.join(", ")).into());
        }
        self.write(keys::REPLACE_HISTORY, &next).await?;
        Ok(removed)
    }

    // ---- migration ----

    /// Normalize every key and write back the ones whose canonical form changed.
    pub async fn migrate(&self) -> StoreResult<MigrationReport> {
        let snapshot = self.load_maintenance().await?;
        let mut report = self.persist_maintenance(&snapshot).await?;

        let checklist = self.load_checklist().await?;
        if checklist.needs_persist {
            self.save_checklist(&checklist.value).await?;
            report.checklist = true;
        }

        let replace = self.load_replace_history().await?;
        if replace.needs_persist {
            self.write(keys::REPLACE_HISTORY, &replace.value).await?;
            report.replace_history = true;
        }

        if report.any() {
            log::info!("migration rewrote stored records: {report:?}");
        }
        Ok(report)
    }
}
