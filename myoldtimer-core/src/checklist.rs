//! Restoration checklist: tasks made of sub-items, split into to-do and done.
//!
//! A task lives in `done` exactly when every one of its sub-items is done.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ValidationError, ValidationResult};
use crate::ids::IdGenerator;
use crate::normalize::{Normalizer, text, truthy};
use crate::number::{json_number, parse_non_negative, parse_non_negative_mileage};
use crate::time::parse_iso_date;

pub const TASK_ID_PREFIX: &str = "task";
pub const SUBTASK_ID_PREFIX: &str = "subtask";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub name: String,
    pub is_done: bool,
    #[serde(default)]
    pub completed_date: String,
    #[serde(default, with = "json_number")]
    pub completed_kilometers: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistTask {
    pub id: String,
    pub task_name: String,
    pub subtasks: Vec<Subtask>,
}

impl ChecklistTask {
    pub fn is_complete(&self) -> bool {
        !self.subtasks.is_empty() && self.subtasks.iter().all(|s| s.is_done)
    }

    fn is_viable(&self) -> bool {
        !self.task_name.trim().is_empty() && !self.subtasks.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Checklist {
    pub todo: Vec<ChecklistTask>,
    pub done: Vec<ChecklistTask>,
}

impl Checklist {
    pub fn tasks(&self) -> impl Iterator<Item = &ChecklistTask> {
        self.todo.iter().chain(self.done.iter())
    }

    pub fn find_task(&self, task_id: &str) -> Option<&ChecklistTask> {
        self.tasks().find(|t| t.id == task_id)
    }

    fn into_tasks(self) -> Vec<ChecklistTask> {
        self.todo.into_iter().chain(self.done).collect()
    }
}

/// Re-split tasks. Tasks without a name or sub-items are dropped; completed
/// tasks go to `done` with every sub-item flagged done.
pub fn partition_tasks(tasks: Vec<ChecklistTask>) -> Checklist {
    let mut out = Checklist::default();
    for task in tasks.into_iter().filter(ChecklistTask::is_viable) {
        if task.is_complete() {
            out.done.push(task);
        } else {
            out.todo.push(task);
        }
    }
    out
}

/// Last known completion date and odometer reading of a task.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionSummary {
    pub date: String,
    pub kilometers: Option<f64>,
}

/// Fields come independently from the last done sub-item that carries them.
pub fn completion_summary(task: &ChecklistTask) -> CompletionSummary {
    let done = || task.subtasks.iter().rev().filter(|s| s.is_done);
    CompletionSummary {
        date: done()
            .find(|s| !s.completed_date.is_empty())
            .map(|s| s.completed_date.clone())
            .unwrap_or_default(),
        kilometers: done().find_map(|s| s.completed_kilometers),
    }
}

impl Normalizer<'_> {
    fn subtask(&self, raw: &Value, index: usize, force_done: bool) -> Subtask {
        Subtask {
            id: text(raw, "id")
                .unwrap_or_else(|| self.fresh_id(&format!("{SUBTASK_ID_PREFIX}-{index}"))),
            name: text(raw, "name")
                .or_else(|| text(raw, "subtaskName"))
                .unwrap_or_default(),
            is_done: force_done || truthy(raw, "isDone"),
            completed_date: text(raw, "completedDate").unwrap_or_default(),
            completed_kilometers: raw.get("completedKilometers").and_then(parse_non_negative),
        }
    }

    fn task(&self, raw: &Value, index: usize, force_done: bool) -> ChecklistTask {
        let subtasks = raw
            .get("subtasks")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .enumerate()
                    .map(|(i, s)| self.subtask(s, i, force_done))
                    .filter(|s| !s.name.trim().is_empty())
                    .collect()
            })
            .unwrap_or_default();

        ChecklistTask {
            id: text(raw, "id")
                .unwrap_or_else(|| self.fresh_id(&format!("{TASK_ID_PREFIX}-{index}"))),
            task_name: text(raw, "taskName").unwrap_or_else(|| "Untitled task".to_string()),
            subtasks,
        }
    }

    /// Flat completed record from before sub-items existed.
    fn legacy_done_task(&self, raw: &Value, index: usize) -> ChecklistTask {
        ChecklistTask {
            id: text(raw, "id").unwrap_or_else(|| self.fresh_id(&format!("done-{index}"))),
            task_name: text(raw, "taskName").unwrap_or_else(|| "Completed task".to_string()),
            subtasks: vec![Subtask {
                id: self.fresh_id(SUBTASK_ID_PREFIX),
                name: "Completed".to_string(),
                is_done: true,
                completed_date: text(raw, "date").unwrap_or_default(),
                completed_kilometers: raw.get("kilometers").and_then(parse_non_negative),
            }],
        }
    }

    pub fn checklist(&self, raw: &Value) -> Checklist {
        let list = |key: &str| raw.get(key).and_then(Value::as_array).cloned().unwrap_or_default();

        let todo = list("todo")
            .iter()
            .enumerate()
            .map(|(i, t)| self.task(t, i, false))
            .collect::<Vec<_>>();

        let done = list("done")
            .iter()
            .enumerate()
            .map(|(i, t)| {
                if t.get("subtasks").is_some_and(Value::is_array) {
                    self.task(t, i, true)
                } else {
                    log::debug!("checklist done #{i}: migrating legacy flat record");
                    self.legacy_done_task(t, i)
                }
            })
            .collect::<Vec<_>>();

        partition_tasks(todo.into_iter().chain(done).collect())
    }
}

/// Editor form for a task. Sub-items carry their id when they already exist.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskDraft {
    pub id: Option<String>,
    pub task_name: String,
    pub subtasks: Vec<SubtaskDraft>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubtaskDraft {
    pub id: Option<String>,
    pub name: String,
}

impl TaskDraft {
    pub fn new(task_name: impl Into<String>, subtask_names: &[&str]) -> Self {
        Self {
            id: None,
            task_name: task_name.into(),
            subtasks: subtask_names
                .iter()
                .map(|n| SubtaskDraft {
                    id: None,
                    name: n.to_string(),
                })
                .collect(),
        }
    }
}

/// Create a task, or rename/re-plan an existing one. Sub-items that keep their
/// id keep their completion state.
pub fn apply_task_draft(
    checklist: &Checklist,
    draft: &TaskDraft,
    ids: &dyn IdGenerator,
) -> ValidationResult<Checklist> {
    let task_name = draft.task_name.trim();
    if task_name.is_empty() {
        return Err(ValidationError::TaskNameRequired);
    }

    let named: Vec<&SubtaskDraft> = draft
        .subtasks
        .iter()
        .filter(|s| !s.name.trim().is_empty())
        .collect();
    if named.is_empty() {
        return Err(ValidationError::SubtaskRequired);
    }

    let existing = match &draft.id {
        Some(id) => Some(
            checklist
                .find_task(id)
                .ok_or_else(|| ValidationError::UnknownTask(id.clone()))?,
        ),
        None => None,
    };

    let subtasks = named
        .into_iter()
        .map(|s| {
            let previous = s
                .id
                .as_ref()
                .and_then(|id| existing.and_then(|t| t.subtasks.iter().find(|p| &p.id == id)));
            match previous {
                Some(p) => Subtask {
                    name: s.name.trim().to_string(),
                    ..p.clone()
                },
                None => Subtask {
                    id: ids.next_id(SUBTASK_ID_PREFIX),
                    name: s.name.trim().to_string(),
                    is_done: false,
                    completed_date: String::new(),
                    completed_kilometers: None,
                },
            }
        })
        .collect();

    let task = ChecklistTask {
        id: existing.map(|t| t.id.clone()).unwrap_or_else(|| ids.next_id(TASK_ID_PREFIX)),
        task_name: task_name.to_string(),
        subtasks,
    };

    let mut tasks = checklist.clone().into_tasks();
    match tasks.iter_mut().find(|t| t.id == task.id) {
        Some(slot) => *slot = task,
        None => tasks.push(task),
    }
    Ok(partition_tasks(tasks))
}

fn update_subtask(
    checklist: &Checklist,
    task_id: &str,
    subtask_id: &str,
    update: impl FnOnce(&mut Subtask),
) -> ValidationResult<Checklist> {
    let mut tasks = checklist.clone().into_tasks();
    let task = tasks
        .iter_mut()
        .find(|t| t.id == task_id)
        .ok_or_else(|| ValidationError::UnknownTask(task_id.to_string()))?;
    let subtask = task
        .subtasks
        .iter_mut()
        .find(|s| s.id == subtask_id)
        .ok_or_else(|| ValidationError::UnknownSubtask(subtask_id.to_string()))?;
    update(subtask);
    Ok(partition_tasks(tasks))
}

fn parse_completion(date: &str, kilometers: &str) -> ValidationResult<(String, Option<f64>)> {
    let date = date.trim();
    if !date.is_empty() && parse_iso_date(date).is_none() {
        return Err(ValidationError::InvalidDate);
    }
    let kilometers = if kilometers.trim().is_empty() {
        None
    } else {
        Some(parse_non_negative_mileage(kilometers).ok_or(ValidationError::InvalidKilometers)?)
    };
    Ok((date.to_string(), kilometers))
}

/// Mark a sub-item done, recording when and at which odometer reading.
pub fn mark_subtask_done(
    checklist: &Checklist,
    task_id: &str,
    subtask_id: &str,
    date: &str,
    kilometers: &str,
) -> ValidationResult<Checklist> {
    let (date, kilometers) = parse_completion(date, kilometers)?;
    update_subtask(checklist, task_id, subtask_id, |s| {
        s.is_done = true;
        s.completed_date = date;
        s.completed_kilometers = kilometers;
    })
}

/// Reopen a sub-item; its completion data is cleared.
pub fn unmark_subtask(
    checklist: &Checklist,
    task_id: &str,
    subtask_id: &str,
) -> ValidationResult<Checklist> {
    update_subtask(checklist, task_id, subtask_id, |s| {
        s.is_done = false;
        s.completed_date.clear();
        s.completed_kilometers = None;
    })
}

/// Correct the name and completion data of a done sub-item.
pub fn update_subtask_details(
    checklist: &Checklist,
    task_id: &str,
    subtask_id: &str,
    name: &str,
    date: &str,
    kilometers: &str,
) -> ValidationResult<Checklist> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::SubtaskNameRequired);
    }
    let (date, kilometers) = parse_completion(date, kilometers)?;
    update_subtask(checklist, task_id, subtask_id, |s| {
        s.name = name.to_string();
        s.completed_date = date;
        s.completed_kilometers = kilometers;
    })
}

pub fn remove_tasks(checklist: &Checklist, ids: &[String]) -> Checklist {
    let keep = |t: &&ChecklistTask| !ids.contains(&t.id);
    Checklist {
        todo: checklist.todo.iter().filter(keep).cloned().collect(),
        done: checklist.done.iter().filter(keep).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::normalize::needs_persist;
    use crate::time::FixedClock;
    use chrono::NaiveDate;
    use serde_json::json;

    fn clock() -> FixedClock {
        FixedClock::at(NaiveDate::from_ymd_opt(2026, 1, 10).unwrap())
    }

    #[test]
    fn test_legacy_done_record_becomes_completed_task() {
        let ids = SequentialIds::new();
        let n = Normalizer::new(&ids, &clock());
        let raw = json!({
            "todo": [],
            "done": [{
                "id": "d1", "taskName": "Rebuild carburettor",
                "date": "2021-07-01", "kilometers": "64000"
            }]
        });
        let list = n.checklist(&raw);
        assert!(list.todo.is_empty());
        let task = &list.done[0];
        assert_eq!(task.id, "d1");
        assert_eq!(task.subtasks.len(), 1);
        assert_eq!(task.subtasks[0].name, "Completed");
        assert!(task.subtasks[0].is_done);
        assert_eq!(task.subtasks[0].completed_kilometers, Some(64_000.0));

        let summary = completion_summary(task);
        assert_eq!(summary.date, "2021-07-01");
        assert_eq!(summary.kilometers, Some(64_000.0));
    }

    #[test]
    fn test_garbage_and_unnamed_items_are_dropped() {
        let ids = SequentialIds::new();
        let n = Normalizer::new(&ids, &clock());
        assert_eq!(n.checklist(&json!(null)), Checklist::default());
        assert_eq!(n.checklist(&json!({"todo": "x"})), Checklist::default());

        let raw = json!({"todo": [
            {"taskName": "Paint", "subtasks": [{"name": "  "}, {"subtaskName": "Sand"}]},
            {"taskName": "Empty", "subtasks": []},
            {"subtasks": [{"name": "Orphan"}]}
        ]});
        let list = n.checklist(&raw);
        assert_eq!(list.todo.len(), 2);
        assert_eq!(list.todo[0].subtasks[0].name, "Sand");
        assert_eq!(list.todo[1].task_name, "Untitled task");
    }

    #[test]
    fn test_done_task_with_open_items_is_forced_done() {
        let ids = SequentialIds::new();
        let n = Normalizer::new(&ids, &clock());
        let raw = json!({
            "done": [{"id": "t", "taskName": "Brakes", "subtasks": [{"id": "s", "name": "Pads"}]}]
        });
        let list = n.checklist(&raw);
        assert!(list.done[0].subtasks[0].is_done);
    }

    #[test]
    fn test_checklist_idempotent() {
        let ids = SequentialIds::new();
        let n = Normalizer::new(&ids, &clock());
        let raw = json!({
            "todo": [{
                "taskName": "Interior",
                "subtasks": [{"name": "Seats", "isDone": 1}, {"name": "Carpet"}]
            }],
            "done": [{"taskName": "Old job", "kilometers": 1200}]
        });
        let once = n.checklist(&raw);
        assert!(needs_persist(&raw, &once));
        let stored = serde_json::to_value(&once).unwrap();
        let twice = n.checklist(&stored);
        assert_eq!(once, twice);
        assert!(!needs_persist(&stored, &twice));
    }

    #[test]
    fn test_completing_last_item_moves_task_to_done() {
        let ids = SequentialIds::new();
        let draft = TaskDraft::new("Brakes", &["Pads", "Discs"]);
        let list = apply_task_draft(&Checklist::default(), &draft, &ids).unwrap();
        let task = list.todo[0].clone();
        let (pads, discs) = (&task.subtasks[0].id, &task.subtasks[1].id);

        let list = mark_subtask_done(&list, &task.id, pads, "2025-05-01", "70000").unwrap();
        assert_eq!(list.todo.len(), 1);
        let list = mark_subtask_done(&list, &task.id, discs, "2025-05-03", "").unwrap();
        assert!(list.todo.is_empty());
        assert_eq!(list.done.len(), 1);

        let summary = completion_summary(&list.done[0]);
        assert_eq!(summary.date, "2025-05-03");
        assert_eq!(summary.kilometers, Some(70_000.0));

        let list = unmark_subtask(&list, &task.id, &task.subtasks[0].id).unwrap();
        assert_eq!(list.todo.len(), 1);
        let reopened = &list.todo[0].subtasks[0];
        assert!(!reopened.is_done);
        assert!(reopened.completed_date.is_empty());
        assert_eq!(reopened.completed_kilometers, None);
    }

    #[test]
    fn test_task_draft_validation_and_edit() {
        let ids = SequentialIds::new();
        let empty = Checklist::default();
        assert_eq!(
            apply_task_draft(&empty, &TaskDraft::new(" ", &["a"]), &ids),
            Err(ValidationError::TaskNameRequired)
        );
        assert_eq!(
            apply_task_draft(&empty, &TaskDraft::new("Wheels", &[" "]), &ids),
            Err(ValidationError::SubtaskRequired)
        );

        let list = apply_task_draft(&empty, &TaskDraft::new("Wheels", &["Balance"]), &ids).unwrap();
        let task = &list.todo[0];
        let list = mark_subtask_done(&list, &task.id, &task.subtasks[0].id, "", "").unwrap();

        let done = &list.done[0];
        let mut edit = TaskDraft {
            id: Some(done.id.clone()),
            task_name: "Wheels & tyres".to_string(),
            subtasks: vec![SubtaskDraft {
                id: Some(done.subtasks[0].id.clone()),
                name: "Balance".to_string(),
            }],
        };
        edit.subtasks.push(SubtaskDraft {
            id: None,
            name: "Alignment".to_string(),
        });
        let list = apply_task_draft(&list, &edit, &ids).unwrap();
        assert!(list.done.is_empty());
        assert_eq!(list.todo[0].task_name, "Wheels & tyres");
        assert!(list.todo[0].subtasks[0].is_done);
        assert!(!list.todo[0].subtasks[1].is_done);
    }

    #[test]
    fn test_subtask_updates_reject_bad_input() {
        let ids = SequentialIds::new();
        let draft = TaskDraft::new("Lights", &["Bulbs"]);
        let list = apply_task_draft(&Checklist::default(), &draft, &ids).unwrap();
        let task = &list.todo[0];
        let sub = &task.subtasks[0].id;
        assert_eq!(
            mark_subtask_done(&list, &task.id, sub, "yesterday", ""),
            Err(ValidationError::InvalidDate)
        );
        assert_eq!(
            mark_subtask_done(&list, &task.id, sub, "", "-3"),
            Err(ValidationError::InvalidKilometers)
        );
        assert_eq!(
            update_subtask_details(&list, &task.id, sub, "", "", ""),
            Err(ValidationError::SubtaskNameRequired)
        );
        assert_eq!(
            unmark_subtask(&list, "nope", sub),
            Err(ValidationError::UnknownTask("nope".to_string()))
        );
        assert_eq!(remove_tasks(&list, &[task.id.clone()]), Checklist::default());
    }
}
