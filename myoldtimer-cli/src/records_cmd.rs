use anyhow::{Result, bail};
use clap::Subcommand;
use myoldtimer_core::checklist::{ChecklistTask, completion_summary};
use myoldtimer_core::{ReplaceDraft, TaskDraft, parse_non_negative_mileage, replace_newest_first};

use crate::App;
use crate::render::{format_km, format_opt_km, text_or_na};

#[derive(Subcommand, Debug)]
pub enum ChecklistCommand {
    /// Show open and completed tasks
    Show {
        /// Include completed tasks
        #[arg(long, default_value_t = false)]
        all: bool,
    },

    /// Add a task with its sub-items
    Add {
        name: String,

        /// Sub-item (repeatable)
        #[arg(long = "item", short = 'i', required = true)]
        items: Vec<String>,
    },

    /// Mark a sub-item done
    Done {
        task: String,
        subtask: String,

        /// Completion date, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,

        #[arg(long, default_value = "")]
        km: String,
    },

    /// Reopen a sub-item
    Undo { task: String, subtask: String },

    /// Rename a sub-item or correct its completion details
    Edit {
        task: String,
        subtask: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        km: Option<String>,
    },

    /// Delete tasks
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReplaceCommand {
    /// List replaced parts, newest first
    List,

    /// Record replaced parts
    Add {
        /// Parts, separated by commas or newlines
        parts: String,

        #[arg(long)]
        date: Option<String>,

        #[arg(long, default_value = "")]
        km: String,

        #[arg(long, default_value = "")]
        comment: String,
    },

    /// Delete entries
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

fn print_task(task: &ChecklistTask) {
    let done = task.subtasks.iter().filter(|s| s.is_done).count();
    println!("{}  {} ({}/{})", task.id, task.task_name, done, task.subtasks.len());
    for s in &task.subtasks {
        let mark = if s.is_done { "x" } else { " " };
        let meta = if s.is_done {
            format!("  {} {}", text_or_na(&s.completed_date), format_opt_km(s.completed_kilometers))
        } else {
            String::new()
        };
        println!("    [{mark}] {}  {}{meta}", s.id, s.name);
    }
}

pub async fn run_checklist(app: &App, cmd: ChecklistCommand) -> Result<()> {
    let garage = app.garage();
    match cmd {
        ChecklistCommand::Show { all } => {
            let loaded = garage.load_checklist().await?;
            if loaded.needs_persist {
                garage.save_checklist(&loaded.value).await?;
            }
            let checklist = loaded.value;
            if checklist.todo.is_empty() {
                println!("Nothing to do");
            }
            checklist.todo.iter().for_each(print_task);
            if all && !checklist.done.is_empty() {
                println!("\nCompleted:");
                for task in &checklist.done {
                    let summary = completion_summary(task);
                    println!(
                        "{}  {}  {} {}",
                        task.id,
                        task.task_name,
                        text_or_na(&summary.date),
                        format_opt_km(summary.kilometers)
                    );
                }
            }
        }
        ChecklistCommand::Add { name, items } => {
            let names: Vec<&str> = items.iter().map(String::as_str).collect();
            let checklist = garage.save_task(&TaskDraft::new(name, &names)).await?;
            if let Some(task) = checklist.todo.last() {
                print_task(task);
            }
        }
        ChecklistCommand::Done {
            task,
            subtask,
            date,
            km,
        } => {
            let date = date.unwrap_or_else(|| app.clock_today());
            let saved = garage.complete_subtask(&task, &subtask, &date, &km).await?;
            match saved.value.find_task(&task) {
                Some(t) if t.is_complete() => println!("Task {} completed", t.task_name),
                Some(t) => print_task(t),
                None => bail!("task {task:?} disappeared while saving"),
            }
            if let (true, Some(km)) = (saved.mileage_raised, parse_non_negative_mileage(&km)) {
                println!("Current mileage raised to {}", format_km(km));
            }
        }
        ChecklistCommand::Undo { task, subtask } => {
            let checklist = garage.reopen_subtask(&task, &subtask).await?;
            if let Some(t) = checklist.find_task(&task) {
                print_task(t);
            }
        }
        ChecklistCommand::Edit {
            task,
            subtask,
            name,
            date,
            km,
        } => {
            let checklist = garage.load_checklist().await?.value;
            let Some(current) = checklist
                .find_task(&task)
                .and_then(|t| t.subtasks.iter().find(|s| s.id == subtask))
            else {
                bail!("no sub-item {subtask:?} in task {task:?}");
            };
            let name = name.unwrap_or_else(|| current.name.clone());
            let date = date.unwrap_or_else(|| current.completed_date.clone());
            let km = km.unwrap_or_else(|| {
                current
                    .completed_kilometers
                    .map(|k| k.to_string())
                    .unwrap_or_default()
            });
            let saved = garage.edit_subtask(&task, &subtask, &name, &date, &km).await?;
            if let Some(t) = saved.value.find_task(&task) {
                print_task(t);
            }
            if let (true, Some(km)) = (saved.mileage_raised, parse_non_negative_mileage(&km)) {
                println!("Current mileage raised to {}", format_km(km));
            }
        }
        ChecklistCommand::Delete { ids } => {
            let before = garage.load_checklist().await?.value.tasks().count();
            let after = garage.delete_tasks(&ids).await?.tasks().count();
            println!("Deleted {} task(s)", before - after);
        }
    }
    Ok(())
}

pub async fn run_replace(app: &App, cmd: ReplaceCommand) -> Result<()> {
    let garage = app.garage();
    match cmd {
        ReplaceCommand::List => {
            let loaded = garage.load_replace_history().await?;
            for e in replace_newest_first(&loaded.value) {
                let parts = if e.parts.is_empty() {
                    "No part listed".to_string()
                } else {
                    e.parts.join(", ")
                };
                println!(
                    "{}  {:<10}  {:>12}  {}",
                    e.id,
                    text_or_na(&e.date),
                    format_opt_km(e.kilometers),
                    parts
                );
            }
        }
        ReplaceCommand::Add {
            parts,
            date,
            km,
            comment,
        } => {
            let draft = ReplaceDraft {
                id: None,
                parts,
                date: date.unwrap_or_else(|| app.clock_today()),
                kilometers: km,
                comment,
            };
            let saved = garage.save_replace_entry(&draft).await?;
            println!("Saved {}: {}", saved.value.id, saved.value.parts.join(", "));
            if let (true, Some(km)) = (saved.mileage_raised, saved.value.kilometers) {
                println!("Current mileage raised to {}", format_km(km));
            }
        }
        ReplaceCommand::Delete { ids } => {
            let removed = garage.delete_replace_entries(&ids).await?;
            println!("Deleted {removed} entr{}", if removed == 1 { "y" } else { "ies" });
        }
    }
    Ok(())
}
