use anyhow::{Context, Result, bail};
use clap::{Subcommand, ValueEnum};
use myoldtimer_core::normalize::CategoryLookup;
use myoldtimer_core::{
    CategoryDraft, IntervalType, MaintenanceCategory, ServiceLogDraft, newest_first, summarize,
};

use crate::App;
use crate::render::{
    format_km, format_opt_km, interval_label, status_line, summary_line, text_or_na,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum IntervalArg {
    Time,
    Mileage,
    Both,
}

impl From<IntervalArg> for IntervalType {
    fn from(a: IntervalArg) -> Self {
        match a {
            IntervalArg::Time => IntervalType::Time,
            IntervalArg::Mileage => IntervalType::Mileage,
            IntervalArg::Both => IntervalType::Both,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    /// List categories and their intervals
    List,

    /// Add a category
    Add {
        #[arg(long)]
        name: String,

        #[arg(long = "type", value_enum, default_value = "both")]
        interval_type: IntervalArg,

        /// Interval in months (time / both)
        #[arg(long)]
        months: Option<String>,

        /// Interval in kilometers (mileage / both)
        #[arg(long)]
        km: Option<String>,
    },

    /// Change a category; unspecified fields keep their value
    Edit {
        /// Category id or name
        category: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long = "type", value_enum)]
        interval_type: Option<IntervalArg>,

        #[arg(long)]
        months: Option<String>,

        #[arg(long)]
        km: Option<String>,
    },

    /// Delete categories (service log entries are kept)
    Delete {
        /// Category ids or names
        #[arg(required = true)]
        categories: Vec<String>,
    },

    /// Replace all categories with the built-in defaults
    Defaults,
}

#[derive(Subcommand, Debug)]
pub enum LogCommand {
    /// List service log entries, newest first
    List,

    /// Record a service
    Add {
        /// Category id or name (repeatable)
        #[arg(long = "category", short = 'c', required = true)]
        categories: Vec<String>,

        /// Service date, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,

        /// Odometer reading at the service
        #[arg(long)]
        km: Option<String>,

        #[arg(long, default_value = "")]
        comment: String,
    },

    /// Change an entry; unspecified fields keep their value
    Edit {
        id: String,

        /// Replaces the entry's categories when given (repeatable)
        #[arg(long = "category", short = 'c')]
        categories: Vec<String>,

        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        km: Option<String>,

        #[arg(long)]
        comment: Option<String>,
    },

    /// Delete entries
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum MileageCommand {
    Show,
    Set { km: String },
}

/// Resolve a user argument to a category id: exact id first, then name.
fn resolve_category(categories: &[MaintenanceCategory], arg: &str) -> Result<String> {
    let lookup = CategoryLookup::new(categories);
    if lookup.contains(arg) {
        return Ok(arg.to_string());
    }
    lookup
        .id_for_name(arg)
        .map(str::to_string)
        .with_context(|| format!("no category matches {arg:?}"))
}

fn resolve_all(categories: &[MaintenanceCategory], args: &[String]) -> Result<Vec<String>> {
    args.iter().map(|a| resolve_category(categories, a)).collect()
}

pub async fn status(app: &App, json: bool) -> Result<()> {
    let garage = app.garage();
    let snapshot = garage.load_maintenance().await?;
    garage.persist_maintenance(&snapshot).await?;

    let ranked = garage.evaluate(&snapshot);
    if json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
        return Ok(());
    }

    println!(
        "Current mileage: {}\n",
        format_opt_km(snapshot.current_mileage)
    );
    for item in &ranked {
        println!("{}", status_line(item));
    }
    println!("\n{}", summary_line(&summarize(&ranked)));
    Ok(())
}

pub async fn run_category(app: &App, cmd: CategoryCommand) -> Result<()> {
    let garage = app.garage();
    match cmd {
        CategoryCommand::List => {
            let categories = garage.load_categories().await?.value;
            for c in &categories {
                println!("{}  {:<24} {}", c.id, c.name, interval_label(c));
            }
        }
        CategoryCommand::Add {
            name,
            interval_type,
            months,
            km,
        } => {
            let draft = CategoryDraft::new(name, interval_type.into())
                .with_months(months.unwrap_or_default())
                .with_kilometers(km.unwrap_or_default());
            let saved = garage.save_category(&draft).await?;
            println!("Added {} ({})", saved.name, saved.id);
        }
        CategoryCommand::Edit {
            category,
            name,
            interval_type,
            months,
            km,
        } => {
            let categories = garage.load_categories().await?.value;
            let id = resolve_category(&categories, &category)?;
            let Some(current) = categories.iter().find(|c| c.id == id) else {
                bail!("no category matches {category:?}");
            };
            let mut draft = CategoryDraft::from_category(current);
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(t) = interval_type {
                draft.interval_type = t.into();
            }
            if let Some(m) = months {
                draft.interval_months = m;
            }
            if let Some(k) = km {
                draft.interval_kilometers = k;
            }
            let saved = garage.save_category(&draft).await?;
            println!("Updated {} ({})", saved.name, interval_label(&saved));
        }
        CategoryCommand::Delete { categories: args } => {
            let categories = garage.load_categories().await?.value;
            let ids = resolve_all(&categories, &args)?;
            let removed = garage.delete_categories(&ids).await?;
            println!("Deleted {removed} categor{}", if removed == 1 { "y" } else { "ies" });
        }
        CategoryCommand::Defaults => {
            let categories = garage.restore_default_categories().await?;
            println!("Restored {} default categories", categories.len());
        }
    }
    Ok(())
}

pub async fn run_log(app: &App, cmd: LogCommand) -> Result<()> {
    let garage = app.garage();
    match cmd {
        LogCommand::List => {
            let snapshot = garage.load_maintenance().await?;
            for e in newest_first(&snapshot.entries.value) {
                let names = if e.categories.is_empty() {
                    "(no category)".to_string()
                } else {
                    e.categories.join(", ")
                };
                println!(
                    "{}  {:<10}  {:>12}  {}{}",
                    e.id,
                    text_or_na(&e.date),
                    format_opt_km(e.kilometers),
                    names,
                    if e.comment.is_empty() { String::new() } else { format!("  # {}", e.comment) }
                );
            }
        }
        LogCommand::Add {
            categories,
            date,
            km,
            comment,
        } => {
            let known = garage.load_categories().await?.value;
            let draft = ServiceLogDraft {
                id: None,
                category_ids: resolve_all(&known, &categories)?,
                date: date.unwrap_or_else(|| app.clock_today()),
                kilometers: km.unwrap_or_default(),
                comment,
            };
            report_entry(garage.save_service_log_entry(&draft).await?);
        }
        LogCommand::Edit {
            id,
            categories,
            date,
            km,
            comment,
        } => {
            let snapshot = garage.load_maintenance().await?;
            let Some(entry) = snapshot.entries.value.iter().find(|e| e.id == id) else {
                bail!("no service log entry with id {id:?}");
            };
            let mut draft = ServiceLogDraft::from_entry(entry);
            if !categories.is_empty() {
                draft.category_ids = resolve_all(&snapshot.categories.value, &categories)?;
            }
            if let Some(date) = date {
                draft.date = date;
            }
            if let Some(km) = km {
                draft.kilometers = km;
            }
            if let Some(comment) = comment {
                draft.comment = comment;
            }
            report_entry(garage.save_service_log_entry(&draft).await?);
        }
        LogCommand::Delete { ids } => {
            let removed = garage.delete_service_log_entries(&ids).await?;
            println!("Deleted {removed} entr{}", if removed == 1 { "y" } else { "ies" });
        }
    }
    Ok(())
}

fn report_entry(saved: myoldtimer_store::Saved<myoldtimer_core::MaintenanceServiceLogEntry>) {
    println!(
        "Saved {} ({}): {}",
        saved.value.id,
        text_or_na(&saved.value.date),
        saved.value.categories.join(", ")
    );
    if let (true, Some(km)) = (saved.mileage_raised, saved.value.kilometers) {
        println!("Current mileage raised to {}", format_km(km));
    }
}

pub async fn run_mileage(app: &App, cmd: MileageCommand) -> Result<()> {
    let garage = app.garage();
    match cmd {
        MileageCommand::Show => {
            println!("{}", format_opt_km(garage.current_mileage().await?));
        }
        MileageCommand::Set { km } => {
            let km = garage.set_current_mileage(&km).await?;
            println!("Current mileage set to {}", format_km(km));
        }
    }
    Ok(())
}

pub async fn migrate(app: &App) -> Result<()> {
    let report = app.garage().migrate().await?;
    if !report.any() {
        println!("All records are up to date");
        return Ok(());
    }
    let rewritten: Vec<&str> = [
        (report.categories, "categories"),
        (report.service_log, "service log"),
        (report.checklist, "checklist"),
        (report.replace_history, "replace history"),
    ]
    .into_iter()
    .filter_map(|(changed, name)| changed.then_some(name))
    .collect();
    println!("Migrated: {}", rewritten.join(", "));
    Ok(())
}
