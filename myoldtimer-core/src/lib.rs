//! myoldtimer-core: maintenance records, scheduling and migration for classic cars

pub mod category;
pub mod checklist;
pub mod error;
pub mod history;
pub mod ids;
pub mod normalize;
pub mod number;
pub mod ranking;
pub mod replace_history;
pub mod schedule;
pub mod service_log;
pub mod time;

pub use category::{
    CategoryDraft, DEFAULT_CATEGORY_TEMPLATES, IntervalType, MaintenanceCategory,
    apply_category_draft, default_categories, remove_categories,
};
pub use checklist::{
    Checklist, ChecklistTask, CompletionSummary, Subtask, SubtaskDraft, TaskDraft,
    apply_task_draft, completion_summary, mark_subtask_done, partition_tasks, remove_tasks,
    unmark_subtask, update_subtask_details,
};
pub use error::{ValidationError, ValidationResult};
pub use history::{
    LastService, aggregate_last_service, effective_last_service, latest_service_by_category,
    sync_entries_with_categories,
};
pub use ids::{IdGenerator, PrefixedIds, SequentialIds};
pub use normalize::{CategoryLookup, Normalizer, ServiceLogShape, needs_persist};
pub use number::{parse_non_negative_mileage, parse_number};
pub use ranking::{
    CategoryWithState, compare_names, evaluate_categories, rank_categories, summarize,
};
pub use replace_history::{
    ReplaceDraft, ReplaceEntry, apply_replace_draft, parse_text_items, remove_replace_entries,
    replace_newest_first,
};
pub use schedule::{
    CategoryRuntimeState, MaintenanceStatus, StatusSummary, WarningConfig, calculate_category_state,
};
pub use service_log::{
    MaintenanceServiceLogEntry, ServiceLogDraft, apply_service_log_draft, newest_first,
    remove_entries,
};
pub use time::{Clock, FixedClock, SystemClock};
