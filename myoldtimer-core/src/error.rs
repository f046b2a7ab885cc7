use thiserror::Error;

/// Rejections raised by editor drafts before anything is persisted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("category name is required")]
    CategoryNameRequired,
    #[error("interval months must be greater than 0")]
    IntervalMonthsRequired,
    #[error("interval kilometers must be greater than 0")]
    IntervalKilometersRequired,
    #[error("select at least one category")]
    NoCategorySelected,
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("unknown entry: {0}")]
    UnknownEntry(String),
    #[error("date must be formatted as YYYY-MM-DD")]
    InvalidDate,
    #[error("kilometers must be a non-negative number")]
    InvalidKilometers,
    #[error("current mileage must be a valid non-negative number")]
    InvalidMileage,
    #[error("task name is required")]
    TaskNameRequired,
    #[error("add at least one named subtask")]
    SubtaskRequired,
    #[error("subtask name is required")]
    SubtaskNameRequired,
    #[error("unknown task: {0}")]
    UnknownTask(String),
    #[error("unknown subtask: {0}")]
    UnknownSubtask(String),
    #[error("enter at least one part")]
    PartsRequired,
}

pub type ValidationResult<T> = Result<T, ValidationError>;
