//! Domain model for tasks, subtasks and buckets.
//!
//! # Responsibility
//! - Define the canonical records shared by every storage backend.
//! - Own field-level validation enforced before any write.
//!
//! # Invariants
//! - Every record is identified by a stable UUID that is never reused.
//! - `bucket_id = None` on a task always denotes the owner's default bucket.
//! - Position indices are dense from 0 within their collection.

use chrono::Utc;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod bucket;
pub mod task;

/// Field-level validation failure shared by task and bucket writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyTitle,
    TitleTooLong { max_chars: usize, actual: usize },
    DescriptionTooLong { max_chars: usize, actual: usize },
    EmptySubtaskTitle,
    MissingRecurrenceInterval,
    UnexpectedRecurrenceInterval,
    EmptyBucketName,
    BucketNameTooLong { max_chars: usize, actual: usize },
    InvalidBucketColor(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title cannot be empty"),
            Self::TitleTooLong { max_chars, actual } => {
                write!(f, "task title exceeds {max_chars} chars (got {actual})")
            }
            Self::DescriptionTooLong { max_chars, actual } => {
                write!(f, "task description exceeds {max_chars} chars (got {actual})")
            }
            Self::EmptySubtaskTitle => write!(f, "subtask title cannot be empty"),
            Self::MissingRecurrenceInterval => {
                write!(f, "recurring task requires a recurrence interval")
            }
            Self::UnexpectedRecurrenceInterval => {
                write!(f, "non-recurring task must not carry a recurrence interval")
            }
            Self::EmptyBucketName => write!(f, "bucket name cannot be empty"),
            Self::BucketNameTooLong { max_chars, actual } => {
                write!(f, "bucket name exceeds {max_chars} chars (got {actual})")
            }
            Self::InvalidBucketColor(value) => {
                write!(f, "bucket color must be `#rrggbb`, got `{value}`")
            }
        }
    }
}

impl Error for ValidationError {}

/// Current wall-clock time in unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}
