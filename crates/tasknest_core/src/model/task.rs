//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record with subtasks embedded.
//! - Provide lifecycle helpers: creation defaults, duplication, recurrence.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `recurrence` is `Some` iff `recurring` is `true`.
//! - Labels are stored trimmed, lowercased and deduplicated.

use crate::model::{now_epoch_ms, ValidationError};
use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable identifier for a task.
pub type TaskId = Uuid;
/// Stable identifier for a subtask.
pub type SubtaskId = Uuid;
/// Stable identifier for a bucket.
pub type BucketId = Uuid;
/// Stable identifier for an owning user.
pub type UserId = Uuid;

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 2000;

/// Coarse urgency classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// Coarse task-size classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Quick,
    #[default]
    Medium,
    Long,
    Massive,
}

/// Repetition cadence for recurring tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceInterval {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceInterval {
    /// Returns the next due date after `date` for this cadence.
    ///
    /// Month/year steps clamp to the last valid day of the target month
    /// (Jan 31 + monthly -> Feb 28/29).
    pub fn advance(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Daily => date + Days::new(1),
            Self::Weekly => date + Days::new(7),
            Self::Monthly => date + Months::new(1),
            Self::Yearly => date + Months::new(12),
        }
    }
}

/// Checklist entry owned by exactly one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: SubtaskId,
    pub title: String,
    pub completed: bool,
}

impl Subtask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            completed: false,
        }
    }
}

/// Canonical task record.
///
/// Subtasks are embedded here; the SQLite backend projects them into their
/// own table but the domain shape stays whole-record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable global ID used for linking and reordering.
    pub id: TaskId,
    /// Owning user. Anonymous sessions use the fixed local user id.
    pub user_id: UserId,
    /// `None` denotes the owner's default bucket.
    pub bucket_id: Option<BucketId>,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub effort: Effort,
    /// Trimmed, lowercased, deduplicated.
    pub labels: Vec<String>,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    pub recurring: bool,
    /// `Some` iff `recurring`.
    pub recurrence: Option<RecurrenceInterval>,
    /// Dense 0-based order index within the task's bucket.
    pub position: u32,
    pub subtasks: Vec<Subtask>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Task {
    /// Creates a new incomplete task with a generated stable ID.
    pub fn new(user_id: UserId, title: impl Into<String>) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            user_id,
            bucket_id: None,
            title: title.into(),
            description: None,
            priority: Priority::default(),
            effort: Effort::default(),
            labels: Vec::new(),
            due_date: None,
            completed: false,
            recurring: false,
            recurrence: None,
            position: 0,
            subtasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks field-level invariants. Write paths must call this before
    /// persisting; read paths use it to reject corrupt storage.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let title_chars = self.title.chars().count();
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if title_chars > TITLE_MAX_CHARS {
            return Err(ValidationError::TitleTooLong {
                max_chars: TITLE_MAX_CHARS,
                actual: title_chars,
            });
        }
        if let Some(description) = &self.description {
            let description_chars = description.chars().count();
            if description_chars > DESCRIPTION_MAX_CHARS {
                return Err(ValidationError::DescriptionTooLong {
                    max_chars: DESCRIPTION_MAX_CHARS,
                    actual: description_chars,
                });
            }
        }
        if self.recurring && self.recurrence.is_none() {
            return Err(ValidationError::MissingRecurrenceInterval);
        }
        if !self.recurring && self.recurrence.is_some() {
            return Err(ValidationError::UnexpectedRecurrenceInterval);
        }
        for subtask in &self.subtasks {
            if subtask.title.trim().is_empty() {
                return Err(ValidationError::EmptySubtaskTitle);
            }
        }
        Ok(())
    }

    /// Returns an independent copy of this task.
    ///
    /// # Contract
    /// - Fresh ids for the copy and every subtask.
    /// - Completion reset to `false` on the copy and its subtasks.
    /// - Title gets ` (Copy)` appended.
    /// - The original is never touched; `position` is left for the caller
    ///   to assign (append-at-end).
    pub fn duplicate(&self) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            title: format!("{} (Copy)", self.title),
            completed: false,
            subtasks: self
                .subtasks
                .iter()
                .map(|subtask| Subtask {
                    id: Uuid::new_v4(),
                    title: subtask.title.clone(),
                    completed: false,
                })
                .collect(),
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }
}

/// Normalizes one label: trimmed and lowercased, `None` when blank.
pub fn normalize_label(label: &str) -> Option<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes and deduplicates a label set, sorted for stable storage.
pub fn normalize_labels(labels: &[String]) -> Vec<String> {
    let mut unique = BTreeSet::new();
    for label in labels {
        if let Some(value) = normalize_label(label) {
            unique.insert(value);
        }
    }
    unique.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::{normalize_labels, RecurrenceInterval, Subtask, Task};
    use crate::model::ValidationError;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_task_starts_incomplete_with_defaults() {
        let task = Task::new(Uuid::new_v4(), "write report");
        assert!(!task.completed);
        assert!(task.bucket_id.is_none());
        assert!(task.subtasks.is_empty());
        assert!(task.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_title() {
        let task = Task::new(Uuid::new_v4(), "   ");
        assert_eq!(task.validate(), Err(ValidationError::EmptyTitle));
    }

    #[test]
    fn validate_rejects_recurring_without_interval() {
        let mut task = Task::new(Uuid::new_v4(), "water plants");
        task.recurring = true;
        assert_eq!(
            task.validate(),
            Err(ValidationError::MissingRecurrenceInterval)
        );
    }

    #[test]
    fn validate_rejects_interval_without_recurring_flag() {
        let mut task = Task::new(Uuid::new_v4(), "one-off");
        task.recurrence = Some(RecurrenceInterval::Weekly);
        assert_eq!(
            task.validate(),
            Err(ValidationError::UnexpectedRecurrenceInterval)
        );
    }

    #[test]
    fn duplicate_resets_completion_and_renames() {
        let mut task = Task::new(Uuid::new_v4(), "ship release");
        task.completed = true;
        task.subtasks.push(Subtask::new("tag version"));
        task.subtasks[0].completed = true;

        let copy = task.duplicate();
        assert_eq!(copy.title, "ship release (Copy)");
        assert!(!copy.completed);
        assert_ne!(copy.id, task.id);
        assert_ne!(copy.subtasks[0].id, task.subtasks[0].id);
        assert!(!copy.subtasks[0].completed);
        // original untouched
        assert!(task.completed);
        assert!(task.subtasks[0].completed);
    }

    #[test]
    fn recurrence_advances_with_month_end_clamping() {
        assert_eq!(
            RecurrenceInterval::Daily.advance(date(2026, 2, 28)),
            date(2026, 3, 1)
        );
        assert_eq!(
            RecurrenceInterval::Weekly.advance(date(2026, 1, 1)),
            date(2026, 1, 8)
        );
        assert_eq!(
            RecurrenceInterval::Monthly.advance(date(2026, 1, 31)),
            date(2026, 2, 28)
        );
        assert_eq!(
            RecurrenceInterval::Yearly.advance(date(2024, 2, 29)),
            date(2025, 2, 28)
        );
    }

    #[test]
    fn labels_normalize_to_sorted_lowercase_set() {
        let labels = vec![
            " Home ".to_string(),
            "work".to_string(),
            "home".to_string(),
            "  ".to_string(),
        ];
        assert_eq!(normalize_labels(&labels), vec!["home", "work"]);
    }
}
