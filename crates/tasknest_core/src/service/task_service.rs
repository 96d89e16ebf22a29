//! Task use-case service.
//!
//! # Responsibility
//! - Provide create/update/toggle/duplicate/reorder/move entry points.
//! - Provide calendar grouping and the random-task picker.
//!
//! # Invariants
//! - After any reorder, positions within the affected bucket are a dense
//!   0..n-1 permutation matching the new sequence.
//! - Duplication never mutates the original task.
//! - Service APIs never bypass repository validation contracts.

use crate::model::task::{
    normalize_labels, BucketId, Effort, Priority, RecurrenceInterval, Subtask, SubtaskId, Task,
    TaskId, UserId,
};
use crate::repo::task_repo::{BucketFilter, TaskListQuery, TaskRepository};
use crate::repo::RepoError;
use chrono::{Datelike, Days, Months, NaiveDate};
use log::info;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for task use-cases.
#[derive(Debug)]
pub enum TaskServiceError {
    TaskNotFound(TaskId),
    SubtaskNotFound(SubtaskId),
    /// Reorder indices out of range for the bucket's task count.
    InvalidReorder {
        from_index: usize,
        to_index: usize,
        len: usize,
    },
    InvalidCalendarMonth {
        year: i32,
        month: u32,
    },
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::SubtaskNotFound(id) => write!(f, "subtask not found: {id}"),
            Self::InvalidReorder {
                from_index,
                to_index,
                len,
            } => write!(
                f,
                "reorder indices {from_index} -> {to_index} out of range for {len} tasks"
            ),
            Self::InvalidCalendarMonth { year, month } => {
                write!(f, "invalid calendar month: {year}-{month}")
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent task state: {details}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::TaskNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Request model for creating one task.
#[derive(Debug, Clone, Default)]
pub struct NewTaskRequest {
    pub title: String,
    pub description: Option<String>,
    /// `None` targets the default bucket.
    pub bucket_id: Option<BucketId>,
    pub priority: Priority,
    pub effort: Effort,
    pub labels: Vec<String>,
    pub due_date: Option<NaiveDate>,
    pub recurrence: Option<RecurrenceInterval>,
}

/// Task service facade over repository implementations.
pub struct TaskService<R: TaskRepository> {
    repo: R,
    user_id: UserId,
}

impl<R: TaskRepository> TaskService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R, user_id: UserId) -> Self {
        Self { repo, user_id }
    }

    /// Creates one task appended at the end of its bucket's order.
    pub fn create_task(&self, request: NewTaskRequest) -> Result<Task, TaskServiceError> {
        let mut task = Task::new(self.user_id, request.title);
        task.description = request.description;
        task.bucket_id = request.bucket_id;
        task.priority = request.priority;
        task.effort = request.effort;
        task.labels = normalize_labels(&request.labels);
        task.due_date = request.due_date;
        task.recurring = request.recurrence.is_some();
        task.recurrence = request.recurrence;
        task.position = self.repo.next_position(task.bucket_id)?;

        let id = self.repo.create_task(&task)?;
        info!(
            "event=task_create module=service status=ok task_id={} bucket={:?}",
            id, task.bucket_id
        );
        self.read_back(id, "created task not found in read-back")
    }

    /// Full-record replacement with label normalization.
    pub fn update_task(&self, mut task: Task) -> Result<Task, TaskServiceError> {
        task.labels = normalize_labels(&task.labels);
        task.recurring = task.recurrence.is_some();
        self.repo.update_task(&task)?;
        self.read_back(task.id, "updated task not found in read-back")
    }

    /// Gets one task by stable ID.
    pub fn get_task(&self, id: TaskId) -> Result<Option<Task>, TaskServiceError> {
        Ok(self.repo.get_task(id)?)
    }

    /// Lists tasks using the repository query contract.
    pub fn list_tasks(&self, query: &TaskListQuery) -> Result<Vec<Task>, TaskServiceError> {
        Ok(self.repo.list_tasks(query)?)
    }

    /// Deletes one task permanently.
    pub fn delete_task(&self, id: TaskId) -> Result<(), TaskServiceError> {
        self.repo.delete_task(id)?;
        info!("event=task_delete module=service status=ok task_id={id}");
        Ok(())
    }

    /// Flips the completion flag.
    ///
    /// # Contract
    /// - Completing a recurring task that has a due date instead advances
    ///   the due date by its interval and leaves the task incomplete.
    pub fn toggle_completed(&self, id: TaskId) -> Result<Task, TaskServiceError> {
        let mut task = self.require_task(id)?;

        match (task.completed, task.recurrence, task.due_date) {
            (false, Some(interval), Some(due)) => {
                task.due_date = Some(interval.advance(due));
            }
            _ => task.completed = !task.completed,
        }

        self.repo.update_task(&task)?;
        self.read_back(id, "toggled task not found in read-back")
    }

    /// Clones one task with fresh ids, appended at the end of its bucket.
    ///
    /// The copy's title gets ` (Copy)` appended and completion is reset on
    /// the copy and all of its subtasks. The original is never mutated.
    pub fn duplicate_task(&self, id: TaskId) -> Result<Task, TaskServiceError> {
        let original = self.require_task(id)?;
        let mut copy = original.duplicate();
        copy.position = self.repo.next_position(copy.bucket_id)?;

        let copy_id = self.repo.create_task(&copy)?;
        info!(
            "event=task_duplicate module=service status=ok source_id={id} copy_id={copy_id}"
        );
        self.read_back(copy_id, "duplicated task not found in read-back")
    }

    /// Moves one task at `from_index` to `to_index` within a bucket.
    ///
    /// # Contract
    /// - Resulting positions are a dense 0..n-1 permutation matching the new
    ///   sequence.
    /// - One position update is issued per affected record, sequentially;
    ///   partial failure mid-reorder leaves inconsistent indices.
    pub fn reorder(
        &self,
        bucket: Option<BucketId>,
        from_index: usize,
        to_index: usize,
    ) -> Result<Vec<Task>, TaskServiceError> {
        let mut tasks = self.repo.list_tasks(&TaskListQuery {
            bucket: BucketFilter::Bucket(bucket),
            ..TaskListQuery::default()
        })?;

        if from_index >= tasks.len() || to_index >= tasks.len() {
            return Err(TaskServiceError::InvalidReorder {
                from_index,
                to_index,
                len: tasks.len(),
            });
        }

        let dragged = tasks.remove(from_index);
        tasks.insert(to_index, dragged);

        for (index, task) in tasks.iter_mut().enumerate() {
            let position = index as u32;
            if task.position != position {
                self.repo.update_position(task.id, position)?;
                task.position = position;
            }
        }

        info!(
            "event=task_reorder module=service status=ok bucket={:?} from={from_index} to={to_index}",
            bucket
        );
        Ok(tasks)
    }

    /// Reassigns one task to another bucket, appended at the end of the
    /// target's order; the source bucket is renumbered densely.
    pub fn move_to_bucket(
        &self,
        id: TaskId,
        target: Option<BucketId>,
    ) -> Result<Task, TaskServiceError> {
        let mut task = self.require_task(id)?;
        if task.bucket_id == target {
            return Ok(task);
        }

        let source = task.bucket_id;
        task.bucket_id = target;
        task.position = self.repo.next_position(target)?;
        self.repo.update_task(&task)?;

        self.renumber_bucket(source)?;
        self.read_back(id, "moved task not found in read-back")
    }

    /// Appends one subtask to a task's checklist.
    pub fn add_subtask(
        &self,
        task_id: TaskId,
        title: impl Into<String>,
    ) -> Result<Task, TaskServiceError> {
        let mut task = self.require_task(task_id)?;
        task.subtasks.push(Subtask::new(title));
        self.repo.update_task(&task)?;
        self.read_back(task_id, "task not found after subtask add")
    }

    /// Flips one subtask's completion flag.
    pub fn toggle_subtask(
        &self,
        task_id: TaskId,
        subtask_id: SubtaskId,
    ) -> Result<Task, TaskServiceError> {
        let mut task = self.require_task(task_id)?;
        let subtask = task
            .subtasks
            .iter_mut()
            .find(|subtask| subtask.id == subtask_id)
            .ok_or(TaskServiceError::SubtaskNotFound(subtask_id))?;
        subtask.completed = !subtask.completed;

        self.repo.update_task(&task)?;
        self.read_back(task_id, "task not found after subtask toggle")
    }

    /// Removes one subtask from a task's checklist.
    pub fn remove_subtask(
        &self,
        task_id: TaskId,
        subtask_id: SubtaskId,
    ) -> Result<Task, TaskServiceError> {
        let mut task = self.require_task(task_id)?;
        let before = task.subtasks.len();
        task.subtasks.retain(|subtask| subtask.id != subtask_id);
        if task.subtasks.len() == before {
            return Err(TaskServiceError::SubtaskNotFound(subtask_id));
        }

        self.repo.update_task(&task)?;
        self.read_back(task_id, "task not found after subtask removal")
    }

    /// Lists tasks due on exactly one calendar date.
    pub fn tasks_due_on(&self, date: NaiveDate) -> Result<Vec<Task>, TaskServiceError> {
        Ok(self.repo.list_tasks(&TaskListQuery {
            due_from: Some(date),
            due_to: Some(date),
            ..TaskListQuery::default()
        })?)
    }

    /// Groups one month's tasks by due date for calendar rendering.
    pub fn tasks_by_day(
        &self,
        year: i32,
        month: u32,
    ) -> Result<BTreeMap<NaiveDate, Vec<Task>>, TaskServiceError> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(TaskServiceError::InvalidCalendarMonth { year, month })?;
        let last = first + Months::new(1) - Days::new(1);

        let tasks = self.repo.list_tasks(&TaskListQuery {
            due_from: Some(first),
            due_to: Some(last),
            ..TaskListQuery::default()
        })?;

        let mut by_day: BTreeMap<NaiveDate, Vec<Task>> = BTreeMap::new();
        for task in tasks {
            let Some(due) = task.due_date else {
                return Err(TaskServiceError::InconsistentState(
                    "due-range query returned task without due date",
                ));
            };
            debug_assert_eq!(due.month(), month);
            by_day.entry(due).or_default().push(task);
        }

        Ok(by_day)
    }

    /// Picks one incomplete task uniformly at random among query matches.
    ///
    /// Returns `None` when nothing matches.
    pub fn pick_random(&self, query: &TaskListQuery) -> Result<Option<Task>, TaskServiceError> {
        let candidates = self.repo.list_tasks(&TaskListQuery {
            completed: Some(false),
            ..query.clone()
        })?;

        Ok(candidates.choose(&mut rand::thread_rng()).cloned())
    }

    fn require_task(&self, id: TaskId) -> Result<Task, TaskServiceError> {
        self.repo
            .get_task(id)?
            .ok_or(TaskServiceError::TaskNotFound(id))
    }

    fn read_back(
        &self,
        id: TaskId,
        details: &'static str,
    ) -> Result<Task, TaskServiceError> {
        self.repo
            .get_task(id)?
            .ok_or(TaskServiceError::InconsistentState(details))
    }

    /// Renumbers one bucket's tasks densely from 0, issuing one update per
    /// displaced record.
    fn renumber_bucket(&self, bucket: Option<BucketId>) -> Result<(), TaskServiceError> {
        let tasks = self.repo.list_tasks(&TaskListQuery {
            bucket: BucketFilter::Bucket(bucket),
            ..TaskListQuery::default()
        })?;
        for (index, task) in tasks.iter().enumerate() {
            let position = index as u32;
            if task.position != position {
                self.repo.update_position(task.id, position)?;
            }
        }

        Ok(())
    }
}
