//! Device-local JSON store and its repository implementations.
//!
//! # Responsibility
//! - Persist whole task/bucket collections as JSON files under fixed names.
//! - Provide `TaskRepository`/`BucketRepository` implementations for
//!   anonymous sessions.
//!
//! # Invariants
//! - Every mutation rewrites the whole affected file.
//! - A file that fails to parse falls back to an empty collection with a
//!   logged warning; it is overwritten on the next successful write.
//! - Query semantics (filters, ordering) match the SQLite repositories.

use crate::model::bucket::Bucket;
use crate::model::task::{BucketId, Task, TaskId, UserId};
use crate::repo::bucket_repo::BucketRepository;
use crate::repo::task_repo::{BucketFilter, TaskListQuery, TaskRepository};
use crate::repo::{RepoError, RepoResult};
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};

pub const TASKS_FILE: &str = "tasks.json";
pub const BUCKETS_FILE: &str = "buckets.json";

/// Handle to a local data directory holding the JSON collections.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Opens (and creates if needed) the local data directory.
    pub fn open(dir: impl AsRef<Path>) -> RepoResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load_tasks(&self) -> RepoResult<Vec<Task>> {
        load_collection(&self.dir.join(TASKS_FILE))
    }

    fn save_tasks(&self, tasks: &[Task]) -> RepoResult<()> {
        save_collection(&self.dir.join(TASKS_FILE), tasks)
    }

    fn load_buckets(&self) -> RepoResult<Vec<Bucket>> {
        load_collection(&self.dir.join(BUCKETS_FILE))
    }

    fn save_buckets(&self, buckets: &[Bucket]) -> RepoResult<()> {
        save_collection(&self.dir.join(BUCKETS_FILE), buckets)
    }
}

fn load_collection<T: serde::de::DeserializeOwned>(path: &Path) -> RepoResult<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let raw = fs::read_to_string(path)?;
    match serde_json::from_str(&raw) {
        Ok(items) => Ok(items),
        Err(err) => {
            warn!(
                "event=local_store_parse module=repo status=fallback_empty file={} error={}",
                path.display(),
                err
            );
            Ok(Vec::new())
        }
    }
}

fn save_collection<T: serde::Serialize>(path: &Path, items: &[T]) -> RepoResult<()> {
    let raw = serde_json::to_string_pretty(items)?;
    fs::write(path, raw)?;
    Ok(())
}

/// JSON-file task repository scoped to one owner.
pub struct LocalTaskRepository {
    store: LocalStore,
    user_id: UserId,
}

impl LocalTaskRepository {
    pub fn new(store: LocalStore, user_id: UserId) -> Self {
        Self { store, user_id }
    }
}

impl TaskRepository for LocalTaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        let mut tasks = self.store.load_tasks()?;
        tasks.push(task.clone());
        self.store.save_tasks(&tasks)?;

        Ok(task.id)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let mut tasks = self.store.load_tasks()?;
        let slot = tasks
            .iter_mut()
            .find(|candidate| candidate.id == task.id && candidate.user_id == self.user_id)
            .ok_or(RepoError::NotFound(task.id))?;
        let mut replacement = task.clone();
        replacement.updated_at = crate::model::now_epoch_ms();
        *slot = replacement;
        self.store.save_tasks(&tasks)?;

        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let tasks = self.store.load_tasks()?;
        Ok(tasks
            .into_iter()
            .find(|task| task.id == id && task.user_id == self.user_id))
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .store
            .load_tasks()?
            .into_iter()
            .filter(|task| task.user_id == self.user_id && matches_query(task, query))
            .collect();

        // Same ordering contract as the SQLite repository.
        tasks.sort_by(|a, b| {
            let a_bucket = a.bucket_id.map(|id| id.to_string()).unwrap_or_default();
            let b_bucket = b.bucket_id.map(|id| id.to_string()).unwrap_or_default();
            a_bucket
                .cmp(&b_bucket)
                .then(a.position.cmp(&b.position))
                .then(a.id.cmp(&b.id))
        });

        let offset = query.offset as usize;
        let tasks: Vec<Task> = match query.limit {
            Some(limit) => tasks
                .into_iter()
                .skip(offset)
                .take(limit as usize)
                .collect(),
            None => tasks.into_iter().skip(offset).collect(),
        };

        Ok(tasks)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let mut tasks = self.store.load_tasks()?;
        let before = tasks.len();
        tasks.retain(|task| !(task.id == id && task.user_id == self.user_id));
        if tasks.len() == before {
            return Err(RepoError::NotFound(id));
        }
        self.store.save_tasks(&tasks)?;

        Ok(())
    }

    fn update_position(&self, id: TaskId, position: u32) -> RepoResult<()> {
        let mut tasks = self.store.load_tasks()?;
        let task = tasks
            .iter_mut()
            .find(|task| task.id == id && task.user_id == self.user_id)
            .ok_or(RepoError::NotFound(id))?;
        task.position = position;
        task.updated_at = crate::model::now_epoch_ms();
        self.store.save_tasks(&tasks)?;

        Ok(())
    }

    fn next_position(&self, bucket: Option<BucketId>) -> RepoResult<u32> {
        let tasks = self.store.load_tasks()?;
        let next = tasks
            .iter()
            .filter(|task| task.user_id == self.user_id && task.bucket_id == bucket)
            .map(|task| task.position + 1)
            .max()
            .unwrap_or(0);

        Ok(next)
    }
}

fn matches_query(task: &Task, query: &TaskListQuery) -> bool {
    match query.bucket {
        BucketFilter::Any => {}
        BucketFilter::Bucket(bucket) => {
            if task.bucket_id != bucket {
                return false;
            }
        }
    }
    if let Some(completed) = query.completed {
        if task.completed != completed {
            return false;
        }
    }
    if let Some(label) = query.label.as_ref() {
        if !task.labels.iter().any(|candidate| candidate == label) {
            return false;
        }
    }
    if query.due_from.is_some() || query.due_to.is_some() {
        let Some(due) = task.due_date else {
            return false;
        };
        if let Some(due_from) = query.due_from {
            if due < due_from {
                return false;
            }
        }
        if let Some(due_to) = query.due_to {
            if due > due_to {
                return false;
            }
        }
    }
    true
}

/// JSON-file bucket repository scoped to one owner.
pub struct LocalBucketRepository {
    store: LocalStore,
    user_id: UserId,
}

impl LocalBucketRepository {
    pub fn new(store: LocalStore, user_id: UserId) -> Self {
        Self { store, user_id }
    }
}

impl BucketRepository for LocalBucketRepository {
    fn create_bucket(&self, bucket: &Bucket) -> RepoResult<BucketId> {
        bucket.validate()?;

        let mut buckets = self.store.load_buckets()?;
        buckets.push(bucket.clone());
        self.store.save_buckets(&buckets)?;

        Ok(bucket.id)
    }

    fn update_bucket(&self, bucket: &Bucket) -> RepoResult<()> {
        bucket.validate()?;

        let mut buckets = self.store.load_buckets()?;
        let slot = buckets
            .iter_mut()
            .find(|candidate| candidate.id == bucket.id && candidate.user_id == self.user_id)
            .ok_or(RepoError::NotFound(bucket.id))?;
        let mut replacement = bucket.clone();
        replacement.updated_at = crate::model::now_epoch_ms();
        *slot = replacement;
        self.store.save_buckets(&buckets)?;

        Ok(())
    }

    fn get_bucket(&self, id: BucketId) -> RepoResult<Option<Bucket>> {
        let buckets = self.store.load_buckets()?;
        Ok(buckets
            .into_iter()
            .find(|bucket| bucket.id == id && bucket.user_id == self.user_id))
    }

    fn list_buckets(&self) -> RepoResult<Vec<Bucket>> {
        let mut buckets: Vec<Bucket> = self
            .store
            .load_buckets()?
            .into_iter()
            .filter(|bucket| bucket.user_id == self.user_id)
            .collect();
        buckets.sort_by(|a, b| a.position.cmp(&b.position).then(a.id.cmp(&b.id)));

        Ok(buckets)
    }

    fn delete_bucket(&self, id: BucketId) -> RepoResult<()> {
        let mut buckets = self.store.load_buckets()?;
        let before = buckets.len();
        buckets.retain(|bucket| !(bucket.id == id && bucket.user_id == self.user_id));
        if buckets.len() == before {
            return Err(RepoError::NotFound(id));
        }
        self.store.save_buckets(&buckets)?;

        Ok(())
    }

    fn update_position(&self, id: BucketId, position: u32) -> RepoResult<()> {
        let mut buckets = self.store.load_buckets()?;
        let bucket = buckets
            .iter_mut()
            .find(|bucket| bucket.id == id && bucket.user_id == self.user_id)
            .ok_or(RepoError::NotFound(id))?;
        bucket.position = position;
        bucket.updated_at = crate::model::now_epoch_ms();
        self.store.save_buckets(&buckets)?;

        Ok(())
    }
}
