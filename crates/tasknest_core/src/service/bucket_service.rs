//! Bucket use-case service.
//!
//! # Responsibility
//! - Provide create/rename/recolor/reorder/delete entry points for buckets.
//! - Guarantee the owner's default "General" bucket exists and survives.
//!
//! # Invariants
//! - Exactly one default bucket per owner; deleting it is rejected.
//! - Deleting a non-default bucket reassigns its tasks to the default
//!   bucket and never deletes tasks.
//! - After any reorder or delete, bucket positions are dense from 0.

use crate::model::bucket::Bucket;
use crate::model::task::{BucketId, UserId};
use crate::repo::bucket_repo::BucketRepository;
use crate::repo::task_repo::{BucketFilter, TaskListQuery, TaskRepository};
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for bucket use-cases.
#[derive(Debug)]
pub enum BucketServiceError {
    BucketNotFound(BucketId),
    /// The default bucket cannot be deleted.
    DefaultBucketProtected(BucketId),
    /// Reorder indices out of range for the owner's bucket count.
    InvalidReorder {
        from_index: usize,
        to_index: usize,
        len: usize,
    },
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for BucketServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BucketNotFound(id) => write!(f, "bucket not found: {id}"),
            Self::DefaultBucketProtected(id) => {
                write!(f, "default bucket cannot be deleted: {id}")
            }
            Self::InvalidReorder {
                from_index,
                to_index,
                len,
            } => write!(
                f,
                "reorder indices {from_index} -> {to_index} out of range for {len} buckets"
            ),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent bucket state: {details}")
            }
        }
    }
}

impl Error for BucketServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BucketServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::BucketNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Bucket service facade over bucket and task repositories.
///
/// The task repository is needed because bucket deletion reassigns the
/// bucket's tasks to the default bucket.
pub struct BucketService<B: BucketRepository, T: TaskRepository> {
    buckets: B,
    tasks: T,
    user_id: UserId,
}

impl<B: BucketRepository, T: TaskRepository> BucketService<B, T> {
    /// Creates a service using the provided repository implementations.
    pub fn new(buckets: B, tasks: T, user_id: UserId) -> Self {
        Self {
            buckets,
            tasks,
            user_id,
        }
    }

    /// Creates the owner's "General" default bucket when none exists.
    ///
    /// Idempotent; returns the existing default when present.
    pub fn ensure_default(&self) -> Result<Bucket, BucketServiceError> {
        let buckets = self.buckets.list_buckets()?;
        if let Some(existing) = buckets.into_iter().find(|bucket| bucket.is_default) {
            return Ok(existing);
        }

        let mut bucket = Bucket::new_default(self.user_id);
        bucket.position = self.next_position()?;
        let id = self.buckets.create_bucket(&bucket)?;
        info!("event=bucket_default_seed module=service status=ok bucket_id={id}");
        self.read_back(id, "default bucket not found in read-back")
    }

    /// Creates one bucket appended at the end of the owner's order.
    pub fn create_bucket(
        &self,
        name: impl Into<String>,
        color: impl Into<String>,
    ) -> Result<Bucket, BucketServiceError> {
        let mut bucket = Bucket::new(self.user_id, name, color);
        bucket.position = self.next_position()?;

        let id = self.buckets.create_bucket(&bucket)?;
        info!("event=bucket_create module=service status=ok bucket_id={id}");
        self.read_back(id, "created bucket not found in read-back")
    }

    /// Gets one bucket by stable ID.
    pub fn get_bucket(&self, id: BucketId) -> Result<Option<Bucket>, BucketServiceError> {
        Ok(self.buckets.get_bucket(id)?)
    }

    /// Lists the owner's buckets ordered by position.
    pub fn list_buckets(&self) -> Result<Vec<Bucket>, BucketServiceError> {
        Ok(self.buckets.list_buckets()?)
    }

    /// Renames one bucket.
    pub fn rename_bucket(
        &self,
        id: BucketId,
        name: impl Into<String>,
    ) -> Result<Bucket, BucketServiceError> {
        let mut bucket = self.require_bucket(id)?;
        bucket.name = name.into();
        self.buckets.update_bucket(&bucket)?;
        self.read_back(id, "renamed bucket not found in read-back")
    }

    /// Changes one bucket's color.
    pub fn recolor_bucket(
        &self,
        id: BucketId,
        color: impl Into<String>,
    ) -> Result<Bucket, BucketServiceError> {
        let mut bucket = self.require_bucket(id)?;
        bucket.color = color.into();
        self.buckets.update_bucket(&bucket)?;
        self.read_back(id, "recolored bucket not found in read-back")
    }

    /// Moves the bucket at `from_index` to `to_index`.
    ///
    /// # Contract
    /// - Resulting positions are a dense 0..n-1 permutation matching the new
    ///   sequence.
    /// - One position update is issued per affected record, sequentially.
    pub fn reorder(
        &self,
        from_index: usize,
        to_index: usize,
    ) -> Result<Vec<Bucket>, BucketServiceError> {
        let mut buckets = self.buckets.list_buckets()?;

        if from_index >= buckets.len() || to_index >= buckets.len() {
            return Err(BucketServiceError::InvalidReorder {
                from_index,
                to_index,
                len: buckets.len(),
            });
        }

        let dragged = buckets.remove(from_index);
        buckets.insert(to_index, dragged);

        for (index, bucket) in buckets.iter_mut().enumerate() {
            let position = index as u32;
            if bucket.position != position {
                self.buckets.update_position(bucket.id, position)?;
                bucket.position = position;
            }
        }

        info!(
            "event=bucket_reorder module=service status=ok from={from_index} to={to_index}"
        );
        Ok(buckets)
    }

    /// Deletes one non-default bucket.
    ///
    /// # Contract
    /// - The default bucket is rejected with `DefaultBucketProtected`.
    /// - The bucket's tasks are reassigned to the default bucket, appended
    ///   at the end of its order; no task is deleted.
    /// - Remaining buckets are renumbered densely from 0.
    pub fn delete_bucket(&self, id: BucketId) -> Result<(), BucketServiceError> {
        let bucket = self.require_bucket(id)?;
        if bucket.is_default {
            return Err(BucketServiceError::DefaultBucketProtected(id));
        }

        let orphaned = self.tasks.list_tasks(&TaskListQuery {
            bucket: BucketFilter::Bucket(Some(id)),
            ..TaskListQuery::default()
        })?;
        for mut task in orphaned {
            task.bucket_id = None;
            task.position = self.tasks.next_position(None)?;
            self.tasks.update_task(&task)?;
        }

        self.buckets.delete_bucket(id)?;

        let remaining = self.buckets.list_buckets()?;
        for (index, bucket) in remaining.iter().enumerate() {
            let position = index as u32;
            if bucket.position != position {
                self.buckets.update_position(bucket.id, position)?;
            }
        }

        info!("event=bucket_delete module=service status=ok bucket_id={id}");
        Ok(())
    }

    fn require_bucket(&self, id: BucketId) -> Result<Bucket, BucketServiceError> {
        self.buckets
            .get_bucket(id)?
            .ok_or(BucketServiceError::BucketNotFound(id))
    }

    fn read_back(
        &self,
        id: BucketId,
        details: &'static str,
    ) -> Result<Bucket, BucketServiceError> {
        self.buckets
            .get_bucket(id)?
            .ok_or(BucketServiceError::InconsistentState(details))
    }

    fn next_position(&self) -> Result<u32, BucketServiceError> {
        let buckets = self.buckets.list_buckets()?;
        Ok(buckets
            .iter()
            .map(|bucket| bucket.position + 1)
            .max()
            .unwrap_or(0))
    }
}
