//! Core domain logic for TaskNest, a personal task manager.
//! This crate is the single source of truth for business invariants.

pub mod backend;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod validate;

pub use backend::{AuthState, SessionBackend, LOCAL_USER_ID};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::bucket::{Bucket, DEFAULT_BUCKET_COLOR, DEFAULT_BUCKET_NAME};
pub use model::task::{
    BucketId, Effort, Priority, RecurrenceInterval, Subtask, SubtaskId, Task, TaskId, UserId,
};
pub use model::ValidationError;
pub use repo::bucket_repo::{BucketRepository, SqliteBucketRepository};
pub use repo::local_store::{
    LocalBucketRepository, LocalStore, LocalTaskRepository, BUCKETS_FILE, TASKS_FILE,
};
pub use repo::task_repo::{
    BucketFilter, SqliteTaskRepository, TaskListQuery, TaskRepository,
};
pub use repo::{RepoError, RepoResult};
pub use service::bucket_service::{BucketService, BucketServiceError};
pub use service::task_service::{NewTaskRequest, TaskService, TaskServiceError};
pub use validate::{
    password_strength, validate_email, validate_length, PasswordStrength, StrengthLabel,
    ValidationReport,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
