//! Auth-state-driven backend selection.
//!
//! # Responsibility
//! - Map session auth state to one of the two storage backends.
//! - Own the fixed identity used by anonymous local-only sessions.
//!
//! # Invariants
//! - Authenticated sessions use the hosted SQLite store.
//! - Anonymous sessions use the device-local JSON store; their data lives
//!   only in local files.
//! - Backend selection happens once at startup, not per operation.

use crate::db::open_db;
use crate::model::task::UserId;
use crate::repo::bucket_repo::SqliteBucketRepository;
use crate::repo::local_store::{LocalBucketRepository, LocalStore, LocalTaskRepository};
use crate::repo::task_repo::SqliteTaskRepository;
use crate::repo::RepoResult;
use log::info;
use rusqlite::Connection;
use std::path::Path;
use uuid::Uuid;

const HOSTED_DB_FILE: &str = "tasknest.db";

/// Fixed owner id for anonymous local-only data.
pub const LOCAL_USER_ID: UserId = Uuid::nil();

/// Session authentication state, decided by the (out of scope) auth
/// provider before the core is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Authenticated { user_id: UserId },
    Anonymous,
}

impl AuthState {
    /// Owner id every repository for this session is scoped to.
    pub fn user_id(&self) -> UserId {
        match self {
            Self::Authenticated { user_id } => *user_id,
            Self::Anonymous => LOCAL_USER_ID,
        }
    }
}

/// Storage backend selected for one session.
///
/// Callers match on the variant and build repositories via the
/// `*_task_repo`/`*_bucket_repo` constructors; services stay generic over
/// the repository traits.
pub enum SessionBackend {
    Hosted(Connection),
    Local(LocalStore),
}

impl SessionBackend {
    /// Opens the backend matching the session's auth state.
    ///
    /// Hosted sessions open (and migrate) the SQLite file under `data_dir`;
    /// anonymous sessions open the JSON local store in the same directory.
    pub fn open(auth: &AuthState, data_dir: impl AsRef<Path>) -> RepoResult<Self> {
        match auth {
            AuthState::Authenticated { user_id } => {
                info!(
                    "event=backend_select module=backend status=ok mode=hosted user_id={user_id}"
                );
                let conn = open_db(data_dir.as_ref().join(HOSTED_DB_FILE))?;
                Ok(Self::Hosted(conn))
            }
            AuthState::Anonymous => {
                info!("event=backend_select module=backend status=ok mode=local");
                let store = LocalStore::open(data_dir)?;
                Ok(Self::Local(store))
            }
        }
    }

    pub fn is_hosted(&self) -> bool {
        matches!(self, Self::Hosted(_))
    }
}

/// Builds a hosted task repository scoped to `user_id`.
pub fn hosted_task_repo(conn: &Connection, user_id: UserId) -> RepoResult<SqliteTaskRepository<'_>> {
    SqliteTaskRepository::try_new(conn, user_id)
}

/// Builds a hosted bucket repository scoped to `user_id`.
pub fn hosted_bucket_repo(
    conn: &Connection,
    user_id: UserId,
) -> RepoResult<SqliteBucketRepository<'_>> {
    SqliteBucketRepository::try_new(conn, user_id)
}

/// Builds a local task repository for the anonymous owner.
pub fn local_task_repo(store: &LocalStore) -> LocalTaskRepository {
    LocalTaskRepository::new(store.clone(), LOCAL_USER_ID)
}

/// Builds a local bucket repository for the anonymous owner.
pub fn local_bucket_repo(store: &LocalStore) -> LocalBucketRepository {
    LocalBucketRepository::new(store.clone(), LOCAL_USER_ID)
}

#[cfg(test)]
mod tests {
    use super::{AuthState, SessionBackend, LOCAL_USER_ID};
    use uuid::Uuid;

    #[test]
    fn auth_state_maps_to_owner_id() {
        let user_id = Uuid::new_v4();
        assert_eq!(AuthState::Authenticated { user_id }.user_id(), user_id);
        assert_eq!(AuthState::Anonymous.user_id(), LOCAL_USER_ID);
    }

    #[test]
    fn anonymous_sessions_get_the_local_backend() {
        let dir = std::env::temp_dir().join(format!(
            "tasknest-backend-test-{}-{}",
            std::process::id(),
            Uuid::new_v4()
        ));
        let backend = SessionBackend::open(&AuthState::Anonymous, &dir).unwrap();
        assert!(!backend.is_hosted());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn authenticated_sessions_get_the_hosted_backend() {
        let dir = std::env::temp_dir().join(format!(
            "tasknest-backend-test-{}-{}",
            std::process::id(),
            Uuid::new_v4()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let auth = AuthState::Authenticated {
            user_id: Uuid::new_v4(),
        };
        let backend = SessionBackend::open(&auth, &dir).unwrap();
        assert!(backend.is_hosted());
        drop(backend);
        std::fs::remove_dir_all(&dir).ok();
    }
}
