//! Bucket repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD + ordering APIs over `buckets` storage.
//!
//! # Invariants
//! - Write paths call `Bucket::validate()` before SQL mutations.
//! - Deletion is a hard delete; task reassignment to the default bucket is
//!   the bucket service's job and must happen first.
//! - Every statement is scoped by `user_id`.

use crate::model::bucket::Bucket;
use crate::model::task::{BucketId, UserId};
use crate::repo::task_repo::{bool_to_int, int_to_bool, parse_position, parse_uuid};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const BUCKET_SELECT_SQL: &str = "SELECT
    uuid,
    user_id,
    name,
    color,
    position,
    is_default,
    created_at,
    updated_at
FROM buckets";

/// Repository interface for bucket CRUD and ordering operations.
pub trait BucketRepository {
    fn create_bucket(&self, bucket: &Bucket) -> RepoResult<BucketId>;
    fn update_bucket(&self, bucket: &Bucket) -> RepoResult<()>;
    fn get_bucket(&self, id: BucketId) -> RepoResult<Option<Bucket>>;
    /// Results are ordered by position.
    fn list_buckets(&self) -> RepoResult<Vec<Bucket>>;
    fn delete_bucket(&self, id: BucketId) -> RepoResult<()>;
    /// Persists one position index. Reorder flows call this per affected
    /// record, sequentially.
    fn update_position(&self, id: BucketId, position: u32) -> RepoResult<()>;
}

/// SQLite-backed bucket repository scoped to one owner.
pub struct SqliteBucketRepository<'conn> {
    conn: &'conn Connection,
    user_id: UserId,
}

impl<'conn> SqliteBucketRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection, user_id: UserId) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn, user_id })
    }
}

impl BucketRepository for SqliteBucketRepository<'_> {
    fn create_bucket(&self, bucket: &Bucket) -> RepoResult<BucketId> {
        bucket.validate()?;

        self.conn.execute(
            "INSERT INTO buckets (
                uuid,
                user_id,
                name,
                color,
                position,
                is_default,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                bucket.id.to_string(),
                self.user_id.to_string(),
                bucket.name.as_str(),
                bucket.color.as_str(),
                i64::from(bucket.position),
                bool_to_int(bucket.is_default),
                bucket.created_at,
                bucket.updated_at,
            ],
        )?;

        Ok(bucket.id)
    }

    fn update_bucket(&self, bucket: &Bucket) -> RepoResult<()> {
        bucket.validate()?;

        let changed = self.conn.execute(
            "UPDATE buckets
             SET
                name = ?1,
                color = ?2,
                position = ?3,
                is_default = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?5 AND user_id = ?6;",
            params![
                bucket.name.as_str(),
                bucket.color.as_str(),
                i64::from(bucket.position),
                bool_to_int(bucket.is_default),
                bucket.id.to_string(),
                self.user_id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(bucket.id));
        }

        Ok(())
    }

    fn get_bucket(&self, id: BucketId) -> RepoResult<Option<Bucket>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BUCKET_SELECT_SQL}
             WHERE uuid = ?1 AND user_id = ?2;"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), self.user_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_bucket_row(row)?));
        }

        Ok(None)
    }

    fn list_buckets(&self) -> RepoResult<Vec<Bucket>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BUCKET_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY position ASC, uuid ASC;"
        ))?;

        let mut rows = stmt.query([self.user_id.to_string()])?;
        let mut buckets = Vec::new();
        while let Some(row) = rows.next()? {
            buckets.push(parse_bucket_row(row)?);
        }

        Ok(buckets)
    }

    fn delete_bucket(&self, id: BucketId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM buckets WHERE uuid = ?1 AND user_id = ?2;",
            params![id.to_string(), self.user_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn update_position(&self, id: BucketId, position: u32) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE buckets
             SET
                position = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?2 AND user_id = ?3;",
            params![
                i64::from(position),
                id.to_string(),
                self.user_id.to_string()
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn parse_bucket_row(row: &Row<'_>) -> RepoResult<Bucket> {
    let uuid_text: String = row.get("uuid")?;
    let user_text: String = row.get("user_id")?;

    let bucket = Bucket {
        id: parse_uuid(&uuid_text, "buckets.uuid")?,
        user_id: parse_uuid(&user_text, "buckets.user_id")?,
        name: row.get("name")?,
        color: row.get("color")?,
        position: parse_position(row.get("position")?, "buckets.position")?,
        is_default: int_to_bool(row.get("is_default")?, "buckets.is_default")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    bucket.validate()?;
    Ok(bucket)
}
