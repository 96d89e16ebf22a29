//! Bucket domain model.
//!
//! # Responsibility
//! - Define the user-defined task grouping record.
//! - Own the default-bucket ("General") construction rules.
//!
//! # Invariants
//! - Exactly one bucket per owner carries `is_default = true`.
//! - Color is a `#rrggbb` hex triplet.

use crate::model::task::{BucketId, UserId};
use crate::model::{now_epoch_ms, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const BUCKET_NAME_MAX_CHARS: usize = 60;
pub const DEFAULT_BUCKET_NAME: &str = "General";
pub const DEFAULT_BUCKET_COLOR: &str = "#6b7280";

static COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid color regex"));

/// User-defined task grouping. One default bucket always exists per owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub id: BucketId,
    pub user_id: UserId,
    pub name: String,
    /// `#rrggbb` hex triplet.
    pub color: String,
    /// Dense 0-based order index among the owner's buckets.
    pub position: u32,
    pub is_default: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Bucket {
    /// Creates a non-default bucket with a generated stable ID.
    pub fn new(user_id: UserId, name: impl Into<String>, color: impl Into<String>) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            color: color.into(),
            position: 0,
            is_default: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates the owner's "General" default bucket.
    pub fn new_default(user_id: UserId) -> Self {
        let mut bucket = Self::new(user_id, DEFAULT_BUCKET_NAME, DEFAULT_BUCKET_COLOR);
        bucket.is_default = true;
        bucket
    }

    /// Checks field-level invariants before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyBucketName);
        }
        let name_chars = self.name.chars().count();
        if name_chars > BUCKET_NAME_MAX_CHARS {
            return Err(ValidationError::BucketNameTooLong {
                max_chars: BUCKET_NAME_MAX_CHARS,
                actual: name_chars,
            });
        }
        if !COLOR_RE.is_match(&self.color) {
            return Err(ValidationError::InvalidBucketColor(self.color.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Bucket, DEFAULT_BUCKET_COLOR, DEFAULT_BUCKET_NAME};
    use crate::model::ValidationError;
    use uuid::Uuid;

    #[test]
    fn default_bucket_is_general_and_valid() {
        let bucket = Bucket::new_default(Uuid::new_v4());
        assert_eq!(bucket.name, DEFAULT_BUCKET_NAME);
        assert_eq!(bucket.color, DEFAULT_BUCKET_COLOR);
        assert!(bucket.is_default);
        assert!(bucket.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_color() {
        let bucket = Bucket::new(Uuid::new_v4(), "Errands", "red");
        assert_eq!(
            bucket.validate(),
            Err(ValidationError::InvalidBucketColor("red".to_string()))
        );
    }

    #[test]
    fn validate_rejects_blank_name() {
        let bucket = Bucket::new(Uuid::new_v4(), "  ", "#a1b2c3");
        assert_eq!(bucket.validate(), Err(ValidationError::EmptyBucketName));
    }
}
