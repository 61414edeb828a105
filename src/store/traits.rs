//! `Database` trait: single async interface for backend persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DatabaseError;
use crate::fields::FieldId;
use crate::layout::{BucketId, StepConfiguration};
use crate::profile::{ProfileFields, ProfileUpdate, UserSummary};

/// A persisted user row.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub current_step: u8,
    pub profile: ProfileFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredUser> for UserSummary {
    fn from(user: StoredUser) -> Self {
        Self {
            email: user.email,
            current_step: user.current_step,
            profile: user.profile,
            created_at: Some(user.created_at),
            updated_at: Some(user.updated_at),
        }
    }
}

/// Backend-agnostic database trait covering the step layout and users.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    // ── Layout ──────────────────────────────────────────────────────

    /// Load every stored bucket.
    async fn load_layout(&self) -> Result<StepConfiguration, DatabaseError>;

    /// Overwrite one bucket's field sequence.
    async fn save_bucket(&self, bucket: BucketId, fields: &[FieldId]) -> Result<(), DatabaseError>;

    // ── Users ───────────────────────────────────────────────────────

    /// Look up a user by email.
    async fn find_user(&self, email: &str) -> Result<Option<StoredUser>, DatabaseError>;

    /// Insert a new user at `current_step`.
    ///
    /// Returns [`DatabaseError::Constraint`] if the email is taken.
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        current_step: u8,
    ) -> Result<(), DatabaseError>;

    /// Overwrite a user's step and profile. Returns `false` if no such user.
    async fn update_progress(&self, update: &ProfileUpdate) -> Result<bool, DatabaseError>;

    /// All users, oldest first.
    async fn list_users(&self) -> Result<Vec<StoredUser>, DatabaseError>;
}
