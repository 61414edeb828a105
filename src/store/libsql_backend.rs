//! libSQL backend: async `Database` trait implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info, warn};

use crate::error::DatabaseError;
use crate::fields::FieldId;
use crate::layout::{BucketId, StepConfiguration};
use crate::profile::{ProfileFields, ProfileUpdate};
use crate::store::migrations;
use crate::store::traits::{Database, StoredUser};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Convert `Option<&str>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

const USER_COLUMNS: &str = "email, password_hash, current_step, \
    about_me, street_address, city, state, zip, birthdate, created_at, updated_at";

/// Map a libsql Row to a StoredUser.
fn row_to_user(row: &libsql::Row) -> Result<StoredUser, libsql::Error> {
    let step: i64 = row.get(2)?;
    let created_str: String = row.get(9)?;
    let updated_str: String = row.get(10)?;

    Ok(StoredUser {
        email: row.get(0)?,
        password_hash: row.get(1)?,
        current_step: u8::try_from(step).unwrap_or(1),
        profile: ProfileFields {
            about_me: row.get::<String>(3).ok(),
            street_address: row.get::<String>(4).ok(),
            city: row.get::<String>(5).ok(),
            state: row.get::<String>(6).ok(),
            zip: row.get::<String>(7).ok(),
            birthdate: row.get::<String>(8).ok(),
        },
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Layout ──────────────────────────────────────────────────────

    async fn load_layout(&self) -> Result<StepConfiguration, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT bucket, components FROM layout_buckets ORDER BY bucket", ())
            .await
            .map_err(|e| DatabaseError::Query(format!("load_layout: {e}")))?;

        let mut layout = StepConfiguration::new();
        while let Ok(Some(row)) = rows.next().await {
            let number: i64 = row
                .get(0)
                .map_err(|e| DatabaseError::Query(format!("load_layout row: {e}")))?;
            let components: String = row
                .get(1)
                .map_err(|e| DatabaseError::Query(format!("load_layout row: {e}")))?;

            let Some(bucket) = u8::try_from(number)
                .ok()
                .and_then(|n| BucketId::try_from(n).ok())
            else {
                warn!(bucket = number, "Skipping stored layout for a non-configurable step");
                continue;
            };
            let fields: Vec<FieldId> = serde_json::from_str(&components).map_err(|e| {
                DatabaseError::Serialization(format!("layout bucket {bucket}: {e}"))
            })?;
            layout.set_bucket(bucket, fields);
        }
        Ok(layout)
    }

    async fn save_bucket(&self, bucket: BucketId, fields: &[FieldId]) -> Result<(), DatabaseError> {
        let components = serde_json::to_string(fields)
            .map_err(|e| DatabaseError::Serialization(format!("layout bucket {bucket}: {e}")))?;
        let now = Utc::now().to_rfc3339();

        self.conn()
            .execute(
                "INSERT INTO layout_buckets (bucket, components, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(bucket) DO UPDATE
                 SET components = excluded.components, updated_at = excluded.updated_at",
                params![bucket.number() as i64, components, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_bucket: {e}")))?;

        debug!(%bucket, count = fields.len(), "Layout bucket saved");
        Ok(())
    }

    // ── Users ───────────────────────────────────────────────────────

    async fn find_user(&self, email: &str) -> Result<Option<StoredUser>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
        let mut rows = self
            .conn()
            .query(&sql, params![email])
            .await
            .map_err(|e| DatabaseError::Query(format!("find_user: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let user = row_to_user(&row)
                    .map_err(|e| DatabaseError::Query(format!("find_user row: {e}")))?;
                Ok(Some(user))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("find_user next: {e}"))),
        }
    }

    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        current_step: u8,
    ) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let inserted = self
            .conn()
            .execute(
                "INSERT OR IGNORE INTO users
                 (email, password_hash, current_step, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![email, password_hash, current_step as i64, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("create_user: {e}")))?;

        if inserted == 0 {
            return Err(DatabaseError::Constraint(format!(
                "user {email} already exists"
            )));
        }
        info!(email, "User registered");
        Ok(())
    }

    async fn update_progress(&self, update: &ProfileUpdate) -> Result<bool, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let profile = &update.profile;

        // Absent attributes keep their stored value.
        let changed = self
            .conn()
            .execute(
                "UPDATE users SET
                    current_step = ?1,
                    about_me = COALESCE(?2, about_me),
                    street_address = COALESCE(?3, street_address),
                    city = COALESCE(?4, city),
                    state = COALESCE(?5, state),
                    zip = COALESCE(?6, zip),
                    birthdate = COALESCE(?7, birthdate),
                    updated_at = ?8
                 WHERE email = ?9",
                params![
                    update.current_step as i64,
                    opt_text(profile.about_me.as_deref()),
                    opt_text(profile.street_address.as_deref()),
                    opt_text(profile.city.as_deref()),
                    opt_text(profile.state.as_deref()),
                    opt_text(profile.zip.as_deref()),
                    opt_text(profile.birthdate.as_deref()),
                    now,
                    update.email.as_str()
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_progress: {e}")))?;

        Ok(changed > 0)
    }

    async fn list_users(&self) -> Result<Vec<StoredUser>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC");
        let mut rows = self
            .conn()
            .query(&sql, ())
            .await
            .map_err(|e| DatabaseError::Query(format!("list_users: {e}")))?;

        let mut users = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_user(&row) {
                Ok(user) => users.push(user),
                Err(e) => warn!(error = %e, "Skipping unreadable user row"),
            }
        }
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    fn ids(items: &[&str]) -> Vec<FieldId> {
        items.iter().map(|s| FieldId::new(*s)).collect()
    }

    // ── Layout tests ────────────────────────────────────────────────

    #[tokio::test]
    async fn fresh_database_has_default_layout() {
        let db = test_db().await;
        let layout = db.load_layout().await.unwrap();
        assert_eq!(layout, StepConfiguration::default_layout());
    }

    #[tokio::test]
    async fn save_bucket_overwrites_only_that_bucket() {
        let db = test_db().await;
        db.save_bucket(BucketId::Step3, &ids(&["BirthdatePicker", "AboutMe"]))
            .await
            .unwrap();

        let layout = db.load_layout().await.unwrap();
        assert_eq!(layout.bucket(BucketId::Step3), ids(&["BirthdatePicker", "AboutMe"]));
        assert_eq!(layout.bucket(BucketId::Step2), ids(&["AboutMe", "AddressForm"]));
    }

    #[tokio::test]
    async fn unknown_components_round_trip_untouched() {
        let db = test_db().await;
        db.save_bucket(BucketId::Step2, &ids(&["AboutMe", "Mystery"]))
            .await
            .unwrap();
        let layout = db.load_layout().await.unwrap();
        assert_eq!(layout.bucket(BucketId::Step2), ids(&["AboutMe", "Mystery"]));
    }

    // ── User tests ──────────────────────────────────────────────────

    #[tokio::test]
    async fn create_and_find_user() {
        let db = test_db().await;
        db.create_user("a@b.co", "$argon2id$hash", 2).await.unwrap();

        let user = db.find_user("a@b.co").await.unwrap().unwrap();
        assert_eq!(user.email, "a@b.co");
        assert_eq!(user.password_hash, "$argon2id$hash");
        assert_eq!(user.current_step, 2);
        assert_eq!(user.profile, ProfileFields::default());
    }

    #[tokio::test]
    async fn find_user_not_found() {
        let db = test_db().await;
        assert!(db.find_user("nobody@b.co").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_user_is_a_constraint_error() {
        let db = test_db().await;
        db.create_user("a@b.co", "h1", 2).await.unwrap();
        let err = db.create_user("a@b.co", "h2", 2).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Constraint(_)));

        let user = db.find_user("a@b.co").await.unwrap().unwrap();
        assert_eq!(user.password_hash, "h1");
    }

    #[tokio::test]
    async fn update_progress_keeps_absent_attributes() {
        let db = test_db().await;
        db.create_user("a@b.co", "h", 2).await.unwrap();

        let mut profile = ProfileFields {
            about_me: Some("hi".into()),
            street_address: Some("1 Main St".into()),
            ..Default::default()
        };
        let update = ProfileUpdate {
            email: "a@b.co".into(),
            current_step: 3,
            profile: profile.clone(),
        };
        assert!(db.update_progress(&update).await.unwrap());

        profile.about_me = None;
        profile.birthdate = Some("1990-01-01".into());
        let update = ProfileUpdate {
            email: "a@b.co".into(),
            current_step: 3,
            profile,
        };
        assert!(db.update_progress(&update).await.unwrap());

        let user = db.find_user("a@b.co").await.unwrap().unwrap();
        assert_eq!(user.current_step, 3);
        assert_eq!(user.profile.about_me.as_deref(), Some("hi"));
        assert_eq!(user.profile.street_address.as_deref(), Some("1 Main St"));
        assert_eq!(user.profile.birthdate.as_deref(), Some("1990-01-01"));
        assert!(user.updated_at >= user.created_at);
    }

    #[tokio::test]
    async fn update_progress_unknown_user() {
        let db = test_db().await;
        let update = ProfileUpdate {
            email: "ghost@b.co".into(),
            current_step: 3,
            profile: ProfileFields::default(),
        };
        assert!(!db.update_progress(&update).await.unwrap());
    }

    #[tokio::test]
    async fn list_users_oldest_first() {
        let db = test_db().await;
        db.create_user("first@b.co", "h", 2).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        db.create_user("second@b.co", "h", 2).await.unwrap();

        let users = db.list_users().await.unwrap();
        let emails: Vec<_> = users.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, vec!["first@b.co", "second@b.co"]);
    }
}
