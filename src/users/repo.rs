use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::users::repo_types::UserRecord;

/// Storage for user records. Lookups never return soft-deleted rows.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Any live user of `app_id` holding `username` or `email_address`,
    /// other than `exclude`.
    async fn find_by_username_or_email(
        &self,
        app_id: Uuid,
        username: &str,
        email_address: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<Option<UserRecord>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>>;

    /// Live users of an App, newest first.
    async fn list_by_app(&self, app_id: Uuid, limit: i64, offset: i64)
        -> AppResult<Vec<UserRecord>>;

    /// Insert or update by id.
    async fn save(&self, record: &UserRecord) -> AppResult<UserRecord>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const COLUMNS: &str =
    "id, app_id, username, email_address, password_hash, created_at, updated_at, deleted_at";

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_username_or_email(
        &self,
        app_id: Uuid,
        username: &str,
        email_address: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<Option<UserRecord>> {
        let sql = format!(
            r#"
            SELECT {COLUMNS}
            FROM users
            WHERE app_id = $1
              AND (username = $2 OR email_address = $3)
              AND deleted_at IS NULL
              AND ($4::uuid IS NULL OR id <> $4)
            LIMIT 1
            "#
        );
        let user = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(app_id)
            .bind(username)
            .bind(email_address)
            .bind(exclude)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>> {
        let sql = format!(
            r#"
            SELECT {COLUMNS}
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#
        );
        let user = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn list_by_app(
        &self,
        app_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<UserRecord>> {
        let sql = format!(
            r#"
            SELECT {COLUMNS}
            FROM users
            WHERE app_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );
        let rows = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(app_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn save(&self, record: &UserRecord) -> AppResult<UserRecord> {
        let sql = format!(
            r#"
            INSERT INTO users ({COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                username      = EXCLUDED.username,
                email_address = EXCLUDED.email_address,
                password_hash = EXCLUDED.password_hash,
                updated_at    = EXCLUDED.updated_at,
                deleted_at    = COALESCE(users.deleted_at, EXCLUDED.deleted_at)
            RETURNING {COLUMNS}
            "#
        );
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(record.id)
            .bind(record.app_id)
            .bind(&record.username)
            .bind(&record.email_address)
            .bind(&record.password_hash)
            .bind(record.created_at)
            .bind(record.updated_at)
            .bind(record.deleted_at)
            .fetch_one(&self.db)
            .await
            .map_err(map_unique_violation)
    }
}

// A concurrent writer can slip past the pre-check; the partial unique
// indexes catch it here.
fn map_unique_violation(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let msg = match db_err.constraint() {
                Some("users_app_username_live_idx") => "username already in use",
                Some("users_app_email_live_idx") => "emailAddress already in use",
                _ => "user already exists",
            };
            return AppError::Conflict(msg.into());
        }
    }
    AppError::Database(err)
}
