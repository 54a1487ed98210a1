use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// A remote end-user of a partner App, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub id: Uuid,                           // generated on create, never changes
    pub app_id: Uuid,                       // owning partner App
    pub username: String,
    pub email_address: String,
    #[serde(skip_serializing)]
    pub password_hash: String,              // Argon2 hash, not exposed in JSON
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>, // soft delete marker
}

impl UserRecord {
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
