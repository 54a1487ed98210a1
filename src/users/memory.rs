use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::users::repo::UserRepository;
use crate::users::repo_types::UserRecord;

/// Process-local store with the same live-uniqueness rules as the
/// PostgreSQL schema.
#[derive(Default)]
pub struct MemoryUserRepository {
    rows: Mutex<HashMap<Uuid, UserRecord>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows physically held, soft-deleted ones included.
    pub fn stored_count(&self) -> usize {
        self.lock().len()
    }

    /// Raw row regardless of soft deletion.
    pub fn get_raw(&self, id: Uuid) -> Option<UserRecord> {
        self.lock().get(&id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, UserRecord>> {
        // A poisoned map is still consistent: every write is a single insert.
        self.rows.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_username_or_email(
        &self,
        app_id: Uuid,
        username: &str,
        email_address: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<Option<UserRecord>> {
        let rows = self.lock();
        Ok(rows
            .values()
            .find(|u| {
                !u.is_deleted()
                    && u.app_id == app_id
                    && Some(u.id) != exclude
                    && (u.username == username || u.email_address == email_address)
            })
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>> {
        Ok(self.lock().get(&id).filter(|u| !u.is_deleted()).cloned())
    }

    async fn list_by_app(
        &self,
        app_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<UserRecord>> {
        let rows = self.lock();
        let mut users: Vec<UserRecord> = rows
            .values()
            .filter(|u| u.app_id == app_id && !u.is_deleted())
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn save(&self, record: &UserRecord) -> AppResult<UserRecord> {
        let mut rows = self.lock();
        if !record.is_deleted() {
            for other in rows.values() {
                if other.id == record.id || other.app_id != record.app_id || other.is_deleted() {
                    continue;
                }
                if other.username == record.username {
                    return Err(AppError::Conflict("username already in use".into()));
                }
                if other.email_address == record.email_address {
                    return Err(AppError::Conflict("emailAddress already in use".into()));
                }
            }
        }
        let mut stored = record.clone();
        if let Some(existing) = rows.get(&record.id) {
            stored.created_at = existing.created_at;
            stored.deleted_at = existing.deleted_at.or(record.deleted_at);
        }
        rows.insert(stored.id, stored.clone());
        Ok(stored)
    }
}
