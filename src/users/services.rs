use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::users::dto::{NewUser, UserChanges};
use crate::users::password::derive_password_hash;
use crate::users::repo::UserRepository;
use crate::users::repo_types::UserRecord;
use crate::users::validation::{
    check_email, check_new_password, check_username, normalize_email, normalize_username,
    validate_password_change,
};

// Postgres keeps microseconds; truncate so a saved record compares equal to
// the one it was built from.
fn now() -> OffsetDateTime {
    let t = OffsetDateTime::now_utc();
    t.replace_nanosecond(t.nanosecond() / 1_000 * 1_000).unwrap_or(t)
}

async fn ensure_unique(
    repo: &dyn UserRepository,
    app_id: Uuid,
    username: &str,
    email_address: &str,
    exclude: Option<Uuid>,
) -> AppResult<()> {
    match repo
        .find_by_username_or_email(app_id, username, email_address, exclude)
        .await?
    {
        None => Ok(()),
        Some(other) if other.username == username => {
            warn!(%app_id, username, "username already in use");
            Err(AppError::Conflict("username already in use".into()))
        }
        Some(_) => {
            warn!(%app_id, email = email_address, "email already in use");
            Err(AppError::Conflict("emailAddress already in use".into()))
        }
    }
}

/// Live user by id, or NotFound.
pub async fn get_user(repo: &dyn UserRepository, id: Uuid) -> AppResult<UserRecord> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))
}

/// Validate, hash and store a new user of `app_id`.
#[instrument(skip(repo, input))]
pub async fn create_user(
    repo: &dyn UserRepository,
    app_id: Uuid,
    input: NewUser,
) -> AppResult<UserRecord> {
    let username = normalize_username(&input.username);
    let email_address = normalize_email(&input.email_address);

    let mut violations = Vec::new();
    check_username(&username, &mut violations);
    check_email(&email_address, &mut violations);
    check_new_password(&input.plain_password, &input.plain_password_confirm, &mut violations);
    if !violations.is_empty() {
        warn!(count = violations.len(), "create rejected");
        return Err(AppError::Validation(violations));
    }

    ensure_unique(repo, app_id, &username, &email_address, None).await?;

    let password_hash = derive_password_hash(&input.plain_password)?;
    let now = now();
    let record = UserRecord {
        id: Uuid::new_v4(),
        app_id,
        username,
        email_address,
        password_hash,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };

    let saved = repo.save(&record).await?;
    info!(user_id = %saved.id, %app_id, "user created");
    Ok(saved)
}

/// Apply `changes` to a live record and store the result.
#[instrument(skip(repo, record, changes), fields(user_id = %record.id))]
pub async fn update_user(
    repo: &dyn UserRepository,
    record: UserRecord,
    changes: UserChanges,
) -> AppResult<UserRecord> {
    if record.is_deleted() {
        return Err(AppError::NotFound(format!("user {}", record.id)));
    }

    let mut next = record.clone();
    if let Some(username) = changes.username.as_deref() {
        next.username = normalize_username(username);
    }
    if let Some(email) = changes.email_address.as_deref() {
        next.email_address = normalize_email(email);
    }

    let mut violations = Vec::new();
    check_username(&next.username, &mut violations);
    check_email(&next.email_address, &mut violations);
    if let Err(v) = validate_password_change(
        &mut next,
        changes.plain_password.as_deref(),
        changes.plain_password_confirm.as_deref(),
        now(),
    ) {
        violations.push(v);
    }
    if !violations.is_empty() {
        warn!(count = violations.len(), "update rejected");
        return Err(AppError::Validation(violations));
    }

    ensure_unique(
        repo,
        next.app_id,
        &next.username,
        &next.email_address,
        Some(next.id),
    )
    .await?;

    if let Some(plain) = changes.plain_password.as_deref() {
        next.password_hash = derive_password_hash(plain)?;
        debug!("password changed");
    }

    let saved = repo.save(&next).await?;
    info!("user updated");
    Ok(saved)
}

/// Mark a record deleted. Deleting an already deleted record is a no-op
/// that keeps the first timestamp.
#[instrument(skip(repo, record), fields(user_id = %record.id))]
pub async fn soft_delete_user(
    repo: &dyn UserRepository,
    mut record: UserRecord,
) -> AppResult<UserRecord> {
    if record.is_deleted() {
        debug!("already deleted");
        return Ok(record);
    }
    let now = now();
    record.deleted_at = Some(now);
    record.updated_at = now;
    let saved = repo.save(&record).await?;
    info!("user soft-deleted");
    Ok(saved)
}
