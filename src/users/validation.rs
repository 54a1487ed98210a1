//! Field constraints for user records.
//!
//! Checks push into a violation list instead of returning early, so a caller
//! sees every problem with its input in one response.

use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;

use crate::error::FieldViolation;
use crate::users::repo_types::UserRecord;

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 100;
pub const EMAIL_MAX_CHARS: usize = 255;

pub const MISSING_CONFIRMATION: &str = "Missing plainPasswordConfirm";
pub const PASSWORD_MISMATCH: &str = "Password mismatched";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_string()
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn check_username(username: &str, out: &mut Vec<FieldViolation>) {
    let len = username.chars().count();
    if username.trim().is_empty() {
        out.push(FieldViolation::new("username", "This value should not be blank."));
    } else if len < USERNAME_MIN_CHARS {
        out.push(FieldViolation::new(
            "username",
            format!("This value is too short. It should have {USERNAME_MIN_CHARS} characters or more."),
        ));
    } else if len > USERNAME_MAX_CHARS {
        out.push(FieldViolation::new(
            "username",
            format!("This value is too long. It should have {USERNAME_MAX_CHARS} characters or less."),
        ));
    }
}

pub fn check_email(email: &str, out: &mut Vec<FieldViolation>) {
    if email.trim().is_empty() {
        out.push(FieldViolation::new("emailAddress", "This value should not be blank."));
        return;
    }
    if email.chars().count() > EMAIL_MAX_CHARS {
        out.push(FieldViolation::new(
            "emailAddress",
            format!("This value is too long. It should have {EMAIL_MAX_CHARS} characters or less."),
        ));
    }
    if !is_valid_email(email) {
        out.push(FieldViolation::new(
            "emailAddress",
            "This value is not a valid email address.",
        ));
    }
}

/// Password rules for a brand new record: both values required and equal.
pub fn check_new_password(plain: &str, confirm: &str, out: &mut Vec<FieldViolation>) {
    let mut blank = false;
    if plain.is_empty() {
        out.push(FieldViolation::new("plainPassword", "This value should not be blank."));
        blank = true;
    }
    if confirm.is_empty() {
        out.push(FieldViolation::new(
            "plainPasswordConfirm",
            "This value should not be blank.",
        ));
        blank = true;
    }
    if !blank && plain != confirm {
        out.push(FieldViolation::new("plainPasswordConfirm", PASSWORD_MISMATCH));
    }
}

/// Password rules for an existing record.
///
/// A new password needs a matching confirmation; a lone confirmation is
/// ignored. On success the record's `updated_at` is touched so the write
/// that follows is always a real change.
pub fn validate_password_change(
    record: &mut UserRecord,
    plain: Option<&str>,
    confirm: Option<&str>,
    now: OffsetDateTime,
) -> Result<(), FieldViolation> {
    if let Some(plain) = plain {
        if plain.is_empty() {
            return Err(FieldViolation::new(
                "plainPassword",
                "This value should not be blank.",
            ));
        }
        match confirm {
            None => return Err(FieldViolation::new("plainPasswordConfirm", MISSING_CONFIRMATION)),
            Some(confirm) if confirm != plain => {
                return Err(FieldViolation::new("plainPasswordConfirm", PASSWORD_MISMATCH))
            }
            Some(_) => {}
        }
    }
    record.updated_at = now;
    Ok(())
}
