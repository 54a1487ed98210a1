use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::UserRecord;

/// Input for creating a user. Missing or `null` fields deserialize as blank
/// so they are reported as field violations rather than a parse failure.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NewUser {
    #[serde(deserialize_with = "null_as_blank")]
    pub username: String,
    #[serde(deserialize_with = "null_as_blank")]
    pub email_address: String,
    #[serde(deserialize_with = "null_as_blank")]
    pub plain_password: String,
    #[serde(deserialize_with = "null_as_blank")]
    pub plain_password_confirm: String,
}

/// Partial update; absent fields keep their stored value. An explicit `null`
/// username or email is a blank value, not an omission. A `null` password
/// means no password change.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UserChanges {
    #[serde(deserialize_with = "present_null_as_blank")]
    pub username: Option<String>,
    #[serde(deserialize_with = "present_null_as_blank")]
    pub email_address: Option<String>,
    pub plain_password: Option<String>,
    pub plain_password_confirm: Option<String>,
}

fn null_as_blank<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

// Only called when the key is present; `default` covers the absent case.
fn present_null_as_blank<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    null_as_blank(d).map(Some)
}

/// Public view of a user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email_address: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<UserRecord> for UserView {
    fn from(u: UserRecord) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email_address: u.email_address,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 { 30 }

impl Pagination {
    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, 100), self.offset.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_hides_credentials_and_uses_camel_case() {
        let now = OffsetDateTime::now_utc();
        let view = UserView::from(UserRecord {
            id: Uuid::new_v4(),
            app_id: Uuid::new_v4(),
            username: "alice".into(),
            email_address: "a@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        });
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["emailAddress"], "a@x.com");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(json.get("deletedAt").is_none());
        assert!(json.get("appId").is_none());
    }

    #[test]
    fn new_user_missing_fields_are_blank() {
        let input: NewUser = serde_json::from_str(r#"{"username":"alice"}"#).unwrap();
        assert_eq!(input.username, "alice");
        assert!(input.email_address.is_empty());
        assert!(input.plain_password_confirm.is_empty());
    }

    #[test]
    fn null_fields_are_blank_not_absent() {
        let input: NewUser =
            serde_json::from_str(r#"{"username":null,"emailAddress":"a@x.com"}"#).unwrap();
        assert!(input.username.is_empty());
        assert_eq!(input.email_address, "a@x.com");

        let c: UserChanges =
            serde_json::from_str(r#"{"username":null,"plainPassword":null}"#).unwrap();
        assert_eq!(c.username.as_deref(), Some(""));
        assert!(c.email_address.is_none());
        assert!(c.plain_password.is_none());
    }

    #[test]
    fn wrong_types_still_fail_to_parse() {
        assert!(serde_json::from_str::<NewUser>(r#"{"username":5}"#).is_err());
        assert!(serde_json::from_str::<UserChanges>(r#"{"emailAddress":[]}"#).is_err());
    }

    #[test]
    fn changes_distinguish_absent_from_present() {
        let c: UserChanges = serde_json::from_str(r#"{"plainPassword":"p"}"#).unwrap();
        assert_eq!(c.plain_password.as_deref(), Some("p"));
        assert!(c.plain_password_confirm.is_none());
        assert!(c.username.is_none());
    }

    #[test]
    fn pagination_is_clamped() {
        let p: Pagination = serde_json::from_str(r#"{"limit":1000,"offset":-4}"#).unwrap();
        assert_eq!(p.clamped(), (100, 0));
    }
}
