use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::users::repo_types::UserRecord;

use super::extractors::AuthApp;

/// Operations a partner App may be granted on its users.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    GetUsers,
    ListUsers,
    PostUsers,
    PutUsers,
    DeleteUsers,
}

impl std::str::FromStr for Permission {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get_users" => Ok(Permission::GetUsers),
            "list_users" => Ok(Permission::ListUsers),
            "post_users" => Ok(Permission::PostUsers),
            "put_users" => Ok(Permission::PutUsers),
            "delete_users" => Ok(Permission::DeleteUsers),
            other => anyhow::bail!("unknown permission: {other}"),
        }
    }
}

/// The caller holds `permission`, and `subject` (when given) belongs to the
/// caller's App.
pub fn is_granted(caller: &AuthApp, permission: Permission, subject: Option<&UserRecord>) -> bool {
    if !caller.permissions.contains(&permission) {
        return false;
    }
    subject.map_or(true, |user| user.app_id == caller.app_id)
}

pub fn authorize(
    caller: &AuthApp,
    permission: Permission,
    subject: Option<&UserRecord>,
) -> AppResult<()> {
    if is_granted(caller, permission, subject) {
        Ok(())
    } else {
        tracing::warn!(app_id = %caller.app_id, ?permission, "permission denied");
        Err(AppError::Forbidden(format!("{permission:?} not granted")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn user_of(app_id: Uuid) -> UserRecord {
        let now = OffsetDateTime::now_utc();
        UserRecord {
            id: Uuid::new_v4(),
            app_id,
            username: "alice".into(),
            email_address: "a@x.com".into(),
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn needs_the_permission() {
        let caller = AuthApp {
            app_id: Uuid::new_v4(),
            permissions: vec![Permission::ListUsers],
        };
        assert!(is_granted(&caller, Permission::ListUsers, None));
        assert!(!is_granted(&caller, Permission::PostUsers, None));
    }

    #[test]
    fn item_must_belong_to_caller() {
        let caller = AuthApp {
            app_id: Uuid::new_v4(),
            permissions: vec![Permission::GetUsers],
        };
        assert!(is_granted(&caller, Permission::GetUsers, Some(&user_of(caller.app_id))));
        assert!(!is_granted(&caller, Permission::GetUsers, Some(&user_of(Uuid::new_v4()))));
        assert!(matches!(
            authorize(&caller, Permission::GetUsers, Some(&user_of(Uuid::new_v4()))),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn permission_wire_names() {
        let json = serde_json::to_string(&Permission::DeleteUsers).unwrap();
        assert_eq!(json, "\"delete_users\"");
        assert_eq!("put_users".parse::<Permission>().unwrap(), Permission::PutUsers);
        assert!("admin".parse::<Permission>().is_err());
    }
}
