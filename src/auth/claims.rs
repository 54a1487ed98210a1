use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::permissions::Permission;

/// JWT payload presented by a partner App.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,   // app ID
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
    #[serde(default)]
    pub permissions: Vec<Permission>,
}
