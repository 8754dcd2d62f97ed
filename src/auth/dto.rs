use serde::Serialize;
use time::OffsetDateTime;

use crate::auth::repo::{User, UserRole};

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub open_id: String,
    pub name: Option<String>,
    pub role: UserRole,
    #[serde(with = "time::serde::rfc3339")]
    pub last_signed_in: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            open_id: u.open_id,
            name: u.name,
            role: u.role,
            last_signed_in: u.last_signed_in,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}
