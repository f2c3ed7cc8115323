use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::users::repo_types::{Role, User, UserStatus};

/// Request body for `Create`.
#[derive(Deserialize)]
pub struct CreateRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

impl fmt::Debug for CreateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateResponse {
    pub id: i64,
}

/// Request body for `Update`. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct GetRequest {
    pub id: i64,
}

/// Public view of a user row; the password hash is never exposed.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl From<User> for GetResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            status: u.status,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Response for operations that return nothing.
#[derive(Debug, Default, Serialize)]
pub struct Empty {}
