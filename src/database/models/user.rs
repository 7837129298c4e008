use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Claim granting the `SuperUsers` policy
pub const SUPER_USER_CLAIM: &str = "SuperUser=True";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    /// Claims in `Type=Value` form
    pub claims: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub claims: Vec<String>,
}

impl NewUser {
    pub fn into_user(self, id: i32) -> User {
        User {
            id,
            username: self.username,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            claims: self.claims,
        }
    }
}
