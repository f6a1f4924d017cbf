//! User accounts

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A user about to be registered. The password is already hashed.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn into_user(self) -> User {
        User { id: Uuid::now_v7(), name: self.name, email: self.email, password_hash: self.password_hash, created_at: Utc::now() }
    }
}
