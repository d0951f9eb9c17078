use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Credentials as submitted by a caller, pre-hashing.
#[derive(Debug, Clone, Deserialize)]
pub struct Creds {
    pub login: String,
    pub password: String,
}

impl Creds {
    pub fn valid(&self) -> bool {
        !self.login.trim().is_empty() && !self.password.is_empty()
    }
}

/// A registered user. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub login: String,
    #[serde(skip)]
    pub pass_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(login: impl Into<String>, pass_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            login: login.into(),
            pass_hash: pass_hash.into(),
            created_at: now,
            updated_at: now,
        }
    }
}
