//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::HomeLocation;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique, case-sensitive)
    pub username: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Saved home coordinate, absent until first set
    #[serde(rename = "homeLocation")]
    pub home_location: Option<HomeLocation>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user without a home location.
    ///
    /// The password must already be hashed with
    /// `services::password::hash_password()`.
    pub fn new(username: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            username,
            password_hash,
            home_location: None,
            created_at: now,
            updated_at: now,
        }
    }
}
