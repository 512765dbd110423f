//! Bearer token claims

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Payload of a signed bearer token.
///
/// Tokens are stateless: nothing is stored server-side, so these claims are
/// all the server knows about a request's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub id: i64,
    /// Issued-at (Unix seconds)
    pub iat: i64,
    /// Expiry (Unix seconds)
    pub exp: i64,
}

impl Claims {
    /// Build claims for `user_id` issued at `now`, valid for `ttl_seconds`.
    ///
    /// Returns `None` if the expiry does not fit in an `i64`.
    pub fn new(user_id: i64, now: DateTime<Utc>, ttl_seconds: i64) -> Option<Self> {
        let iat = now.timestamp();
        Some(Self {
            id: user_id,
            iat,
            exp: iat.checked_add(ttl_seconds)?,
        })
    }

    /// A token stays valid through its expiry second and dies after it
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }

    /// Expiry as a timestamp
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}
