use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Pending two-factor challenge stored between the two login steps.
///
/// The opaque token handed to the client is never stored; only its SHA-256
/// digest is, so a leaked store snapshot cannot complete a login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeToken {
    pub id: Uuid,

    /// User this challenge belongs to
    pub user_id: Uuid,

    /// SHA-256 hash of the opaque challenge token
    pub token_hash: String,

    /// When this challenge expires
    pub expires_at: DateTime<Utc>,

    /// When this challenge was created
    pub created_at: DateTime<Utc>,

    /// Whether this challenge has already been redeemed
    pub consumed: bool,
}

impl ChallengeToken {
    /// Create a new challenge for the given opaque token.
    pub fn new(user_id: Uuid, token: &str, ttl_minutes: i64) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            user_id,
            token_hash: Self::hash_token(token),
            expires_at: now + Duration::minutes(ttl_minutes),
            created_at: now,
            consumed: false,
        }
    }

    /// Hash a token using SHA-256
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Check if this challenge is expired
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Check if this challenge can still be redeemed
    pub fn is_usable(&self) -> bool {
        !self.is_expired() && !self.consumed
    }
}

/// Handle returned by the first login step. Proves the password check passed
/// without granting any access on its own.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedChallenge {
    pub challenge_token: String,
    pub expires_at: DateTime<Utc>,
}
