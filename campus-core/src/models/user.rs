//! User model - platform accounts as the credential system sees them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Platform role codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Instructor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "instructor" => Ok(Role::Instructor),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// User account. Secret material (password hash, two-factor secret) never
/// leaves the credential store; this row is what the rest of the platform
/// gets to see.
///
/// `token_version` is the revocation pivot: every issued token embeds the
/// value current at mint time, and a token is live only while the embedded
/// value still equals this one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub two_factor_enabled: bool,
    pub token_version: i64,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user. Token version starts at zero and only ever grows.
    pub fn new(email: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            role,
            two_factor_enabled: false,
            token_version: 0,
            created_at: Utc::now(),
        }
    }

    /// Whether login must go through the second factor.
    pub fn requires_challenge(&self) -> bool {
        self.two_factor_enabled
    }
}

/// Identity attached to a validated access token.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,
}

/// First login step: email and password.
#[derive(Debug, Deserialize, Validate)]
pub struct BeginLoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Second login step: the opaque challenge plus the one-time code.
#[derive(Debug, Deserialize, Validate)]
pub struct CompleteLoginRequest {
    #[validate(length(min = 1, message = "Challenge token is required"))]
    pub challenge_token: String,

    #[validate(length(min = 1, message = "Code is required"))]
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_starts_at_version_zero() {
        let user = User::new("ada@campus.dev".to_string(), Role::Student);

        assert_eq!(user.token_version, 0);
        assert!(!user.two_factor_enabled);
        assert!(!user.requires_challenge());
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Student, Role::Instructor, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        // The role claim in tokens is the lowercase code
        assert_eq!(
            serde_json::to_value(Role::Instructor).unwrap(),
            serde_json::json!("instructor")
        );
    }

    #[test]
    fn test_begin_login_request_rejects_bad_email() {
        let req = BeginLoginRequest {
            email: "not-an-email".to_string(),
            password: "secret".to_string(),
        };

        assert!(req.validate().is_err());
    }

    #[test]
    fn test_complete_login_request_requires_both_fields() {
        let req = CompleteLoginRequest {
            challenge_token: "abc".to_string(),
            code: String::new(),
        };

        assert!(req.validate().is_err());
    }
}
