use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Course access grant, keyed by (user, course). Granting again for the same
/// pair replaces the existing grant instead of stacking a duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseAccessGrant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,

    /// Whether the grant also enrolls the user, or only unlocks the content
    pub enrolled: bool,

    /// Free-form audit note, e.g. "scholarship" or "support ticket 4821"
    pub grant_reason: Option<String>,

    pub granted_at: DateTime<Utc>,
}

impl CourseAccessGrant {
    pub fn new(user_id: Uuid, course_id: Uuid, enrolled: bool, grant_reason: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            course_id,
            enrolled,
            grant_reason,
            granted_at: Utc::now(),
        }
    }
}

/// Request to grant a user access to a paid course without payment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GrantAccessRequest {
    pub user_id: Uuid,
    pub course_id: Uuid,
    #[serde(default)]
    pub enrolled: bool,
    #[validate(length(max = 500, message = "grant reason must be at most 500 characters"))]
    pub grant_reason: Option<String>,
}
