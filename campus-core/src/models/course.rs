use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lifecycle::LifecycleStatus;

/// Course entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub status: LifecycleStatus,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
}

impl Course {
    /// Create a new course. New entities begin life as drafts.
    pub fn new(title: String, is_paid: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            status: LifecycleStatus::Draft,
            is_paid,
            created_at: Utc::now(),
        }
    }

    /// Check if the course appears in public listings.
    pub fn is_visible(&self) -> bool {
        self.status.is_visible()
    }
}
