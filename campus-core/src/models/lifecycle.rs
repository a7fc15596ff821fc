//! Lifecycle state machine shared by courses and wiki articles.

use serde::{Deserialize, Serialize};

/// Lifecycle status codes.
///
/// `Active` is the only externally visible state. `Draft` and `Inactive`
/// differ in history, not in visibility: a draft has never been published,
/// an inactive entity has been withdrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStatus {
    Draft,
    Active,
    Inactive,
}

impl LifecycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStatus::Draft => "draft",
            LifecycleStatus::Active => "active",
            LifecycleStatus::Inactive => "inactive",
        }
    }

    /// Whether entities in this status appear in public listings.
    pub fn is_visible(&self) -> bool {
        matches!(self, LifecycleStatus::Active)
    }
}

impl std::str::FromStr for LifecycleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(LifecycleStatus::Draft),
            "active" => Ok(LifecycleStatus::Active),
            "inactive" => Ok(LifecycleStatus::Inactive),
            _ => Err(format!("Invalid lifecycle status: {}", s)),
        }
    }
}

impl std::fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of asking to move an entity to a target status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPlan {
    /// Already in the target status; apply nothing, record nothing.
    NoOp,
    /// Move between two distinct statuses.
    Change {
        from: LifecycleStatus,
        to: LifecycleStatus,
    },
}

/// Plans a lifecycle transition. Any pair of distinct statuses is a legal
/// move in either direction; asking for the current status is a no-op rather
/// than an error, so retried bulk requests stay idempotent.
pub fn plan_transition(current: LifecycleStatus, target: LifecycleStatus) -> TransitionPlan {
    if current == target {
        TransitionPlan::NoOp
    } else {
        TransitionPlan::Change {
            from: current,
            to: target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [LifecycleStatus; 3] = [
        LifecycleStatus::Draft,
        LifecycleStatus::Active,
        LifecycleStatus::Inactive,
    ];

    #[test]
    fn test_every_distinct_pair_is_allowed() {
        for from in ALL {
            for to in ALL {
                match plan_transition(from, to) {
                    TransitionPlan::NoOp => assert_eq!(from, to),
                    TransitionPlan::Change { from: f, to: t } => {
                        assert_ne!(f, t);
                        assert_eq!((f, t), (from, to));
                    }
                }
            }
        }
    }

    #[test]
    fn test_only_active_is_visible() {
        assert!(LifecycleStatus::Active.is_visible());
        assert!(!LifecycleStatus::Draft.is_visible());
        assert!(!LifecycleStatus::Inactive.is_visible());
    }

    #[test]
    fn test_status_round_trip() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<LifecycleStatus>().unwrap(), status);
        }
        assert!("archived".parse::<LifecycleStatus>().is_err());
    }
}
