//! Audit record model - who changed what, and when.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::bulk::EntityKind;
use super::lifecycle::LifecycleStatus;

/// Administrative actions worth a durable trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AuditAction {
    Deleted,
    StatusChanged {
        from: LifecycleStatus,
        to: LifecycleStatus,
    },
    /// Recorded against the course; the payload names who got access.
    AccessGranted { user_id: Uuid },
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Deleted => "deleted",
            AuditAction::StatusChanged { .. } => "status_changed",
            AuditAction::AccessGranted { .. } => "access_granted",
        }
    }
}

/// Audit record entity. Written in the same transaction as the mutation it
/// describes, so a recorded action always actually happened.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub actor: Uuid,
    pub entity_kind: EntityKind,
    pub entity_id: Uuid,
    pub action: AuditAction,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(actor: Uuid, entity_kind: EntityKind, entity_id: Uuid, action: AuditAction) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor,
            entity_kind,
            entity_id,
            action,
            recorded_at: Utc::now(),
        }
    }
}
