//! Bulk mutation request models.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;
use validator::Validate;

/// Entity kinds the bulk engine operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Course,
    WikiArticle,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Course => "course",
            EntityKind::WikiArticle => "wiki_article",
        }
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(EntityKind::User),
            "course" => Ok(EntityKind::Course),
            "wiki_article" => Ok(EntityKind::WikiArticle),
            _ => Err(format!("Invalid entity kind: {}", s)),
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A batch of entity ids for one bulk operation.
///
/// Construction deduplicates, so one id can never be counted or mutated
/// twice within a batch. The fields stay private to keep that invariant.
#[derive(Debug, Clone, Validate)]
pub struct BulkRequest {
    kind: EntityKind,
    #[validate(length(min = 1, message = "id list must not be empty"))]
    ids: Vec<Uuid>,
}

impl BulkRequest {
    /// Build a batch, dropping duplicate ids while keeping first-seen order.
    pub fn new(kind: EntityKind, ids: Vec<Uuid>) -> Self {
        let mut seen = HashSet::with_capacity(ids.len());
        let ids = ids.into_iter().filter(|id| seen.insert(*id)).collect();

        Self { kind, ids }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn ids(&self) -> &[Uuid] {
        &self.ids
    }
}

/// Summary of an applied bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    /// Distinct ids in the request
    pub requested: usize,
    /// Entities actually mutated (no-op transitions are not counted)
    pub applied: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_collapse_in_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let request = BulkRequest::new(EntityKind::Course, vec![a, b, a, a, b]);

        assert_eq!(request.ids(), &[a, b]);
    }

    #[test]
    fn test_empty_batch_fails_validation() {
        let request = BulkRequest::new(EntityKind::User, vec![]);

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [EntityKind::User, EntityKind::Course, EntityKind::WikiArticle] {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
        assert!("lesson".parse::<EntityKind>().is_err());
    }
}
