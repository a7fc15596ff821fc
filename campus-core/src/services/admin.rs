//! Administrative bulk mutations.
//!
//! Every operation here is all-or-nothing: targets are verified and mutated
//! inside one store transaction, so a missing id or a storage failure means
//! nothing was applied and the request is safe to retry.

use std::sync::Arc;

use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    models::{
        plan_transition, AuditAction, AuditRecord, BulkOutcome, BulkRequest, CourseAccessGrant,
        EntityKind, GrantAccessRequest, LifecycleStatus, TransitionPlan,
    },
    services::ServiceError,
    store::{ContentStore, ContentTx},
};

#[derive(Clone)]
pub struct AdminService {
    content: Arc<dyn ContentStore>,
}

impl AdminService {
    pub fn new(content: Arc<dyn ContentStore>) -> Self {
        Self { content }
    }

    /// Delete a batch of entities with their dependent state, atomically.
    ///
    /// The cascade order per kind is explicit: users first lose their live
    /// tokens and grants, courses lose their grants, articles lose their
    /// version ledger. One `Deleted` audit record per id, written in the
    /// same transaction.
    pub async fn bulk_delete(
        &self,
        req: BulkRequest,
        actor: Uuid,
    ) -> Result<BulkOutcome, ServiceError> {
        req.validate()?;

        let mut tx = self.content.begin().await?;

        // 1. Whole batch must exist or nothing happens
        Self::require_all(tx.as_mut(), &req).await?;

        // 2. Dependent state first, in a fixed order
        match req.kind() {
            EntityKind::User => {
                tx.bump_token_versions(req.ids()).await?;
                tx.clear_grants_for_users(req.ids()).await?;
            }
            EntityKind::Course => {
                tx.clear_grants_for_courses(req.ids()).await?;
            }
            EntityKind::WikiArticle => {}
        }

        // 3. The entities themselves; owned rows (challenges, version
        //    ledgers) go with them inside the store
        let deleted = tx.delete_all(req.kind(), req.ids()).await?;

        // 4. Audit trail, same transaction
        let audits: Vec<AuditRecord> = req
            .ids()
            .iter()
            .map(|id| AuditRecord::new(actor, req.kind(), *id, AuditAction::Deleted))
            .collect();
        tx.record_audit(&audits).await?;

        tx.commit().await?;

        tracing::info!(
            kind = req.kind().as_str(),
            deleted,
            actor = %actor,
            "Bulk delete committed"
        );

        Ok(BulkOutcome {
            requested: req.ids().len(),
            applied: deleted as usize,
        })
    }

    /// Move a batch of entities to a target lifecycle status, atomically.
    ///
    /// Ids already in the target status are successful no-ops: they count
    /// toward `requested`, not `applied`, and leave no audit record. Running
    /// the same request twice is therefore harmless.
    pub async fn bulk_transition(
        &self,
        req: BulkRequest,
        target: LifecycleStatus,
        actor: Uuid,
    ) -> Result<BulkOutcome, ServiceError> {
        req.validate()?;

        // Users carry no lifecycle status
        if req.kind() == EntityKind::User {
            let mut errors = ValidationErrors::new();
            errors.add("kind", ValidationError::new("lifecycle_not_applicable"));
            return Err(ServiceError::Validation(errors));
        }

        let mut tx = self.content.begin().await?;

        // 1. Whole batch must exist or nothing happens
        Self::require_all(tx.as_mut(), &req).await?;

        // 2. Plan per id against its current status
        let mut changed: Vec<Uuid> = Vec::new();
        let mut audits: Vec<AuditRecord> = Vec::new();
        for (id, current) in tx.statuses(req.kind(), req.ids()).await? {
            if let TransitionPlan::Change { from, to } = plan_transition(current, target) {
                changed.push(id);
                audits.push(AuditRecord::new(
                    actor,
                    req.kind(),
                    id,
                    AuditAction::StatusChanged { from, to },
                ));
            }
        }

        // 3. Apply and audit only the ids that actually move
        let applied = if changed.is_empty() {
            0
        } else {
            tx.apply_status(req.kind(), &changed, target).await?
        };
        tx.record_audit(&audits).await?;

        tx.commit().await?;

        tracing::info!(
            kind = req.kind().as_str(),
            status = target.as_str(),
            applied,
            actor = %actor,
            "Bulk transition committed"
        );

        Ok(BulkOutcome {
            requested: req.ids().len(),
            applied: applied as usize,
        })
    }

    /// Grant a user access to a course, bypassing payment.
    ///
    /// Idempotent per (user, course): a repeat grant replaces the previous
    /// one instead of duplicating it. Activating a course never creates
    /// grants; this explicit action is the only source of them.
    pub async fn grant_course_access(
        &self,
        req: GrantAccessRequest,
        actor: Uuid,
    ) -> Result<CourseAccessGrant, ServiceError> {
        req.validate()?;

        let mut tx = self.content.begin().await?;

        // Both ends must exist; grants never dangle
        let users = tx.exists_all(EntityKind::User, &[req.user_id]).await?;
        if !users.contains(&req.user_id) {
            return Err(ServiceError::UserNotFound);
        }
        tx.find_course(req.course_id)
            .await?
            .ok_or(ServiceError::CourseNotFound)?;

        let grant = CourseAccessGrant::new(
            req.user_id,
            req.course_id,
            req.enrolled,
            req.grant_reason.clone(),
        );
        tx.upsert_grant(grant.clone()).await?;

        tx.record_audit(&[AuditRecord::new(
            actor,
            EntityKind::Course,
            req.course_id,
            AuditAction::AccessGranted {
                user_id: req.user_id,
            },
        )])
        .await?;

        tx.commit().await?;

        tracing::info!(
            user_id = %req.user_id,
            course_id = %req.course_id,
            actor = %actor,
            "Course access granted"
        );

        Ok(grant)
    }

    /// Fail with the sorted missing ids unless every id in the batch exists.
    async fn require_all(tx: &mut dyn ContentTx, req: &BulkRequest) -> Result<(), ServiceError> {
        let existing = tx.exists_all(req.kind(), req.ids()).await?;

        let mut missing: Vec<Uuid> = req
            .ids()
            .iter()
            .filter(|id| !existing.contains(id))
            .copied()
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            missing.sort();
            Err(ServiceError::PartialNotFound(missing))
        }
    }
}
