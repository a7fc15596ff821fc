//! Storage seams.
//!
//! The core never talks to a concrete database; it talks to these traits.
//! [`memory::MemoryStore`] is the in-process reference implementation and the
//! default test double. A SQL-backed implementation plugs in behind the same
//! contracts without touching the services.

use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ArticleLocale, AuditRecord, ChallengeToken, Course, CourseAccessGrant, EntityKind,
    LifecycleStatus, User, WikiArticle, WikiVersion,
};
use crate::utils::Password;

pub mod memory;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Credential-side storage: accounts, challenges, token versions, refresh
/// slots. All single-row operations; the compare-and-swap methods are the
/// concurrency primitives the login and refresh flows are built on.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;

    /// Check a password for the account with this email. Returns the user on
    /// success, `None` on a wrong password or unknown email. Implementations
    /// must burn a same-cost verification when the account does not exist,
    /// so response timing does not reveal which emails are registered.
    async fn verify_password(
        &self,
        email: &str,
        password: &Password,
    ) -> Result<Option<User>, StoreError>;

    /// Check a second-factor code for this user. Unknown users and users
    /// without an enrolled factor fail closed.
    async fn verify_two_factor_code(&self, user_id: Uuid, code: &str) -> Result<bool, StoreError>;

    /// Live token version for this user, `None` if the account is gone.
    async fn token_version(&self, user_id: Uuid) -> Result<Option<i64>, StoreError>;

    /// Bump the token version, invalidating every outstanding token at once.
    /// Returns the new version, `None` if the account is gone.
    async fn increment_token_version(&self, user_id: Uuid) -> Result<Option<i64>, StoreError>;

    async fn insert_challenge(&self, challenge: ChallengeToken) -> Result<(), StoreError>;

    /// Look up a challenge by token hash. Expired rows may be evicted on
    /// access, in which case they are simply absent.
    async fn find_challenge(&self, token_hash: &str) -> Result<Option<ChallengeToken>, StoreError>;

    /// Atomically mark a challenge consumed. Returns true only for the call
    /// that flipped the flag; concurrent redeemers of the same token get
    /// false, however the race interleaves.
    async fn consume_challenge(&self, token_hash: &str) -> Result<bool, StoreError>;

    /// Install `jti` as the user's current refresh slot, replacing whatever
    /// was there. Returns false if the account is gone.
    async fn set_current_refresh(&self, user_id: Uuid, jti: Uuid) -> Result<bool, StoreError>;

    /// Swap the refresh slot from `expected` to `next` in one step. Returns
    /// false without writing if the slot no longer holds `expected`.
    async fn swap_current_refresh(
        &self,
        user_id: Uuid,
        expected: Uuid,
        next: Uuid,
    ) -> Result<bool, StoreError>;
}

/// Content-side storage, entered through short write transactions.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Open a write transaction. Everything staged through the returned
    /// handle becomes visible atomically at [`ContentTx::commit`]; dropping
    /// the handle uncommitted discards all of it.
    async fn begin(&self) -> Result<Box<dyn ContentTx>, StoreError>;
}

/// One write transaction against the content store.
///
/// Deleting entities also removes rows that exist only as part of them
/// (a user's pending challenges, an article's version ledger). Cross-domain
/// cleanup such as grants and token versions stays with the caller, which
/// sequences those steps explicitly.
#[async_trait]
pub trait ContentTx: Send {
    /// Which of these ids exist for this kind.
    async fn exists_all(
        &mut self,
        kind: EntityKind,
        ids: &[Uuid],
    ) -> Result<HashSet<Uuid>, StoreError>;

    /// Current lifecycle status per id. Users carry no lifecycle status and
    /// yield no rows.
    async fn statuses(
        &mut self,
        kind: EntityKind,
        ids: &[Uuid],
    ) -> Result<Vec<(Uuid, LifecycleStatus)>, StoreError>;

    /// Set the status on every listed entity. Returns rows written.
    async fn apply_status(
        &mut self,
        kind: EntityKind,
        ids: &[Uuid],
        status: LifecycleStatus,
    ) -> Result<u64, StoreError>;

    /// Delete the listed entities and their owned rows. Returns rows deleted.
    async fn delete_all(&mut self, kind: EntityKind, ids: &[Uuid]) -> Result<u64, StoreError>;

    /// Bump token versions for these users, killing their live tokens the
    /// moment the transaction commits.
    async fn bump_token_versions(&mut self, user_ids: &[Uuid]) -> Result<(), StoreError>;

    async fn clear_grants_for_users(&mut self, user_ids: &[Uuid]) -> Result<u64, StoreError>;

    async fn clear_grants_for_courses(&mut self, course_ids: &[Uuid]) -> Result<u64, StoreError>;

    async fn find_course(&mut self, course_id: Uuid) -> Result<Option<Course>, StoreError>;

    /// Insert or replace the grant for its (user, course) pair.
    async fn upsert_grant(&mut self, grant: CourseAccessGrant) -> Result<(), StoreError>;

    async fn find_article(&mut self, article_id: Uuid) -> Result<Option<WikiArticle>, StoreError>;

    async fn find_locale(
        &mut self,
        article_id: Uuid,
        language: &str,
    ) -> Result<Option<ArticleLocale>, StoreError>;

    async fn find_version(&mut self, version_id: Uuid) -> Result<Option<WikiVersion>, StoreError>;

    /// Insert or replace a version row by id.
    async fn put_version(&mut self, version: &WikiVersion) -> Result<(), StoreError>;

    /// Insert or replace the locale row for its (article, language) pair.
    async fn put_locale(&mut self, locale: &ArticleLocale) -> Result<(), StoreError>;

    async fn record_audit(&mut self, records: &[AuditRecord]) -> Result<(), StoreError>;

    /// Make every staged write visible at once.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
