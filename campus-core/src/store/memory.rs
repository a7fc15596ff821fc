//! In-memory store - reference implementation of the storage seams.
//!
//! One `tokio` mutex guards the whole state. Single-row credential
//! operations take it briefly; a content transaction holds it for its whole
//! life and mutates a scratch copy, so commit is a plain write-back and a
//! dropped transaction never leaks a partial change. This also serializes
//! concurrent bulk mutations against each other.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::models::{
    ArticleLocale, AuditRecord, ChallengeToken, Course, CourseAccessGrant, EntityKind,
    LifecycleStatus, Role, User, WikiArticle, WikiVersion,
};
use crate::utils::password as pw;
use crate::utils::Password;

use super::{ContentStore, ContentTx, CredentialStore, StoreError};

#[derive(Debug, Clone)]
struct UserRecord {
    user: User,
    password_hash: String,
    two_factor_secret: Option<String>,
    current_refresh: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
struct State {
    users: HashMap<Uuid, UserRecord>,
    /// Challenges keyed by token hash
    challenges: HashMap<String, ChallengeToken>,
    courses: HashMap<Uuid, Course>,
    articles: HashMap<Uuid, WikiArticle>,
    versions: HashMap<Uuid, WikiVersion>,
    /// Locale rows keyed by (article, language)
    locales: HashMap<(Uuid, String), ArticleLocale>,
    /// Grants keyed by (user, course)
    grants: HashMap<(Uuid, Uuid), CourseAccessGrant>,
    audit_log: Vec<AuditRecord>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account. The password is hashed the same way production
    /// accounts are, so login flows exercise the real verification path.
    pub async fn seed_user(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Uuid, StoreError> {
        self.insert_user(email, password, role, None).await
    }

    /// Seed an account with the second factor enrolled. `code` is what
    /// [`CredentialStore::verify_two_factor_code`] will accept.
    pub async fn seed_user_with_two_factor(
        &self,
        email: &str,
        password: &str,
        role: Role,
        code: &str,
    ) -> Result<Uuid, StoreError> {
        self.insert_user(email, password, role, Some(code.to_string()))
            .await
    }

    async fn insert_user(
        &self,
        email: &str,
        password: &str,
        role: Role,
        two_factor_secret: Option<String>,
    ) -> Result<Uuid, StoreError> {
        let password_hash = pw::hash_password(&Password::new(password.to_string()))
            .map_err(StoreError::Backend)?
            .into_string();

        let mut user = User::new(email.to_string(), role);
        user.two_factor_enabled = two_factor_secret.is_some();
        let id = user.id;

        let mut state = self.state.lock().await;
        state.users.insert(
            id,
            UserRecord {
                user,
                password_hash,
                two_factor_secret,
                current_refresh: None,
            },
        );

        Ok(id)
    }

    pub async fn seed_course(&self, title: &str, status: LifecycleStatus, is_paid: bool) -> Uuid {
        let mut course = Course::new(title.to_string(), is_paid);
        course.status = status;
        let id = course.id;

        self.state.lock().await.courses.insert(id, course);
        id
    }

    pub async fn seed_article(&self, slug: &str, status: LifecycleStatus) -> Uuid {
        let mut article = WikiArticle::new(slug.to_string());
        article.status = status;
        let id = article.id;

        self.state.lock().await.articles.insert(id, article);
        id
    }

    /// Make the next transaction commit fail, for exercising rollback paths.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    pub async fn course(&self, course_id: Uuid) -> Option<Course> {
        self.state.lock().await.courses.get(&course_id).cloned()
    }

    pub async fn article(&self, article_id: Uuid) -> Option<WikiArticle> {
        self.state.lock().await.articles.get(&article_id).cloned()
    }

    pub async fn grant(&self, user_id: Uuid, course_id: Uuid) -> Option<CourseAccessGrant> {
        self.state
            .lock()
            .await
            .grants
            .get(&(user_id, course_id))
            .cloned()
    }

    pub async fn locale(&self, article_id: Uuid, language: &str) -> Option<ArticleLocale> {
        self.state
            .lock()
            .await
            .locales
            .get(&(article_id, language.to_string()))
            .cloned()
    }

    /// Every ledger row for this (article, language), published rows first in
    /// version order, the working row last.
    pub async fn versions_for(&self, article_id: Uuid, language: &str) -> Vec<WikiVersion> {
        let state = self.state.lock().await;
        let mut rows: Vec<WikiVersion> = state
            .versions
            .values()
            .filter(|v| v.article_id == article_id && v.language == language)
            .cloned()
            .collect();
        rows.sort_by_key(|v| (v.is_working(), v.version));
        rows
    }

    pub async fn audit_records(&self) -> Vec<AuditRecord> {
        self.state.lock().await.audit_log.clone()
    }

    pub async fn challenge_count(&self) -> usize {
        self.state.lock().await.challenges.len()
    }

    pub async fn current_refresh(&self, user_id: Uuid) -> Option<Uuid> {
        self.state
            .lock()
            .await
            .users
            .get(&user_id)
            .and_then(|r| r.current_refresh)
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.get(&user_id).map(|r| r.user.clone()))
    }

    async fn verify_password(
        &self,
        email: &str,
        password: &Password,
    ) -> Result<Option<User>, StoreError> {
        // Clone out and release the lock before the slow argon2 work
        let found = {
            let state = self.state.lock().await;
            state
                .users
                .values()
                .find(|r| r.user.email == email)
                .map(|r| (r.user.clone(), r.password_hash.clone()))
        };

        match found {
            Some((user, hash)) => {
                let hash = pw::PasswordHashString::new(hash);
                if pw::verify_password(password, &hash).is_ok() {
                    Ok(Some(user))
                } else {
                    Ok(None)
                }
            }
            None => {
                pw::verify_password_dummy(password);
                Ok(None)
            }
        }
    }

    async fn verify_two_factor_code(&self, user_id: Uuid, code: &str) -> Result<bool, StoreError> {
        let secret = {
            let state = self.state.lock().await;
            state
                .users
                .get(&user_id)
                .and_then(|r| r.two_factor_secret.clone())
        };

        match secret {
            Some(secret) => Ok(secret.as_bytes().ct_eq(code.as_bytes()).into()),
            None => Ok(false),
        }
    }

    async fn token_version(&self, user_id: Uuid) -> Result<Option<i64>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.get(&user_id).map(|r| r.user.token_version))
    }

    async fn increment_token_version(&self, user_id: Uuid) -> Result<Option<i64>, StoreError> {
        let mut state = self.state.lock().await;
        Ok(state.users.get_mut(&user_id).map(|r| {
            r.user.token_version += 1;
            r.user.token_version
        }))
    }

    async fn insert_challenge(&self, challenge: ChallengeToken) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state
            .challenges
            .insert(challenge.token_hash.clone(), challenge);
        Ok(())
    }

    async fn find_challenge(&self, token_hash: &str) -> Result<Option<ChallengeToken>, StoreError> {
        let mut state = self.state.lock().await;

        // Expired rows are evicted on access rather than swept in the
        // background, so "expired" and "never existed" look the same.
        let expired = state.challenges.get(token_hash).map(|ch| ch.is_expired());
        match expired {
            Some(true) => {
                state.challenges.remove(token_hash);
                Ok(None)
            }
            Some(false) => Ok(state.challenges.get(token_hash).cloned()),
            None => Ok(None),
        }
    }

    async fn consume_challenge(&self, token_hash: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        match state.challenges.get_mut(token_hash) {
            Some(ch) if ch.is_usable() => {
                ch.consumed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_current_refresh(&self, user_id: Uuid, jti: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        match state.users.get_mut(&user_id) {
            Some(record) => {
                record.current_refresh = Some(jti);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn swap_current_refresh(
        &self,
        user_id: Uuid,
        expected: Uuid,
        next: Uuid,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        match state.users.get_mut(&user_id) {
            Some(record) if record.current_refresh == Some(expected) => {
                record.current_refresh = Some(next);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn ContentTx>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let scratch = (*guard).clone();

        Ok(Box::new(MemoryTx {
            guard,
            scratch,
            fail_commit: self.fail_next_commit.clone(),
        }))
    }
}

/// Transaction over a scratch copy of the state. Holds the store lock until
/// committed or dropped.
struct MemoryTx {
    guard: OwnedMutexGuard<State>,
    scratch: State,
    fail_commit: Arc<AtomicBool>,
}

#[async_trait]
impl ContentTx for MemoryTx {
    async fn exists_all(
        &mut self,
        kind: EntityKind,
        ids: &[Uuid],
    ) -> Result<HashSet<Uuid>, StoreError> {
        let found = match kind {
            EntityKind::User => ids
                .iter()
                .filter(|id| self.scratch.users.contains_key(id))
                .copied()
                .collect(),
            EntityKind::Course => ids
                .iter()
                .filter(|id| self.scratch.courses.contains_key(id))
                .copied()
                .collect(),
            EntityKind::WikiArticle => ids
                .iter()
                .filter(|id| self.scratch.articles.contains_key(id))
                .copied()
                .collect(),
        };
        Ok(found)
    }

    async fn statuses(
        &mut self,
        kind: EntityKind,
        ids: &[Uuid],
    ) -> Result<Vec<(Uuid, LifecycleStatus)>, StoreError> {
        let rows = match kind {
            EntityKind::User => Vec::new(),
            EntityKind::Course => ids
                .iter()
                .filter_map(|id| self.scratch.courses.get(id).map(|c| (*id, c.status)))
                .collect(),
            EntityKind::WikiArticle => ids
                .iter()
                .filter_map(|id| self.scratch.articles.get(id).map(|a| (*id, a.status)))
                .collect(),
        };
        Ok(rows)
    }

    async fn apply_status(
        &mut self,
        kind: EntityKind,
        ids: &[Uuid],
        status: LifecycleStatus,
    ) -> Result<u64, StoreError> {
        let mut written = 0;
        match kind {
            EntityKind::User => {}
            EntityKind::Course => {
                for id in ids {
                    if let Some(course) = self.scratch.courses.get_mut(id) {
                        course.status = status;
                        written += 1;
                    }
                }
            }
            EntityKind::WikiArticle => {
                for id in ids {
                    if let Some(article) = self.scratch.articles.get_mut(id) {
                        article.status = status;
                        written += 1;
                    }
                }
            }
        }
        Ok(written)
    }

    async fn delete_all(&mut self, kind: EntityKind, ids: &[Uuid]) -> Result<u64, StoreError> {
        let targets: HashSet<Uuid> = ids.iter().copied().collect();
        let removed = match kind {
            EntityKind::User => {
                let before = self.scratch.users.len();
                self.scratch.users.retain(|id, _| !targets.contains(id));
                self.scratch
                    .challenges
                    .retain(|_, ch| !targets.contains(&ch.user_id));
                before - self.scratch.users.len()
            }
            EntityKind::Course => {
                let before = self.scratch.courses.len();
                self.scratch.courses.retain(|id, _| !targets.contains(id));
                before - self.scratch.courses.len()
            }
            EntityKind::WikiArticle => {
                let before = self.scratch.articles.len();
                self.scratch.articles.retain(|id, _| !targets.contains(id));
                self.scratch
                    .versions
                    .retain(|_, v| !targets.contains(&v.article_id));
                self.scratch
                    .locales
                    .retain(|(article_id, _), _| !targets.contains(article_id));
                before - self.scratch.articles.len()
            }
        };
        Ok(removed as u64)
    }

    async fn bump_token_versions(&mut self, user_ids: &[Uuid]) -> Result<(), StoreError> {
        for id in user_ids {
            if let Some(record) = self.scratch.users.get_mut(id) {
                record.user.token_version += 1;
            }
        }
        Ok(())
    }

    async fn clear_grants_for_users(&mut self, user_ids: &[Uuid]) -> Result<u64, StoreError> {
        let targets: HashSet<Uuid> = user_ids.iter().copied().collect();
        let before = self.scratch.grants.len();
        self.scratch
            .grants
            .retain(|(user_id, _), _| !targets.contains(user_id));
        Ok((before - self.scratch.grants.len()) as u64)
    }

    async fn clear_grants_for_courses(&mut self, course_ids: &[Uuid]) -> Result<u64, StoreError> {
        let targets: HashSet<Uuid> = course_ids.iter().copied().collect();
        let before = self.scratch.grants.len();
        self.scratch
            .grants
            .retain(|(_, course_id), _| !targets.contains(course_id));
        Ok((before - self.scratch.grants.len()) as u64)
    }

    async fn find_course(&mut self, course_id: Uuid) -> Result<Option<Course>, StoreError> {
        Ok(self.scratch.courses.get(&course_id).cloned())
    }

    async fn upsert_grant(&mut self, grant: CourseAccessGrant) -> Result<(), StoreError> {
        self.scratch
            .grants
            .insert((grant.user_id, grant.course_id), grant);
        Ok(())
    }

    async fn find_article(&mut self, article_id: Uuid) -> Result<Option<WikiArticle>, StoreError> {
        Ok(self.scratch.articles.get(&article_id).cloned())
    }

    async fn find_locale(
        &mut self,
        article_id: Uuid,
        language: &str,
    ) -> Result<Option<ArticleLocale>, StoreError> {
        Ok(self
            .scratch
            .locales
            .get(&(article_id, language.to_string()))
            .cloned())
    }

    async fn find_version(&mut self, version_id: Uuid) -> Result<Option<WikiVersion>, StoreError> {
        Ok(self.scratch.versions.get(&version_id).cloned())
    }

    async fn put_version(&mut self, version: &WikiVersion) -> Result<(), StoreError> {
        self.scratch.versions.insert(version.id, version.clone());
        Ok(())
    }

    async fn put_locale(&mut self, locale: &ArticleLocale) -> Result<(), StoreError> {
        self.scratch
            .locales
            .insert((locale.article_id, locale.language.clone()), locale.clone());
        Ok(())
    }

    async fn record_audit(&mut self, records: &[AuditRecord]) -> Result<(), StoreError> {
        self.scratch.audit_log.extend_from_slice(records);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTx {
            mut guard,
            scratch,
            fail_commit,
        } = *self;

        if fail_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "injected commit failure"
            )));
        }

        *guard = scratch;
        Ok(())
    }
}
