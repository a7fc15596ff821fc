//! Wiki draft autosave and publishing.
//!
//! Per (article, language) there is exactly one mutable working draft and
//! an append-only trail of frozen published versions numbered gaplessly
//! from 1. Autosave only ever touches the draft; publish freezes it and
//! opens a fresh one.

use std::sync::Arc;

use anyhow::anyhow;
use uuid::Uuid;

use crate::{
    models::{ArticleLocale, DraftPatch, WikiVersion},
    services::ServiceError,
    store::ContentStore,
};

#[derive(Clone)]
pub struct WikiService {
    content: Arc<dyn ContentStore>,
}

impl WikiService {
    pub fn new(content: Arc<dyn ContentStore>) -> Self {
        Self { content }
    }

    /// Merge an autosave payload into the working draft, creating the
    /// locale and its draft row on first touch.
    ///
    /// Only the fields present in the patch are written; concurrent editors
    /// clobber each other field by field, never whole-row. Repeating the
    /// same payload leaves the same draft. The published pointer is never
    /// touched here.
    pub async fn autosave_draft(
        &self,
        article_id: Uuid,
        language: &str,
        patch: DraftPatch,
        actor: Uuid,
    ) -> Result<WikiVersion, ServiceError> {
        let language = normalized(language)?;

        let mut tx = self.content.begin().await?;

        // 1. Article must exist
        tx.find_article(article_id)
            .await?
            .ok_or(ServiceError::ArticleNotFound)?;

        // 2. Load or create the locale and its working draft
        let mut locale = match tx.find_locale(article_id, language).await? {
            Some(locale) => locale,
            None => ArticleLocale::new(article_id, language),
        };
        let mut working = match locale.working_version_id {
            Some(id) => tx
                .find_version(id)
                .await?
                .ok_or_else(|| ServiceError::Internal(anyhow!("working version row missing")))?,
            None => WikiVersion::new_working(article_id, language, actor),
        };
        locale.working_version_id = Some(working.id);

        // 3. Field-granular merge; the last writer owns the draft
        if working.apply(&patch) {
            working.created_by = actor;
            locale.dirty = true;
        }

        tx.put_version(&working).await?;
        tx.put_locale(&locale).await?;
        tx.commit().await?;

        Ok(working)
    }

    /// Freeze the dirty working draft as the next published version.
    ///
    /// With nothing new to publish this is a no-op returning the current
    /// published version, or `NoDraftContent` if nothing was ever
    /// published either. Frozen versions are never mutated again and their
    /// numbers are never reused.
    pub async fn publish(
        &self,
        article_id: Uuid,
        language: &str,
        actor: Uuid,
    ) -> Result<WikiVersion, ServiceError> {
        let language = normalized(language)?;

        let mut tx = self.content.begin().await?;

        // 1. Article must exist
        tx.find_article(article_id)
            .await?
            .ok_or(ServiceError::ArticleNotFound)?;

        // 2. Nothing dirty: answer with what is already published
        let Some(mut locale) = tx.find_locale(article_id, language).await? else {
            return Err(ServiceError::NoDraftContent);
        };
        if !locale.dirty {
            let published_id = locale
                .published_version_id
                .ok_or(ServiceError::NoDraftContent)?;
            return tx
                .find_version(published_id)
                .await?
                .ok_or_else(|| ServiceError::Internal(anyhow!("published version row missing")));
        }

        // 3. Freeze the draft under the next number. The counter lives on
        //    the locale, so the number is fresh even if old versions were
        //    deleted
        let working_id = locale
            .working_version_id
            .ok_or(ServiceError::NoDraftContent)?;
        let mut frozen = tx
            .find_version(working_id)
            .await?
            .ok_or_else(|| ServiceError::Internal(anyhow!("working version row missing")))?;
        frozen.freeze(locale.next_version());
        tx.put_version(&frozen).await?;

        // 4. Open a fresh empty draft and move the published pointer
        let fresh = WikiVersion::new_working(article_id, language, actor);
        tx.put_version(&fresh).await?;

        locale.published_version_id = Some(frozen.id);
        locale.working_version_id = Some(fresh.id);
        locale.dirty = false;
        tx.put_locale(&locale).await?;

        tx.commit().await?;

        tracing::info!(
            article_id = %article_id,
            language,
            version = frozen.version,
            "Article version published"
        );

        Ok(frozen)
    }
}

/// Reject blank language codes, passing everything else through.
fn normalized(language: &str) -> Result<&str, ServiceError> {
    let trimmed = language.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidRequest(
            "language must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}
