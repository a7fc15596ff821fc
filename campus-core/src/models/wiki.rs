//! Wiki article models - the append-only version ledger rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lifecycle::LifecycleStatus;

/// Version status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Working,
    Published,
}

impl VersionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionStatus::Working => "working",
            VersionStatus::Published => "published",
        }
    }
}

/// Wiki article entity. Content lives in per-language version rows; the
/// article row carries identity and lifecycle only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiArticle {
    pub id: Uuid,
    pub slug: String,
    pub status: LifecycleStatus,
    pub created_at: DateTime<Utc>,
}

impl WikiArticle {
    pub fn new(slug: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            slug,
            status: LifecycleStatus::Draft,
            created_at: Utc::now(),
        }
    }
}

/// One row of the version ledger.
///
/// Exactly one working row exists per (article, language) at a time; it
/// carries the sentinel number 0 and is the only row that ever mutates.
/// Published rows are frozen: their number is assigned once at publish time
/// and their content never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiVersion {
    pub id: Uuid,
    pub article_id: Uuid,
    pub language: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub content: String,
    pub version: i32,
    pub status: VersionStatus,
    /// Last writer. Autosaves move this to whoever sent the payload.
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WikiVersion {
    /// Start a fresh, empty working version.
    pub fn new_working(article_id: Uuid, language: &str, created_by: Uuid) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            article_id,
            language: language.to_string(),
            title: String::new(),
            subtitle: None,
            content: String::new(),
            version: 0,
            status: VersionStatus::Working,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_working(&self) -> bool {
        self.status == VersionStatus::Working
    }

    /// Merge an autosave payload into this row. Absent fields keep their
    /// current value. Returns whether any field was touched.
    pub fn apply(&mut self, patch: &DraftPatch) -> bool {
        let touched = patch.title.is_some() || patch.subtitle.is_some() || patch.content.is_some();

        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(subtitle) = &patch.subtitle {
            self.subtitle = Some(subtitle.clone());
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if touched {
            self.updated_at = Utc::now();
        }

        touched
    }

    /// Freeze this row as the published version with the given number.
    pub fn freeze(&mut self, number: i32) {
        self.version = number;
        self.status = VersionStatus::Published;
        self.updated_at = Utc::now();
    }
}

/// Partial autosave payload. Absent fields are left alone rather than
/// cleared, so concurrent editors only clobber what they actually sent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftPatch {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub content: Option<String>,
}

/// Per-(article, language) ledger bookkeeping.
///
/// `version_counter` is the only source of published numbers. It lives here,
/// not on version rows, so deleting a published version can never free a
/// number for reuse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleLocale {
    pub article_id: Uuid,
    pub language: String,
    pub version_counter: i32,
    pub published_version_id: Option<Uuid>,
    pub working_version_id: Option<Uuid>,
    pub dirty: bool,
}

impl ArticleLocale {
    pub fn new(article_id: Uuid, language: &str) -> Self {
        Self {
            article_id,
            language: language.to_string(),
            version_counter: 0,
            published_version_id: None,
            working_version_id: None,
            dirty: false,
        }
    }

    /// Allocate the next published number. Strictly increasing, gapless,
    /// starting at 1.
    pub fn next_version(&mut self) -> i32 {
        self.version_counter += 1;
        self.version_counter
    }
}
