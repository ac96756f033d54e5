//! Translation records — the domain view over the `translations` table.
//!
//! `RecordStore` wraps the raw repository with typed conversions: status
//! strings become the `TranslationStatus` state machine, timestamps become
//! `DateTime<Utc>`, and content columns become string maps.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::translation_repo::{self, TranslationFilter, TranslationRow};
use crate::db::{Database, DatabaseError};

/// Records per listing page, matching the public API contract.
pub const PER_PAGE: u32 = 15;

// ─── Status ─────────────────────────────────────────────────────────────────

/// Lifecycle state of a translation request.
///
/// Pending and Processing are non-terminal; Completed and Failed are
/// terminal and never mutate again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TranslationStatus {
    /// The lowercase wire/storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TranslationStatus::Pending => "pending",
            TranslationStatus::Processing => "processing",
            TranslationStatus::Completed => "completed",
            TranslationStatus::Failed => "failed",
        }
    }

    /// Parses the storage representation. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TranslationStatus::Pending),
            "processing" => Some(TranslationStatus::Processing),
            "completed" => Some(TranslationStatus::Completed),
            "failed" => Some(TranslationStatus::Failed),
            _ => None,
        }
    }

    /// Whether this state admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TranslationStatus::Completed | TranslationStatus::Failed
        )
    }
}

impl std::fmt::Display for TranslationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn parse_status(s: &str, translation_id: &str) -> TranslationStatus {
    TranslationStatus::parse(s).unwrap_or_else(|| {
        log::warn!(
            "Unknown translation status '{}' for record {}, defaulting to Pending",
            s,
            translation_id
        );
        TranslationStatus::Pending
    })
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            log::warn!("parse_timestamp: failed to parse '{}': {}", s, e);
            Utc::now()
        })
}

/// Formats a timestamp for storage. RFC 3339 with a fixed UTC offset keeps
/// lexicographic and chronological order in agreement for SQL comparisons.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_content(s: &str, translation_id: &str) -> BTreeMap<String, String> {
    serde_json::from_str(s).unwrap_or_else(|e| {
        log::warn!(
            "Malformed content JSON for record {}: {}",
            translation_id,
            e
        );
        BTreeMap::new()
    })
}

// ─── TranslationRecord ──────────────────────────────────────────────────────

/// A translation request and its lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRecord {
    /// Unique identifier (UUID), assigned at creation.
    pub id: String,
    /// Client-supplied fields, immutable after creation.
    pub name: String,
    pub title: String,
    pub description: String,
    /// Language pair.
    pub source_language: String,
    pub target_language: String,
    /// Snapshot of the input fields taken at creation time.
    pub original_content: BTreeMap<String, String>,
    /// Translated field map; `Some` iff status is Completed.
    pub translated_content: Option<BTreeMap<String, String>>,
    /// Current lifecycle state.
    pub status: TranslationStatus,
    /// Failure description; `Some` iff status is Failed.
    pub error_message: Option<String>,
    /// Set when a terminal state is reached.
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TranslationRecord {
    /// Builds the domain record from a raw row, tolerating (and logging)
    /// malformed stored values rather than failing reads.
    pub fn from_row(row: TranslationRow) -> Self {
        let status = parse_status(&row.status, &row.id);
        let original_content = parse_content(&row.original_content, &row.id);
        let translated_content = row
            .translated_content
            .as_deref()
            .map(|s| parse_content(s, &row.id));

        Self {
            status,
            original_content,
            translated_content,
            error_message: row.error_message,
            processed_at: row.processed_at.as_deref().map(parse_timestamp),
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
            id: row.id,
            name: row.name,
            title: row.title,
            description: row.description,
            source_language: row.source_language,
            target_language: row.target_language,
        }
    }
}

// ─── Listing ────────────────────────────────────────────────────────────────

/// Typed listing filters. An unknown status string cannot reach the store;
/// the API boundary rejects it before constructing a filter.
#[derive(Debug, Default, Clone)]
pub struct ListFilter {
    pub status: Option<TranslationStatus>,
    pub target_language: Option<String>,
}

/// One page of a listing, newest first.
#[derive(Debug, Clone)]
pub struct Page {
    pub records: Vec<TranslationRecord>,
    pub current_page: u32,
    pub total: u64,
    pub per_page: u32,
}

// ─── RecordStore ────────────────────────────────────────────────────────────

/// Typed command interface over the `translations` table.
///
/// Mutations are only ever issued by the job processor (and the creation
/// transaction); reads serve the query facade.
#[derive(Clone)]
pub struct RecordStore {
    db: Database,
}

impl RecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Looks up a record by id.
    pub fn find_by_id(&self, id: &str) -> Result<Option<TranslationRecord>, DatabaseError> {
        Ok(translation_repo::find_by_id(&self.db, id)?.map(TranslationRecord::from_row))
    }

    /// Lists records matching the filter, newest first. `page` is 1-based.
    pub fn list(&self, filter: &ListFilter, page: u32) -> Result<Page, DatabaseError> {
        let page = page.max(1);
        let repo_filter = TranslationFilter {
            status: filter.status.map(|s| s.as_str().to_string()),
            target_language: filter.target_language.clone(),
            limit: Some(PER_PAGE as u64),
            offset: Some((page as u64 - 1) * PER_PAGE as u64),
        };

        let (rows, total) = translation_repo::query(&self.db, &repo_filter)?;
        Ok(Page {
            records: rows.into_iter().map(TranslationRecord::from_row).collect(),
            current_page: page,
            total,
            per_page: PER_PAGE,
        })
    }

    /// Pending → Processing, persisted at the start of every attempt.
    pub fn mark_processing(&self, id: &str) -> Result<(), DatabaseError> {
        translation_repo::mark_processing(&self.db, id, &format_timestamp(Utc::now()))
    }

    /// Processing → Completed with the translated field map.
    pub fn mark_completed(
        &self,
        id: &str,
        translated_content: &BTreeMap<String, String>,
    ) -> Result<(), DatabaseError> {
        let object = serde_json::Map::from_iter(
            translated_content
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone()))),
        );
        let json = serde_json::Value::Object(object).to_string();
        translation_repo::mark_completed(&self.db, id, &json, &format_timestamp(Utc::now()))
    }

    /// Processing → Failed with a human-readable error.
    pub fn mark_failed(&self, id: &str, error_message: &str) -> Result<(), DatabaseError> {
        translation_repo::mark_failed(
            &self.db,
            id,
            error_message,
            &format_timestamp(Utc::now()),
        )
    }
}
