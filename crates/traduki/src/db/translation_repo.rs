//! Translation repository — row-level commands for the `translations` table.
//!
//! Mutations are discrete commands (`insert_tx`, `mark_processing`,
//! `mark_completed`, `mark_failed`) rather than whole-row saves, so every
//! status transition is a single auditable statement.

use rusqlite::{params, Row, Transaction};

use super::{Database, DatabaseError};

/// A raw translation row from the database. Content columns hold JSON text.
#[derive(Debug, Clone)]
pub struct TranslationRow {
    pub id: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub source_language: String,
    pub target_language: String,
    pub original_content: String,
    pub translated_content: Option<String>,
    pub status: String,
    pub error_message: Option<String>,
    pub processed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TranslationRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            title: row.get("title")?,
            description: row.get("description")?,
            source_language: row.get("source_language")?,
            target_language: row.get("target_language")?,
            original_content: row.get("original_content")?,
            translated_content: row.get("translated_content")?,
            status: row.get("status")?,
            error_message: row.get("error_message")?,
            processed_at: row.get("processed_at")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Query filter parameters for translation listing.
#[derive(Debug, Default, Clone)]
pub struct TranslationFilter {
    pub status: Option<String>,
    pub target_language: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Inserts a new translation row inside an open transaction.
///
/// Creation always runs in the same transaction as the job enqueue, so
/// this takes a `Transaction` rather than the `Database` handle.
pub fn insert_tx(tx: &Transaction<'_>, row: &TranslationRow) -> Result<(), DatabaseError> {
    tx.execute(
        "INSERT INTO translations (id, name, title, description, source_language,
         target_language, original_content, translated_content, status, error_message,
         processed_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            row.id,
            row.name,
            row.title,
            row.description,
            row.source_language,
            row.target_language,
            row.original_content,
            row.translated_content,
            row.status,
            row.error_message,
            row.processed_at,
            row.created_at,
            row.updated_at,
        ],
    )?;
    Ok(())
}

/// Finds a translation by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<TranslationRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM translations WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], TranslationRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Queries translations with filters, newest first, returning (rows, total_count).
pub fn query(
    db: &Database,
    filter: &TranslationFilter,
) -> Result<(Vec<TranslationRow>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref status) = filter.status {
            conditions.push(format!("status = ?{}", param_values.len() + 1));
            param_values.push(Box::new(status.clone()));
        }
        if let Some(ref target_language) = filter.target_language {
            conditions.push(format!("target_language = ?{}", param_values.len() + 1));
            param_values.push(Box::new(target_language.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        // Count total matching rows.
        let count_sql = format!("SELECT COUNT(*) FROM translations {}", where_clause);
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

        // Fetch paginated results.
        let limit = filter.limit.unwrap_or(100) as i64;
        let offset = filter.offset.unwrap_or(0) as i64;
        param_values.push(Box::new(limit));
        param_values.push(Box::new(offset));
        let query_sql = format!(
            "SELECT * FROM translations {} ORDER BY created_at DESC LIMIT ?{} OFFSET ?{}",
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query_sql)?;
        let rows: Vec<TranslationRow> = stmt
            .query_map(params_ref.as_slice(), TranslationRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}

/// Transitions a translation to `processing`.
pub fn mark_processing(db: &Database, id: &str, updated_at: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE translations SET status = 'processing', updated_at = ?2 WHERE id = ?1",
            params![id, updated_at],
        )?;
        Ok(())
    })
}

/// Transitions a translation to `completed` and stores the translated content.
pub fn mark_completed(
    db: &Database,
    id: &str,
    translated_content: &str,
    processed_at: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE translations SET status = 'completed', translated_content = ?2,
             processed_at = ?3, updated_at = ?3 WHERE id = ?1",
            params![id, translated_content, processed_at],
        )?;
        Ok(())
    })
}

/// Transitions a translation to `failed` and stores the error message.
pub fn mark_failed(
    db: &Database,
    id: &str,
    error_message: &str,
    processed_at: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE translations SET status = 'failed', error_message = ?2,
             processed_at = ?3, updated_at = ?3 WHERE id = ?1",
            params![id, error_message, processed_at],
        )?;
        Ok(())
    })
}

/// Counts translations with the given status.
pub fn count_by_status(db: &Database, status: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM translations WHERE status = ?1",
            params![status],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
