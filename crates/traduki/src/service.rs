//! Request orchestration: creation with atomic enqueue, plus the
//! read-only query facade used by the API layer.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::db::translation_repo::TranslationRow;
use crate::db::{translation_repo, Database, DatabaseError};
use crate::queue::JobQueue;
use crate::records::{format_timestamp, ListFilter, Page, RecordStore, TranslationRecord};

/// Validated input for a new translation request. Validation happens at
/// the API boundary; by the time this type exists the fields are good.
#[derive(Debug, Clone)]
pub struct NewTranslationRequest {
    pub name: String,
    pub title: String,
    pub description: String,
    pub source_language: String,
    pub target_language: String,
}

impl NewTranslationRequest {
    /// Source language is not client-supplied; it is fixed to "en".
    /// Target defaults to "es" when absent.
    pub fn new(
        name: String,
        title: String,
        description: String,
        target_language: Option<String>,
    ) -> Self {
        Self {
            name,
            title,
            description,
            source_language: "en".to_string(),
            target_language: target_language.unwrap_or_else(|| "es".to_string()),
        }
    }

    /// The pre-translation snapshot persisted with the record.
    fn original_content(&self) -> BTreeMap<String, String> {
        [
            ("name".to_string(), self.name.clone()),
            ("title".to_string(), self.title.clone()),
            ("description".to_string(), self.description.clone()),
        ]
        .into()
    }
}

/// Creates translation requests and serves read-side lookups.
pub struct TranslationService {
    db: Database,
    store: RecordStore,
    queue: JobQueue,
}

impl TranslationService {
    pub fn new(db: Database, store: RecordStore, queue: JobQueue) -> Self {
        Self { db, store, queue }
    }

    /// Persists a new Pending record and enqueues exactly one processing
    /// job for it, atomically: if either write fails, neither is visible.
    /// Returns the created record without waiting for translation.
    pub fn create_translation_request(
        &self,
        request: NewTranslationRequest,
    ) -> Result<TranslationRecord, DatabaseError> {
        let now = format_timestamp(Utc::now());
        let original_content = request.original_content();
        let content_json = serde_json::Value::Object(
            original_content
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        )
        .to_string();

        let row = TranslationRow {
            id: Uuid::new_v4().to_string(),
            name: request.name,
            title: request.title,
            description: request.description,
            source_language: request.source_language,
            target_language: request.target_language,
            original_content: content_json,
            translated_content: None,
            status: "pending".to_string(),
            error_message: None,
            processed_at: None,
            created_at: now.clone(),
            updated_at: now,
        };

        self.db.with_tx(|tx| {
            translation_repo::insert_tx(tx, &row)?;
            self.queue.enqueue(tx, &row.id)
        })?;
        self.queue.wake();

        info!(
            "Translation request created: request_id={} target_language={}",
            row.id, row.target_language
        );

        Ok(TranslationRecord::from_row(row))
    }

    /// Looks up a single record. `None` maps to 404 at the boundary.
    pub fn get_translation_request(
        &self,
        id: &str,
    ) -> Result<Option<TranslationRecord>, DatabaseError> {
        self.store.find_by_id(id)
    }

    /// Lists records newest-first with exact-match filters, 15 per page.
    pub fn list_translation_requests(
        &self,
        filter: &ListFilter,
        page: u32,
    ) -> Result<Page, DatabaseError> {
        self.store.list(filter, page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::queue_repo;
    use crate::queue::QueueConfig;
    use crate::records::TranslationStatus;

    fn test_service() -> (TranslationService, Database) {
        let db = Database::open_in_memory().unwrap();
        let queue = JobQueue::new(db.clone(), QueueConfig::default());
        let store = RecordStore::new(db.clone());
        (TranslationService::new(db.clone(), store, queue), db)
    }

    fn sample_request() -> NewTranslationRequest {
        NewTranslationRequest::new(
            "John Doe".to_string(),
            "Welcome Message".to_string(),
            "This is a welcome message for our users.".to_string(),
            Some("es".to_string()),
        )
    }

    #[test]
    fn test_create_returns_pending_record() {
        let (service, _db) = test_service();

        let record = service.create_translation_request(sample_request()).unwrap();

        assert!(!record.id.is_empty());
        assert_eq!(record.status, TranslationStatus::Pending);
        assert_eq!(record.source_language, "en");
        assert_eq!(record.target_language, "es");
        assert!(record.translated_content.is_none());
        assert!(record.error_message.is_none());
        assert!(record.processed_at.is_none());
    }

    #[test]
    fn test_create_snapshots_original_content() {
        let (service, _db) = test_service();

        let record = service.create_translation_request(sample_request()).unwrap();

        assert_eq!(
            record.original_content.get("name").map(String::as_str),
            Some("John Doe")
        );
        assert_eq!(
            record.original_content.get("title").map(String::as_str),
            Some("Welcome Message")
        );
        assert_eq!(
            record
                .original_content
                .get("description")
                .map(String::as_str),
            Some("This is a welcome message for our users.")
        );
        assert_eq!(record.original_content.len(), 3);
    }

    #[test]
    fn test_create_enqueues_exactly_one_job() {
        let (service, db) = test_service();

        let record = service.create_translation_request(sample_request()).unwrap();

        assert_eq!(
            queue_repo::count_for_translation(&db, &record.id).unwrap(),
            1
        );
        assert_eq!(queue_repo::depth(&db).unwrap(), 1);
    }

    #[test]
    fn test_create_persists_record() {
        let (service, _db) = test_service();

        let created = service.create_translation_request(sample_request()).unwrap();
        let fetched = service
            .get_translation_request(&created.id)
            .unwrap()
            .expect("created record should be readable");

        assert_eq!(fetched.name, "John Doe");
        assert_eq!(fetched.status, TranslationStatus::Pending);
    }

    #[test]
    fn test_target_language_defaults_to_es() {
        let (service, _db) = test_service();

        let record = service
            .create_translation_request(NewTranslationRequest::new(
                "Jane Doe".to_string(),
                "Goodbye Message".to_string(),
                "This is a goodbye message for our users.".to_string(),
                None,
            ))
            .unwrap();

        assert_eq!(record.target_language, "es");
    }

    #[test]
    fn test_get_missing_returns_none() {
        let (service, _db) = test_service();
        assert!(service
            .get_translation_request("no-such-id")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_list_empty() {
        let (service, _db) = test_service();
        let page = service
            .list_translation_requests(&ListFilter::default(), 1)
            .unwrap();
        assert_eq!(page.total, 0);
        assert!(page.records.is_empty());
        assert_eq!(page.per_page, 15);
    }

    #[test]
    fn test_list_filters_by_target_language() {
        let (service, _db) = test_service();

        service.create_translation_request(sample_request()).unwrap();
        service
            .create_translation_request(NewTranslationRequest::new(
                "Jane Doe".to_string(),
                "Greeting".to_string(),
                "A greeting for our French-speaking users.".to_string(),
                Some("fr".to_string()),
            ))
            .unwrap();

        let page = service
            .list_translation_requests(
                &ListFilter {
                    status: None,
                    target_language: Some("fr".to_string()),
                },
                1,
            )
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.records[0].target_language, "fr");
    }
}
