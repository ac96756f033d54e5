//! REST handlers for the translation API.
//!
//! Responses share one envelope: `{success, message?, data?, meta?}`.
//! Failures of the asynchronous translation are never surfaced here;
//! clients observe them by polling a record's `status`/`error_message`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use traduki::{ListFilter, TranslationRecord, TranslationStatus};

use crate::state::AppState;
use crate::validation::{validate_store, FieldErrors, StoreTranslationPayload};

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub target_language: Option<String>,
    pub page: Option<u32>,
}

/// Shapes a record for the wire. `error_message` is present only for
/// failed records; timestamps are ISO-8601.
fn translation_resource(record: &TranslationRecord) -> Value {
    let iso = |dt: chrono::DateTime<chrono::Utc>| {
        dt.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
    };

    let mut resource = json!({
        "id": record.id,
        "name": record.name,
        "title": record.title,
        "description": record.description,
        "source_language": record.source_language,
        "target_language": record.target_language,
        "status": record.status,
        "original_content": record.original_content,
        "translated_content": record.translated_content,
        "processed_at": record.processed_at.map(iso),
        "created_at": iso(record.created_at),
        "updated_at": iso(record.updated_at),
    });
    if record.status == TranslationStatus::Failed {
        resource["error_message"] = json!(record.error_message);
    }
    resource
}

fn validation_error_response(errors: FieldErrors) -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "success": false,
            "message": "The given data was invalid.",
            "errors": errors,
        })),
    )
}

fn internal_error_response(context: &str, e: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    error!("{}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "message": "Internal server error",
        })),
    )
}

/// `POST /v1/translations`
pub async fn store(
    State(state): State<AppState>,
    Json(payload): Json<StoreTranslationPayload>,
) -> (StatusCode, Json<Value>) {
    let validated = match validate_store(payload) {
        Ok(validated) => validated,
        Err(errors) => return validation_error_response(errors),
    };

    let request = traduki::NewTranslationRequest::new(
        validated.name,
        validated.title,
        validated.description,
        validated.target_language,
    );

    match state.service.create_translation_request(request) {
        Ok(record) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": "Translation request created successfully",
                "data": translation_resource(&record),
            })),
        ),
        Err(e) => internal_error_response("Failed to create translation request", e),
    }
}

/// `GET /v1/translations/:id`
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    match state.service.get_translation_request(&id) {
        Ok(Some(record)) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": translation_resource(&record),
            })),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "success": false,
                "message": "Translation request not found",
            })),
        ),
        Err(e) => internal_error_response("Failed to load translation request", e),
    }
}

/// `GET /v1/translations?status=&target_language=&page=`
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> (StatusCode, Json<Value>) {
    // An unrecognized status filter is rejected rather than silently
    // matching nothing.
    let status = match query.status.as_deref() {
        None => None,
        Some(s) => match TranslationStatus::parse(s) {
            Some(status) => Some(status),
            None => {
                let mut errors = FieldErrors::new();
                errors
                    .entry("status")
                    .or_default()
                    .push("The selected status is invalid.".to_string());
                return validation_error_response(errors);
            }
        },
    };

    let filter = ListFilter {
        status,
        target_language: query.target_language,
    };

    match state
        .service
        .list_translation_requests(&filter, query.page.unwrap_or(1))
    {
        Ok(page) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": page.records.iter().map(translation_resource).collect::<Vec<_>>(),
                "meta": {
                    "current_page": page.current_page,
                    "total": page.total,
                    "per_page": page.per_page,
                },
            })),
        ),
        Err(e) => internal_error_response("Failed to list translation requests", e),
    }
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
