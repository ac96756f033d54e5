//! Request validation for the create endpoint.
//!
//! The core service assumes validated input; this module is the
//! collaborator that guarantees it, producing per-field error messages
//! for the 422 response.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Raw create payload. Fields are optional so that missing keys surface
/// as field errors instead of a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct StoreTranslationPayload {
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_language: Option<String>,
}

/// Payload that passed validation.
#[derive(Debug)]
pub struct ValidatedStore {
    pub name: String,
    pub title: String,
    pub description: String,
    pub target_language: Option<String>,
}

/// Per-field validation errors, keyed by field name.
pub type FieldErrors = BTreeMap<&'static str, Vec<String>>;

const TARGET_LANGUAGES: &[&str] = &["es", "fr", "de", "it", "pt"];

fn check_text_field(
    errors: &mut FieldErrors,
    field: &'static str,
    label: &str,
    value: Option<&str>,
    min: usize,
    max: usize,
) {
    let Some(value) = value else {
        errors
            .entry(field)
            .or_default()
            .push(format!("The {} field is required.", label));
        return;
    };

    let length = value.chars().count();
    if length < min {
        errors
            .entry(field)
            .or_default()
            .push(format!("The {} must be at least {} characters.", label, min));
    } else if length > max {
        errors.entry(field).or_default().push(format!(
            "The {} may not be greater than {} characters.",
            label, max
        ));
    }
}

/// Validates a create payload. Returns the validated fields or the full
/// set of per-field errors.
pub fn validate_store(payload: StoreTranslationPayload) -> Result<ValidatedStore, FieldErrors> {
    let mut errors = FieldErrors::new();

    check_text_field(&mut errors, "name", "name", payload.name.as_deref(), 2, 255);
    check_text_field(
        &mut errors,
        "title",
        "title",
        payload.title.as_deref(),
        3,
        500,
    );
    check_text_field(
        &mut errors,
        "description",
        "description",
        payload.description.as_deref(),
        10,
        5000,
    );

    if let Some(ref target) = payload.target_language {
        if !TARGET_LANGUAGES.contains(&target.as_str()) {
            errors.entry("target_language").or_default().push(format!(
                "The target language must be one of: {}.",
                TARGET_LANGUAGES.join(", ")
            ));
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    // Presence was checked above; unwraps cannot fire past this point,
    // but keep them structured anyway.
    match (payload.name, payload.title, payload.description) {
        (Some(name), Some(title), Some(description)) => Ok(ValidatedStore {
            name,
            title,
            description,
            target_language: payload.target_language,
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> StoreTranslationPayload {
        StoreTranslationPayload {
            name: Some("John Doe".to_string()),
            title: Some("Welcome Message".to_string()),
            description: Some("This is a welcome message for our users.".to_string()),
            target_language: Some("es".to_string()),
        }
    }

    #[test]
    fn test_valid_payload_passes() {
        let validated = validate_store(valid_payload()).unwrap();
        assert_eq!(validated.name, "John Doe");
        assert_eq!(validated.target_language.as_deref(), Some("es"));
    }

    #[test]
    fn test_target_language_is_optional() {
        let payload = StoreTranslationPayload {
            target_language: None,
            ..valid_payload()
        };
        let validated = validate_store(payload).unwrap();
        assert!(validated.target_language.is_none());
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let errors = validate_store(StoreTranslationPayload::default()).unwrap_err();
        assert_eq!(
            errors.get("name").unwrap(),
            &vec!["The name field is required.".to_string()]
        );
        assert!(errors.contains_key("title"));
        assert!(errors.contains_key("description"));
        assert!(!errors.contains_key("target_language"));
    }

    #[test]
    fn test_boundary_lengths_fail() {
        // name: 1 char, title: 2 chars, description: 9 chars, all just
        // below their minimums.
        let payload = StoreTranslationPayload {
            name: Some("A".to_string()),
            title: Some("Hi".to_string()),
            description: Some("Short one".to_string()),
            target_language: None,
        };
        let errors = validate_store(payload).unwrap_err();
        assert_eq!(
            errors.get("name").unwrap(),
            &vec!["The name must be at least 2 characters.".to_string()]
        );
        assert_eq!(
            errors.get("title").unwrap(),
            &vec!["The title must be at least 3 characters.".to_string()]
        );
        assert_eq!(
            errors.get("description").unwrap(),
            &vec!["The description must be at least 10 characters.".to_string()]
        );
    }

    #[test]
    fn test_boundary_lengths_pass() {
        let payload = StoreTranslationPayload {
            name: Some("Jo".to_string()),
            title: Some("Hey".to_string()),
            description: Some("Ten chars!".to_string()),
            target_language: None,
        };
        assert!(validate_store(payload).is_ok());
    }

    #[test]
    fn test_over_length_fails() {
        let payload = StoreTranslationPayload {
            name: Some("x".repeat(256)),
            ..valid_payload()
        };
        let errors = validate_store(payload).unwrap_err();
        assert_eq!(
            errors.get("name").unwrap(),
            &vec!["The name may not be greater than 255 characters.".to_string()]
        );
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // Two multi-byte characters satisfy the 2-char minimum.
        let payload = StoreTranslationPayload {
            name: Some("éé".to_string()),
            ..valid_payload()
        };
        assert!(validate_store(payload).is_ok());
    }

    #[test]
    fn test_unknown_target_language_fails() {
        let payload = StoreTranslationPayload {
            target_language: Some("jp".to_string()),
            ..valid_payload()
        };
        let errors = validate_store(payload).unwrap_err();
        assert_eq!(
            errors.get("target_language").unwrap(),
            &vec!["The target language must be one of: es, fr, de, it, pt.".to_string()]
        );
    }
}
