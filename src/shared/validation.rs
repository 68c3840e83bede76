//! Validation Utilities

use validator::{Validate, ValidationErrors};

use super::error::AppError;

/// Validate a request body, turning the first field error into an `AppError`.
pub fn validate_request<T: Validate>(body: &T) -> Result<(), AppError> {
    body.validate().map_err(validation_error)
}

/// Convert validation errors to AppError
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let message = fields
        .into_iter()
        .find_map(|(field, errs)| {
            errs.first().map(|e| {
                let detail = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, detail)
            })
        })
        .unwrap_or_else(|| "Validation failed".into());

    AppError::Validation(message)
}

/// Require a non-blank search term.
pub fn require_search_query(query: Option<&str>) -> Result<&str, AppError> {
    match query.map(str::trim) {
        Some(q) if !q.is_empty() => Ok(q),
        _ => Err(AppError::BadRequest("Search query is required".into())),
    }
}

/// Parse a snowflake path or body parameter.
pub fn parse_id(raw: &str, what: &str) -> Result<i64, AppError> {
    crate::shared::snowflake::from_string(raw)
        .map_err(|_| AppError::BadRequest(format!("Invalid {} ID", what)))
}
