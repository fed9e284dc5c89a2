//! API handlers module

pub mod health;
pub mod meetings;

use axum::extract::rejection::JsonRejection;
use axum::http::Uri;
use axum::Json;
use meetprep_common::errors::{AppError, Result};
use validator::Validate;

/// Decode and validate a JSON body, mapping failures onto [`AppError`]
pub(crate) fn validated<T: Validate>(
    payload: std::result::Result<Json<T>, JsonRejection>,
) -> Result<T> {
    let Json(request) = payload.map_err(|rejection| AppError::InvalidFormat {
        message: rejection.body_text(),
    })?;

    request.validate().map_err(|e| AppError::Validation {
        field: e.field_errors().keys().next().map(|field| field.to_string()),
        message: e.to_string(),
    })?;

    Ok(request)
}

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound {
        resource_type: "route".to_string(),
        id: uri.path().to_string(),
    }
}
