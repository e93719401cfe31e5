//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the service
//! layer for business logic. Handlers taking a [`crate::auth::Principal`]
//! require a bearer access token.

pub mod accounts;
pub mod directory;
pub mod health;
pub mod maintenance;

use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};

use super::error::AppError;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Result type for handlers answering `201 Created`.
pub type CreatedResult<T> = Result<(StatusCode, Json<T>), AppError>;

/// Unwrap a JSON body, turning parse failures into `400`.
pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    let Json(value) = payload?;
    Ok(value)
}

pub(crate) fn created<T>(value: T) -> CreatedResult<T> {
    Ok((StatusCode::CREATED, Json(value)))
}
