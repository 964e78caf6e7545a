//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Maps every variant of the core taxonomy onto a precise HTTP status, so
//! page handlers never see a partially-applied operation — only a rejected
//! one with an explanatory message.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use matric_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Actor headers missing or malformed.
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// Request body exceeded the configured upload cap.
  #[error("request body too large")]
  PayloadTooLarge,

  #[error(transparent)]
  Core(#[from] CoreError),
}

fn core_status(e: &CoreError) -> StatusCode {
  match e {
    CoreError::ApplicationNotFound(_) | CoreError::DocumentNotFound(_) => {
      StatusCode::NOT_FOUND
    }
    CoreError::UnknownCertificateType { .. }
    | CoreError::InvalidFileType { .. }
    | CoreError::DeclarationRequired => StatusCode::UNPROCESSABLE_ENTITY,
    CoreError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
    CoreError::Forbidden { .. } | CoreError::NotOwner { .. } => {
      StatusCode::FORBIDDEN
    }
    CoreError::ApplicationNotEditable(_)
    | CoreError::InvalidTransition { .. }
    | CoreError::IncompleteApplication { .. }
    | CoreError::DuplicateApplication { .. } => StatusCode::CONFLICT,
    CoreError::Storage(_) | CoreError::Persistence(_) => {
      StatusCode::INTERNAL_SERVER_ERROR
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::Unauthorized(m) => {
        (StatusCode::UNAUTHORIZED, json!({ "error": m }))
      }
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::PayloadTooLarge => (
        StatusCode::PAYLOAD_TOO_LARGE,
        json!({ "error": "request body too large" }),
      ),
      ApiError::Core(e) => {
        let mut body = json!({ "error": e.to_string() });
        // The freeze guard's missing list is machine-readable so status
        // pages can render it per certificate.
        if let CoreError::IncompleteApplication { missing } = e {
          body["missing"] = json!(missing);
        }
        (core_status(e), body)
      }
    };
    (status, Json(body)).into_response()
  }
}
