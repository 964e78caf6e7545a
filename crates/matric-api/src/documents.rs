//! Handlers for document upload, download, and verification.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `PUT`  | `/applications/:id/documents/:certificate_type_id` | Raw body; `X-File-Name` required |
//! | `GET`  | `/documents/:id/file` | Streams the stored bytes back |
//! | `POST` | `/documents/:id/verification` | Body: `{"approve":true,"remarks":"…"}` |

use axum::{
  Json,
  body::Body,
  extract::{Path, Request, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use matric_core::{
  document::ApplicationDocument,
  service::UploadRequest,
  store::{AdmissionStore, DocumentStore},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, actor::ActorIdentity, error::ApiError};

pub const FILE_NAME_HEADER: &str = "x-file-name";

/// Collect the request body, enforcing the configured cap before any
/// processing happens.
async fn collect_body(req: Request, limit: u64) -> Result<Vec<u8>, ApiError> {
  let bytes = axum::body::to_bytes(req.into_body(), limit as usize)
    .await
    .map_err(|_| ApiError::PayloadTooLarge)?;
  Ok(bytes.to_vec())
}

fn media_type(headers: &HeaderMap) -> String {
  headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or("application/octet-stream")
    .to_string()
}

fn declared_size(headers: &HeaderMap, actual: usize) -> u64 {
  headers
    .get(header::CONTENT_LENGTH)
    .and_then(|v| v.to_str().ok())
    .and_then(|s| s.parse().ok())
    .unwrap_or(actual as u64)
}

// ─── Upload ──────────────────────────────────────────────────────────────────

/// `PUT /applications/:id/documents/:certificate_type_id`
pub async fn upload<S, B>(
  State(state): State<AppState<S, B>>,
  ActorIdentity(actor): ActorIdentity,
  Path((application_id, certificate_type_id)): Path<(Uuid, Uuid)>,
  req: Request,
) -> Result<(StatusCode, Json<ApplicationDocument>), ApiError>
where
  S: AdmissionStore + 'static,
  B: DocumentStore + 'static,
{
  let headers = req.headers().clone();

  let original_filename = headers
    .get(FILE_NAME_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(str::to_string)
    .ok_or_else(|| {
      ApiError::BadRequest("missing X-File-Name header".to_string())
    })?;

  let bytes = collect_body(req, state.config.max_upload_bytes).await?;

  let request = UploadRequest {
    declared_size: declared_size(&headers, bytes.len()),
    media_type: media_type(&headers),
    original_filename,
    bytes,
  };

  let document = state
    .service
    .upload(actor, application_id, certificate_type_id, request)
    .await?;
  Ok((StatusCode::OK, Json(document)))
}

// ─── Download ────────────────────────────────────────────────────────────────

/// `GET /documents/:id/file`
pub async fn download<S, B>(
  State(state): State<AppState<S, B>>,
  ActorIdentity(actor): ActorIdentity,
  Path(id): Path<Uuid>,
) -> Result<Response, ApiError>
where
  S: AdmissionStore + 'static,
  B: DocumentStore + 'static,
{
  let (record, bytes) = state.service.document_bytes(actor, id).await?;

  let disposition = format!(
    "attachment; filename=\"{}\"",
    record.upload.original_filename.replace('"', "")
  );
  Ok(
    (
      [
        (header::CONTENT_TYPE, record.upload.media_type),
        (header::CONTENT_DISPOSITION, disposition),
      ],
      Body::from(bytes),
    )
      .into_response(),
  )
}

// ─── Verification ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
  pub approve: bool,
  #[serde(default)]
  pub remarks: Option<String>,
}

/// `POST /documents/:id/verification`
pub async fn verify<S, B>(
  State(state): State<AppState<S, B>>,
  ActorIdentity(actor): ActorIdentity,
  Path(id): Path<Uuid>,
  Json(body): Json<VerifyBody>,
) -> Result<Json<ApplicationDocument>, ApiError>
where
  S: AdmissionStore + 'static,
  B: DocumentStore + 'static,
{
  Ok(Json(
    state
      .service
      .verify(actor, id, body.approve, body.remarks)
      .await?,
  ))
}
