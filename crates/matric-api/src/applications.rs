//! Handlers for `/applications` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/applications` | Body: `{"program_id":"…","academic_year":"…"}` |
//! | `GET`  | `/applications` | The acting user's applications |
//! | `GET`  | `/applications/:id` | Application + status display attributes |
//! | `GET`  | `/applications/:id/requirements` | Requirement matrix + completeness |
//! | `GET`  | `/applications/:id/history` | Append-only status history |
//! | `POST` | `/applications/:id/submit` | `Draft → Submitted` |
//! | `POST` | `/applications/:id/freeze` | Body: `{"declaration_accepted":true}` |
//! | `POST` | `/applications/:id/review` | `Frozen → UnderReview` |
//! | `POST` | `/applications/:id/decision` | Body: `{"approve":true,"remarks":"…"}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use matric_core::{
  application::{Application, StatusDisplay, StatusHistoryEntry},
  matrix::{Completeness, RequirementMatrix},
  store::{AdmissionStore, DocumentStore},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, actor::ActorIdentity, error::ApiError};

// ─── Responses ───────────────────────────────────────────────────────────────

/// An application together with its display attributes, so status pages
/// never re-derive icon/colour/label themselves.
#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
  pub application: Application,
  pub display:     StatusDisplay,
}

impl From<Application> for ApplicationResponse {
  fn from(application: Application) -> Self {
    let display = application.status.display();
    Self {
      application,
      display,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct RequirementsResponse {
  pub matrix:       RequirementMatrix,
  pub completeness: Completeness,
}

// ─── Create / read ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub program_id:    String,
  pub academic_year: String,
}

/// `POST /applications`
pub async fn create<S, B>(
  State(state): State<AppState<S, B>>,
  ActorIdentity(actor): ActorIdentity,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AdmissionStore + 'static,
  B: DocumentStore + 'static,
{
  let application = state
    .service
    .create_application(actor, body.program_id, body.academic_year)
    .await?;
  Ok((StatusCode::CREATED, Json(ApplicationResponse::from(application))))
}

/// `GET /applications`
pub async fn list_mine<S, B>(
  State(state): State<AppState<S, B>>,
  ActorIdentity(actor): ActorIdentity,
) -> Result<Json<Vec<ApplicationResponse>>, ApiError>
where
  S: AdmissionStore + 'static,
  B: DocumentStore + 'static,
{
  let applications = state.service.my_applications(actor).await?;
  Ok(Json(
    applications
      .into_iter()
      .map(ApplicationResponse::from)
      .collect(),
  ))
}

/// `GET /applications/:id`
pub async fn get_one<S, B>(
  State(state): State<AppState<S, B>>,
  ActorIdentity(actor): ActorIdentity,
  Path(id): Path<Uuid>,
) -> Result<Json<ApplicationResponse>, ApiError>
where
  S: AdmissionStore + 'static,
  B: DocumentStore + 'static,
{
  let application = state.service.application(actor, id).await?;
  Ok(Json(ApplicationResponse::from(application)))
}

/// `GET /applications/:id/requirements`
pub async fn requirements<S, B>(
  State(state): State<AppState<S, B>>,
  ActorIdentity(actor): ActorIdentity,
  Path(id): Path<Uuid>,
) -> Result<Json<RequirementsResponse>, ApiError>
where
  S: AdmissionStore + 'static,
  B: DocumentStore + 'static,
{
  let matrix = state.service.requirement_matrix(actor, id).await?;
  let completeness = matrix.completeness();
  Ok(Json(RequirementsResponse {
    matrix,
    completeness,
  }))
}

/// `GET /applications/:id/history`
pub async fn history<S, B>(
  State(state): State<AppState<S, B>>,
  ActorIdentity(actor): ActorIdentity,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<StatusHistoryEntry>>, ApiError>
where
  S: AdmissionStore + 'static,
  B: DocumentStore + 'static,
{
  Ok(Json(state.service.status_history(actor, id).await?))
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RemarksBody {
  pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FreezeBody {
  pub declaration_accepted: bool,
  #[serde(default)]
  pub remarks:              Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DecisionBody {
  pub approve: bool,
  #[serde(default)]
  pub remarks: Option<String>,
}

/// `POST /applications/:id/submit`
pub async fn submit<S, B>(
  State(state): State<AppState<S, B>>,
  ActorIdentity(actor): ActorIdentity,
  Path(id): Path<Uuid>,
) -> Result<Json<StatusHistoryEntry>, ApiError>
where
  S: AdmissionStore + 'static,
  B: DocumentStore + 'static,
{
  Ok(Json(state.service.submit(actor, id).await?))
}

/// `POST /applications/:id/freeze`
pub async fn freeze<S, B>(
  State(state): State<AppState<S, B>>,
  ActorIdentity(actor): ActorIdentity,
  Path(id): Path<Uuid>,
  Json(body): Json<FreezeBody>,
) -> Result<Json<StatusHistoryEntry>, ApiError>
where
  S: AdmissionStore + 'static,
  B: DocumentStore + 'static,
{
  Ok(Json(
    state
      .service
      .freeze(actor, id, body.declaration_accepted, body.remarks)
      .await?,
  ))
}

/// `POST /applications/:id/review`
pub async fn advance<S, B>(
  State(state): State<AppState<S, B>>,
  ActorIdentity(actor): ActorIdentity,
  Path(id): Path<Uuid>,
  body: Option<Json<RemarksBody>>,
) -> Result<Json<StatusHistoryEntry>, ApiError>
where
  S: AdmissionStore + 'static,
  B: DocumentStore + 'static,
{
  let remarks = body.and_then(|Json(b)| b.remarks);
  Ok(Json(
    state.service.advance_to_review(actor, id, remarks).await?,
  ))
}

/// `POST /applications/:id/decision`
pub async fn decide<S, B>(
  State(state): State<AppState<S, B>>,
  ActorIdentity(actor): ActorIdentity,
  Path(id): Path<Uuid>,
  Json(body): Json<DecisionBody>,
) -> Result<Json<StatusHistoryEntry>, ApiError>
where
  S: AdmissionStore + 'static,
  B: DocumentStore + 'static,
{
  Ok(Json(
    state
      .service
      .decide(actor, id, body.approve, body.remarks)
      .await?,
  ))
}
