//! Integration tests driving the router end-to-end over an in-memory
//! store and a temp-dir document store.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use matric_core::{
  catalog::{CertificateType, ProgramCertificateRequirement},
  service::{AdmissionService, UploadPolicy},
  store::AdmissionStore as _,
};
use matric_files::FsDocumentStore;
use matric_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{AppState, ServerConfig, router};

const MAX_UPLOAD_BYTES: u64 = 64 * 1024;

async fn make_state() -> AppState<SqliteStore, FsDocumentStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let uploads_dir =
    std::env::temp_dir().join(format!("matric-api-{}", Uuid::new_v4()));
  let files = FsDocumentStore::open(&uploads_dir).await.unwrap();

  let config = ServerConfig {
    host:             "127.0.0.1".to_string(),
    port:             0,
    database_path:    ":memory:".into(),
    uploads_dir,
    max_upload_bytes: MAX_UPLOAD_BYTES,
    catalog_path:     None,
  };

  let service = AdmissionService::new(
    Arc::new(store),
    Arc::new(files),
    UploadPolicy {
      default_max_size_bytes: config.max_upload_bytes,
    },
  );

  AppState {
    service: Arc::new(service),
    config:  Arc::new(config),
  }
}

/// Seed one certificate type + requirement for `bsc-physics`.
async fn seed_requirement(
  state: &AppState<SqliteStore, FsDocumentStore>,
  name: &str,
  required: bool,
  max_size_bytes: Option<u64>,
) -> Uuid {
  let store = state.service.store();
  let certificate_type_id = Uuid::new_v4();
  store
    .put_certificate_type(CertificateType {
      certificate_type_id,
      name: name.into(),
      description: None,
      allowed_extensions: vec![],
      max_size_bytes,
      active: true,
    })
    .await
    .unwrap();
  store
    .put_requirement(ProgramCertificateRequirement {
      program_id: "bsc-physics".into(),
      certificate_type_id,
      required,
      display_order: 1,
      special_instructions: None,
    })
    .await
    .unwrap();
  certificate_type_id
}

fn with_actor(
  builder: axum::http::request::Builder,
  actor: Option<(Uuid, &str)>,
) -> axum::http::request::Builder {
  match actor {
    Some((id, role)) => builder
      .header("x-actor-id", id.to_string())
      .header("x-actor-role", role),
    None => builder,
  }
}

async fn send_json(
  state: AppState<SqliteStore, FsDocumentStore>,
  method: &str,
  uri: &str,
  actor: Option<(Uuid, &str)>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  builder = with_actor(builder, actor);

  let request = match body {
    Some(value) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(value.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let response = router(state).oneshot(request).await.unwrap();
  let status = response.status();
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
  };
  (status, value)
}

async fn send_upload(
  state: AppState<SqliteStore, FsDocumentStore>,
  application_id: &str,
  certificate_type_id: Uuid,
  actor: (Uuid, &str),
  filename: &str,
  bytes: Vec<u8>,
) -> (StatusCode, Value) {
  let uri =
    format!("/applications/{application_id}/documents/{certificate_type_id}");
  let request = with_actor(
    Request::builder().method("PUT").uri(uri),
    Some(actor),
  )
  .header("x-file-name", filename)
  .header(header::CONTENT_TYPE, "application/pdf")
  .body(Body::from(bytes))
  .unwrap();

  let response = router(state).oneshot(request).await.unwrap();
  let status = response.status();
  let body = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
  (status, value)
}

async fn create_application(
  state: &AppState<SqliteStore, FsDocumentStore>,
  student: Uuid,
) -> String {
  let (status, body) = send_json(
    state.clone(),
    "POST",
    "/applications",
    Some((student, "student")),
    Some(json!({"program_id": "bsc-physics", "academic_year": "2026-27"})),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  body["application"]["application_id"]
    .as_str()
    .unwrap()
    .to_string()
}

// ─── Actor headers ───────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_actor_headers_return_401() {
  let state = make_state().await;
  let (status, _) =
    send_json(state, "GET", "/applications", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_role_returns_401() {
  let state = make_state().await;
  let (status, _) = send_json(
    state,
    "GET",
    "/applications",
    Some((Uuid::new_v4(), "registrar")),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ─── Applications ────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_returns_draft_with_display_attributes() {
  let state = make_state().await;
  let student = Uuid::new_v4();

  let (status, body) = send_json(
    state,
    "POST",
    "/applications",
    Some((student, "student")),
    Some(json!({"program_id": "bsc-physics", "academic_year": "2026-27"})),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["application"]["status"], "draft");
  assert_eq!(body["display"]["label"], "Draft");
  assert!(body["application"]["application_number"].is_null());
}

#[tokio::test]
async fn duplicate_application_returns_409() {
  let state = make_state().await;
  let student = Uuid::new_v4();
  create_application(&state, student).await;

  let (status, _) = send_json(
    state,
    "POST",
    "/applications",
    Some((student, "student")),
    Some(json!({"program_id": "bsc-physics", "academic_year": "2026-27"})),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn students_cannot_read_each_others_applications() {
  let state = make_state().await;
  let app_id = create_application(&state, Uuid::new_v4()).await;

  let (status, _) = send_json(
    state,
    "GET",
    &format!("/applications/{app_id}"),
    Some((Uuid::new_v4(), "student")),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

// ─── Upload validation over HTTP ─────────────────────────────────────────────

#[tokio::test]
async fn upload_with_disallowed_extension_returns_422() {
  let state = make_state().await;
  let student = Uuid::new_v4();
  let app_id = create_application(&state, student).await;
  let income = seed_requirement(&state, "Income Certificate", true, None).await;

  let (status, body) = send_upload(
    state,
    &app_id,
    income,
    (student, "student"),
    "income.docx",
    b"not a pdf".to_vec(),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert!(body["error"].as_str().unwrap().contains("docx"));
}

#[tokio::test]
async fn upload_over_the_type_cap_returns_413() {
  let state = make_state().await;
  let student = Uuid::new_v4();
  let app_id = create_application(&state, student).await;
  let income =
    seed_requirement(&state, "Income Certificate", true, Some(16)).await;

  let (status, _) = send_upload(
    state,
    &app_id,
    income,
    (student, "student"),
    "income.pdf",
    vec![0u8; 64],
  )
  .await;
  assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn upload_over_the_body_cap_returns_413_before_validation() {
  let state = make_state().await;
  let student = Uuid::new_v4();
  let app_id = create_application(&state, student).await;
  let income = seed_requirement(&state, "Income Certificate", true, None).await;

  let (status, _) = send_upload(
    state,
    &app_id,
    income,
    (student, "student"),
    "income.pdf",
    vec![0u8; (MAX_UPLOAD_BYTES + 1) as usize],
  )
  .await;
  assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn upload_for_unknown_certificate_type_returns_422() {
  let state = make_state().await;
  let student = Uuid::new_v4();
  let app_id = create_application(&state, student).await;

  let (status, _) = send_upload(
    state,
    &app_id,
    Uuid::new_v4(),
    (student, "student"),
    "income.pdf",
    b"%PDF-1.4".to_vec(),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn upload_without_filename_header_returns_400() {
  let state = make_state().await;
  let student = Uuid::new_v4();
  let app_id = create_application(&state, student).await;
  let income = seed_requirement(&state, "Income Certificate", true, None).await;

  let request = with_actor(
    Request::builder()
      .method("PUT")
      .uri(format!("/applications/{app_id}/documents/{income}")),
    Some((student, "student")),
  )
  .body(Body::from(b"%PDF-1.4".to_vec()))
  .unwrap();
  let response = router(state).oneshot(request).await.unwrap();
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ─── End-to-end flow ─────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_freeze_and_review_flow() {
  let state = make_state().await;
  let student = Uuid::new_v4();
  let reviewer = Uuid::new_v4();
  let app_id = create_application(&state, student).await;
  let income = seed_requirement(&state, "Income Certificate", true, None).await;
  seed_requirement(&state, "Sports Certificate", false, None).await;

  // Requirements start incomplete, listing the required type.
  let (status, body) = send_json(
    state.clone(),
    "GET",
    &format!("/applications/{app_id}/requirements"),
    Some((student, "student")),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["completeness"]["complete"], json!(false));
  assert_eq!(
    body["completeness"]["missing"],
    json!(["Income Certificate"])
  );
  assert_eq!(body["matrix"]["rows"].as_array().unwrap().len(), 2);

  // Submit, then try to freeze while incomplete: 409 with the names.
  let (status, _) = send_json(
    state.clone(),
    "POST",
    &format!("/applications/{app_id}/submit"),
    Some((student, "student")),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (status, body) = send_json(
    state.clone(),
    "POST",
    &format!("/applications/{app_id}/freeze"),
    Some((student, "student")),
    Some(json!({"declaration_accepted": true})),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["missing"], json!(["Income Certificate"]));

  // Upload the required document; the matrix flips to complete.
  let (status, body) = send_upload(
    state.clone(),
    &app_id,
    income,
    (student, "student"),
    "income.pdf",
    b"%PDF-1.4 income".to_vec(),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["verified"], json!(false));
  let document_id = body["document_id"].as_str().unwrap().to_string();

  // Freeze without the declaration is rejected deterministically.
  let (status, _) = send_json(
    state.clone(),
    "POST",
    &format!("/applications/{app_id}/freeze"),
    Some((student, "student")),
    Some(json!({"declaration_accepted": false})),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  // Freeze with the declaration succeeds and assigns the number.
  let (status, _) = send_json(
    state.clone(),
    "POST",
    &format!("/applications/{app_id}/freeze"),
    Some((student, "student")),
    Some(json!({"declaration_accepted": true})),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (status, body) = send_json(
    state.clone(),
    "GET",
    &format!("/applications/{app_id}"),
    Some((student, "student")),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["application"]["status"], "frozen");
  assert_eq!(
    body["application"]["application_number"],
    json!("2026-27-000001")
  );
  assert_eq!(body["display"]["label"], "Frozen");

  // Uploads are locked after the freeze.
  let (status, _) = send_upload(
    state.clone(),
    &app_id,
    income,
    (student, "student"),
    "late.pdf",
    b"%PDF-1.4 late".to_vec(),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  // Students cannot verify; a program admin can.
  let (status, _) = send_json(
    state.clone(),
    "POST",
    &format!("/documents/{document_id}/verification"),
    Some((student, "student")),
    Some(json!({"approve": true})),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = send_json(
    state.clone(),
    "POST",
    &format!("/documents/{document_id}/verification"),
    Some((reviewer, "program_admin")),
    Some(json!({"approve": true, "remarks": "seal checked"})),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["verified"], json!(true));

  // Verification did not move the application.
  let (_, body) = send_json(
    state.clone(),
    "GET",
    &format!("/applications/{app_id}"),
    Some((student, "student")),
    None,
  )
  .await;
  assert_eq!(body["application"]["status"], "frozen");

  // Advance and decide.
  let (status, _) = send_json(
    state.clone(),
    "POST",
    &format!("/applications/{app_id}/review"),
    Some((reviewer, "program_admin")),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (status, _) = send_json(
    state.clone(),
    "POST",
    &format!("/applications/{app_id}/decision"),
    Some((reviewer, "program_admin")),
    Some(json!({"approve": true, "remarks": "complete file"})),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  // History reconstructs the full chain.
  let (status, body) = send_json(
    state,
    "GET",
    &format!("/applications/{app_id}/history"),
    Some((student, "student")),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let entries = body.as_array().unwrap();
  assert_eq!(entries.len(), 4);
  assert_eq!(entries[0]["from_status"], "draft");
  assert_eq!(entries[3]["to_status"], "approved");
}

#[tokio::test]
async fn reverse_transition_returns_409() {
  let state = make_state().await;
  let student = Uuid::new_v4();
  let app_id = create_application(&state, student).await;

  let (status, _) = send_json(
    state.clone(),
    "POST",
    &format!("/applications/{app_id}/submit"),
    Some((student, "student")),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  // Submitting again is Submitted → Submitted, which the table rejects.
  let (status, body) = send_json(
    state,
    "POST",
    &format!("/applications/{app_id}/submit"),
    Some((student, "student")),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(body["error"].as_str().unwrap().contains("Submitted"));
}

#[tokio::test]
async fn download_roundtrips_the_stored_bytes() {
  let state = make_state().await;
  let student = Uuid::new_v4();
  let app_id = create_application(&state, student).await;
  let income = seed_requirement(&state, "Income Certificate", true, None).await;

  let (status, body) = send_upload(
    state.clone(),
    &app_id,
    income,
    (student, "student"),
    "income.pdf",
    b"%PDF-1.4 original bytes".to_vec(),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let document_id = body["document_id"].as_str().unwrap();

  let request = with_actor(
    Request::builder()
      .method("GET")
      .uri(format!("/documents/{document_id}/file")),
    Some((student, "student")),
  )
  .body(Body::empty())
  .unwrap();
  let response = router(state).oneshot(request).await.unwrap();
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(
    response
      .headers()
      .get(header::CONTENT_TYPE)
      .unwrap()
      .to_str()
      .unwrap(),
    "application/pdf"
  );
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  assert_eq!(&bytes[..], b"%PDF-1.4 original bytes");
}
