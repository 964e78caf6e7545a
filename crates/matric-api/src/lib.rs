//! JSON REST API for the matric admission service.
//!
//! Exposes an axum [`Router`] backed by any
//! [`AdmissionStore`](matric_core::store::AdmissionStore) and
//! [`DocumentStore`](matric_core::store::DocumentStore). Session
//! resolution, TLS, and transport concerns are the caller's
//! responsibility; verified identity arrives via the `X-Actor-*` headers.

pub mod actor;
pub mod applications;
pub mod documents;
pub mod error;
pub mod seed;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post, put},
};
use matric_core::{
  service::AdmissionService,
  store::{AdmissionStore, DocumentStore},
};
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_max_upload_bytes() -> u64 { 10 * 1024 * 1024 }

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub database_path:    PathBuf,
  pub uploads_dir:      PathBuf,
  /// Upper bound on upload bodies, enforced before any processing; also
  /// the default per-file cap when a certificate type sets none.
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes: u64,
  /// Optional TOML file of certificate types and program requirements,
  /// applied at startup.
  #[serde(default)]
  pub catalog_path:     Option<PathBuf>,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, B> {
  pub service: Arc<AdmissionService<S, B>>,
  pub config:  Arc<ServerConfig>,
}

impl<S, B> Clone for AppState<S, B> {
  fn clone(&self) -> Self {
    Self {
      service: self.service.clone(),
      config:  self.config.clone(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] exposing the admission operations.
pub fn router<S, B>(state: AppState<S, B>) -> Router
where
  S: AdmissionStore + 'static,
  B: DocumentStore + 'static,
{
  Router::new()
    // Applications
    .route(
      "/applications",
      post(applications::create::<S, B>).get(applications::list_mine::<S, B>),
    )
    .route("/applications/{id}", get(applications::get_one::<S, B>))
    .route(
      "/applications/{id}/requirements",
      get(applications::requirements::<S, B>),
    )
    .route(
      "/applications/{id}/history",
      get(applications::history::<S, B>),
    )
    // Lifecycle
    .route("/applications/{id}/submit", post(applications::submit::<S, B>))
    .route("/applications/{id}/freeze", post(applications::freeze::<S, B>))
    .route("/applications/{id}/review", post(applications::advance::<S, B>))
    .route(
      "/applications/{id}/decision",
      post(applications::decide::<S, B>),
    )
    // Documents
    .route(
      "/applications/{id}/documents/{certificate_type_id}",
      put(documents::upload::<S, B>),
    )
    .route("/documents/{id}/file", get(documents::download::<S, B>))
    .route(
      "/documents/{id}/verification",
      post(documents::verify::<S, B>),
    )
    .with_state(state)
}

#[cfg(test)]
mod tests;
