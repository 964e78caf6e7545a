//! Error types for `matric-core`.
//!
//! One taxonomy for the whole workspace: validation, lookup, authorization
//! and lifecycle failures are all typed, so every layer up to the HTTP
//! surface can match on the exact variant. Backend failures carry only a
//! generic message; the store logs the full context before mapping.

use thiserror::Error;
use uuid::Uuid;

use crate::{actor::{Action, Role}, application::ApplicationStatus};

#[derive(Debug, Error)]
pub enum Error {
  // ── Lookup ────────────────────────────────────────────────────────────

  #[error("application not found: {0}")]
  ApplicationNotFound(Uuid),

  #[error("document not found: {0}")]
  DocumentNotFound(Uuid),

  #[error("certificate type {certificate_type_id} is not an active requirement of program {program_id:?}")]
  UnknownCertificateType {
    program_id:          String,
    certificate_type_id: Uuid,
  },

  // ── Validation ────────────────────────────────────────────────────────

  #[error("file extension {extension:?} is not allowed (allowed: {allowed:?})")]
  InvalidFileType {
    extension: String,
    allowed:   Vec<String>,
  },

  #[error("file of {size} bytes exceeds the maximum of {max} bytes")]
  FileTooLarge { size: u64, max: u64 },

  // ── Authorization ─────────────────────────────────────────────────────

  #[error("role {role:?} is not permitted to {action:?}")]
  Forbidden { role: Role, action: Action },

  #[error("user {user_id} does not own application {application_id}")]
  NotOwner {
    user_id:        Uuid,
    application_id: Uuid,
  },

  #[error("application is not editable in status {0:?}")]
  ApplicationNotEditable(ApplicationStatus),

  // ── Lifecycle ─────────────────────────────────────────────────────────

  #[error("transition from {from:?} to {to:?} is not permitted")]
  InvalidTransition {
    from: ApplicationStatus,
    to:   ApplicationStatus,
  },

  #[error("application is incomplete; missing required documents: {}", .missing.join(", "))]
  IncompleteApplication { missing: Vec<String> },

  #[error("the declaration must be accepted before freezing")]
  DeclarationRequired,

  #[error("user {user_id} already has an application for academic year {academic_year}")]
  DuplicateApplication {
    user_id:       Uuid,
    academic_year: String,
  },

  // ── Infrastructure ────────────────────────────────────────────────────

  /// Document store (filesystem) failure. Full context is logged at the
  /// point of failure; callers see a generic message.
  #[error("document storage failure: {0}")]
  Storage(String),

  /// Database failure. Full context is logged at the point of failure.
  #[error("persistence failure: {0}")]
  Persistence(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
