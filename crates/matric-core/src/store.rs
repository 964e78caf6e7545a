//! The `AdmissionStore` and `DocumentStore` traits.
//!
//! `AdmissionStore` is implemented by database backends (e.g.
//! `matric-store-sqlite`); `DocumentStore` by blob backends (e.g.
//! `matric-files`). The service layer and the HTTP layer depend on these
//! abstractions, not on any concrete backend.
//!
//! Both traits use the crate's concrete [`Error`](crate::Error) so callers
//! can match guard variants (invalid transition, incomplete application,
//! not editable) without downcasting. Backends map their internal failures
//! to [`Error::Persistence`] / [`Error::Storage`] after logging context.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Result,
  actor::Actor,
  application::{Application, ApplicationStatus, NewApplication, StatusHistoryEntry},
  catalog::{CertificateType, ProgramCertificateRequirement},
  document::{ApplicationDocument, DocumentRecord, FileUpload, NewFileUpload},
  matrix::RequirementMatrix,
};

// ─── Write inputs ────────────────────────────────────────────────────────────

/// Input to [`AdmissionStore::link_upload`]: link freshly stored bytes to
/// an application slot, replacing any previous link for the same
/// certificate type.
#[derive(Debug, Clone)]
pub struct LinkUpload {
  pub application_id:      Uuid,
  pub certificate_type_id: Uuid,
  pub upload:              NewFileUpload,
}

/// Result of [`AdmissionStore::link_upload`]. When the link replaced an
/// earlier upload, `replaced` carries it so the caller can reclaim its
/// bytes from the document store.
#[derive(Debug, Clone)]
pub struct LinkOutcome {
  pub document: ApplicationDocument,
  pub replaced: Option<FileUpload>,
}

// ─── AdmissionStore ──────────────────────────────────────────────────────────

/// Abstraction over the admission database backend.
///
/// Multi-row writes (`link_upload`, `transition`) are atomic: either every
/// row lands or none does. `transition` evaluates its guards — the
/// transition table, and the completeness gate when freezing — inside the
/// same transaction that flips the status and appends history.
pub trait AdmissionStore: Send + Sync {
  // ── Applications ──────────────────────────────────────────────────────

  /// Create a draft application. Fails with
  /// [`Error::DuplicateApplication`](crate::Error::DuplicateApplication)
  /// when the user already has one for the academic year.
  fn create_application(
    &self,
    input: NewApplication,
  ) -> impl Future<Output = Result<Application>> + Send + '_;

  /// Fetch an application by id. Returns `None` if not found.
  fn get_application(
    &self,
    application_id: Uuid,
  ) -> impl Future<Output = Result<Option<Application>>> + Send + '_;

  /// All applications owned by a user, newest first.
  fn applications_for_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Application>>> + Send + '_;

  // ── Catalog ───────────────────────────────────────────────────────────

  /// Insert or update a certificate type (reference data seeding).
  fn put_certificate_type(
    &self,
    certificate_type: CertificateType,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Insert or update a program requirement (reference data seeding).
  fn put_requirement(
    &self,
    requirement: ProgramCertificateRequirement,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Resolve one certificate type as an active requirement of a program.
  /// Returns `None` when the type is unknown, inactive, or not part of
  /// the program's checklist.
  fn requirement_for<'a>(
    &'a self,
    program_id: &'a str,
    certificate_type_id: Uuid,
  ) -> impl Future<Output = Result<Option<(CertificateType, ProgramCertificateRequirement)>>>
  + Send
  + 'a;

  // ── Requirement matrix ────────────────────────────────────────────────

  /// The full requirement matrix for an application: the program's active
  /// checklist outer-joined against the application's current documents,
  /// ordered by display order then certificate name. Read-only.
  fn requirement_matrix(
    &self,
    application_id: Uuid,
  ) -> impl Future<Output = Result<RequirementMatrix>> + Send + '_;

  // ── Documents ─────────────────────────────────────────────────────────

  /// Atomically insert the upload row and link it to the application's
  /// slot for the certificate type, replacing any existing link and
  /// resetting verification. Re-checks in the same transaction that the
  /// application still permits student edits.
  fn link_upload(
    &self,
    input: LinkUpload,
  ) -> impl Future<Output = Result<LinkOutcome>> + Send + '_;

  /// Fetch a document link joined with its upload metadata.
  fn get_document(
    &self,
    document_id: Uuid,
  ) -> impl Future<Output = Result<Option<DocumentRecord>>> + Send + '_;

  /// Set or clear the verification attestation on a document in one
  /// update. Never touches the underlying upload or the application.
  fn set_verification(
    &self,
    document_id: Uuid,
    verifier_id: Uuid,
    approve: bool,
    remarks: Option<String>,
  ) -> impl Future<Output = Result<ApplicationDocument>> + Send + '_;

  // ── Lifecycle ─────────────────────────────────────────────────────────

  /// Perform a guarded status transition and append the history entry in
  /// one transaction. Freezing re-evaluates completeness inside that
  /// transaction; an incomplete application fails with no state change
  /// and no history row.
  fn transition(
    &self,
    application_id: Uuid,
    to: ApplicationStatus,
    actor: Actor,
    remarks: Option<String>,
  ) -> impl Future<Output = Result<StatusHistoryEntry>> + Send + '_;

  /// The append-only status history for an application, oldest first.
  fn status_history(
    &self,
    application_id: Uuid,
  ) -> impl Future<Output = Result<Vec<StatusHistoryEntry>>> + Send + '_;
}

// ─── DocumentStore ───────────────────────────────────────────────────────────

/// Byte-level blob storage keyed by an opaque identifier.
///
/// Writes are not transactional with the database; the upload service's
/// compensating delete keeps the two from diverging.
pub trait DocumentStore: Send + Sync {
  /// Durably store `bytes` under `key`. Overwrites are not expected —
  /// the service always allocates a fresh key.
  fn save(
    &self,
    key: Uuid,
    bytes: Vec<u8>,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Read the bytes stored under `key`. Returns `None` if absent.
  fn read(
    &self,
    key: Uuid,
  ) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send + '_;

  /// Delete the bytes stored under `key`. Deleting an absent key is not
  /// an error.
  fn delete(&self, key: Uuid) -> impl Future<Output = Result<()>> + Send + '_;
}
