//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Allowed-extension lists
//! are stored as compact JSON arrays. UUIDs are stored as hyphenated
//! lowercase strings.

use chrono::{DateTime, Utc};
use matric_core::{
  Error, Result,
  actor::Role,
  application::{Application, ApplicationStatus, StatusHistoryEntry},
  catalog::CertificateType,
  document::{ApplicationDocument, DocumentRecord, FileUpload},
};
use uuid::Uuid;

/// Map a row-decoding problem to the persistence error, with context for
/// the operator log.
fn corrupt(what: &str, detail: impl std::fmt::Display) -> Error {
  tracing::error!(column = what, error = %detail, "corrupt row in sqlite store");
  Error::Persistence(format!("corrupt {what}: {detail}"))
}

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> {
  Uuid::parse_str(s).map_err(|e| corrupt("uuid", e))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| corrupt("timestamp", e))
}

// ─── ApplicationStatus ───────────────────────────────────────────────────────

pub fn encode_status(s: ApplicationStatus) -> &'static str {
  match s {
    ApplicationStatus::Draft => "draft",
    ApplicationStatus::Submitted => "submitted",
    ApplicationStatus::Frozen => "frozen",
    ApplicationStatus::UnderReview => "under_review",
    ApplicationStatus::Approved => "approved",
    ApplicationStatus::Rejected => "rejected",
  }
}

pub fn decode_status(s: &str) -> Result<ApplicationStatus> {
  match s {
    "draft" => Ok(ApplicationStatus::Draft),
    "submitted" => Ok(ApplicationStatus::Submitted),
    "frozen" => Ok(ApplicationStatus::Frozen),
    "under_review" => Ok(ApplicationStatus::UnderReview),
    "approved" => Ok(ApplicationStatus::Approved),
    "rejected" => Ok(ApplicationStatus::Rejected),
    other => Err(corrupt("status", format!("unknown value {other:?}"))),
  }
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str {
  match r {
    Role::Student => "student",
    Role::ProgramAdmin => "program_admin",
    Role::Admin => "admin",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "student" => Ok(Role::Student),
    "program_admin" => Ok(Role::ProgramAdmin),
    "admin" => Ok(Role::Admin),
    other => Err(corrupt("role", format!("unknown value {other:?}"))),
  }
}

// ─── Extension lists ─────────────────────────────────────────────────────────

pub fn encode_extensions(extensions: &[String]) -> Result<String> {
  serde_json::to_string(extensions).map_err(|e| corrupt("allowed_extensions", e))
}

pub fn decode_extensions(s: &str) -> Result<Vec<String>> {
  serde_json::from_str(s).map_err(|e| corrupt("allowed_extensions", e))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `applications` row.
pub struct RawApplication {
  pub application_id:     String,
  pub user_id:            String,
  pub program_id:         String,
  pub academic_year:      String,
  pub status:             String,
  pub application_number: Option<String>,
  pub created_at:         String,
  pub submitted_at:       Option<String>,
  pub frozen_at:          Option<String>,
}

impl RawApplication {
  pub fn into_application(self) -> Result<Application> {
    Ok(Application {
      application_id:     decode_uuid(&self.application_id)?,
      user_id:            decode_uuid(&self.user_id)?,
      program_id:         self.program_id,
      academic_year:      self.academic_year,
      status:             decode_status(&self.status)?,
      application_number: self.application_number,
      created_at:         decode_dt(&self.created_at)?,
      submitted_at:       self.submitted_at.as_deref().map(decode_dt).transpose()?,
      frozen_at:          self.frozen_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from a `certificate_types` row.
pub struct RawCertificateType {
  pub certificate_type_id: String,
  pub name:                String,
  pub description:         Option<String>,
  pub allowed_extensions:  String,
  pub max_size_bytes:      Option<i64>,
  pub active:              bool,
}

impl RawCertificateType {
  pub fn into_certificate_type(self) -> Result<CertificateType> {
    Ok(CertificateType {
      certificate_type_id: decode_uuid(&self.certificate_type_id)?,
      name:                self.name,
      description:         self.description,
      allowed_extensions:  decode_extensions(&self.allowed_extensions)?,
      max_size_bytes:      self.max_size_bytes.map(|n| n as u64),
      active:              self.active,
    })
  }
}

/// Raw strings read from a `file_uploads` row.
pub struct RawFileUpload {
  pub upload_id:         String,
  pub storage_key:       String,
  pub original_filename: String,
  pub media_type:        String,
  pub size_bytes:        i64,
  pub content_hash:      String,
  pub owner_id:          String,
  pub uploaded_at:       String,
}

impl RawFileUpload {
  pub fn into_upload(self) -> Result<FileUpload> {
    Ok(FileUpload {
      upload_id:         decode_uuid(&self.upload_id)?,
      storage_key:       decode_uuid(&self.storage_key)?,
      original_filename: self.original_filename,
      media_type:        self.media_type,
      size_bytes:        self.size_bytes as u64,
      content_hash:      self.content_hash,
      owner_id:          decode_uuid(&self.owner_id)?,
      uploaded_at:       decode_dt(&self.uploaded_at)?,
    })
  }
}

/// Raw strings read from an `application_documents` row.
pub struct RawDocument {
  pub document_id:          String,
  pub application_id:       String,
  pub certificate_type_id:  String,
  pub upload_id:            String,
  pub verified:             bool,
  pub verified_by:          Option<String>,
  pub verified_at:          Option<String>,
  pub verification_remarks: Option<String>,
  pub updated_at:           String,
}

impl RawDocument {
  pub fn into_document(self) -> Result<ApplicationDocument> {
    Ok(ApplicationDocument {
      document_id:          decode_uuid(&self.document_id)?,
      application_id:       decode_uuid(&self.application_id)?,
      certificate_type_id:  decode_uuid(&self.certificate_type_id)?,
      upload_id:            decode_uuid(&self.upload_id)?,
      verified:             self.verified,
      verified_by:          self.verified_by.as_deref().map(decode_uuid).transpose()?,
      verified_at:          self.verified_at.as_deref().map(decode_dt).transpose()?,
      verification_remarks: self.verification_remarks,
      updated_at:           decode_dt(&self.updated_at)?,
    })
  }
}

/// A document row joined with its upload row.
pub struct RawDocumentRecord {
  pub document: RawDocument,
  pub upload:   RawFileUpload,
}

impl RawDocumentRecord {
  pub fn into_record(self) -> Result<DocumentRecord> {
    Ok(DocumentRecord {
      document: self.document.into_document()?,
      upload:   self.upload.into_upload()?,
    })
  }
}

/// One row of the requirement-matrix join: a program requirement and its
/// certificate type, with the document/upload columns present only when a
/// document is linked.
pub struct RawMatrixRow {
  pub certificate_type:     RawCertificateType,
  pub required:             bool,
  pub display_order:        i64,
  pub special_instructions: Option<String>,
  pub document:             Option<RawDocumentRecord>,
}

impl RawMatrixRow {
  pub fn into_row(self) -> Result<matric_core::matrix::RequirementRow> {
    Ok(matric_core::matrix::RequirementRow {
      certificate_type:     self.certificate_type.into_certificate_type()?,
      required:             self.required,
      display_order:        self.display_order,
      special_instructions: self.special_instructions,
      document:             self.document.map(RawDocumentRecord::into_record).transpose()?,
    })
  }
}

/// Raw strings read from a `status_history` row.
pub struct RawHistoryEntry {
  pub entry_id:       String,
  pub application_id: String,
  pub from_status:    String,
  pub to_status:      String,
  pub actor_id:       String,
  pub actor_role:     String,
  pub remarks:        Option<String>,
  pub recorded_at:    String,
}

impl RawHistoryEntry {
  pub fn into_entry(self) -> Result<StatusHistoryEntry> {
    Ok(StatusHistoryEntry {
      entry_id:       decode_uuid(&self.entry_id)?,
      application_id: decode_uuid(&self.application_id)?,
      from_status:    decode_status(&self.from_status)?,
      to_status:      decode_status(&self.to_status)?,
      actor_id:       decode_uuid(&self.actor_id)?,
      actor_role:     decode_role(&self.actor_role)?,
      remarks:        self.remarks,
      recorded_at:    decode_dt(&self.recorded_at)?,
    })
  }
}
