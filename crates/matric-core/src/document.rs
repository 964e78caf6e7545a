//! Uploaded files and their links to applications.
//!
//! A [`FileUpload`] describes one physical stored file and is immutable
//! once written. The bytes themselves live in the document store under the
//! upload's storage key; no binary data lives in the database. An
//! [`ApplicationDocument`] is the current link between an application, a
//! certificate type and the upload satisfying it — re-uploading replaces
//! the link and resets verification rather than creating a second row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use uuid::Uuid;

// ─── FileUpload ──────────────────────────────────────────────────────────────

/// Metadata for one physical stored file. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUpload {
  pub upload_id:         Uuid,
  /// Opaque key under which the bytes live in the document store.
  pub storage_key:       Uuid,
  pub original_filename: String,
  pub media_type:        String,
  pub size_bytes:        u64,
  /// SHA-256 hex digest of the stored bytes.
  pub content_hash:      String,
  pub owner_id:          Uuid,
  pub uploaded_at:       DateTime<Utc>,
}

/// Input to [`crate::store::AdmissionStore::link_upload`]. The id and
/// timestamp are assigned by the store; the storage key is assigned by the
/// upload service once the bytes are durably stored.
#[derive(Debug, Clone)]
pub struct NewFileUpload {
  pub storage_key:       Uuid,
  pub original_filename: String,
  pub media_type:        String,
  pub size_bytes:        u64,
  pub content_hash:      String,
  pub owner_id:          Uuid,
}

/// SHA-256 hex digest of file bytes, recorded on every upload.
pub fn content_hash(bytes: &[u8]) -> String {
  hex::encode(Sha256::digest(bytes))
}

// ─── ApplicationDocument ─────────────────────────────────────────────────────

/// The current link between an application, a certificate type, and the
/// upload satisfying it. At most one row per (application, certificate
/// type); a replacement updates this row and clears verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDocument {
  pub document_id:          Uuid,
  pub application_id:       Uuid,
  pub certificate_type_id:  Uuid,
  pub upload_id:            Uuid,
  pub verified:             bool,
  pub verified_by:          Option<Uuid>,
  pub verified_at:          Option<DateTime<Utc>>,
  pub verification_remarks: Option<String>,
  pub updated_at:           DateTime<Utc>,
}

/// A document link joined with its current upload's metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
  pub document: ApplicationDocument,
  pub upload:   FileUpload,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn content_hash_is_sha256_hex() {
    // Known digest of the empty input.
    assert_eq!(
      content_hash(b""),
      "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    assert_eq!(content_hash(b"matric").len(), 64);
  }
}
