//! The requirement matrix — the computed read model joining a program's
//! checklist against an application's current uploads. Never stored,
//! always derived; safe to recompute on every request.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{catalog::CertificateType, document::DocumentRecord};

/// One row of the matrix: a certificate type the program cares about,
/// joined with the application's upload for that type, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementRow {
  pub certificate_type:     CertificateType,
  pub required:             bool,
  pub display_order:        i64,
  pub special_instructions: Option<String>,
  /// `None` means no document has been uploaded for this type yet.
  pub document:             Option<DocumentRecord>,
}

impl RequirementRow {
  pub fn is_missing(&self) -> bool { self.document.is_none() }
}

/// The full checklist for one application, ordered by display order then
/// certificate name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementMatrix {
  pub application_id: Uuid,
  pub rows:           Vec<RequirementRow>,
}

impl RequirementMatrix {
  /// Names of required certificate types with no uploaded document, in
  /// matrix order.
  pub fn missing_required(&self) -> Vec<String> {
    self
      .rows
      .iter()
      .filter(|row| row.required && row.is_missing())
      .map(|row| row.certificate_type.name.clone())
      .collect()
  }

  /// The completeness gate: true iff no required row is missing. An empty
  /// requirement set is vacuously complete.
  pub fn is_complete(&self) -> bool { self.missing_required().is_empty() }

  pub fn completeness(&self) -> Completeness {
    let missing = self.missing_required();
    Completeness {
      complete: missing.is_empty(),
      missing,
    }
  }
}

/// The completeness verdict surfaced to status pages and the freeze guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completeness {
  pub complete: bool,
  pub missing:  Vec<String>,
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::document::{ApplicationDocument, DocumentRecord, FileUpload};

  fn row(name: &str, required: bool, uploaded: bool) -> RequirementRow {
    let certificate_type_id = Uuid::new_v4();
    let document = uploaded.then(|| {
      let upload_id = Uuid::new_v4();
      DocumentRecord {
        document: ApplicationDocument {
          document_id: Uuid::new_v4(),
          application_id: Uuid::new_v4(),
          certificate_type_id,
          upload_id,
          verified: false,
          verified_by: None,
          verified_at: None,
          verification_remarks: None,
          updated_at: Utc::now(),
        },
        upload: FileUpload {
          upload_id,
          storage_key: Uuid::new_v4(),
          original_filename: format!("{name}.pdf"),
          media_type: "application/pdf".into(),
          size_bytes: 1024,
          content_hash: "00".repeat(32),
          owner_id: Uuid::new_v4(),
          uploaded_at: Utc::now(),
        },
      }
    });

    RequirementRow {
      certificate_type: CertificateType {
        certificate_type_id,
        name: name.into(),
        description: None,
        allowed_extensions: vec![],
        max_size_bytes: None,
        active: true,
      },
      required,
      display_order: 0,
      special_instructions: None,
      document,
    }
  }

  fn matrix(rows: Vec<RequirementRow>) -> RequirementMatrix {
    RequirementMatrix {
      application_id: Uuid::new_v4(),
      rows,
    }
  }

  #[test]
  fn empty_requirement_set_is_vacuously_complete() {
    let m = matrix(vec![]);
    assert!(m.is_complete());
    assert!(m.missing_required().is_empty());
  }

  #[test]
  fn missing_optional_does_not_block_completeness() {
    let m = matrix(vec![
      row("Income Certificate", true, true),
      row("Sports Certificate", false, false),
    ]);
    assert!(m.is_complete());
  }

  #[test]
  fn missing_required_is_reported_by_name() {
    let m = matrix(vec![
      row("Income Certificate", true, true),
      row("Transfer Certificate", true, false),
    ]);
    assert!(!m.is_complete());
    assert_eq!(m.missing_required(), vec!["Transfer Certificate"]);

    let verdict = m.completeness();
    assert!(!verdict.complete);
    assert_eq!(verdict.missing, vec!["Transfer Certificate"]);
  }

  #[test]
  fn verification_state_does_not_affect_completeness() {
    // Completeness is upload completeness; verification is orthogonal.
    let mut uploaded = row("Income Certificate", true, true);
    if let Some(record) = uploaded.document.as_mut() {
      record.document.verified = false;
    }
    let m = matrix(vec![uploaded]);
    assert!(m.is_complete());
  }
}
