//! Certificate catalog — the reference data describing which supporting
//! documents exist and what each program requires.
//!
//! Catalog content is managed out of scope; these types are effectively
//! immutable once seeded.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Extensions accepted when a certificate type does not constrain its own.
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "jpg", "jpeg", "png"];

/// A category of supporting document, e.g. "Income Certificate".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateType {
  pub certificate_type_id: Uuid,
  pub name:                String,
  pub description:         Option<String>,
  /// Lowercase extensions without the dot. Empty means
  /// [`DEFAULT_ALLOWED_EXTENSIONS`] applies.
  pub allowed_extensions:  Vec<String>,
  /// Per-type size cap; `None` defers to the service-wide default.
  pub max_size_bytes:      Option<u64>,
  pub active:              bool,
}

impl CertificateType {
  /// Case-insensitive extension check against this type's allowed set,
  /// falling back to the defaults when the type specifies none.
  pub fn extension_allowed(&self, extension: &str) -> bool {
    let ext = extension.to_ascii_lowercase();
    if self.allowed_extensions.is_empty() {
      DEFAULT_ALLOWED_EXTENSIONS.contains(&ext.as_str())
    } else {
      self
        .allowed_extensions
        .iter()
        .any(|a| a.eq_ignore_ascii_case(&ext))
    }
  }

  /// The allowed set as reported in validation errors.
  pub fn allowed_set(&self) -> Vec<String> {
    if self.allowed_extensions.is_empty() {
      DEFAULT_ALLOWED_EXTENSIONS
        .iter()
        .map(|s| s.to_string())
        .collect()
    } else {
      self.allowed_extensions.clone()
    }
  }
}

/// A program's declaration that a certificate type is mandatory or
/// optional, with UI ordering and free-text instructions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramCertificateRequirement {
  pub program_id:           String,
  pub certificate_type_id:  Uuid,
  pub required:             bool,
  pub display_order:        i64,
  pub special_instructions: Option<String>,
}

/// Extract the lowercase extension of a filename, if any.
pub fn file_extension(filename: &str) -> Option<String> {
  let (_, ext) = filename.rsplit_once('.')?;
  if ext.is_empty() {
    return None;
  }
  Some(ext.to_ascii_lowercase())
}
