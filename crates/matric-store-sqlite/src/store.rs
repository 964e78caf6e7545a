//! [`SqliteStore`] — the SQLite implementation of
//! [`AdmissionStore`](matric_core::store::AdmissionStore).
//!
//! Guarded writes (`link_upload`, `transition`) run inside a single SQLite
//! transaction so their invariants hold under concurrency: the link upsert
//! can never produce a second row for the same slot, and a freeze
//! re-evaluates completeness with the writer lock held, so a racing upload
//! cannot invalidate a committed freeze.

use std::path::Path;

use chrono::Utc;
use matric_core::{
  Error, Result,
  actor::Actor,
  application::{Application, ApplicationStatus, NewApplication, StatusHistoryEntry},
  catalog::{CertificateType, ProgramCertificateRequirement},
  document::{ApplicationDocument, DocumentRecord, FileUpload},
  matrix::RequirementMatrix,
  store::{AdmissionStore, LinkOutcome, LinkUpload},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  encode::{
    RawApplication, RawCertificateType, RawDocument, RawDocumentRecord,
    RawFileUpload, RawHistoryEntry, RawMatrixRow, decode_status, decode_uuid,
    encode_dt, encode_extensions, encode_role, encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

/// Map a database failure to the generic persistence error after logging
/// the full context for operators.
fn db_err(e: impl std::fmt::Display) -> Error {
  tracing::error!(error = %e, "sqlite store failure");
  Error::Persistence(e.to_string())
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An admission store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(db_err)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(db_err)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(db_err)
  }
}

// ─── Transactional write logic ───────────────────────────────────────────────
//
// These run on the sqlite thread inside `conn.call`; domain guard failures
// travel out through the inner `Result`.

fn create_application_tx(
  conn: &mut rusqlite::Connection,
  input: &NewApplication,
) -> Result<Application> {
  let application = Application {
    application_id:     Uuid::new_v4(),
    user_id:            input.user_id,
    program_id:         input.program_id.clone(),
    academic_year:      input.academic_year.clone(),
    status:             ApplicationStatus::Draft,
    application_number: None,
    created_at:         Utc::now(),
    submitted_at:       None,
    frozen_at:          None,
  };

  let result = conn.execute(
    "INSERT INTO applications (
       application_id, user_id, program_id, academic_year,
       status, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      encode_uuid(application.application_id),
      encode_uuid(application.user_id),
      application.program_id,
      application.academic_year,
      encode_status(application.status),
      encode_dt(application.created_at),
    ],
  );

  match result {
    Ok(_) => Ok(application),
    Err(rusqlite::Error::SqliteFailure(f, Some(ref msg)))
      if f.code == rusqlite::ErrorCode::ConstraintViolation
        && msg.contains("applications.user_id") =>
    {
      Err(Error::DuplicateApplication {
        user_id:       input.user_id,
        academic_year: input.academic_year.clone(),
      })
    }
    Err(e) => Err(db_err(e)),
  }
}

fn link_upload_tx(
  conn: &mut rusqlite::Connection,
  input: &LinkUpload,
) -> Result<LinkOutcome> {
  let tx = conn.transaction().map_err(db_err)?;
  let now = Utc::now();
  let app_id_str = encode_uuid(input.application_id);
  let type_id_str = encode_uuid(input.certificate_type_id);

  // The editability check is repeated here, with the writer lock held, so
  // an upload can never slip past a concurrent freeze.
  let status_str: Option<String> = tx
    .query_row(
      "SELECT status FROM applications WHERE application_id = ?1",
      rusqlite::params![app_id_str],
      |row| row.get(0),
    )
    .optional()
    .map_err(db_err)?;

  let status = match status_str {
    Some(s) => decode_status(&s)?,
    None => return Err(Error::ApplicationNotFound(input.application_id)),
  };
  if !status.allows_student_edits() {
    return Err(Error::ApplicationNotEditable(status));
  }

  let upload = FileUpload {
    upload_id:         Uuid::new_v4(),
    storage_key:       input.upload.storage_key,
    original_filename: input.upload.original_filename.clone(),
    media_type:        input.upload.media_type.clone(),
    size_bytes:        input.upload.size_bytes,
    content_hash:      input.upload.content_hash.clone(),
    owner_id:          input.upload.owner_id,
    uploaded_at:       now,
  };

  tx.execute(
    "INSERT INTO file_uploads (
       upload_id, storage_key, original_filename, media_type,
       size_bytes, content_hash, owner_id, uploaded_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    rusqlite::params![
      encode_uuid(upload.upload_id),
      encode_uuid(upload.storage_key),
      upload.original_filename,
      upload.media_type,
      upload.size_bytes as i64,
      upload.content_hash,
      encode_uuid(upload.owner_id),
      encode_dt(upload.uploaded_at),
    ],
  )
  .map_err(db_err)?;

  // Read the current link, if any, while holding the write lock — this is
  // the read-current-link / write-new-link pair the replace semantics
  // depend on.
  let existing: Option<(String, String)> = tx
    .query_row(
      "SELECT document_id, upload_id FROM application_documents
       WHERE application_id = ?1 AND certificate_type_id = ?2",
      rusqlite::params![app_id_str, type_id_str],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
    .map_err(db_err)?;

  let (document_id, replaced) = match existing {
    Some((document_id_str, old_upload_id_str)) => {
      let replaced = tx
        .query_row(
          "SELECT upload_id, storage_key, original_filename, media_type,
                  size_bytes, content_hash, owner_id, uploaded_at
           FROM file_uploads WHERE upload_id = ?1",
          rusqlite::params![old_upload_id_str],
          |row| {
            Ok(RawFileUpload {
              upload_id:         row.get(0)?,
              storage_key:       row.get(1)?,
              original_filename: row.get(2)?,
              media_type:        row.get(3)?,
              size_bytes:        row.get(4)?,
              content_hash:      row.get(5)?,
              owner_id:          row.get(6)?,
              uploaded_at:       row.get(7)?,
            })
          },
        )
        .map_err(db_err)?
        .into_upload()?;

      tx.execute(
        "UPDATE application_documents
         SET upload_id = ?1, verified = 0, verified_by = NULL,
             verified_at = NULL, verification_remarks = NULL, updated_at = ?2
         WHERE document_id = ?3",
        rusqlite::params![
          encode_uuid(upload.upload_id),
          encode_dt(now),
          document_id_str,
        ],
      )
      .map_err(db_err)?;

      (decode_uuid(&document_id_str)?, Some(replaced))
    }
    None => {
      let document_id = Uuid::new_v4();
      tx.execute(
        "INSERT INTO application_documents (
           document_id, application_id, certificate_type_id, upload_id,
           verified, updated_at
         ) VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        rusqlite::params![
          encode_uuid(document_id),
          app_id_str,
          type_id_str,
          encode_uuid(upload.upload_id),
          encode_dt(now),
        ],
      )
      .map_err(db_err)?;
      (document_id, None)
    }
  };

  tx.commit().map_err(db_err)?;

  Ok(LinkOutcome {
    document: ApplicationDocument {
      document_id,
      application_id: input.application_id,
      certificate_type_id: input.certificate_type_id,
      upload_id: upload.upload_id,
      verified: false,
      verified_by: None,
      verified_at: None,
      verification_remarks: None,
      updated_at: now,
    },
    replaced,
  })
}

/// Names of required, active certificate types the application has no
/// document for, in matrix order. Runs inside the caller's transaction.
fn missing_required_tx(
  tx: &rusqlite::Transaction<'_>,
  program_id: &str,
  app_id_str: &str,
) -> Result<Vec<String>> {
  let mut stmt = tx
    .prepare(
      "SELECT ct.name
       FROM program_requirements pr
       JOIN certificate_types ct
         ON ct.certificate_type_id = pr.certificate_type_id AND ct.active = 1
       WHERE pr.program_id = ?1
         AND pr.required = 1
         AND NOT EXISTS (
           SELECT 1 FROM application_documents d
           WHERE d.application_id = ?2
             AND d.certificate_type_id = pr.certificate_type_id
         )
       ORDER BY pr.display_order, ct.name",
    )
    .map_err(db_err)?;

  let names = stmt
    .query_map(rusqlite::params![program_id, app_id_str], |row| row.get(0))
    .map_err(db_err)?
    .collect::<rusqlite::Result<Vec<String>>>()
    .map_err(db_err)?;
  Ok(names)
}

fn transition_tx(
  conn: &mut rusqlite::Connection,
  application_id: Uuid,
  to: ApplicationStatus,
  actor: Actor,
  remarks: Option<String>,
) -> Result<StatusHistoryEntry> {
  let tx = conn.transaction().map_err(db_err)?;
  let now = Utc::now();
  let app_id_str = encode_uuid(application_id);

  let row: Option<(String, String, String)> = tx
    .query_row(
      "SELECT status, program_id, academic_year
       FROM applications WHERE application_id = ?1",
      rusqlite::params![app_id_str],
      |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )
    .optional()
    .map_err(db_err)?;

  let (status_str, program_id, academic_year) =
    row.ok_or(Error::ApplicationNotFound(application_id))?;
  let from = decode_status(&status_str)?;

  if !from.can_transition_to(to) {
    return Err(Error::InvalidTransition { from, to });
  }

  match to {
    ApplicationStatus::Submitted => {
      tx.execute(
        "UPDATE applications SET status = ?1, submitted_at = ?2
         WHERE application_id = ?3",
        rusqlite::params![encode_status(to), encode_dt(now), app_id_str],
      )
      .map_err(db_err)?;
    }
    ApplicationStatus::Frozen => {
      // The completeness gate, evaluated with the writer lock held.
      let missing = missing_required_tx(&tx, &program_id, &app_id_str)?;
      if !missing.is_empty() {
        return Err(Error::IncompleteApplication { missing });
      }

      // Dense per-year sequence; safe because the whole check-then-assign
      // runs in one transaction.
      let assigned: i64 = tx
        .query_row(
          "SELECT COUNT(*) FROM applications
           WHERE academic_year = ?1 AND application_number IS NOT NULL",
          rusqlite::params![academic_year],
          |row| row.get(0),
        )
        .map_err(db_err)?;
      let number = format!("{academic_year}-{:06}", assigned + 1);

      tx.execute(
        "UPDATE applications
         SET status = ?1, frozen_at = ?2, application_number = ?3
         WHERE application_id = ?4",
        rusqlite::params![
          encode_status(to),
          encode_dt(now),
          number,
          app_id_str
        ],
      )
      .map_err(db_err)?;
    }
    _ => {
      tx.execute(
        "UPDATE applications SET status = ?1 WHERE application_id = ?2",
        rusqlite::params![encode_status(to), app_id_str],
      )
      .map_err(db_err)?;
    }
  }

  let entry = StatusHistoryEntry {
    entry_id: Uuid::new_v4(),
    application_id,
    from_status: from,
    to_status: to,
    actor_id: actor.user_id,
    actor_role: actor.role,
    remarks,
    recorded_at: now,
  };

  tx.execute(
    "INSERT INTO status_history (
       entry_id, application_id, from_status, to_status,
       actor_id, actor_role, remarks, recorded_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    rusqlite::params![
      encode_uuid(entry.entry_id),
      app_id_str,
      encode_status(entry.from_status),
      encode_status(entry.to_status),
      encode_uuid(entry.actor_id),
      encode_role(entry.actor_role),
      entry.remarks,
      encode_dt(entry.recorded_at),
    ],
  )
  .map_err(db_err)?;

  tx.commit().map_err(db_err)?;
  Ok(entry)
}

fn set_verification_tx(
  conn: &mut rusqlite::Connection,
  document_id: Uuid,
  verifier_id: Uuid,
  approve: bool,
  remarks: Option<String>,
) -> Result<ApplicationDocument> {
  let now = Utc::now();
  let doc_id_str = encode_uuid(document_id);

  let changed = conn
    .execute(
      "UPDATE application_documents
       SET verified = ?1, verified_by = ?2, verified_at = ?3,
           verification_remarks = ?4, updated_at = ?5
       WHERE document_id = ?6",
      rusqlite::params![
        approve,
        encode_uuid(verifier_id),
        encode_dt(now),
        remarks,
        encode_dt(now),
        doc_id_str,
      ],
    )
    .map_err(db_err)?;

  if changed == 0 {
    return Err(Error::DocumentNotFound(document_id));
  }

  conn
    .query_row(
      "SELECT document_id, application_id, certificate_type_id, upload_id,
              verified, verified_by, verified_at, verification_remarks,
              updated_at
       FROM application_documents WHERE document_id = ?1",
      rusqlite::params![doc_id_str],
      |row| {
        Ok(RawDocument {
          document_id:          row.get(0)?,
          application_id:       row.get(1)?,
          certificate_type_id:  row.get(2)?,
          upload_id:            row.get(3)?,
          verified:             row.get(4)?,
          verified_by:          row.get(5)?,
          verified_at:          row.get(6)?,
          verification_remarks: row.get(7)?,
          updated_at:           row.get(8)?,
        })
      },
    )
    .map_err(db_err)?
    .into_document()
}

// ─── AdmissionStore impl ─────────────────────────────────────────────────────

impl AdmissionStore for SqliteStore {
  // ── Applications ──────────────────────────────────────────────────────────

  async fn create_application(&self, input: NewApplication) -> Result<Application> {
    self
      .conn
      .call(move |conn| Ok(create_application_tx(conn, &input)))
      .await
      .map_err(db_err)?
  }

  async fn get_application(&self, application_id: Uuid) -> Result<Option<Application>> {
    let id_str = encode_uuid(application_id);

    let raw: Option<RawApplication> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT application_id, user_id, program_id, academic_year,
                      status, application_number, created_at, submitted_at,
                      frozen_at
               FROM applications WHERE application_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawApplication {
                  application_id:     row.get(0)?,
                  user_id:            row.get(1)?,
                  program_id:         row.get(2)?,
                  academic_year:      row.get(3)?,
                  status:             row.get(4)?,
                  application_number: row.get(5)?,
                  created_at:         row.get(6)?,
                  submitted_at:       row.get(7)?,
                  frozen_at:          row.get(8)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(db_err)?;

    raw.map(RawApplication::into_application).transpose()
  }

  async fn applications_for_user(&self, user_id: Uuid) -> Result<Vec<Application>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawApplication> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT application_id, user_id, program_id, academic_year,
                  status, application_number, created_at, submitted_at,
                  frozen_at
           FROM applications WHERE user_id = ?1
           ORDER BY created_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], |row| {
            Ok(RawApplication {
              application_id:     row.get(0)?,
              user_id:            row.get(1)?,
              program_id:         row.get(2)?,
              academic_year:      row.get(3)?,
              status:             row.get(4)?,
              application_number: row.get(5)?,
              created_at:         row.get(6)?,
              submitted_at:       row.get(7)?,
              frozen_at:          row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws
      .into_iter()
      .map(RawApplication::into_application)
      .collect()
  }

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn put_certificate_type(&self, certificate_type: CertificateType) -> Result<()> {
    let extensions = encode_extensions(&certificate_type.allowed_extensions)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO certificate_types (
             certificate_type_id, name, description, allowed_extensions,
             max_size_bytes, active
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            encode_uuid(certificate_type.certificate_type_id),
            certificate_type.name,
            certificate_type.description,
            extensions,
            certificate_type.max_size_bytes.map(|n| n as i64),
            certificate_type.active,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(db_err)
  }

  async fn put_requirement(
    &self,
    requirement: ProgramCertificateRequirement,
  ) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO program_requirements (
             program_id, certificate_type_id, required, display_order,
             special_instructions
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            requirement.program_id,
            encode_uuid(requirement.certificate_type_id),
            requirement.required,
            requirement.display_order,
            requirement.special_instructions,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(db_err)
  }

  async fn requirement_for(
    &self,
    program_id: &str,
    certificate_type_id: Uuid,
  ) -> Result<Option<(CertificateType, ProgramCertificateRequirement)>> {
    let program = program_id.to_string();
    let program_out = program.clone();
    let type_str = encode_uuid(certificate_type_id);

    let raw: Option<(RawCertificateType, bool, i64, Option<String>)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT ct.certificate_type_id, ct.name, ct.description,
                      ct.allowed_extensions, ct.max_size_bytes, ct.active,
                      pr.required, pr.display_order, pr.special_instructions
               FROM program_requirements pr
               JOIN certificate_types ct
                 ON ct.certificate_type_id = pr.certificate_type_id
                AND ct.active = 1
               WHERE pr.program_id = ?1 AND pr.certificate_type_id = ?2",
              rusqlite::params![program, type_str],
              |row| {
                Ok((
                  RawCertificateType {
                    certificate_type_id: row.get(0)?,
                    name:                row.get(1)?,
                    description:         row.get(2)?,
                    allowed_extensions:  row.get(3)?,
                    max_size_bytes:      row.get(4)?,
                    active:              row.get(5)?,
                  },
                  row.get(6)?,
                  row.get(7)?,
                  row.get(8)?,
                ))
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(db_err)?;

    raw
      .map(|(raw_type, required, display_order, special_instructions)| {
        Ok((
          raw_type.into_certificate_type()?,
          ProgramCertificateRequirement {
            program_id: program_out.clone(),
            certificate_type_id,
            required,
            display_order,
            special_instructions,
          },
        ))
      })
      .transpose()
  }

  // ── Requirement matrix ────────────────────────────────────────────────────

  async fn requirement_matrix(&self, application_id: Uuid) -> Result<RequirementMatrix> {
    let application = self
      .get_application(application_id)
      .await?
      .ok_or(Error::ApplicationNotFound(application_id))?;

    let app_id_str = encode_uuid(application_id);
    let program = application.program_id.clone();

    let raws: Vec<RawMatrixRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT
             ct.certificate_type_id, ct.name, ct.description,
             ct.allowed_extensions, ct.max_size_bytes, ct.active,
             pr.required, pr.display_order, pr.special_instructions,
             d.document_id, d.upload_id, d.verified, d.verified_by,
             d.verified_at, d.verification_remarks, d.updated_at,
             u.storage_key, u.original_filename, u.media_type,
             u.size_bytes, u.content_hash, u.owner_id, u.uploaded_at,
             d.application_id
           FROM program_requirements pr
           JOIN certificate_types ct
             ON ct.certificate_type_id = pr.certificate_type_id
            AND ct.active = 1
           LEFT JOIN application_documents d
             ON d.application_id = ?1
            AND d.certificate_type_id = pr.certificate_type_id
           LEFT JOIN file_uploads u ON u.upload_id = d.upload_id
           WHERE pr.program_id = ?2
           ORDER BY pr.display_order, ct.name",
        )?;

        let rows = stmt
          .query_map(rusqlite::params![app_id_str, program], |row| {
            let document_id: Option<String> = row.get(9)?;
            let document = match document_id {
              Some(document_id) => Some(RawDocumentRecord {
                document: RawDocument {
                  document_id,
                  application_id:       row.get(23)?,
                  certificate_type_id:  row.get(0)?,
                  upload_id:            row.get(10)?,
                  verified:             row.get(11)?,
                  verified_by:          row.get(12)?,
                  verified_at:          row.get(13)?,
                  verification_remarks: row.get(14)?,
                  updated_at:           row.get(15)?,
                },
                upload: RawFileUpload {
                  upload_id:         row.get(10)?,
                  storage_key:       row.get(16)?,
                  original_filename: row.get(17)?,
                  media_type:        row.get(18)?,
                  size_bytes:        row.get(19)?,
                  content_hash:      row.get(20)?,
                  owner_id:          row.get(21)?,
                  uploaded_at:       row.get(22)?,
                },
              }),
              None => None,
            };

            Ok(RawMatrixRow {
              certificate_type: RawCertificateType {
                certificate_type_id: row.get(0)?,
                name:                row.get(1)?,
                description:         row.get(2)?,
                allowed_extensions:  row.get(3)?,
                max_size_bytes:      row.get(4)?,
                active:              row.get(5)?,
              },
              required:             row.get(6)?,
              display_order:        row.get(7)?,
              special_instructions: row.get(8)?,
              document,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    let rows = raws
      .into_iter()
      .map(RawMatrixRow::into_row)
      .collect::<Result<Vec<_>>>()?;

    Ok(RequirementMatrix {
      application_id,
      rows,
    })
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  async fn link_upload(&self, input: LinkUpload) -> Result<LinkOutcome> {
    self
      .conn
      .call(move |conn| Ok(link_upload_tx(conn, &input)))
      .await
      .map_err(db_err)?
  }

  async fn get_document(&self, document_id: Uuid) -> Result<Option<DocumentRecord>> {
    let id_str = encode_uuid(document_id);

    let raw: Option<RawDocumentRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT d.document_id, d.application_id, d.certificate_type_id,
                      d.upload_id, d.verified, d.verified_by, d.verified_at,
                      d.verification_remarks, d.updated_at,
                      u.storage_key, u.original_filename, u.media_type,
                      u.size_bytes, u.content_hash, u.owner_id, u.uploaded_at
               FROM application_documents d
               JOIN file_uploads u ON u.upload_id = d.upload_id
               WHERE d.document_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawDocumentRecord {
                  document: RawDocument {
                    document_id:          row.get(0)?,
                    application_id:       row.get(1)?,
                    certificate_type_id:  row.get(2)?,
                    upload_id:            row.get(3)?,
                    verified:             row.get(4)?,
                    verified_by:          row.get(5)?,
                    verified_at:          row.get(6)?,
                    verification_remarks: row.get(7)?,
                    updated_at:           row.get(8)?,
                  },
                  upload: RawFileUpload {
                    upload_id:         row.get(3)?,
                    storage_key:       row.get(9)?,
                    original_filename: row.get(10)?,
                    media_type:        row.get(11)?,
                    size_bytes:        row.get(12)?,
                    content_hash:      row.get(13)?,
                    owner_id:          row.get(14)?,
                    uploaded_at:       row.get(15)?,
                  },
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(db_err)?;

    raw.map(RawDocumentRecord::into_record).transpose()
  }

  async fn set_verification(
    &self,
    document_id: Uuid,
    verifier_id: Uuid,
    approve: bool,
    remarks: Option<String>,
  ) -> Result<ApplicationDocument> {
    self
      .conn
      .call(move |conn| {
        Ok(set_verification_tx(
          conn,
          document_id,
          verifier_id,
          approve,
          remarks,
        ))
      })
      .await
      .map_err(db_err)?
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────────

  async fn transition(
    &self,
    application_id: Uuid,
    to: ApplicationStatus,
    actor: Actor,
    remarks: Option<String>,
  ) -> Result<StatusHistoryEntry> {
    self
      .conn
      .call(move |conn| Ok(transition_tx(conn, application_id, to, actor, remarks)))
      .await
      .map_err(db_err)?
  }

  async fn status_history(&self, application_id: Uuid) -> Result<Vec<StatusHistoryEntry>> {
    let id_str = encode_uuid(application_id);

    let raws: Vec<RawHistoryEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT entry_id, application_id, from_status, to_status,
                  actor_id, actor_role, remarks, recorded_at
           FROM status_history WHERE application_id = ?1
           ORDER BY recorded_at, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawHistoryEntry {
              entry_id:       row.get(0)?,
              application_id: row.get(1)?,
              from_status:    row.get(2)?,
              to_status:      row.get(3)?,
              actor_id:       row.get(4)?,
              actor_role:     row.get(5)?,
              remarks:        row.get(6)?,
              recorded_at:    row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawHistoryEntry::into_entry).collect()
  }
}
