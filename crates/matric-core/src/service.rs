//! `AdmissionService` — the orchestration layer behind the page handlers.
//!
//! Composes an [`AdmissionStore`], a [`DocumentStore`] and the upload
//! policy. Owns everything that is not persistence: authorization,
//! ownership checks, upload validation order, the compensating delete that
//! keeps blob storage and the database consistent, and the cleanup of
//! superseded blobs.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
  Error, Result,
  actor::{Action, Actor, Role},
  application::{Application, ApplicationStatus, NewApplication, StatusHistoryEntry},
  catalog::{
    CertificateType, DEFAULT_ALLOWED_EXTENSIONS, ProgramCertificateRequirement,
    file_extension,
  },
  document::{ApplicationDocument, DocumentRecord, NewFileUpload, content_hash},
  matrix::RequirementMatrix,
  store::{AdmissionStore, DocumentStore, LinkUpload},
};

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Service-wide upload limits. Per-type catalog constraints override the
/// defaults.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
  pub default_max_size_bytes: u64,
}

impl Default for UploadPolicy {
  fn default() -> Self {
    Self {
      default_max_size_bytes: 10 * 1024 * 1024,
    }
  }
}

/// An incoming file as handed over by the transport layer.
#[derive(Debug, Clone)]
pub struct UploadRequest {
  pub bytes:             Vec<u8>,
  pub original_filename: String,
  pub media_type:        String,
  /// Size claimed by the client; checked against the limit alongside the
  /// actual byte length.
  pub declared_size:     u64,
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// The document-compliance and lifecycle core, generic over its backends.
pub struct AdmissionService<S, B> {
  store:  Arc<S>,
  files:  Arc<B>,
  policy: UploadPolicy,
}

impl<S, B> AdmissionService<S, B>
where
  S: AdmissionStore,
  B: DocumentStore,
{
  pub fn new(store: Arc<S>, files: Arc<B>, policy: UploadPolicy) -> Self {
    Self {
      store,
      files,
      policy,
    }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  // ── Applications ──────────────────────────────────────────────────────

  /// Create a draft application owned by the acting student.
  pub async fn create_application(
    &self,
    actor: Actor,
    program_id: String,
    academic_year: String,
  ) -> Result<Application> {
    authorize(actor, Action::CreateApplication)?;
    self
      .store
      .create_application(NewApplication {
        user_id: actor.user_id,
        program_id,
        academic_year,
      })
      .await
  }

  /// Fetch an application the actor may view.
  pub async fn application(
    &self,
    actor: Actor,
    application_id: Uuid,
  ) -> Result<Application> {
    authorize(actor, Action::ViewApplication)?;
    self.load_visible(actor, application_id).await
  }

  /// All applications owned by the acting user.
  pub async fn my_applications(&self, actor: Actor) -> Result<Vec<Application>> {
    authorize(actor, Action::ViewApplication)?;
    self.store.applications_for_user(actor.user_id).await
  }

  // ── Requirement matrix ────────────────────────────────────────────────

  /// The requirement matrix for an application. Recomputed on every call;
  /// never cached.
  pub async fn requirement_matrix(
    &self,
    actor: Actor,
    application_id: Uuid,
  ) -> Result<RequirementMatrix> {
    authorize(actor, Action::ViewApplication)?;
    self.load_visible(actor, application_id).await?;
    self.store.requirement_matrix(application_id).await
  }

  // ── Upload ────────────────────────────────────────────────────────────

  /// Validate and store a document for one certificate-type slot,
  /// replacing any previous upload for that slot.
  ///
  /// Validation is fail-fast in a fixed order: extension, size, then
  /// resolution of the certificate type against the program's active
  /// requirements. Nothing is stored until all three pass. If the linking
  /// transaction fails after the bytes were stored, the blob is deleted
  /// again before the error is returned.
  pub async fn upload(
    &self,
    actor: Actor,
    application_id: Uuid,
    certificate_type_id: Uuid,
    request: UploadRequest,
  ) -> Result<ApplicationDocument> {
    authorize(actor, Action::UploadDocument)?;
    let application = self.load_owned(actor, application_id).await?;

    if !application.status.allows_student_edits() {
      return Err(Error::ApplicationNotEditable(application.status));
    }

    let requirement = self
      .store
      .requirement_for(&application.program_id, certificate_type_id)
      .await?;

    self.validate_upload(
      requirement.as_ref(),
      &application.program_id,
      certificate_type_id,
      &request,
    )?;

    let storage_key = Uuid::new_v4();
    let size_bytes = request.bytes.len() as u64;
    let hash = content_hash(&request.bytes);

    self.files.save(storage_key, request.bytes).await?;

    let outcome = match self
      .store
      .link_upload(LinkUpload {
        application_id,
        certificate_type_id,
        upload: NewFileUpload {
          storage_key,
          original_filename: request.original_filename,
          media_type: request.media_type,
          size_bytes,
          content_hash: hash,
          owner_id: actor.user_id,
        },
      })
      .await
    {
      Ok(outcome) => outcome,
      Err(e) => {
        // The bytes are stored but the link never landed; delete them so
        // storage and database do not diverge.
        if let Err(cleanup) = self.files.delete(storage_key).await {
          tracing::error!(
            %storage_key,
            error = %cleanup,
            "failed to delete orphaned blob after link failure"
          );
        }
        return Err(e);
      }
    };

    if let Some(replaced) = outcome.replaced {
      // Superseded bytes are reclaimed immediately; the upload row stays
      // as the audit record. Best-effort only.
      if let Err(e) = self.files.delete(replaced.storage_key).await {
        tracing::warn!(
          storage_key = %replaced.storage_key,
          error = %e,
          "failed to delete superseded blob"
        );
      }
    }

    Ok(outcome.document)
  }

  // ── Documents ─────────────────────────────────────────────────────────

  /// Fetch a document's metadata and bytes for download.
  pub async fn document_bytes(
    &self,
    actor: Actor,
    document_id: Uuid,
  ) -> Result<(DocumentRecord, Vec<u8>)> {
    authorize(actor, Action::DownloadDocument)?;

    let record = self
      .store
      .get_document(document_id)
      .await?
      .ok_or(Error::DocumentNotFound(document_id))?;

    self
      .load_visible(actor, record.document.application_id)
      .await?;

    let bytes = self
      .files
      .read(record.upload.storage_key)
      .await?
      .ok_or_else(|| {
        tracing::error!(
          storage_key = %record.upload.storage_key,
          upload_id = %record.upload.upload_id,
          "upload row present but blob missing"
        );
        Error::Storage("stored file is missing".to_string())
      })?;

    Ok((record, bytes))
  }

  /// Record a reviewer's verification verdict on a document. Never moves
  /// the application's status.
  pub async fn verify(
    &self,
    actor: Actor,
    document_id: Uuid,
    approve: bool,
    remarks: Option<String>,
  ) -> Result<ApplicationDocument> {
    authorize(actor, Action::VerifyDocument)?;
    self
      .store
      .set_verification(document_id, actor.user_id, approve, remarks)
      .await
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────

  /// `Draft → Submitted`, student-initiated. No completeness requirement.
  pub async fn submit(
    &self,
    actor: Actor,
    application_id: Uuid,
  ) -> Result<StatusHistoryEntry> {
    authorize(actor, Action::SubmitApplication)?;
    self.load_owned(actor, application_id).await?;
    self
      .store
      .transition(application_id, ApplicationStatus::Submitted, actor, None)
      .await
  }

  /// `Submitted → Frozen`, the irrevocable point. Requires the declaration
  /// and upload completeness; the latter is re-evaluated inside the
  /// transition transaction by the store.
  pub async fn freeze(
    &self,
    actor: Actor,
    application_id: Uuid,
    declaration_accepted: bool,
    remarks: Option<String>,
  ) -> Result<StatusHistoryEntry> {
    authorize(actor, Action::FreezeApplication)?;
    self.load_owned(actor, application_id).await?;

    if !declaration_accepted {
      return Err(Error::DeclarationRequired);
    }

    self
      .store
      .transition(application_id, ApplicationStatus::Frozen, actor, remarks)
      .await
  }

  /// `Frozen → UnderReview`, administrative.
  pub async fn advance_to_review(
    &self,
    actor: Actor,
    application_id: Uuid,
    remarks: Option<String>,
  ) -> Result<StatusHistoryEntry> {
    authorize(actor, Action::AdvanceReview)?;
    self
      .store
      .transition(
        application_id,
        ApplicationStatus::UnderReview,
        actor,
        remarks,
      )
      .await
  }

  /// `UnderReview → Approved | Rejected`, administrative and terminal.
  pub async fn decide(
    &self,
    actor: Actor,
    application_id: Uuid,
    approve: bool,
    remarks: Option<String>,
  ) -> Result<StatusHistoryEntry> {
    authorize(actor, Action::DecideApplication)?;
    let to = if approve {
      ApplicationStatus::Approved
    } else {
      ApplicationStatus::Rejected
    };
    self
      .store
      .transition(application_id, to, actor, remarks)
      .await
  }

  /// The audit trail, oldest first.
  pub async fn status_history(
    &self,
    actor: Actor,
    application_id: Uuid,
  ) -> Result<Vec<StatusHistoryEntry>> {
    authorize(actor, Action::ViewApplication)?;
    self.load_visible(actor, application_id).await?;
    self.store.status_history(application_id).await
  }

  // ── Internals ─────────────────────────────────────────────────────────

  /// Load an application the actor must own (reviewers are exempt from
  /// the ownership check).
  async fn load_owned(
    &self,
    actor: Actor,
    application_id: Uuid,
  ) -> Result<Application> {
    let application = self
      .store
      .get_application(application_id)
      .await?
      .ok_or(Error::ApplicationNotFound(application_id))?;

    if actor.role == Role::Student && application.user_id != actor.user_id {
      return Err(Error::NotOwner {
        user_id: actor.user_id,
        application_id,
      });
    }
    Ok(application)
  }

  /// Same visibility rule as [`Self::load_owned`]; reads share it.
  async fn load_visible(
    &self,
    actor: Actor,
    application_id: Uuid,
  ) -> Result<Application> {
    self.load_owned(actor, application_id).await
  }

  /// Fail-fast validation: (1) extension, (2) size, (3) certificate type
  /// resolution. The first two use the default constraints when the type
  /// did not resolve, so the order stays deterministic.
  fn validate_upload(
    &self,
    requirement: Option<&(CertificateType, ProgramCertificateRequirement)>,
    program_id: &str,
    certificate_type_id: Uuid,
    request: &UploadRequest,
  ) -> Result<()> {
    let extension =
      file_extension(&request.original_filename).unwrap_or_default();
    let extension_ok = match requirement {
      Some((certificate_type, _)) => {
        certificate_type.extension_allowed(&extension)
      }
      None => DEFAULT_ALLOWED_EXTENSIONS.contains(&extension.as_str()),
    };
    if !extension_ok {
      return Err(Error::InvalidFileType {
        extension,
        allowed: requirement
          .map(|(certificate_type, _)| certificate_type.allowed_set())
          .unwrap_or_else(|| {
            DEFAULT_ALLOWED_EXTENSIONS
              .iter()
              .map(|s| s.to_string())
              .collect()
          }),
      });
    }

    let max = requirement
      .and_then(|(certificate_type, _)| certificate_type.max_size_bytes)
      .unwrap_or(self.policy.default_max_size_bytes);
    let size = request.declared_size.max(request.bytes.len() as u64);
    if size > max {
      return Err(Error::FileTooLarge { size, max });
    }

    if requirement.is_none() {
      return Err(Error::UnknownCertificateType {
        program_id: program_id.to_string(),
        certificate_type_id,
      });
    }

    Ok(())
  }
}

/// The single permission gate in front of every operation.
fn authorize(actor: Actor, action: Action) -> Result<()> {
  if actor.role.permits(action) {
    Ok(())
  } else {
    Err(Error::Forbidden {
      role: actor.role,
      action,
    })
  }
}
