//! Actor identity and the permission model.
//!
//! Identity is always passed explicitly into core operations — there is no
//! ambient "current user". The authentication collaborator resolves the
//! session and hands the core an [`Actor`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role attached to an acting identity by the auth collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  Student,
  ProgramAdmin,
  Admin,
}

/// An operation a role may or may not be permitted to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  CreateApplication,
  ViewApplication,
  UploadDocument,
  DownloadDocument,
  SubmitApplication,
  FreezeApplication,
  VerifyDocument,
  AdvanceReview,
  DecideApplication,
}

impl Role {
  /// The single permission check consulted by every core operation.
  pub fn permits(self, action: Action) -> bool {
    use Action::*;
    match self {
      Role::Student => matches!(
        action,
        CreateApplication
          | ViewApplication
          | UploadDocument
          | DownloadDocument
          | SubmitApplication
          | FreezeApplication
      ),
      Role::ProgramAdmin => matches!(
        action,
        ViewApplication
          | DownloadDocument
          | VerifyDocument
          | AdvanceReview
          | DecideApplication
      ),
      Role::Admin => true,
    }
  }
}

/// An authenticated identity performing a core operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub user_id: Uuid,
  pub role:    Role,
}

impl Actor {
  pub fn new(user_id: Uuid, role: Role) -> Self { Self { user_id, role } }

  /// Whether this actor may review documents and move applications through
  /// the administrative stages.
  pub fn is_reviewer(&self) -> bool {
    matches!(self.role, Role::ProgramAdmin | Role::Admin)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn student_cannot_verify() {
    assert!(!Role::Student.permits(Action::VerifyDocument));
    assert!(Role::Student.permits(Action::UploadDocument));
  }

  #[test]
  fn program_admin_cannot_create_or_submit() {
    assert!(!Role::ProgramAdmin.permits(Action::CreateApplication));
    assert!(!Role::ProgramAdmin.permits(Action::SubmitApplication));
    assert!(Role::ProgramAdmin.permits(Action::VerifyDocument));
  }

  #[test]
  fn admin_is_permitted_everything() {
    for action in [
      Action::CreateApplication,
      Action::ViewApplication,
      Action::UploadDocument,
      Action::DownloadDocument,
      Action::SubmitApplication,
      Action::FreezeApplication,
      Action::VerifyDocument,
      Action::AdvanceReview,
      Action::DecideApplication,
    ] {
      assert!(Role::Admin.permits(action));
    }
  }
}
