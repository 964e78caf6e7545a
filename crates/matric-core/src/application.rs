//! The application lifecycle — status enum, transition rules, and the
//! append-only history record.
//!
//! The status field is only ever mutated by a guarded transition, and every
//! successful transition appends a [`StatusHistoryEntry`] in the same unit
//! of work. History rows are never updated or deleted; they are the
//! authoritative audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actor::Role;

// ─── Status ──────────────────────────────────────────────────────────────────

/// The lifecycle state of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
  Draft,
  Submitted,
  Frozen,
  UnderReview,
  Approved,
  Rejected,
}

impl ApplicationStatus {
  /// Forward transitions only. Administrative overrides that move a state
  /// backward are deliberately not modelled.
  pub fn can_transition_to(self, to: ApplicationStatus) -> bool {
    use ApplicationStatus::*;
    matches!(
      (self, to),
      (Draft, Submitted)
        | (Submitted, Frozen)
        | (Frozen, UnderReview)
        | (UnderReview, Approved)
        | (UnderReview, Rejected)
    )
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Approved | Self::Rejected)
  }

  /// The single source of truth for the student-editable predicate,
  /// consumed by the upload service and by form-rendering collaborators.
  /// Freezing is the lock point: `Draft` and `Submitted` are editable,
  /// `Frozen` and everything after it is not.
  pub fn allows_student_edits(self) -> bool {
    matches!(self, Self::Draft | Self::Submitted)
  }

  /// Display attributes for presentation collaborators. One lookup keyed
  /// by the enum so status pages and timelines never duplicate it.
  pub fn display(self) -> StatusDisplay {
    match self {
      Self::Draft => StatusDisplay {
        label: "Draft",
        icon:  "pencil",
        color: "gray",
      },
      Self::Submitted => StatusDisplay {
        label: "Submitted",
        icon:  "paper-plane",
        color: "blue",
      },
      Self::Frozen => StatusDisplay {
        label: "Frozen",
        icon:  "lock",
        color: "indigo",
      },
      Self::UnderReview => StatusDisplay {
        label: "Under review",
        icon:  "magnifying-glass",
        color: "amber",
      },
      Self::Approved => StatusDisplay {
        label: "Approved",
        icon:  "check-circle",
        color: "green",
      },
      Self::Rejected => StatusDisplay {
        label: "Rejected",
        icon:  "x-circle",
        color: "red",
      },
    }
  }
}

/// Icon/colour/label attributes for a status, shared by all pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusDisplay {
  pub label: &'static str,
  pub icon:  &'static str,
  pub color: &'static str,
}

// ─── Application ─────────────────────────────────────────────────────────────

/// One admission application per student per academic year.
///
/// Student-entered profile data lives with the profile collaborator; this
/// record carries only what the lifecycle and document compliance need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
  pub application_id: Uuid,
  pub user_id:        Uuid,
  pub program_id:     String,
  pub academic_year:  String,
  pub status:         ApplicationStatus,
  /// Assigned at freeze; immutable once set.
  pub application_number: Option<String>,
  pub created_at:     DateTime<Utc>,
  pub submitted_at:   Option<DateTime<Utc>>,
  pub frozen_at:      Option<DateTime<Utc>>,
}

/// Input to [`crate::store::AdmissionStore::create_application`].
/// Identifier, status and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewApplication {
  pub user_id:       Uuid,
  pub program_id:    String,
  pub academic_year: String,
}

// ─── History ─────────────────────────────────────────────────────────────────

/// Append-only audit record of one status change. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
  pub entry_id:       Uuid,
  pub application_id: Uuid,
  pub from_status:    ApplicationStatus,
  pub to_status:      ApplicationStatus,
  pub actor_id:       Uuid,
  pub actor_role:     Role,
  pub remarks:        Option<String>,
  pub recorded_at:    DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::ApplicationStatus::*;

  const ALL: [super::ApplicationStatus; 6] =
    [Draft, Submitted, Frozen, UnderReview, Approved, Rejected];

  #[test]
  fn forward_chain_is_permitted() {
    assert!(Draft.can_transition_to(Submitted));
    assert!(Submitted.can_transition_to(Frozen));
    assert!(Frozen.can_transition_to(UnderReview));
    assert!(UnderReview.can_transition_to(Approved));
    assert!(UnderReview.can_transition_to(Rejected));
  }

  #[test]
  fn reverse_and_skip_transitions_are_rejected() {
    assert!(!Frozen.can_transition_to(Submitted));
    assert!(!Submitted.can_transition_to(Draft));
    assert!(!Draft.can_transition_to(Frozen));
    assert!(!Draft.can_transition_to(Approved));
    assert!(!Submitted.can_transition_to(UnderReview));
  }

  #[test]
  fn terminal_states_permit_nothing() {
    for from in [Approved, Rejected] {
      assert!(from.is_terminal());
      for to in ALL {
        assert!(!from.can_transition_to(to));
      }
    }
  }

  #[test]
  fn edits_lock_at_freeze() {
    assert!(Draft.allows_student_edits());
    assert!(Submitted.allows_student_edits());
    assert!(!Frozen.allows_student_edits());
    assert!(!UnderReview.allows_student_edits());
    assert!(!Approved.allows_student_edits());
    assert!(!Rejected.allows_student_edits());
  }

  #[test]
  fn every_status_has_distinct_display_label() {
    let labels: std::collections::HashSet<_> =
      ALL.iter().map(|s| s.display().label).collect();
    assert_eq!(labels.len(), ALL.len());
  }
}
