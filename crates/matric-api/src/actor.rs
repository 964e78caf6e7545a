//! Actor extraction from request headers.
//!
//! Authentication is an external collaborator: a gateway in front of this
//! service resolves the session and forwards the verified identity as
//! `X-Actor-Id` / `X-Actor-Role` headers. This extractor turns those into
//! the explicit [`Actor`] every core operation takes — there is no ambient
//! current-user lookup anywhere below this point.

use axum::{extract::FromRequestParts, http::request::Parts};
use matric_core::actor::{Actor, Role};
use uuid::Uuid;

use crate::error::ApiError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// The authenticated identity attached to the request by the gateway.
#[derive(Debug, Clone, Copy)]
pub struct ActorIdentity(pub Actor);

fn parse_role(s: &str) -> Option<Role> {
  match s {
    "student" => Some(Role::Student),
    "program_admin" => Some(Role::ProgramAdmin),
    "admin" => Some(Role::Admin),
    _ => None,
  }
}

impl<S> FromRequestParts<S> for ActorIdentity
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let user_id = parts
      .headers
      .get(ACTOR_ID_HEADER)
      .and_then(|v| v.to_str().ok())
      .and_then(|s| Uuid::parse_str(s).ok())
      .ok_or_else(|| {
        ApiError::Unauthorized("missing or malformed X-Actor-Id".to_string())
      })?;

    let role = parts
      .headers
      .get(ACTOR_ROLE_HEADER)
      .and_then(|v| v.to_str().ok())
      .and_then(parse_role)
      .ok_or_else(|| {
        ApiError::Unauthorized("missing or unknown X-Actor-Role".to_string())
      })?;

    Ok(ActorIdentity(Actor::new(user_id, role)))
  }
}
