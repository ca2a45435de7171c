//! Who is making a request, and whether they may touch a record.
//!
//! The acting person is named by the `userid` header. Nothing verifies that
//! claim; the [`Editor`] extractor is the only place that reads it, so a real
//! session layer can replace it without touching the permission check.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use lineage_core::{
  permission::{self, Grant},
  store::RegistryStore,
};
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "userid";

/// The person on whose behalf a request is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Editor(pub Uuid);

/// Read the acting person's id from request headers.
pub fn editor_from_headers(headers: &HeaderMap) -> Result<Editor, ApiError> {
  let raw = headers
    .get(USER_ID_HEADER)
    .ok_or_else(|| ApiError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?
    .to_str()
    .map_err(|_| ApiError::BadRequest(format!("{USER_ID_HEADER} is not valid text")))?;

  Uuid::parse_str(raw.trim())
    .map(Editor)
    .map_err(|_| ApiError::BadRequest(format!("{USER_ID_HEADER} is not a valid id")))
}

impl<S> FromRequestParts<S> for Editor
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    editor_from_headers(&parts.headers)
  }
}

/// Run the permission check, turning a denial into `403`.
pub async fn authorize<S>(
  store: &S,
  editor: Editor,
  target: Uuid,
) -> Result<Grant, ApiError>
where
  S: RegistryStore,
{
  let grant = permission::evaluate(store, editor.0, target)
    .await
    .map_err(ApiError::from_store)?;

  match grant {
    Some(grant) => {
      tracing::debug!(editor = %editor.0, %target, %grant, "edit allowed");
      Ok(grant)
    }
    None => {
      tracing::info!(editor = %editor.0, %target, "edit denied");
      Err(ApiError::Forbidden(format!("{} may not edit {target}", editor.0)))
    }
  }
}
