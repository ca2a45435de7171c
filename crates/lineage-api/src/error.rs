//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use lineage_core::store::StoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("precondition failed: {0}")]
  PreconditionFailed(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("photo store error: {0}")]
  Photo(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Surface a domain error carried by a store failure with its own status;
  /// anything else is a generic server error.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    match e.as_domain() {
      Some(domain) => Self::from_domain(domain),
      None => Self::Store(Box::new(e)),
    }
  }

  fn from_domain(e: &lineage_core::Error) -> Self {
    use lineage_core::Error as D;
    match e {
      D::PersonNotFound(_) => Self::NotFound(e.to_string()),
      _ if e.is_precondition() => Self::PreconditionFailed(e.to_string()),
      _ => Self::BadRequest(e.to_string()),
    }
  }
}

impl From<lineage_core::Error> for ApiError {
  fn from(e: lineage_core::Error) -> Self { Self::from_domain(&e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::PreconditionFailed(m) => (StatusCode::PRECONDITION_FAILED, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Photo(e) | ApiError::Store(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
