//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use canvass_core::{Error as CoreError, report::Capture};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// An exact duplicate submission. Carries the logged rejection row so the
  /// caller can see what was ignored.
  #[error("duplicate capture: {message}")]
  Duplicate { message: String, capture: Box<Capture> },

  #[error("store error: {0}")]
  Store(String),
}

impl ApiError {
  /// Map a store failure onto an HTTP-shaped error.
  pub fn from_store<E: Into<CoreError>>(e: E) -> Self {
    match e.into() {
      e @ (CoreError::LeaderNotFound(_)
      | CoreError::VoterNotFound(_)
      | CoreError::SponsorNotFound(_)
      | CoreError::NotAssigned { .. }) => Self::NotFound(e.to_string()),
      e @ (CoreError::Validation(_)
      | CoreError::AlreadyAssigned { .. }
      | CoreError::ExactDuplicate { .. }
      | CoreError::IdentifierTaken { .. }
      | CoreError::Undeletable { .. }) => Self::BadRequest(e.to_string()),
      e => Self::Store(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Duplicate { message, capture } => (
        StatusCode::BAD_REQUEST,
        Json(json!({
          "error": message,
          "tipo_incidencia": "EXACT_DUPLICATE",
          "captura": capture,
        })),
      )
        .into_response(),
      ApiError::Store(m) => {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": m })))
          .into_response()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn store_errors_map_to_statuses() {
    let e = ApiError::from_store(CoreError::VoterNotFound("V1".into()));
    assert_eq!(e.into_response().status(), StatusCode::NOT_FOUND);

    let e = ApiError::from_store(CoreError::Validation("empty id".into()));
    assert_eq!(e.into_response().status(), StatusCode::BAD_REQUEST);

    let e = ApiError::from_store(CoreError::AlreadyAssigned {
      voter_id:  "V1".into(),
      leader_id: "L1".into(),
    });
    assert_eq!(e.into_response().status(), StatusCode::BAD_REQUEST);

    let e = ApiError::from_store(CoreError::Storage("disk".into()));
    assert_eq!(
      e.into_response().status(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }
}
