//! Handlers for `/asignaciones` and the manual reassignment endpoint.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/asignaciones` | Body: `{voterId, leaderId}`; 201 |
//! | `DELETE` | `/asignaciones` | Body: `{voterId, leaderId}` |
//! | `GET`    | `/asignaciones` | `?votante_id&lider_id` |
//! | `PUT`    | `/votantes/reasignar` | Body: [`ReassignBody`] |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use canvass_core::{
  assignment::Assignment,
  incident::Incident,
  store::{CanvassStore, Reassignment},
};
use serde::Deserialize;
use serde_json::json;

use crate::{default_actor, error::ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairBody {
  pub voter_id:  String,
  pub leader_id: String,
  #[serde(default = "default_actor")]
  pub actor:     String,
}

/// `POST /asignaciones` — 201, or 400 `AlreadyAssigned`.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<PairBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CanvassStore,
{
  let assignment = store
    .assign(&body.voter_id, &body.leader_id, body.actor)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(assignment)))
}

/// `DELETE /asignaciones` — 200, or 404 `NotAssigned`. The voter's
/// `first_leader` is untouched.
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<PairBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CanvassStore,
{
  store
    .unassign(&body.voter_id, &body.leader_id, body.actor)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "removed": true })))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub votante_id: Option<String>,
  pub lider_id:   Option<String>,
}

/// `GET /asignaciones?votante_id&lider_id`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Assignment>>, ApiError>
where
  S: CanvassStore,
{
  let assignments = store
    .list_assignments(params.votante_id.as_deref(), params.lider_id.as_deref())
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(assignments))
}

/// JSON body accepted by `PUT /votantes/reasignar`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignBody {
  pub voter_id:      String,
  pub old_leader_id: String,
  pub new_leader_id: String,
  #[serde(default = "default_actor")]
  pub actor:         String,
}

/// `PUT /votantes/reasignar` — reviewed duplicate resolution. Returns the
/// `MANUAL` incident it recorded.
pub async fn reassign<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<ReassignBody>,
) -> Result<Json<Incident>, ApiError>
where
  S: CanvassStore,
{
  let incident = store
    .reassign(Reassignment {
      voter_id:      body.voter_id,
      old_leader_id: body.old_leader_id,
      new_leader_id: body.new_leader_id,
      actor:         body.actor,
    })
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(incident))
}
