//! Handlers for the `/votantes` catalog.
//!
//! Voters are created by the reconciliation pipeline, never through this
//! surface; these endpoints read, edit, and soft-delete canonical records.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use canvass_core::{
  audit::Archived,
  entity::{CanonicalVoter, VoterUpdate},
  store::CanvassStore,
};
use serde::Deserialize;

use crate::{default_actor, error::ApiError, leaders::DeleteBody};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// If set, only voters currently assigned to this leader.
  pub lider: Option<String>,
}

/// `GET /votantes[?lider]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<CanonicalVoter>>, ApiError>
where
  S: CanvassStore,
{
  let voters = store
    .list_voters(params.lider.as_deref())
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(voters))
}

/// `GET /votantes/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<CanonicalVoter>, ApiError>
where
  S: CanvassStore,
{
  let voter = store
    .get_voter(&id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("voter {id} not found")))?;
  Ok(Json(voter))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVoterBody {
  #[serde(flatten)]
  pub update: VoterUpdate,
  #[serde(default = "default_actor")]
  pub actor:  String,
}

/// `PUT /votantes/{id}` — the one path that edits canonical fields. A
/// `newId` different from the path id renames the voter and cascades into
/// assignments and variants.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
  Json(body): Json<UpdateVoterBody>,
) -> Result<Json<CanonicalVoter>, ApiError>
where
  S: CanvassStore,
{
  let voter = store
    .update_voter(&id, body.update, body.actor)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(voter))
}

/// `DELETE /votantes/{id}` — soft-delete; 404 if absent.
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
  body: Option<Json<DeleteBody>>,
) -> Result<Json<Archived<CanonicalVoter>>, ApiError>
where
  S: CanvassStore,
{
  let body = body.map(|Json(b)| b).unwrap_or_default();
  let archived = store
    .delete_voter(&id, body.actor, body.reason)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(archived))
}

/// JSON body accepted by `POST /votantes/eliminar`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteBody {
  pub ids:    Vec<String>,
  #[serde(default)]
  pub reason: String,
  #[serde(default = "default_actor")]
  pub actor:  String,
}

/// `POST /votantes/eliminar` — bulk soft-delete in one transaction: if any
/// id is unknown, nothing is deleted.
pub async fn remove_bulk<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<BulkDeleteBody>,
) -> Result<Json<Vec<Archived<CanonicalVoter>>>, ApiError>
where
  S: CanvassStore,
{
  let archived = store
    .delete_voters(body.ids, body.actor, body.reason)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(archived))
}

/// `GET /votantes/eliminados` — archive listing with actor and reason.
pub async fn list_archived<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Archived<CanonicalVoter>>>, ApiError>
where
  S: CanvassStore,
{
  let archived = store
    .list_archived_voters()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(archived))
}
