//! Handlers for the `/lideres` catalog.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/lideres` | Body: [`NewLeaderBody`]; 201 |
//! | `GET`    | `/lideres` | Full catalog |
//! | `GET`    | `/lideres/{id}` | |
//! | `PUT`    | `/lideres/{id}` | Full update; changed `newId` cascades |
//! | `DELETE` | `/lideres/{id}` | Soft-delete; body: optional `{reason, actor}` |
//! | `GET`    | `/lideres/eliminados` | Archive listing |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use canvass_core::{
  audit::Archived,
  entity::{Leader, LeaderUpdate, NewLeader},
  store::CanvassStore,
};
use serde::Deserialize;

use crate::{default_actor, error::ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLeaderBody {
  #[serde(flatten)]
  pub leader: NewLeader,
  #[serde(default = "default_actor")]
  pub actor:  String,
}

/// `POST /lideres` — 201, or 400 if the identifier is taken or the sponsor
/// is unknown.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewLeaderBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CanvassStore,
{
  let leader = store
    .add_leader(body.leader, body.actor)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(leader)))
}

/// `GET /lideres`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Leader>>, ApiError>
where
  S: CanvassStore,
{
  let leaders = store.list_leaders().await.map_err(ApiError::from_store)?;
  Ok(Json(leaders))
}

/// `GET /lideres/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<Leader>, ApiError>
where
  S: CanvassStore,
{
  let leader = store
    .get_leader(&id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("leader {id} not found")))?;
  Ok(Json(leader))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeaderBody {
  #[serde(flatten)]
  pub update: LeaderUpdate,
  #[serde(default = "default_actor")]
  pub actor:  String,
}

/// `PUT /lideres/{id}` — full update; a `newId` different from the path id
/// renames the leader and cascades into assignments, variants, and
/// `first_leader` pointers.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
  Json(body): Json<UpdateLeaderBody>,
) -> Result<Json<Leader>, ApiError>
where
  S: CanvassStore,
{
  let leader = store
    .update_leader(&id, body.update, body.actor)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(leader))
}

/// Optional body for soft-delete endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBody {
  #[serde(default)]
  pub reason: String,
  #[serde(default = "default_actor")]
  pub actor:  String,
}

impl Default for DeleteBody {
  fn default() -> Self {
    Self { reason: String::new(), actor: default_actor() }
  }
}

/// `DELETE /lideres/{id}` — soft-delete; 404 if absent.
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
  body: Option<Json<DeleteBody>>,
) -> Result<Json<Archived<Leader>>, ApiError>
where
  S: CanvassStore,
{
  let body = body.map(|Json(b)| b).unwrap_or_default();
  let archived = store
    .delete_leader(&id, body.actor, body.reason)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(archived))
}

/// `GET /lideres/eliminados` — archive listing with actor and reason.
pub async fn list_archived<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Archived<Leader>>>, ApiError>
where
  S: CanvassStore,
{
  let archived = store
    .list_archived_leaders()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(archived))
}
