//! Handlers for the `/recomendados` (sponsor) catalog.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use canvass_core::{
  audit::Archived,
  entity::{NewSponsor, Sponsor, SponsorUpdate},
  store::CanvassStore,
};
use serde::Deserialize;

use crate::{default_actor, error::ApiError, leaders::DeleteBody};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSponsorBody {
  #[serde(flatten)]
  pub sponsor: NewSponsor,
  #[serde(default = "default_actor")]
  pub actor:   String,
}

/// `POST /recomendados` — 201, or 400 if the identifier is taken.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewSponsorBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CanvassStore,
{
  let sponsor = store
    .add_sponsor(body.sponsor, body.actor)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(sponsor)))
}

/// `GET /recomendados`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Sponsor>>, ApiError>
where
  S: CanvassStore,
{
  let sponsors = store.list_sponsors().await.map_err(ApiError::from_store)?;
  Ok(Json(sponsors))
}

/// `GET /recomendados/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<Sponsor>, ApiError>
where
  S: CanvassStore,
{
  let sponsor = store
    .get_sponsor(&id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("sponsor {id} not found")))?;
  Ok(Json(sponsor))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSponsorBody {
  #[serde(flatten)]
  pub update: SponsorUpdate,
  #[serde(default = "default_actor")]
  pub actor:  String,
}

/// `PUT /recomendados/{id}` — full update; a changed `newId` cascades into
/// referencing leaders.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
  Json(body): Json<UpdateSponsorBody>,
) -> Result<Json<Sponsor>, ApiError>
where
  S: CanvassStore,
{
  let sponsor = store
    .update_sponsor(&id, body.update, body.actor)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(sponsor))
}

/// `DELETE /recomendados/{id}` — soft-delete; 400 `Undeletable` while
/// leaders still reference the sponsor.
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
  body: Option<Json<DeleteBody>>,
) -> Result<Json<Archived<Sponsor>>, ApiError>
where
  S: CanvassStore,
{
  let body = body.map(|Json(b)| b).unwrap_or_default();
  let archived = store
    .delete_sponsor(&id, body.actor, body.reason)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(archived))
}

/// `GET /recomendados/eliminados`
pub async fn list_archived<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Archived<Sponsor>>>, ApiError>
where
  S: CanvassStore,
{
  let archived = store
    .list_archived_sponsors()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(archived))
}
