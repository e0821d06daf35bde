//! Handler for `/auditoria`, the append-only action log.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use canvass_core::{
  audit::ActionLogEntry,
  entity::EntityKind,
  store::{ActionQuery, CanvassStore},
};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Entity kind filter (`sponsor`, `leader`, `voter`).
  pub entidad: Option<EntityKind>,
  /// Entity identifier filter.
  pub id:      Option<String>,
  pub limit:   Option<usize>,
  pub offset:  Option<usize>,
}

/// `GET /auditoria?entidad&id&limit&offset` — newest first.
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ActionLogEntry>>, ApiError>
where
  S: CanvassStore,
{
  let actions = store
    .list_actions(&ActionQuery {
      entity_kind: params.entidad,
      entity_id:   params.id,
      limit:       params.limit,
      offset:      params.offset,
    })
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(actions))
}
