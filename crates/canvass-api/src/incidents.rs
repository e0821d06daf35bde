//! Handler for `/incidencias`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use canvass_core::{
  incident::{Incident, IncidentKind},
  store::{CanvassStore, IncidentQuery},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Incident kind filter (`EXACT_DUPLICATE`, `DUPLICATE_ACROSS_LEADERS`,
  /// `DATA_CONFLICT`, `MANUAL`).
  pub tipo:       Option<IncidentKind>,
  pub votante_id: Option<String>,
  pub lider_id:   Option<String>,
  pub desde:      Option<DateTime<Utc>>,
  pub hasta:      Option<DateTime<Utc>>,
  pub limit:      Option<usize>,
  pub offset:     Option<usize>,
}

/// `GET /incidencias?tipo&votante_id&lider_id&desde&hasta`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Incident>>, ApiError>
where
  S: CanvassStore,
{
  let incidents = store
    .list_incidents(&IncidentQuery {
      kind:   params.tipo,
      voter:  params.votante_id,
      leader: params.lider_id,
      from:   params.desde,
      to:     params.hasta,
      limit:  params.limit,
      offset: params.offset,
    })
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(incidents))
}
