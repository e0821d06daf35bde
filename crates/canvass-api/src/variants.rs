//! Handlers for `/variantes` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use canvass_core::{
  store::{CanvassStore, VariantMetrics, VariantQuery},
  variant::Variant,
};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Filter on the canonical voter identifier.
  pub cc:      Option<String>,
  pub lider:   Option<String>,
  /// If `true`, return only the current variant per (voter, leader).
  #[serde(default)]
  pub current: bool,
  pub limit:   Option<usize>,
  pub offset:  Option<usize>,
}

/// `GET /variantes?cc&lider&current&limit&offset`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Variant>>, ApiError>
where
  S: CanvassStore,
{
  let variants = store
    .list_variants(&VariantQuery {
      voter:        params.cc,
      leader:       params.lider,
      only_current: params.current,
      limit:        params.limit,
      offset:       params.offset,
    })
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(variants))
}

#[derive(Debug, Deserialize)]
pub struct MetricsParams {
  pub lider: Option<String>,
}

/// `GET /variantes/metricas[?lider]` — resubmission rates per leader and
/// cross-leader duplicate clusters.
pub async fn metrics<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<MetricsParams>,
) -> Result<Json<VariantMetrics>, ApiError>
where
  S: CanvassStore,
{
  let metrics = store
    .variant_metrics(params.lider.as_deref())
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(metrics))
}
