//! Handlers for `/capturas` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/capturas` | Body: [`CaptureBody`]; 201 + outcome, or 400 with `tipo_incidencia` on an exact duplicate |
//! | `POST` | `/capturas/lote` | Body: [`BatchBody`]; per-record outcomes |
//! | `GET`  | `/capturas` | `?estado&lider&cc&desde&hasta&limit&offset` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use canvass_core::{
  report::{
    BatchSummary, Capture, CaptureStatus, FlatRecord, NewCapture,
    ReportedFields,
  },
  store::{CanvassStore, CaptureQuery},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{default_actor, error::ApiError};

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /capturas`. The reported field set is
/// flattened into the top level.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureBody {
  pub leader_id:   String,
  pub reported_id: String,
  #[serde(flatten)]
  pub fields:      ReportedFields,
  #[serde(default = "default_actor")]
  pub actor:       String,
}

/// `POST /capturas` — 201 + the full
/// [`CaptureOutcome`](canvass_core::report::CaptureOutcome).
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CaptureBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CanvassStore,
{
  let outcome = store
    .submit_capture(NewCapture {
      leader_id:   body.leader_id,
      reported_id: body.reported_id,
      fields:      body.fields,
      actor:       body.actor,
    })
    .await
    .map_err(ApiError::from_store)?;

  if outcome.capture.status == CaptureStatus::RejectedDuplicate {
    return Err(ApiError::Duplicate {
      message: format!(
        "identical submission for voter {} already processed",
        outcome.canonical_id
      ),
      capture: Box::new(outcome.capture),
    });
  }

  Ok((StatusCode::CREATED, Json(outcome)))
}

// ─── Batch ────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /capturas/lote`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchBody {
  pub records: Vec<FlatRecord>,
  #[serde(default = "default_actor")]
  pub actor:   String,
}

/// `POST /capturas/lote` — runs every record through the pipeline, one
/// transaction each, and reports per-record outcomes.
pub async fn batch<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<BatchBody>,
) -> Result<Json<BatchSummary>, ApiError>
where
  S: CanvassStore,
{
  let summary = store
    .ingest_batch(body.records, body.actor)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(summary))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Capture status filter (`PROCESSED`, `REJECTED_DUPLICATE`, `ERROR`).
  pub estado: Option<CaptureStatus>,
  pub lider:  Option<String>,
  /// Filter on the reported voter identifier.
  pub cc:     Option<String>,
  pub desde:  Option<DateTime<Utc>>,
  pub hasta:  Option<DateTime<Utc>>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /capturas?estado&lider&cc&desde&hasta&limit&offset`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Capture>>, ApiError>
where
  S: CanvassStore,
{
  let captures = store
    .list_captures(&CaptureQuery {
      status: params.estado,
      leader: params.lider,
      voter:  params.cc,
      from:   params.desde,
      to:     params.hasta,
      limit:  params.limit,
      offset: params.offset,
    })
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(captures))
}
