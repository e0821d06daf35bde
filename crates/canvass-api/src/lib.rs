//! JSON REST API for the canvass engine.
//!
//! Exposes an axum [`Router`] backed by any
//! [`canvass_core::store::CanvassStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! Route paths and query parameters keep their field-operations Spanish
//! names (`capturas`, `lideres`, `votantes`, ...); JSON bodies are camelCase.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", canvass_api::api_router(store.clone()))
//! ```

pub mod assignments;
pub mod audit;
pub mod captures;
pub mod error;
pub mod incidents;
pub mod leaders;
pub mod sponsors;
pub mod variants;
pub mod voters;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use canvass_core::store::CanvassStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: CanvassStore + Clone + 'static,
{
  Router::new()
    // Captures
    .route(
      "/capturas",
      post(captures::create::<S>).get(captures::list::<S>),
    )
    .route("/capturas/lote", post(captures::batch::<S>))
    // Variants
    .route("/variantes", get(variants::list::<S>))
    .route("/variantes/metricas", get(variants::metrics::<S>))
    // Assignments
    .route(
      "/asignaciones",
      post(assignments::create::<S>)
        .delete(assignments::remove::<S>)
        .get(assignments::list::<S>),
    )
    // Incidents
    .route("/incidencias", get(incidents::list::<S>))
    // Leaders
    .route("/lideres", post(leaders::create::<S>).get(leaders::list::<S>))
    .route("/lideres/eliminados", get(leaders::list_archived::<S>))
    .route(
      "/lideres/{id}",
      get(leaders::get_one::<S>)
        .put(leaders::update::<S>)
        .delete(leaders::remove::<S>),
    )
    // Canonical voters
    .route("/votantes", get(voters::list::<S>))
    .route("/votantes/eliminados", get(voters::list_archived::<S>))
    .route("/votantes/eliminar", post(voters::remove_bulk::<S>))
    .route("/votantes/reasignar", put(assignments::reassign::<S>))
    .route(
      "/votantes/{id}",
      get(voters::get_one::<S>)
        .put(voters::update::<S>)
        .delete(voters::remove::<S>),
    )
    // Sponsors
    .route(
      "/recomendados",
      post(sponsors::create::<S>).get(sponsors::list::<S>),
    )
    .route("/recomendados/eliminados", get(sponsors::list_archived::<S>))
    .route(
      "/recomendados/{id}",
      get(sponsors::get_one::<S>)
        .put(sponsors::update::<S>)
        .delete(sponsors::remove::<S>),
    )
    // Audit
    .route("/auditoria", get(audit::list::<S>))
    .with_state(store)
}

/// Shared default for the optional `actor` field of mutating bodies.
pub(crate) fn default_actor() -> String { "sistema".to_owned() }
