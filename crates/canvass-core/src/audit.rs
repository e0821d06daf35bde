//! Audit records: the append-only action log and archived entity snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::EntityKind;

/// One entry in the append-only audit trail. Every mutating operation writes
/// at least one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLogEntry {
  pub action_id:   Uuid,
  pub entity_kind: EntityKind,
  pub entity_id:   String,
  /// Verb, e.g. `CREATE`, `RENAME`, `CAPTURE`, `ASSIGN`, `UNASSIGN`,
  /// `REASSIGN`, `DELETE`.
  pub action:      String,
  pub actor:       String,
  /// Structured operation detail.
  pub detail:      serde_json::Value,
  pub recorded_at: DateTime<Utc>,
}

/// A full snapshot of a soft-deleted entity plus deletion metadata. Written
/// exactly once per deletion, in the same transaction that removes the live
/// row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Archived<T> {
  #[serde(flatten)]
  pub record:     T,
  pub deleted_by: String,
  pub reason:     String,
  pub deleted_at: DateTime<Utc>,
}
