//! Assignments — the many-to-many voter↔leader relation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A voter↔leader link. The (voter, leader) pair is unique. Deleting a pair
/// removes the relation but never the voter or leader, and never alters the
/// voter's `first_leader` fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
  pub assignment_id: Uuid,
  pub voter_id:      String,
  pub leader_id:     String,
  /// Actor who created the link.
  pub assigned_by:   String,
  pub created_at:    DateTime<Utc>,
}
