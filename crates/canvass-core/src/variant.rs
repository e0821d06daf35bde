//! Variants — per-(voter, leader) historized report snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::report::ReportedFields;

/// A leader-specific snapshot of a voter's reported data.
///
/// Exactly one variant per (voter, leader) pair carries `is_current = true`
/// at any time. Superseded variants are retained forever; no variant row is
/// ever deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
  pub variant_id:   Uuid,
  pub voter_id:     String,
  pub leader_id:    String,
  /// The capture that produced this snapshot.
  pub capture_id:   Uuid,
  pub fields:       ReportedFields,
  pub content_hash: String,
  pub is_current:   bool,
  pub recorded_at:  DateTime<Utc>,
}
