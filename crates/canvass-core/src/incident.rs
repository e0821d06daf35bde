//! Incidents — the duplicate/conflict taxonomy.
//!
//! Incidents are append-only review records; they are never edited or
//! deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification of a detected duplicate or conflicting submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentKind {
  /// Identical resubmission by the same leader; caught by the capture store
  /// hash check before the detector runs.
  ExactDuplicate,
  /// A second leader reported a voter already assigned to another leader.
  DuplicateAcrossLeaders,
  /// The same leader re-reported a voter with differing field values.
  DataConflict,
  /// Recorded by an explicit human operation (e.g. a reviewed reassignment).
  Manual,
}

impl IncidentKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::ExactDuplicate => "EXACT_DUPLICATE",
      Self::DuplicateAcrossLeaders => "DUPLICATE_ACROSS_LEADERS",
      Self::DataConflict => "DATA_CONFLICT",
      Self::Manual => "MANUAL",
    }
  }
}

/// A detected duplicate or conflicting data event requiring human review.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
  pub incident_id:     Uuid,
  pub kind:            IncidentKind,
  pub voter_id:        String,
  /// The leader previously holding the contested relation, where relevant.
  pub prior_leader_id: Option<String>,
  /// The leader whose submission raised the incident, where relevant.
  pub new_leader_id:   Option<String>,
  pub detail:          String,
  pub actor:           String,
  pub recorded_at:     DateTime<Utc>,
}
