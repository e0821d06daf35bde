//! Catalog entities: sponsors, field leaders, and canonical voters.
//!
//! All three are keyed by a natural identifier (a national id string) that is
//! unique per kind and mutable only through an explicit, cascading rename.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of a catalog entity, used in audit and archive records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
  Sponsor,
  Leader,
  Voter,
}

impl EntityKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Sponsor => "sponsor",
      Self::Leader => "leader",
      Self::Voter => "voter",
    }
  }
}

// ─── Sponsor ─────────────────────────────────────────────────────────────────

/// A sponsor ("recomendado") vouching for zero or more leaders. A sponsor
/// with linked leaders cannot be deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sponsor {
  pub sponsor_id:  String,
  pub given_name:  String,
  pub family_name: String,
  pub phone:       String,
  pub email:       String,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSponsor {
  pub sponsor_id:  String,
  #[serde(default)]
  pub given_name:  String,
  #[serde(default)]
  pub family_name: String,
  #[serde(default)]
  pub phone:       String,
  #[serde(default)]
  pub email:       String,
}

/// Full update; a differing `new_id` triggers the rename cascade into
/// referencing leaders.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorUpdate {
  pub new_id:      Option<String>,
  #[serde(default)]
  pub given_name:  String,
  #[serde(default)]
  pub family_name: String,
  #[serde(default)]
  pub phone:       String,
  #[serde(default)]
  pub email:       String,
}

// ─── Leader ──────────────────────────────────────────────────────────────────

/// A field leader who reports captures. Owns zero or more assignments and
/// variants; `duplicate_log` accumulates human-readable duplicate notices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leader {
  pub leader_id:     String,
  pub given_name:    String,
  pub family_name:   String,
  pub phone:         String,
  pub email:         String,
  pub sponsor_id:    Option<String>,
  pub objective:     Option<String>,
  pub duplicate_log: String,
  pub created_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLeader {
  pub leader_id:   String,
  #[serde(default)]
  pub given_name:  String,
  #[serde(default)]
  pub family_name: String,
  #[serde(default)]
  pub phone:       String,
  #[serde(default)]
  pub email:       String,
  pub sponsor_id:  Option<String>,
  pub objective:   Option<String>,
}

/// Full update; a differing `new_id` triggers the rename cascade into
/// assignments, variants, and `first_leader` pointers.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderUpdate {
  pub new_id:      Option<String>,
  #[serde(default)]
  pub given_name:  String,
  #[serde(default)]
  pub family_name: String,
  #[serde(default)]
  pub phone:       String,
  #[serde(default)]
  pub email:       String,
  pub sponsor_id:  Option<String>,
  pub objective:   Option<String>,
}

// ─── Canonical voter ─────────────────────────────────────────────────────────

/// The single authoritative record per voter identifier.
///
/// Created by the resolver on first sighting, never with a leader reference —
/// leader linkage lives exclusively in assignments. `first_leader` is set by
/// the first successful assignment and afterwards changes only through a
/// rename cascade of that same leader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalVoter {
  pub voter_id:     String,
  pub given_name:   String,
  pub family_name:  String,
  pub address:      String,
  pub phone:        String,
  pub email:        String,
  pub first_leader: Option<String>,
  pub created_at:   DateTime<Utc>,
}

/// Explicit canonical edit; captures never overwrite canonical fields.
/// A differing `new_id` triggers the rename cascade into assignments and
/// variants.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterUpdate {
  pub new_id:      Option<String>,
  #[serde(default)]
  pub given_name:  String,
  #[serde(default)]
  pub family_name: String,
  #[serde(default)]
  pub address:     String,
  #[serde(default)]
  pub phone:       String,
  #[serde(default)]
  pub email:       String,
}
