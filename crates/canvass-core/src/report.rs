//! Captures — immutable raw ingestion records — and the reported field set.
//!
//! A capture is never updated once written. Idempotent resubmission is
//! enforced by a uniqueness constraint over (leader, reported identifier,
//! normalized content hash) among processed captures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::incident::Incident;

// ─── Reported fields ─────────────────────────────────────────────────────────

/// The flat field set a leader reports about a voter. Any subset may be
/// present; absent fields normalize to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedFields {
  pub given_name:  Option<String>,
  pub family_name: Option<String>,
  pub address:     Option<String>,
  pub phone:       Option<String>,
  pub email:       Option<String>,
}

/// Canonical text normalization applied to every reported field before
/// hashing and storage: trim, collapse internal whitespace runs to a single
/// space, Unicode uppercase.
pub fn normalize_field(raw: &str) -> String {
  raw
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_uppercase()
}

impl ReportedFields {
  /// The fields in their normalized storage form.
  pub fn normalized(&self) -> Self {
    let norm = |f: &Option<String>| Some(normalize_field(f.as_deref().unwrap_or("")));
    Self {
      given_name:  norm(&self.given_name),
      family_name: norm(&self.family_name),
      address:     norm(&self.address),
      phone:       norm(&self.phone),
      email:       norm(&self.email),
    }
  }

  /// SHA-256 hex digest of the normalized fields, concatenated in fixed
  /// order with a `\x1F` separator. Two reports differing only in case or
  /// spacing hash identically.
  pub fn content_hash(&self) -> String {
    let n = self.normalized();
    let joined = [
      n.given_name.as_deref().unwrap_or(""),
      n.family_name.as_deref().unwrap_or(""),
      n.address.as_deref().unwrap_or(""),
      n.phone.as_deref().unwrap_or(""),
      n.email.as_deref().unwrap_or(""),
    ]
    .join("\u{1f}");
    hex::encode(Sha256::digest(joined.as_bytes()))
  }
}

// ─── Capture ─────────────────────────────────────────────────────────────────

/// Processing status of a capture. The status is assigned exactly once, when
/// the row is written; capture rows are never updated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaptureStatus {
  /// The reconciliation pipeline ran to completion.
  Processed,
  /// Identical resubmission; logged but not reprocessed.
  RejectedDuplicate,
  /// Batch-ingested record that failed validation (unknown leader, missing
  /// identifier). Single-capture validation failures leave no row at all.
  Error,
}

impl CaptureStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Processed => "PROCESSED",
      Self::RejectedDuplicate => "REJECTED_DUPLICATE",
      Self::Error => "ERROR",
    }
  }
}

/// An immutable raw ingestion event from a leader about a voter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capture {
  pub capture_id:   Uuid,
  pub leader_id:    String,
  pub reported_id:  String,
  pub fields:       ReportedFields,
  pub content_hash: String,
  pub status:       CaptureStatus,
  /// The canonical voter this capture resolved to; `None` for rows that
  /// never reached the resolver.
  pub canonical_id: Option<String>,
  pub actor:        String,
  pub recorded_at:  DateTime<Utc>,
}

/// Input to [`crate::store::CanvassStore::submit_capture`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCapture {
  pub leader_id:   String,
  pub reported_id: String,
  #[serde(default)]
  pub fields:      ReportedFields,
  pub actor:       String,
}

/// Everything one reconciled capture produced, reported back to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOutcome {
  pub capture:        Capture,
  pub canonical_id:   String,
  /// Whether the resolver created the canonical voter on this capture.
  pub created_voter:  bool,
  /// Whether this capture created a new voter↔leader assignment.
  pub new_assignment: bool,
  pub incidents:      Vec<Incident>,
}

// ─── Batch ingestion ─────────────────────────────────────────────────────────

/// One flat record from the external ingestion producer. The producer's
/// parsing mechanics (spreadsheets etc.) are not this crate's concern.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatRecord {
  pub leader_id:   String,
  pub reported_id: String,
  #[serde(default)]
  pub fields:      ReportedFields,
}

/// A record rejected during batch ingestion with its `ERROR` capture row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchError {
  pub capture: Capture,
  pub detail:  String,
}

/// Per-record outcomes of one batch ingestion request. Each record runs
/// through the reconciliation pipeline in its own transaction; invalid
/// records are logged as `ERROR` captures and the batch continues.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
  pub processed:  usize,
  /// Captures rejected as exact duplicates.
  pub duplicates: Vec<Capture>,
  pub errors:     Vec<BatchError>,
  /// All incidents the batch emitted, in record order.
  pub incidents:  Vec<Incident>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_trims_collapses_and_uppercases() {
    assert_eq!(normalize_field("  ana   maría "), "ANA MARÍA");
    assert_eq!(normalize_field(""), "");
    assert_eq!(normalize_field("Calle 10 # 4-22"), "CALLE 10 # 4-22");
  }

  #[test]
  fn content_hash_ignores_case_and_spacing() {
    let a = ReportedFields {
      given_name: Some("Ana".into()),
      family_name: Some("Pérez  Ruiz".into()),
      ..Default::default()
    };
    let b = ReportedFields {
      given_name: Some("  ANA ".into()),
      family_name: Some("pérez ruiz".into()),
      ..Default::default()
    };
    assert_eq!(a.content_hash(), b.content_hash());
  }

  #[test]
  fn content_hash_distinguishes_differing_fields() {
    let a = ReportedFields {
      given_name: Some("Ana".into()),
      ..Default::default()
    };
    let b = ReportedFields {
      given_name: Some("Ana María".into()),
      ..Default::default()
    };
    assert_ne!(a.content_hash(), b.content_hash());
  }

  #[test]
  fn absent_and_empty_fields_hash_identically() {
    let a = ReportedFields::default();
    let b = ReportedFields {
      given_name: Some("".into()),
      address: Some("   ".into()),
      ..Default::default()
    };
    assert_eq!(a.content_hash(), b.content_hash());
  }
}
