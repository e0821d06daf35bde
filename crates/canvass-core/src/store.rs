//! The `CanvassStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `canvass-store-sqlite`). The HTTP layer depends on this abstraction, not
//! on any concrete backend. Every multi-step operation executes inside a
//! single backend transaction: any failure rolls the whole operation back.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  assignment::Assignment,
  audit::{ActionLogEntry, Archived},
  entity::{
    CanonicalVoter, EntityKind, Leader, LeaderUpdate, NewLeader, NewSponsor,
    Sponsor, SponsorUpdate, VoterUpdate,
  },
  incident::{Incident, IncidentKind},
  report::{
    BatchSummary, Capture, CaptureOutcome, CaptureStatus, FlatRecord,
    NewCapture,
  },
  variant::Variant,
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`CanvassStore::list_captures`].
#[derive(Debug, Clone, Default)]
pub struct CaptureQuery {
  pub status:   Option<CaptureStatus>,
  pub leader:   Option<String>,
  /// Filter on the reported voter identifier.
  pub voter:    Option<String>,
  pub from:     Option<DateTime<Utc>>,
  pub to:       Option<DateTime<Utc>>,
  pub limit:    Option<usize>,
  pub offset:   Option<usize>,
}

/// Parameters for [`CanvassStore::list_variants`].
#[derive(Debug, Clone, Default)]
pub struct VariantQuery {
  pub voter:        Option<String>,
  pub leader:       Option<String>,
  /// If `true`, return only variants with `is_current = true`.
  pub only_current: bool,
  pub limit:        Option<usize>,
  pub offset:       Option<usize>,
}

/// Parameters for [`CanvassStore::list_incidents`].
#[derive(Debug, Clone, Default)]
pub struct IncidentQuery {
  pub kind:   Option<IncidentKind>,
  pub voter:  Option<String>,
  pub leader: Option<String>,
  pub from:   Option<DateTime<Utc>>,
  pub to:     Option<DateTime<Utc>>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// Parameters for [`CanvassStore::list_actions`].
#[derive(Debug, Clone, Default)]
pub struct ActionQuery {
  pub entity_kind: Option<EntityKind>,
  pub entity_id:   Option<String>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

// ─── Metrics ─────────────────────────────────────────────────────────────────

/// Per-leader variant statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderVariantStats {
  pub leader_id:      String,
  pub unique_voters:  u64,
  pub total_variants: u64,
  /// `total_variants / unique_voters`; 1.0 means no resubmissions.
  pub resubmission_rate: f64,
}

/// A voter reported by more than one leader, with all involved leaders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCluster {
  pub voter_id: String,
  pub leaders:  Vec<String>,
}

/// Result of [`CanvassStore::variant_metrics`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantMetrics {
  pub per_leader: Vec<LeaderVariantStats>,
  pub clusters:   Vec<DuplicateCluster>,
}

// ─── Reassignment ────────────────────────────────────────────────────────────

/// A reviewed manual resolution of a cross-leader duplicate: move (or keep)
/// one voter's assignment. Never touches the voter's `first_leader` fact.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reassignment {
  pub voter_id:      String,
  pub old_leader_id: String,
  pub new_leader_id: String,
  pub actor:         String,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Canvass storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (tokio with axum).
pub trait CanvassStore: Send + Sync {
  type Error: std::error::Error
    + Into<crate::Error>
    + Send
    + Sync
    + 'static;

  // ── Sponsors ──────────────────────────────────────────────────────────

  fn add_sponsor(
    &self,
    input: NewSponsor,
    actor: String,
  ) -> impl Future<Output = Result<Sponsor, Self::Error>> + Send + '_;

  fn get_sponsor<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Sponsor>, Self::Error>> + Send + 'a;

  fn list_sponsors(
    &self,
  ) -> impl Future<Output = Result<Vec<Sponsor>, Self::Error>> + Send + '_;

  /// Full update; a changed identifier cascades into referencing leaders.
  fn update_sponsor<'a>(
    &'a self,
    id: &'a str,
    update: SponsorUpdate,
    actor: String,
  ) -> impl Future<Output = Result<Sponsor, Self::Error>> + Send + 'a;

  /// Soft-delete. Fails with `Undeletable` while leaders reference the
  /// sponsor.
  fn delete_sponsor<'a>(
    &'a self,
    id: &'a str,
    actor: String,
    reason: String,
  ) -> impl Future<Output = Result<Archived<Sponsor>, Self::Error>> + Send + 'a;

  fn list_archived_sponsors(
    &self,
  ) -> impl Future<Output = Result<Vec<Archived<Sponsor>>, Self::Error>> + Send + '_;

  // ── Leaders ───────────────────────────────────────────────────────────

  fn add_leader(
    &self,
    input: NewLeader,
    actor: String,
  ) -> impl Future<Output = Result<Leader, Self::Error>> + Send + '_;

  fn get_leader<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Leader>, Self::Error>> + Send + 'a;

  fn list_leaders(
    &self,
  ) -> impl Future<Output = Result<Vec<Leader>, Self::Error>> + Send + '_;

  /// Full update; a changed identifier cascades into assignments, variants,
  /// and voters' `first_leader` pointers.
  fn update_leader<'a>(
    &'a self,
    id: &'a str,
    update: LeaderUpdate,
    actor: String,
  ) -> impl Future<Output = Result<Leader, Self::Error>> + Send + 'a;

  /// Soft-delete: archive the full snapshot and remove the live row in one
  /// transaction. Dependent assignments and variants stay as history.
  fn delete_leader<'a>(
    &'a self,
    id: &'a str,
    actor: String,
    reason: String,
  ) -> impl Future<Output = Result<Archived<Leader>, Self::Error>> + Send + 'a;

  fn list_archived_leaders(
    &self,
  ) -> impl Future<Output = Result<Vec<Archived<Leader>>, Self::Error>> + Send + '_;

  // ── Canonical voters ──────────────────────────────────────────────────

  fn get_voter<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<CanonicalVoter>, Self::Error>> + Send + 'a;

  /// List voters, optionally only those assigned to `leader`.
  fn list_voters<'a>(
    &'a self,
    leader: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<CanonicalVoter>, Self::Error>> + Send + 'a;

  /// Explicit canonical edit; the only path that overwrites canonical
  /// fields. A changed identifier cascades into assignments and variants.
  fn update_voter<'a>(
    &'a self,
    id: &'a str,
    update: VoterUpdate,
    actor: String,
  ) -> impl Future<Output = Result<CanonicalVoter, Self::Error>> + Send + 'a;

  fn delete_voter<'a>(
    &'a self,
    id: &'a str,
    actor: String,
    reason: String,
  ) -> impl Future<Output = Result<Archived<CanonicalVoter>, Self::Error>> + Send + 'a;

  /// Bulk soft-delete in a single transaction: if any id is unknown, none
  /// of the voters is deleted.
  fn delete_voters(
    &self,
    ids: Vec<String>,
    actor: String,
    reason: String,
  ) -> impl Future<Output = Result<Vec<Archived<CanonicalVoter>>, Self::Error>> + Send + '_;

  fn list_archived_voters(
    &self,
  ) -> impl Future<Output = Result<Vec<Archived<CanonicalVoter>>, Self::Error>> + Send + '_;

  // ── Captures ──────────────────────────────────────────────────────────

  /// Drive one capture through the reconciliation pipeline: validate →
  /// resolve → record variant → assign → classify → commit, atomically.
  fn submit_capture(
    &self,
    input: NewCapture,
  ) -> impl Future<Output = Result<CaptureOutcome, Self::Error>> + Send + '_;

  /// Ingest an ordered sequence of flat records, one transaction per
  /// record. Validation failures are written as `ERROR` captures and the
  /// batch continues; the summary reports every outcome.
  fn ingest_batch(
    &self,
    records: Vec<FlatRecord>,
    actor: String,
  ) -> impl Future<Output = Result<BatchSummary, Self::Error>> + Send + '_;

  fn list_captures<'a>(
    &'a self,
    query: &'a CaptureQuery,
  ) -> impl Future<Output = Result<Vec<Capture>, Self::Error>> + Send + 'a;

  // ── Variants ──────────────────────────────────────────────────────────

  fn list_variants<'a>(
    &'a self,
    query: &'a VariantQuery,
  ) -> impl Future<Output = Result<Vec<Variant>, Self::Error>> + Send + 'a;

  /// Per-leader unique-voter counts vs. total variants, plus cross-leader
  /// duplicate clusters.
  fn variant_metrics<'a>(
    &'a self,
    leader: Option<&'a str>,
  ) -> impl Future<Output = Result<VariantMetrics, Self::Error>> + Send + 'a;

  // ── Assignments ───────────────────────────────────────────────────────

  /// Create the (voter, leader) pair; sets the voter's `first_leader` if and
  /// only if it is still unset. Fails with `AlreadyAssigned` on an existing
  /// pair.
  fn assign<'a>(
    &'a self,
    voter_id: &'a str,
    leader_id: &'a str,
    actor: String,
  ) -> impl Future<Output = Result<Assignment, Self::Error>> + Send + 'a;

  /// Remove the pair. Fails with `NotAssigned` if absent. Never alters
  /// `first_leader`.
  fn unassign<'a>(
    &'a self,
    voter_id: &'a str,
    leader_id: &'a str,
    actor: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Manual duplicate resolution; emits a `MANUAL` incident.
  fn reassign(
    &self,
    input: Reassignment,
  ) -> impl Future<Output = Result<Incident, Self::Error>> + Send + '_;

  fn list_assignments<'a>(
    &'a self,
    voter: Option<&'a str>,
    leader: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + 'a;

  // ── Incidents & audit ─────────────────────────────────────────────────

  fn list_incidents<'a>(
    &'a self,
    query: &'a IncidentQuery,
  ) -> impl Future<Output = Result<Vec<Incident>, Self::Error>> + Send + 'a;

  fn list_actions<'a>(
    &'a self,
    query: &'a ActionQuery,
  ) -> impl Future<Output = Result<Vec<ActionLogEntry>, Self::Error>> + Send + 'a;
}
