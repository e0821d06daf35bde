//! The reconciliation pipeline: resolver, variant recorder, assignment
//! manager, and incident detector, composed by [`run_capture`].
//!
//! Everything here operates on a borrowed [`rusqlite::Transaction`] and is
//! driven by `SqliteStore::with_tx`, which commits on success and lets the
//! transaction roll back on any error. The pipeline replaces the source
//! system's implicit trigger chains with explicit, ordered calls so failure
//! points and rollback boundaries are visible and testable.

use canvass_core::{
  Error as CoreError,
  assignment::Assignment,
  entity::{CanonicalVoter, EntityKind, Leader, Sponsor},
  incident::{Incident, IncidentKind},
  report::{Capture, CaptureOutcome, CaptureStatus, NewCapture, ReportedFields},
  store::Reassignment,
  variant::Variant,
};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, Transaction, params};
use uuid::Uuid;

use crate::{
  archive::log_action,
  encode::{RawLeader, RawSponsor, RawVoter, encode_dt, encode_uuid},
};

// ─── Transaction plumbing ────────────────────────────────────────────────────

/// Failure inside a transaction: either a domain outcome (rolls back, maps
/// to a 4xx at the HTTP layer) or a database error (rolls back, 5xx).
pub(crate) enum TxError {
  Domain(CoreError),
  Db(rusqlite::Error),
}

impl From<rusqlite::Error> for TxError {
  fn from(e: rusqlite::Error) -> Self { Self::Db(e) }
}

impl From<CoreError> for TxError {
  fn from(e: CoreError) -> Self { Self::Domain(e) }
}

impl From<crate::Error> for TxError {
  fn from(e: crate::Error) -> Self { Self::Domain(e.into()) }
}

pub(crate) type TxResult<T> = Result<T, TxError>;

// ─── Row fetchers ────────────────────────────────────────────────────────────

pub(crate) fn fetch_sponsor(
  tx: &Transaction<'_>,
  id: &str,
) -> TxResult<Option<Sponsor>> {
  let raw = tx
    .query_row(
      "SELECT sponsor_id, given_name, family_name, phone, email, created_at
       FROM sponsors WHERE sponsor_id = ?1",
      params![id],
      RawSponsor::from_row,
    )
    .optional()?;
  Ok(raw.map(RawSponsor::into_sponsor).transpose()?)
}

pub(crate) fn fetch_leader(
  tx: &Transaction<'_>,
  id: &str,
) -> TxResult<Option<Leader>> {
  let raw = tx
    .query_row(
      "SELECT leader_id, given_name, family_name, phone, email, sponsor_id,
              objective, duplicate_log, created_at
       FROM leaders WHERE leader_id = ?1",
      params![id],
      RawLeader::from_row,
    )
    .optional()?;
  Ok(raw.map(RawLeader::into_leader).transpose()?)
}

pub(crate) fn fetch_voter(
  tx: &Transaction<'_>,
  id: &str,
) -> TxResult<Option<CanonicalVoter>> {
  let raw = tx
    .query_row(
      "SELECT voter_id, given_name, family_name, address, phone, email,
              first_leader, created_at
       FROM voters WHERE voter_id = ?1",
      params![id],
      RawVoter::from_row,
    )
    .optional()?;
  Ok(raw.map(RawVoter::into_voter).transpose()?)
}

// ─── Canonical resolver ──────────────────────────────────────────────────────

/// Find or create the canonical voter for a reported identifier.
///
/// Existing voters are returned unchanged — canonical fields are edited only
/// through the explicit update operation, never from captures. New voters
/// are created with the reported fields and no `first_leader`; leader
/// linkage is exclusively the assignment manager's business.
pub(crate) fn resolve_voter(
  tx: &Transaction<'_>,
  reported_id: &str,
  fields: &ReportedFields,
  now: DateTime<Utc>,
) -> TxResult<(CanonicalVoter, bool)> {
  if let Some(existing) = fetch_voter(tx, reported_id)? {
    return Ok((existing, false));
  }

  let voter = CanonicalVoter {
    voter_id:     reported_id.to_owned(),
    given_name:   fields.given_name.clone().unwrap_or_default(),
    family_name:  fields.family_name.clone().unwrap_or_default(),
    address:      fields.address.clone().unwrap_or_default(),
    phone:        fields.phone.clone().unwrap_or_default(),
    email:        fields.email.clone().unwrap_or_default(),
    first_leader: None,
    created_at:   now,
  };

  tx.execute(
    "INSERT INTO voters (voter_id, given_name, family_name, address, phone,
                         email, first_leader, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7)",
    params![
      voter.voter_id,
      voter.given_name,
      voter.family_name,
      voter.address,
      voter.phone,
      voter.email,
      encode_dt(now),
    ],
  )?;

  Ok((voter, true))
}

// ─── Variant recorder ────────────────────────────────────────────────────────

pub(crate) struct VariantOutcome {
  /// The pair already had a current variant and the new fields differ.
  pub conflict: bool,
}

/// Maintain the (voter, leader) pair's current variant.
///
/// Absent → insert a new current variant. Present with equal normalized
/// fields → idempotent no-op. Present with differing fields → mark the old
/// variant superseded and insert a new current one.
pub(crate) fn record_variant(
  tx: &Transaction<'_>,
  voter_id: &str,
  leader_id: &str,
  fields: &ReportedFields,
  content_hash: &str,
  capture_id: Uuid,
  now: DateTime<Utc>,
) -> TxResult<VariantOutcome> {
  let current: Option<(String, String)> = tx
    .query_row(
      "SELECT variant_id, content_hash FROM variants
       WHERE voter_id = ?1 AND leader_id = ?2 AND is_current = 1",
      params![voter_id, leader_id],
      |r| Ok((r.get(0)?, r.get(1)?)),
    )
    .optional()?;

  let conflict = match current {
    Some((_, ref hash)) if hash == content_hash => return Ok(VariantOutcome { conflict: false }),
    Some((variant_id, _)) => {
      tx.execute(
        "UPDATE variants SET is_current = 0 WHERE variant_id = ?1",
        params![variant_id],
      )?;
      true
    }
    None => false,
  };

  let variant = Variant {
    variant_id: Uuid::new_v4(),
    voter_id: voter_id.to_owned(),
    leader_id: leader_id.to_owned(),
    capture_id,
    fields: fields.clone(),
    content_hash: content_hash.to_owned(),
    is_current: true,
    recorded_at: now,
  };
  insert_variant(tx, &variant)?;

  Ok(VariantOutcome { conflict })
}

fn insert_variant(tx: &Transaction<'_>, v: &Variant) -> TxResult<()> {
  tx.execute(
    "INSERT INTO variants (variant_id, voter_id, leader_id, capture_id,
                           given_name, family_name, address, phone, email,
                           content_hash, is_current, recorded_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    params![
      encode_uuid(v.variant_id),
      v.voter_id,
      v.leader_id,
      encode_uuid(v.capture_id),
      v.fields.given_name.as_deref().unwrap_or(""),
      v.fields.family_name.as_deref().unwrap_or(""),
      v.fields.address.as_deref().unwrap_or(""),
      v.fields.phone.as_deref().unwrap_or(""),
      v.fields.email.as_deref().unwrap_or(""),
      v.content_hash,
      v.is_current,
      encode_dt(v.recorded_at),
    ],
  )?;
  Ok(())
}

// ─── Assignment manager ──────────────────────────────────────────────────────

pub(crate) fn assignment_exists(
  tx: &Transaction<'_>,
  voter_id: &str,
  leader_id: &str,
) -> TxResult<bool> {
  let found: Option<i64> = tx
    .query_row(
      "SELECT 1 FROM assignments WHERE voter_id = ?1 AND leader_id = ?2",
      params![voter_id, leader_id],
      |r| r.get(0),
    )
    .optional()?;
  Ok(found.is_some())
}

/// All leaders currently assigned to `voter_id` other than `excluding`.
pub(crate) fn other_leaders(
  tx: &Transaction<'_>,
  voter_id: &str,
  excluding: &str,
) -> TxResult<Vec<String>> {
  let mut stmt = tx.prepare(
    "SELECT leader_id FROM assignments
     WHERE voter_id = ?1 AND leader_id != ?2
     ORDER BY leader_id",
  )?;
  let leaders = stmt
    .query_map(params![voter_id, excluding], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(leaders)
}

fn insert_assignment(tx: &Transaction<'_>, a: &Assignment) -> TxResult<()> {
  tx.execute(
    "INSERT INTO assignments (assignment_id, voter_id, leader_id,
                              assigned_by, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    params![
      encode_uuid(a.assignment_id),
      a.voter_id,
      a.leader_id,
      a.assigned_by,
      encode_dt(a.created_at),
    ],
  )?;
  Ok(())
}

/// First-writer-wins: sets `first_leader` only while it is still unset.
/// Subsequent assigns and reassigns never overwrite it.
fn set_first_leader_if_unset(
  tx: &Transaction<'_>,
  voter_id: &str,
  leader_id: &str,
) -> TxResult<bool> {
  let changed = tx.execute(
    "UPDATE voters SET first_leader = ?2
     WHERE voter_id = ?1 AND first_leader IS NULL",
    params![voter_id, leader_id],
  )?;
  Ok(changed > 0)
}

/// Explicit assignment creation (`POST /asignaciones`).
pub(crate) fn assign_op(
  tx: &Transaction<'_>,
  voter_id: &str,
  leader_id: &str,
  actor: &str,
  now: DateTime<Utc>,
) -> TxResult<Assignment> {
  fetch_voter(tx, voter_id)?
    .ok_or_else(|| CoreError::VoterNotFound(voter_id.to_owned()))?;
  fetch_leader(tx, leader_id)?
    .ok_or_else(|| CoreError::LeaderNotFound(leader_id.to_owned()))?;

  if assignment_exists(tx, voter_id, leader_id)? {
    return Err(
      CoreError::AlreadyAssigned {
        voter_id:  voter_id.to_owned(),
        leader_id: leader_id.to_owned(),
      }
      .into(),
    );
  }

  let assignment = Assignment {
    assignment_id: Uuid::new_v4(),
    voter_id:      voter_id.to_owned(),
    leader_id:     leader_id.to_owned(),
    assigned_by:   actor.to_owned(),
    created_at:    now,
  };
  insert_assignment(tx, &assignment)?;
  let first = set_first_leader_if_unset(tx, voter_id, leader_id)?;

  log_action(
    tx,
    EntityKind::Voter,
    voter_id,
    "ASSIGN",
    actor,
    serde_json::json!({ "leaderId": leader_id, "firstLeaderSet": first }),
    now,
  )?;
  Ok(assignment)
}

/// Explicit assignment removal (`DELETE /asignaciones`). The voter's
/// `first_leader` is a historical fact and stays untouched.
pub(crate) fn unassign_op(
  tx: &Transaction<'_>,
  voter_id: &str,
  leader_id: &str,
  actor: &str,
  now: DateTime<Utc>,
) -> TxResult<()> {
  let removed = tx.execute(
    "DELETE FROM assignments WHERE voter_id = ?1 AND leader_id = ?2",
    params![voter_id, leader_id],
  )?;
  if removed == 0 {
    return Err(
      CoreError::NotAssigned {
        voter_id:  voter_id.to_owned(),
        leader_id: leader_id.to_owned(),
      }
      .into(),
    );
  }

  log_action(
    tx,
    EntityKind::Voter,
    voter_id,
    "UNASSIGN",
    actor,
    serde_json::json!({ "leaderId": leader_id }),
    now,
  )?;
  Ok(())
}

/// Manual duplicate resolution: move (or keep) one voter's assignment after
/// human review. Emits a `MANUAL` incident and appends to the losing
/// leader's duplicate log. Never touches `first_leader`.
pub(crate) fn reassign_op(
  tx: &Transaction<'_>,
  input: &Reassignment,
  now: DateTime<Utc>,
) -> TxResult<Incident> {
  fetch_voter(tx, &input.voter_id)?
    .ok_or_else(|| CoreError::VoterNotFound(input.voter_id.clone()))?;
  if !assignment_exists(tx, &input.voter_id, &input.old_leader_id)? {
    return Err(
      CoreError::NotAssigned {
        voter_id:  input.voter_id.clone(),
        leader_id: input.old_leader_id.clone(),
      }
      .into(),
    );
  }

  let detail = if input.new_leader_id == input.old_leader_id {
    format!(
      "Reviewed duplicate: kept leader {} for voter {}",
      input.old_leader_id, input.voter_id
    )
  } else {
    fetch_leader(tx, &input.new_leader_id)?
      .ok_or_else(|| CoreError::LeaderNotFound(input.new_leader_id.clone()))?;
    if assignment_exists(tx, &input.voter_id, &input.new_leader_id)? {
      return Err(
        CoreError::AlreadyAssigned {
          voter_id:  input.voter_id.clone(),
          leader_id: input.new_leader_id.clone(),
        }
        .into(),
      );
    }

    tx.execute(
      "DELETE FROM assignments WHERE voter_id = ?1 AND leader_id = ?2",
      params![input.voter_id, input.old_leader_id],
    )?;
    let assignment = Assignment {
      assignment_id: Uuid::new_v4(),
      voter_id:      input.voter_id.clone(),
      leader_id:     input.new_leader_id.clone(),
      assigned_by:   input.actor.clone(),
      created_at:    now,
    };
    insert_assignment(tx, &assignment)?;

    format!(
      "Reviewed duplicate: moved voter {} from leader {} to leader {}",
      input.voter_id, input.old_leader_id, input.new_leader_id
    )
  };

  append_duplicate_log(tx, &input.old_leader_id, &detail)?;

  let incident = Incident {
    incident_id:     Uuid::new_v4(),
    kind:            IncidentKind::Manual,
    voter_id:        input.voter_id.clone(),
    prior_leader_id: Some(input.old_leader_id.clone()),
    new_leader_id:   Some(input.new_leader_id.clone()),
    detail,
    actor:           input.actor.clone(),
    recorded_at:     now,
  };
  insert_incident(tx, &incident)?;

  log_action(
    tx,
    EntityKind::Voter,
    &input.voter_id,
    "REASSIGN",
    &input.actor,
    serde_json::json!({
      "oldLeaderId": input.old_leader_id,
      "newLeaderId": input.new_leader_id,
    }),
    now,
  )?;
  Ok(incident)
}

// ─── Incident detector ───────────────────────────────────────────────────────

pub(crate) fn insert_incident(
  tx: &Transaction<'_>,
  i: &Incident,
) -> TxResult<()> {
  tx.execute(
    "INSERT INTO incidents (incident_id, kind, voter_id, prior_leader_id,
                            new_leader_id, detail, actor, recorded_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    params![
      encode_uuid(i.incident_id),
      i.kind.as_str(),
      i.voter_id,
      i.prior_leader_id,
      i.new_leader_id,
      i.detail,
      i.actor,
      encode_dt(i.recorded_at),
    ],
  )?;
  Ok(())
}

pub(crate) fn append_duplicate_log(
  tx: &Transaction<'_>,
  leader_id: &str,
  message: &str,
) -> TxResult<()> {
  tx.execute(
    "UPDATE leaders SET duplicate_log = duplicate_log || ?2 || char(10)
     WHERE leader_id = ?1",
    params![leader_id, message],
  )?;
  Ok(())
}

/// Classify the outcome of resolve + record + assign. At most one incident
/// per capture; exact duplicates never reach this point.
fn classify(
  capture: &Capture,
  voter_id: &str,
  pair_existed: bool,
  conflict: bool,
  others: &[String],
  now: DateTime<Utc>,
) -> Option<Incident> {
  if pair_existed && conflict {
    return Some(Incident {
      incident_id:     Uuid::new_v4(),
      kind:            IncidentKind::DataConflict,
      voter_id:        voter_id.to_owned(),
      prior_leader_id: Some(capture.leader_id.clone()),
      new_leader_id:   Some(capture.leader_id.clone()),
      detail:          format!(
        "Leader {} re-reported voter {} with differing data",
        capture.leader_id, voter_id
      ),
      actor:           capture.actor.clone(),
      recorded_at:     now,
    });
  }

  if !pair_existed && !others.is_empty() {
    return Some(Incident {
      incident_id:     Uuid::new_v4(),
      kind:            IncidentKind::DuplicateAcrossLeaders,
      voter_id:        voter_id.to_owned(),
      prior_leader_id: Some(others[0].clone()),
      new_leader_id:   Some(capture.leader_id.clone()),
      detail:          format!(
        "Voter {} already reported by leader(s) {}; new report by leader {}",
        voter_id,
        others.join(", "),
        capture.leader_id
      ),
      actor:           capture.actor.clone(),
      recorded_at:     now,
    });
  }

  None
}

// ─── Capture store ───────────────────────────────────────────────────────────

pub(crate) fn insert_capture(
  tx: &Transaction<'_>,
  c: &Capture,
) -> TxResult<()> {
  tx.execute(
    "INSERT INTO captures (capture_id, leader_id, reported_id, given_name,
                           family_name, address, phone, email, content_hash,
                           status, canonical_id, actor, recorded_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    params![
      encode_uuid(c.capture_id),
      c.leader_id,
      c.reported_id,
      c.fields.given_name.as_deref().unwrap_or(""),
      c.fields.family_name.as_deref().unwrap_or(""),
      c.fields.address.as_deref().unwrap_or(""),
      c.fields.phone.as_deref().unwrap_or(""),
      c.fields.email.as_deref().unwrap_or(""),
      c.content_hash,
      c.status.as_str(),
      c.canonical_id,
      c.actor,
      encode_dt(c.recorded_at),
    ],
  )?;
  Ok(())
}

/// Record an `ERROR` capture for a batch record that failed validation.
/// The single-capture path never writes these; it surfaces the failure with
/// no row instead.
pub(crate) fn record_error_capture(
  tx: &Transaction<'_>,
  input: &NewCapture,
  now: DateTime<Utc>,
) -> TxResult<Capture> {
  let fields = input.fields.normalized();
  let capture = Capture {
    capture_id:   Uuid::new_v4(),
    leader_id:    input.leader_id.clone(),
    reported_id:  input.reported_id.trim().to_owned(),
    content_hash: fields.content_hash(),
    fields,
    status:       CaptureStatus::Error,
    canonical_id: None,
    actor:        input.actor.clone(),
    recorded_at:  now,
  };
  insert_capture(tx, &capture)?;
  Ok(capture)
}

// ─── Orchestrator ────────────────────────────────────────────────────────────

/// Drive one capture through the per-capture state machine:
/// received → validated → resolved → recorded → assigned → classified →
/// committed. Exact duplicates short-circuit after validation with a logged
/// `REJECTED_DUPLICATE` row and no other writes.
pub(crate) fn run_capture(
  tx: &Transaction<'_>,
  input: &NewCapture,
  now: DateTime<Utc>,
) -> TxResult<CaptureOutcome> {
  // Validation. Failure here must leave no capture row.
  let reported_id = input.reported_id.trim();
  if reported_id.is_empty() {
    return Err(
      CoreError::Validation("reported identifier is required".into()).into(),
    );
  }
  fetch_leader(tx, &input.leader_id)?
    .ok_or_else(|| CoreError::LeaderNotFound(input.leader_id.clone()))?;

  let fields = input.fields.normalized();
  let content_hash = fields.content_hash();

  // Exact-duplicate hash check against processed captures.
  let prior: Option<Option<String>> = tx
    .query_row(
      "SELECT canonical_id FROM captures
       WHERE leader_id = ?1 AND reported_id = ?2 AND content_hash = ?3
         AND status = 'PROCESSED'",
      params![input.leader_id, reported_id, content_hash],
      |r| r.get(0),
    )
    .optional()?;

  if let Some(prior_canonical) = prior {
    let canonical_id =
      prior_canonical.unwrap_or_else(|| reported_id.to_owned());
    let capture = Capture {
      capture_id: Uuid::new_v4(),
      leader_id: input.leader_id.clone(),
      reported_id: reported_id.to_owned(),
      fields,
      content_hash,
      status: CaptureStatus::RejectedDuplicate,
      canonical_id: Some(canonical_id.clone()),
      actor: input.actor.clone(),
      recorded_at: now,
    };
    insert_capture(tx, &capture)?;
    append_duplicate_log(
      tx,
      &input.leader_id,
      &format!(
        "Exact duplicate: identical resubmission of voter {canonical_id} ignored"
      ),
    )?;
    log_action(
      tx,
      EntityKind::Voter,
      &canonical_id,
      "CAPTURE_REJECTED",
      &input.actor,
      serde_json::json!({
        "captureId": capture.capture_id,
        "leaderId": input.leader_id,
      }),
      now,
    )?;
    return Ok(CaptureOutcome {
      capture,
      canonical_id,
      created_voter: false,
      new_assignment: false,
      incidents: Vec::new(),
    });
  }

  // Resolve → record → assign.
  let (voter, created_voter) = resolve_voter(tx, reported_id, &fields, now)?;

  let capture_id = Uuid::new_v4();
  let variant = record_variant(
    tx,
    &voter.voter_id,
    &input.leader_id,
    &fields,
    &content_hash,
    capture_id,
    now,
  )?;

  let pair_existed =
    assignment_exists(tx, &voter.voter_id, &input.leader_id)?;
  let others = other_leaders(tx, &voter.voter_id, &input.leader_id)?;
  if !pair_existed {
    let assignment = Assignment {
      assignment_id: Uuid::new_v4(),
      voter_id:      voter.voter_id.clone(),
      leader_id:     input.leader_id.clone(),
      assigned_by:   input.actor.clone(),
      created_at:    now,
    };
    insert_assignment(tx, &assignment)?;
    set_first_leader_if_unset(tx, &voter.voter_id, &input.leader_id)?;
  }

  let capture = Capture {
    capture_id,
    leader_id: input.leader_id.clone(),
    reported_id: reported_id.to_owned(),
    fields,
    content_hash,
    status: CaptureStatus::Processed,
    canonical_id: Some(voter.voter_id.clone()),
    actor: input.actor.clone(),
    recorded_at: now,
  };

  // Classify and commit.
  let mut incidents = Vec::new();
  if let Some(incident) = classify(
    &capture,
    &voter.voter_id,
    pair_existed,
    variant.conflict,
    &others,
    now,
  ) {
    if incident.kind == IncidentKind::DuplicateAcrossLeaders {
      append_duplicate_log(tx, &input.leader_id, &incident.detail)?;
    }
    insert_incident(tx, &incident)?;
    incidents.push(incident);
  }

  insert_capture(tx, &capture)?;
  log_action(
    tx,
    EntityKind::Voter,
    &voter.voter_id,
    "CAPTURE",
    &input.actor,
    serde_json::json!({
      "captureId": capture.capture_id,
      "leaderId": input.leader_id,
      "createdVoter": created_voter,
      "newAssignment": !pair_existed,
      "incidents": incidents.len(),
    }),
    now,
  )?;

  Ok(CaptureOutcome {
    capture,
    canonical_id: voter.voter_id,
    created_voter,
    new_assignment: !pair_existed,
    incidents,
  })
}
