//! The archive/audit layer: soft deletion and the append-only action log.
//!
//! A soft delete verifies the entity exists and has no protective
//! dependents, writes a full snapshot to the archive table with actor,
//! reason, and timestamp, then removes the live row — all inside the caller
//! transaction. If any step fails the whole delete fails; there is no
//! partial state. Dependent assignments and variants are left in place as
//! history, never cascaded.

use canvass_core::{
  Error as CoreError,
  audit::Archived,
  entity::{CanonicalVoter, EntityKind, Leader, Sponsor},
};
use chrono::{DateTime, Utc};
use rusqlite::{Transaction, params};
use uuid::Uuid;

use crate::{
  encode::{encode_dt, encode_uuid},
  recon::{TxResult, fetch_leader, fetch_sponsor, fetch_voter},
};

// ─── Action log ──────────────────────────────────────────────────────────────

/// Append one audit entry. Called by every mutating operation, inside its
/// transaction.
pub(crate) fn log_action(
  tx: &Transaction<'_>,
  entity_kind: EntityKind,
  entity_id: &str,
  action: &str,
  actor: &str,
  detail: serde_json::Value,
  now: DateTime<Utc>,
) -> TxResult<()> {
  tx.execute(
    "INSERT INTO action_log (action_id, entity_kind, entity_id, action,
                             actor, detail, recorded_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    params![
      encode_uuid(Uuid::new_v4()),
      entity_kind.as_str(),
      entity_id,
      action,
      actor,
      detail.to_string(),
      encode_dt(now),
    ],
  )?;
  Ok(())
}

// ─── Soft deletion ───────────────────────────────────────────────────────────

pub(crate) fn delete_sponsor_op(
  tx: &Transaction<'_>,
  id: &str,
  actor: &str,
  reason: &str,
  now: DateTime<Utc>,
) -> TxResult<Archived<Sponsor>> {
  let sponsor = fetch_sponsor(tx, id)?
    .ok_or_else(|| CoreError::SponsorNotFound(id.to_owned()))?;

  // Sponsors are protected by their leaders.
  let mut stmt = tx.prepare(
    "SELECT leader_id FROM leaders WHERE sponsor_id = ?1 ORDER BY leader_id",
  )?;
  let linked = stmt
    .query_map(params![id], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  if !linked.is_empty() {
    return Err(
      CoreError::Undeletable {
        kind:   EntityKind::Sponsor,
        id:     id.to_owned(),
        detail: format!("linked leaders: {}", linked.join(", ")),
      }
      .into(),
    );
  }

  tx.execute(
    "INSERT INTO archived_sponsors (archive_id, sponsor_id, given_name,
                                    family_name, phone, email, created_at,
                                    deleted_by, reason, deleted_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    params![
      encode_uuid(Uuid::new_v4()),
      sponsor.sponsor_id,
      sponsor.given_name,
      sponsor.family_name,
      sponsor.phone,
      sponsor.email,
      encode_dt(sponsor.created_at),
      actor,
      reason,
      encode_dt(now),
    ],
  )?;
  tx.execute("DELETE FROM sponsors WHERE sponsor_id = ?1", params![id])?;

  log_action(
    tx,
    EntityKind::Sponsor,
    id,
    "DELETE",
    actor,
    serde_json::json!({ "reason": reason }),
    now,
  )?;

  Ok(Archived {
    record:     sponsor,
    deleted_by: actor.to_owned(),
    reason:     reason.to_owned(),
    deleted_at: now,
  })
}

/// Leaders can always be soft-deleted; their assignments and variants stay
/// behind as history.
pub(crate) fn delete_leader_op(
  tx: &Transaction<'_>,
  id: &str,
  actor: &str,
  reason: &str,
  now: DateTime<Utc>,
) -> TxResult<Archived<Leader>> {
  let leader = fetch_leader(tx, id)?
    .ok_or_else(|| CoreError::LeaderNotFound(id.to_owned()))?;

  tx.execute(
    "INSERT INTO archived_leaders (archive_id, leader_id, given_name,
                                   family_name, phone, email, sponsor_id,
                                   objective, duplicate_log, created_at,
                                   deleted_by, reason, deleted_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    params![
      encode_uuid(Uuid::new_v4()),
      leader.leader_id,
      leader.given_name,
      leader.family_name,
      leader.phone,
      leader.email,
      leader.sponsor_id,
      leader.objective,
      leader.duplicate_log,
      encode_dt(leader.created_at),
      actor,
      reason,
      encode_dt(now),
    ],
  )?;
  tx.execute("DELETE FROM leaders WHERE leader_id = ?1", params![id])?;

  log_action(
    tx,
    EntityKind::Leader,
    id,
    "DELETE",
    actor,
    serde_json::json!({ "reason": reason }),
    now,
  )?;

  Ok(Archived {
    record:     leader,
    deleted_by: actor.to_owned(),
    reason:     reason.to_owned(),
    deleted_at: now,
  })
}

pub(crate) fn delete_voter_op(
  tx: &Transaction<'_>,
  id: &str,
  actor: &str,
  reason: &str,
  now: DateTime<Utc>,
) -> TxResult<Archived<CanonicalVoter>> {
  let voter = fetch_voter(tx, id)?
    .ok_or_else(|| CoreError::VoterNotFound(id.to_owned()))?;

  tx.execute(
    "INSERT INTO archived_voters (archive_id, voter_id, given_name,
                                  family_name, address, phone, email,
                                  first_leader, created_at, deleted_by,
                                  reason, deleted_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    params![
      encode_uuid(Uuid::new_v4()),
      voter.voter_id,
      voter.given_name,
      voter.family_name,
      voter.address,
      voter.phone,
      voter.email,
      voter.first_leader,
      encode_dt(voter.created_at),
      actor,
      reason,
      encode_dt(now),
    ],
  )?;
  tx.execute("DELETE FROM voters WHERE voter_id = ?1", params![id])?;

  log_action(
    tx,
    EntityKind::Voter,
    id,
    "DELETE",
    actor,
    serde_json::json!({ "reason": reason }),
    now,
  )?;

  Ok(Archived {
    record:     voter,
    deleted_by: actor.to_owned(),
    reason:     reason.to_owned(),
    deleted_at: now,
  })
}

/// Bulk soft-delete: one transaction for all ids. An unknown id fails the
/// whole batch; none of the voters is deleted.
pub(crate) fn delete_voters_op(
  tx: &Transaction<'_>,
  ids: &[String],
  actor: &str,
  reason: &str,
  now: DateTime<Utc>,
) -> TxResult<Vec<Archived<CanonicalVoter>>> {
  let mut archived = Vec::with_capacity(ids.len());
  for id in ids {
    archived.push(delete_voter_op(tx, id, actor, reason, now)?);
  }
  Ok(archived)
}
