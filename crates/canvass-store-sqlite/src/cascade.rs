//! Catalog mutations: creation, edits, and identifier renames.
//!
//! Natural identifiers are mutable. A rename is an explicit orchestrated
//! operation: it updates the primary row and enumerates every dependent
//! relation (assignments, variants, `first_leader` pointers) in the same
//! transaction, rejecting with `Conflict` when the new identifier is already
//! taken. Captures and incidents are immutable history and keep the
//! identifiers they were recorded with.

use canvass_core::{
  Error as CoreError,
  entity::{
    CanonicalVoter, EntityKind, Leader, LeaderUpdate, NewLeader, NewSponsor,
    Sponsor, SponsorUpdate, VoterUpdate,
  },
  report::normalize_field,
};
use chrono::{DateTime, Utc};
use rusqlite::{Transaction, params};

use crate::{
  archive::log_action,
  encode::encode_dt,
  recon::{TxError, TxResult, fetch_leader, fetch_sponsor, fetch_voter},
};

fn require_id(id: &str, what: &str) -> TxResult<String> {
  let trimmed = id.trim();
  if trimmed.is_empty() {
    return Err(CoreError::Validation(format!("{what} is required")).into());
  }
  Ok(trimmed.to_owned())
}

// ─── Sponsors ────────────────────────────────────────────────────────────────

pub(crate) fn add_sponsor_op(
  tx: &Transaction<'_>,
  input: &NewSponsor,
  actor: &str,
  now: DateTime<Utc>,
) -> TxResult<Sponsor> {
  let id = require_id(&input.sponsor_id, "sponsor identifier")?;
  if fetch_sponsor(tx, &id)?.is_some() {
    return Err(
      CoreError::IdentifierTaken { kind: EntityKind::Sponsor, id }.into(),
    );
  }

  let sponsor = Sponsor {
    sponsor_id:  id,
    given_name:  normalize_field(&input.given_name),
    family_name: normalize_field(&input.family_name),
    phone:       normalize_field(&input.phone),
    email:       normalize_field(&input.email),
    created_at:  now,
  };
  tx.execute(
    "INSERT INTO sponsors (sponsor_id, given_name, family_name, phone,
                           email, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    params![
      sponsor.sponsor_id,
      sponsor.given_name,
      sponsor.family_name,
      sponsor.phone,
      sponsor.email,
      encode_dt(now),
    ],
  )?;

  log_action(
    tx,
    EntityKind::Sponsor,
    &sponsor.sponsor_id,
    "CREATE",
    actor,
    serde_json::json!({}),
    now,
  )?;
  Ok(sponsor)
}

pub(crate) fn update_sponsor_op(
  tx: &Transaction<'_>,
  id: &str,
  update: &SponsorUpdate,
  actor: &str,
  now: DateTime<Utc>,
) -> TxResult<Sponsor> {
  fetch_sponsor(tx, id)?
    .ok_or_else(|| CoreError::SponsorNotFound(id.to_owned()))?;

  let new_id = match &update.new_id {
    Some(n) => require_id(n, "sponsor identifier")?,
    None => id.to_owned(),
  };
  let renamed = new_id != id;
  if renamed && fetch_sponsor(tx, &new_id)?.is_some() {
    return Err(
      CoreError::IdentifierTaken {
        kind: EntityKind::Sponsor,
        id:   new_id,
      }
      .into(),
    );
  }

  tx.execute(
    "UPDATE sponsors
     SET sponsor_id = ?2, given_name = ?3, family_name = ?4, phone = ?5,
         email = ?6
     WHERE sponsor_id = ?1",
    params![
      id,
      new_id,
      normalize_field(&update.given_name),
      normalize_field(&update.family_name),
      normalize_field(&update.phone),
      normalize_field(&update.email),
    ],
  )?;
  if renamed {
    tx.execute(
      "UPDATE leaders SET sponsor_id = ?2 WHERE sponsor_id = ?1",
      params![id, new_id],
    )?;
  }

  log_action(
    tx,
    EntityKind::Sponsor,
    &new_id,
    if renamed { "RENAME" } else { "UPDATE" },
    actor,
    serde_json::json!({ "previousId": id }),
    now,
  )?;

  fetch_sponsor(tx, &new_id)?.ok_or_else(|| {
    TxError::Domain(CoreError::Storage(
      "sponsor vanished during update".into(),
    ))
  })
}

// ─── Leaders ─────────────────────────────────────────────────────────────────

pub(crate) fn add_leader_op(
  tx: &Transaction<'_>,
  input: &NewLeader,
  actor: &str,
  now: DateTime<Utc>,
) -> TxResult<Leader> {
  let id = require_id(&input.leader_id, "leader identifier")?;
  if fetch_leader(tx, &id)?.is_some() {
    return Err(
      CoreError::IdentifierTaken { kind: EntityKind::Leader, id }.into(),
    );
  }
  if let Some(sponsor_id) = &input.sponsor_id {
    fetch_sponsor(tx, sponsor_id)?
      .ok_or_else(|| CoreError::SponsorNotFound(sponsor_id.clone()))?;
  }

  let leader = Leader {
    leader_id:     id,
    given_name:    normalize_field(&input.given_name),
    family_name:   normalize_field(&input.family_name),
    phone:         normalize_field(&input.phone),
    email:         normalize_field(&input.email),
    sponsor_id:    input.sponsor_id.clone(),
    objective:     input.objective.clone(),
    duplicate_log: String::new(),
    created_at:    now,
  };
  tx.execute(
    "INSERT INTO leaders (leader_id, given_name, family_name, phone, email,
                          sponsor_id, objective, duplicate_log, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, '', ?8)",
    params![
      leader.leader_id,
      leader.given_name,
      leader.family_name,
      leader.phone,
      leader.email,
      leader.sponsor_id,
      leader.objective,
      encode_dt(now),
    ],
  )?;

  log_action(
    tx,
    EntityKind::Leader,
    &leader.leader_id,
    "CREATE",
    actor,
    serde_json::json!({ "sponsorId": leader.sponsor_id }),
    now,
  )?;
  Ok(leader)
}

/// Full leader update. A changed identifier cascades into assignments,
/// variants, and every voter whose `first_leader` points at this leader —
/// the one sanctioned way that fact ever changes.
pub(crate) fn update_leader_op(
  tx: &Transaction<'_>,
  id: &str,
  update: &LeaderUpdate,
  actor: &str,
  now: DateTime<Utc>,
) -> TxResult<Leader> {
  fetch_leader(tx, id)?
    .ok_or_else(|| CoreError::LeaderNotFound(id.to_owned()))?;

  let new_id = match &update.new_id {
    Some(n) => require_id(n, "leader identifier")?,
    None => id.to_owned(),
  };
  let renamed = new_id != id;
  if renamed && fetch_leader(tx, &new_id)?.is_some() {
    return Err(
      CoreError::IdentifierTaken {
        kind: EntityKind::Leader,
        id:   new_id,
      }
      .into(),
    );
  }
  if let Some(sponsor_id) = &update.sponsor_id {
    fetch_sponsor(tx, sponsor_id)?
      .ok_or_else(|| CoreError::SponsorNotFound(sponsor_id.clone()))?;
  }

  tx.execute(
    "UPDATE leaders
     SET leader_id = ?2, given_name = ?3, family_name = ?4, phone = ?5,
         email = ?6, sponsor_id = ?7, objective = ?8
     WHERE leader_id = ?1",
    params![
      id,
      new_id,
      normalize_field(&update.given_name),
      normalize_field(&update.family_name),
      normalize_field(&update.phone),
      normalize_field(&update.email),
      update.sponsor_id,
      update.objective,
    ],
  )?;
  if renamed {
    tx.execute(
      "UPDATE assignments SET leader_id = ?2 WHERE leader_id = ?1",
      params![id, new_id],
    )?;
    tx.execute(
      "UPDATE variants SET leader_id = ?2 WHERE leader_id = ?1",
      params![id, new_id],
    )?;
    tx.execute(
      "UPDATE voters SET first_leader = ?2 WHERE first_leader = ?1",
      params![id, new_id],
    )?;
  }

  log_action(
    tx,
    EntityKind::Leader,
    &new_id,
    if renamed { "RENAME" } else { "UPDATE" },
    actor,
    serde_json::json!({ "previousId": id }),
    now,
  )?;

  fetch_leader(tx, &new_id)?.ok_or_else(|| {
    TxError::Domain(CoreError::Storage("leader vanished during update".into()))
  })
}

// ─── Canonical voters ────────────────────────────────────────────────────────

/// Explicit canonical edit; the only path that overwrites canonical fields.
/// A changed identifier cascades into assignments and variants.
pub(crate) fn update_voter_op(
  tx: &Transaction<'_>,
  id: &str,
  update: &VoterUpdate,
  actor: &str,
  now: DateTime<Utc>,
) -> TxResult<CanonicalVoter> {
  fetch_voter(tx, id)?
    .ok_or_else(|| CoreError::VoterNotFound(id.to_owned()))?;

  let new_id = match &update.new_id {
    Some(n) => require_id(n, "voter identifier")?,
    None => id.to_owned(),
  };
  let renamed = new_id != id;
  if renamed && fetch_voter(tx, &new_id)?.is_some() {
    return Err(
      CoreError::IdentifierTaken {
        kind: EntityKind::Voter,
        id:   new_id,
      }
      .into(),
    );
  }

  tx.execute(
    "UPDATE voters
     SET voter_id = ?2, given_name = ?3, family_name = ?4, address = ?5,
         phone = ?6, email = ?7
     WHERE voter_id = ?1",
    params![
      id,
      new_id,
      normalize_field(&update.given_name),
      normalize_field(&update.family_name),
      normalize_field(&update.address),
      normalize_field(&update.phone),
      normalize_field(&update.email),
    ],
  )?;
  if renamed {
    tx.execute(
      "UPDATE assignments SET voter_id = ?2 WHERE voter_id = ?1",
      params![id, new_id],
    )?;
    tx.execute(
      "UPDATE variants SET voter_id = ?2 WHERE voter_id = ?1",
      params![id, new_id],
    )?;
  }

  log_action(
    tx,
    EntityKind::Voter,
    &new_id,
    if renamed { "RENAME" } else { "UPDATE" },
    actor,
    serde_json::json!({ "previousId": id }),
    now,
  )?;

  fetch_voter(tx, &new_id)?.ok_or_else(|| {
    TxError::Domain(CoreError::Storage("voter vanished during update".into()))
  })
}
