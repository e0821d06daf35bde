//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Reported field sets are stored as discrete
//! columns in their normalized form. Action-log detail is compact JSON.

use canvass_core::{
  assignment::Assignment,
  audit::{ActionLogEntry, Archived},
  entity::{CanonicalVoter, EntityKind, Leader, Sponsor},
  incident::{Incident, IncidentKind},
  report::{Capture, CaptureStatus, ReportedFields},
  variant::Variant,
};
use chrono::{DateTime, Utc};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalar codecs ───────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

pub fn decode_status(s: &str) -> Result<CaptureStatus> {
  match s {
    "PROCESSED" => Ok(CaptureStatus::Processed),
    "REJECTED_DUPLICATE" => Ok(CaptureStatus::RejectedDuplicate),
    "ERROR" => Ok(CaptureStatus::Error),
    other => Err(Error::Decode(format!("unknown capture status: {other:?}"))),
  }
}

pub fn decode_incident_kind(s: &str) -> Result<IncidentKind> {
  match s {
    "EXACT_DUPLICATE" => Ok(IncidentKind::ExactDuplicate),
    "DUPLICATE_ACROSS_LEADERS" => Ok(IncidentKind::DuplicateAcrossLeaders),
    "DATA_CONFLICT" => Ok(IncidentKind::DataConflict),
    "MANUAL" => Ok(IncidentKind::Manual),
    other => Err(Error::Decode(format!("unknown incident kind: {other:?}"))),
  }
}

pub fn decode_entity_kind(s: &str) -> Result<EntityKind> {
  match s {
    "sponsor" => Ok(EntityKind::Sponsor),
    "leader" => Ok(EntityKind::Leader),
    "voter" => Ok(EntityKind::Voter),
    other => Err(Error::Decode(format!("unknown entity kind: {other:?}"))),
  }
}

// ─── Archive metadata ────────────────────────────────────────────────────────

/// The trailing (deleted_by, reason, deleted_at) columns of an archive row.
pub struct RawArchiveMeta {
  pub deleted_by: String,
  pub reason:     String,
  pub deleted_at: String,
}

impl RawArchiveMeta {
  pub fn wrap<T>(self, record: T) -> Result<Archived<T>> {
    Ok(Archived {
      record,
      deleted_by: self.deleted_by,
      reason: self.reason,
      deleted_at: decode_dt(&self.deleted_at)?,
    })
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read from a `sponsors` (or `archived_sponsors`) row.
pub struct RawSponsor {
  pub sponsor_id:  String,
  pub given_name:  String,
  pub family_name: String,
  pub phone:       String,
  pub email:       String,
  pub created_at:  String,
}

impl RawSponsor {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      sponsor_id:  row.get(0)?,
      given_name:  row.get(1)?,
      family_name: row.get(2)?,
      phone:       row.get(3)?,
      email:       row.get(4)?,
      created_at:  row.get(5)?,
    })
  }

  pub fn into_sponsor(self) -> Result<Sponsor> {
    Ok(Sponsor {
      sponsor_id:  self.sponsor_id,
      given_name:  self.given_name,
      family_name: self.family_name,
      phone:       self.phone,
      email:       self.email,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read from a `leaders` (or `archived_leaders`) row.
pub struct RawLeader {
  pub leader_id:     String,
  pub given_name:    String,
  pub family_name:   String,
  pub phone:         String,
  pub email:         String,
  pub sponsor_id:    Option<String>,
  pub objective:     Option<String>,
  pub duplicate_log: String,
  pub created_at:    String,
}

impl RawLeader {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      leader_id:     row.get(0)?,
      given_name:    row.get(1)?,
      family_name:   row.get(2)?,
      phone:         row.get(3)?,
      email:         row.get(4)?,
      sponsor_id:    row.get(5)?,
      objective:     row.get(6)?,
      duplicate_log: row.get(7)?,
      created_at:    row.get(8)?,
    })
  }

  pub fn into_leader(self) -> Result<Leader> {
    Ok(Leader {
      leader_id:     self.leader_id,
      given_name:    self.given_name,
      family_name:   self.family_name,
      phone:         self.phone,
      email:         self.email,
      sponsor_id:    self.sponsor_id,
      objective:     self.objective,
      duplicate_log: self.duplicate_log,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read from a `voters` (or `archived_voters`) row.
pub struct RawVoter {
  pub voter_id:     String,
  pub given_name:   String,
  pub family_name:  String,
  pub address:      String,
  pub phone:        String,
  pub email:        String,
  pub first_leader: Option<String>,
  pub created_at:   String,
}

impl RawVoter {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      voter_id:     row.get(0)?,
      given_name:   row.get(1)?,
      family_name:  row.get(2)?,
      address:      row.get(3)?,
      phone:        row.get(4)?,
      email:        row.get(5)?,
      first_leader: row.get(6)?,
      created_at:   row.get(7)?,
    })
  }

  pub fn into_voter(self) -> Result<CanonicalVoter> {
    Ok(CanonicalVoter {
      voter_id:     self.voter_id,
      given_name:   self.given_name,
      family_name:  self.family_name,
      address:      self.address,
      phone:        self.phone,
      email:        self.email,
      first_leader: self.first_leader,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

fn fields_from_columns(
  given_name: String,
  family_name: String,
  address: String,
  phone: String,
  email: String,
) -> ReportedFields {
  ReportedFields {
    given_name:  Some(given_name),
    family_name: Some(family_name),
    address:     Some(address),
    phone:       Some(phone),
    email:       Some(email),
  }
}

/// Raw strings read from a `captures` row.
pub struct RawCapture {
  pub capture_id:   String,
  pub leader_id:    String,
  pub reported_id:  String,
  pub given_name:   String,
  pub family_name:  String,
  pub address:      String,
  pub phone:        String,
  pub email:        String,
  pub content_hash: String,
  pub status:       String,
  pub canonical_id: Option<String>,
  pub actor:        String,
  pub recorded_at:  String,
}

impl RawCapture {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      capture_id:   row.get(0)?,
      leader_id:    row.get(1)?,
      reported_id:  row.get(2)?,
      given_name:   row.get(3)?,
      family_name:  row.get(4)?,
      address:      row.get(5)?,
      phone:        row.get(6)?,
      email:        row.get(7)?,
      content_hash: row.get(8)?,
      status:       row.get(9)?,
      canonical_id: row.get(10)?,
      actor:        row.get(11)?,
      recorded_at:  row.get(12)?,
    })
  }

  pub fn into_capture(self) -> Result<Capture> {
    Ok(Capture {
      capture_id:   decode_uuid(&self.capture_id)?,
      leader_id:    self.leader_id,
      reported_id:  self.reported_id,
      fields:       fields_from_columns(
        self.given_name,
        self.family_name,
        self.address,
        self.phone,
        self.email,
      ),
      content_hash: self.content_hash,
      status:       decode_status(&self.status)?,
      canonical_id: self.canonical_id,
      actor:        self.actor,
      recorded_at:  decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read from a `variants` row.
pub struct RawVariant {
  pub variant_id:   String,
  pub voter_id:     String,
  pub leader_id:    String,
  pub capture_id:   String,
  pub given_name:   String,
  pub family_name:  String,
  pub address:      String,
  pub phone:        String,
  pub email:        String,
  pub content_hash: String,
  pub is_current:   bool,
  pub recorded_at:  String,
}

impl RawVariant {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      variant_id:   row.get(0)?,
      voter_id:     row.get(1)?,
      leader_id:    row.get(2)?,
      capture_id:   row.get(3)?,
      given_name:   row.get(4)?,
      family_name:  row.get(5)?,
      address:      row.get(6)?,
      phone:        row.get(7)?,
      email:        row.get(8)?,
      content_hash: row.get(9)?,
      is_current:   row.get(10)?,
      recorded_at:  row.get(11)?,
    })
  }

  pub fn into_variant(self) -> Result<Variant> {
    Ok(Variant {
      variant_id:   decode_uuid(&self.variant_id)?,
      voter_id:     self.voter_id,
      leader_id:    self.leader_id,
      capture_id:   decode_uuid(&self.capture_id)?,
      fields:       fields_from_columns(
        self.given_name,
        self.family_name,
        self.address,
        self.phone,
        self.email,
      ),
      content_hash: self.content_hash,
      is_current:   self.is_current,
      recorded_at:  decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read from an `assignments` row.
pub struct RawAssignment {
  pub assignment_id: String,
  pub voter_id:      String,
  pub leader_id:     String,
  pub assigned_by:   String,
  pub created_at:    String,
}

impl RawAssignment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      assignment_id: row.get(0)?,
      voter_id:      row.get(1)?,
      leader_id:     row.get(2)?,
      assigned_by:   row.get(3)?,
      created_at:    row.get(4)?,
    })
  }

  pub fn into_assignment(self) -> Result<Assignment> {
    Ok(Assignment {
      assignment_id: decode_uuid(&self.assignment_id)?,
      voter_id:      self.voter_id,
      leader_id:     self.leader_id,
      assigned_by:   self.assigned_by,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read from an `incidents` row.
pub struct RawIncident {
  pub incident_id:     String,
  pub kind:            String,
  pub voter_id:        String,
  pub prior_leader_id: Option<String>,
  pub new_leader_id:   Option<String>,
  pub detail:          String,
  pub actor:           String,
  pub recorded_at:     String,
}

impl RawIncident {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      incident_id:     row.get(0)?,
      kind:            row.get(1)?,
      voter_id:        row.get(2)?,
      prior_leader_id: row.get(3)?,
      new_leader_id:   row.get(4)?,
      detail:          row.get(5)?,
      actor:           row.get(6)?,
      recorded_at:     row.get(7)?,
    })
  }

  pub fn into_incident(self) -> Result<Incident> {
    Ok(Incident {
      incident_id:     decode_uuid(&self.incident_id)?,
      kind:            decode_incident_kind(&self.kind)?,
      voter_id:        self.voter_id,
      prior_leader_id: self.prior_leader_id,
      new_leader_id:   self.new_leader_id,
      detail:          self.detail,
      actor:           self.actor,
      recorded_at:     decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read from an `action_log` row.
pub struct RawAction {
  pub action_id:   String,
  pub entity_kind: String,
  pub entity_id:   String,
  pub action:      String,
  pub actor:       String,
  pub detail:      String,
  pub recorded_at: String,
}

impl RawAction {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      action_id:   row.get(0)?,
      entity_kind: row.get(1)?,
      entity_id:   row.get(2)?,
      action:      row.get(3)?,
      actor:       row.get(4)?,
      detail:      row.get(5)?,
      recorded_at: row.get(6)?,
    })
  }

  pub fn into_entry(self) -> Result<ActionLogEntry> {
    Ok(ActionLogEntry {
      action_id:   decode_uuid(&self.action_id)?,
      entity_kind: decode_entity_kind(&self.entity_kind)?,
      entity_id:   self.entity_id,
      action:      self.action,
      actor:       self.actor,
      detail:      serde_json::from_str(&self.detail)?,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}
