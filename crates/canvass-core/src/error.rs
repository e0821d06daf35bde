//! Error taxonomy for `canvass-core`.
//!
//! Every component surfaces these unmodified to the caller; the orchestrator
//! rolls back on the first failure. Duplicate and conflict conditions are
//! business outcomes, not transient faults — callers must not retry them.

use thiserror::Error;

use crate::entity::EntityKind;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid input: {0}")]
  Validation(String),

  #[error("leader not found: {0}")]
  LeaderNotFound(String),

  #[error("voter not found: {0}")]
  VoterNotFound(String),

  #[error("sponsor not found: {0}")]
  SponsorNotFound(String),

  #[error("voter {voter_id} is already assigned to leader {leader_id}")]
  AlreadyAssigned {
    voter_id:  String,
    leader_id: String,
  },

  #[error("voter {voter_id} is not assigned to leader {leader_id}")]
  NotAssigned {
    voter_id:  String,
    leader_id: String,
  },

  /// Identical resubmission: same leader, same reported identifier, same
  /// normalized content hash as an already-processed capture.
  #[error("exact duplicate capture of {reported_id} by leader {leader_id}")]
  ExactDuplicate {
    leader_id:   String,
    reported_id: String,
  },

  /// A create or rename collides with an existing identifier of the same
  /// entity kind.
  #[error("{} identifier already in use: {id}", kind.as_str())]
  IdentifierTaken { kind: EntityKind, id: String },

  #[error("cannot delete {} {id}: {detail}", kind.as_str())]
  Undeletable {
    kind:   EntityKind,
    id:     String,
    detail: String,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("storage error: {0}")]
  Storage(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
