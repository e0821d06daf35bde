//! Integration tests for `SqliteStore` against an in-memory database.

use canvass_core::{
  Error as CoreError,
  entity::{EntityKind, LeaderUpdate, NewLeader, NewSponsor, VoterUpdate},
  incident::IncidentKind,
  report::{CaptureStatus, FlatRecord, NewCapture, ReportedFields},
  store::{
    ActionQuery, CanvassStore, CaptureQuery, IncidentQuery, Reassignment,
    VariantQuery,
  },
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn add_leader(s: &SqliteStore, id: &str) {
  s.add_leader(
    NewLeader {
      leader_id:   id.into(),
      given_name:  "Lidia".into(),
      family_name: "Gomez".into(),
      phone:       "300".into(),
      email:       String::new(),
      sponsor_id:  None,
      objective:   None,
    },
    "test".into(),
  )
  .await
  .unwrap();
}

fn fields(given: &str, phone: &str) -> ReportedFields {
  ReportedFields {
    given_name:  Some(given.into()),
    family_name: Some("Perez".into()),
    address:     Some("Calle 1".into()),
    phone:       Some(phone.into()),
    email:       None,
  }
}

fn capture(leader: &str, reported: &str, f: ReportedFields) -> NewCapture {
  NewCapture {
    leader_id:   leader.into(),
    reported_id: reported.into(),
    fields:      f,
    actor:       "test".into(),
  }
}

// ─── Captures & reconciliation ───────────────────────────────────────────────

#[tokio::test]
async fn first_capture_creates_voter_and_assignment() {
  let s = store().await;
  add_leader(&s, "L1").await;

  let out = s
    .submit_capture(capture("L1", "V100", fields("Ana", "111")))
    .await
    .unwrap();

  assert_eq!(out.capture.status, CaptureStatus::Processed);
  assert!(out.created_voter);
  assert!(out.new_assignment);
  assert!(out.incidents.is_empty());
  assert_eq!(out.canonical_id, "V100");

  let voter = s.get_voter("V100").await.unwrap().unwrap();
  assert_eq!(voter.given_name, "ANA");
  assert_eq!(voter.first_leader.as_deref(), Some("L1"));

  let assignments = s.list_assignments(Some("V100"), None).await.unwrap();
  assert_eq!(assignments.len(), 1);
  assert_eq!(assignments[0].leader_id, "L1");
}

#[tokio::test]
async fn identical_resubmission_is_rejected_as_duplicate() {
  let s = store().await;
  add_leader(&s, "L1").await;

  s.submit_capture(capture("L1", "V100", fields("Ana", "111")))
    .await
    .unwrap();
  // Same data up to whitespace and case: hashes over normalized fields.
  let out = s
    .submit_capture(capture("L1", "V100", fields("  ana ", " 111 ")))
    .await
    .unwrap();

  assert_eq!(out.capture.status, CaptureStatus::RejectedDuplicate);
  assert!(!out.created_voter);
  assert!(!out.new_assignment);
  assert!(out.incidents.is_empty());

  // Only the first submission produced a variant.
  let variants = s
    .list_variants(&VariantQuery {
      voter: Some("V100".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(variants.len(), 1);

  let leader = s.get_leader("L1").await.unwrap().unwrap();
  assert!(leader.duplicate_log.contains("Exact duplicate"));

  // Both rows are retained: one PROCESSED, one REJECTED_DUPLICATE.
  let rejected = s
    .list_captures(&CaptureQuery {
      status: Some(CaptureStatus::RejectedDuplicate),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(rejected.len(), 1);
}

#[tokio::test]
async fn changed_data_from_same_leader_is_a_data_conflict() {
  let s = store().await;
  add_leader(&s, "L1").await;

  s.submit_capture(capture("L1", "V100", fields("Ana", "111")))
    .await
    .unwrap();
  let out = s
    .submit_capture(capture("L1", "V100", fields("Ana", "222")))
    .await
    .unwrap();

  assert_eq!(out.capture.status, CaptureStatus::Processed);
  assert_eq!(out.incidents.len(), 1);
  assert_eq!(out.incidents[0].kind, IncidentKind::DataConflict);
  assert_eq!(out.incidents[0].prior_leader_id.as_deref(), Some("L1"));
  assert_eq!(out.incidents[0].new_leader_id.as_deref(), Some("L1"));

  // Canonical record keeps the first-reported data.
  let voter = s.get_voter("V100").await.unwrap().unwrap();
  assert_eq!(voter.phone, "111");

  // Variant history: two rows, exactly one current, and it is the newest.
  let all = s
    .list_variants(&VariantQuery {
      voter: Some("V100".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(all.len(), 2);
  let current = s
    .list_variants(&VariantQuery {
      voter: Some("V100".into()),
      only_current: true,
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(current.len(), 1);
  assert_eq!(current[0].fields.phone.as_deref(), Some("222"));
}

#[tokio::test]
async fn second_leader_triggers_cross_leader_duplicate() {
  let s = store().await;
  add_leader(&s, "L1").await;
  add_leader(&s, "L2").await;

  s.submit_capture(capture("L1", "V100", fields("Ana", "111")))
    .await
    .unwrap();
  let out = s
    .submit_capture(capture("L2", "V100", fields("Ana", "111")))
    .await
    .unwrap();

  assert_eq!(out.capture.status, CaptureStatus::Processed);
  assert!(!out.created_voter);
  assert!(out.new_assignment);
  assert_eq!(out.incidents.len(), 1);
  assert_eq!(out.incidents[0].kind, IncidentKind::DuplicateAcrossLeaders);
  assert_eq!(out.incidents[0].prior_leader_id.as_deref(), Some("L1"));
  assert_eq!(out.incidents[0].new_leader_id.as_deref(), Some("L2"));

  // Both assignments coexist; first_leader stays with the first reporter.
  let assignments = s.list_assignments(Some("V100"), None).await.unwrap();
  assert_eq!(assignments.len(), 2);
  let voter = s.get_voter("V100").await.unwrap().unwrap();
  assert_eq!(voter.first_leader.as_deref(), Some("L1"));

  let leader = s.get_leader("L2").await.unwrap().unwrap();
  assert!(leader.duplicate_log.contains("V100"));
}

#[tokio::test]
async fn capture_for_unknown_leader_leaves_no_row() {
  let s = store().await;

  let err = s
    .submit_capture(capture("NOPE", "V100", fields("Ana", "111")))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::LeaderNotFound(_))));

  let all = s.list_captures(&CaptureQuery::default()).await.unwrap();
  assert!(all.is_empty());
  assert!(s.get_voter("V100").await.unwrap().is_none());
}

#[tokio::test]
async fn capture_without_reported_id_fails_validation() {
  let s = store().await;
  add_leader(&s, "L1").await;

  let err = s
    .submit_capture(capture("L1", "   ", fields("Ana", "111")))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::Validation(_))));

  let all = s.list_captures(&CaptureQuery::default()).await.unwrap();
  assert!(all.is_empty());
}

/// The full worked scenario: first sighting, identical resubmission,
/// corrected resubmission, then a second leader reporting the same voter.
#[tokio::test]
async fn capture_lifecycle_scenario() {
  let s = store().await;
  add_leader(&s, "L1").await;
  add_leader(&s, "L2").await;

  let step1 = s
    .submit_capture(capture("L1", "V100", fields("Ana", "111")))
    .await
    .unwrap();
  assert!(step1.created_voter);
  assert!(step1.incidents.is_empty());

  let step2 = s
    .submit_capture(capture("L1", "V100", fields("Ana", "111")))
    .await
    .unwrap();
  assert_eq!(step2.capture.status, CaptureStatus::RejectedDuplicate);

  let step3 = s
    .submit_capture(capture("L1", "V100", fields("Ana Maria", "111")))
    .await
    .unwrap();
  assert_eq!(step3.incidents[0].kind, IncidentKind::DataConflict);

  let step4 = s
    .submit_capture(capture("L2", "V100", fields("Ana", "111")))
    .await
    .unwrap();
  assert_eq!(
    step4.incidents[0].kind,
    IncidentKind::DuplicateAcrossLeaders
  );

  let voter = s.get_voter("V100").await.unwrap().unwrap();
  assert_eq!(voter.first_leader.as_deref(), Some("L1"));
  assert_eq!(voter.given_name, "ANA");

  let incidents = s.list_incidents(&IncidentQuery::default()).await.unwrap();
  assert_eq!(incidents.len(), 2);
}

// ─── Batch ingestion ─────────────────────────────────────────────────────────

#[tokio::test]
async fn batch_logs_errors_and_continues() {
  let s = store().await;
  add_leader(&s, "L1").await;

  let records = vec![
    FlatRecord {
      leader_id:   "L1".into(),
      reported_id: "V1".into(),
      fields:      fields("Ana", "111"),
    },
    // Unknown leader: logged as ERROR, does not abort the batch.
    FlatRecord {
      leader_id:   "NOPE".into(),
      reported_id: "V2".into(),
      fields:      fields("Berta", "222"),
    },
    // Identical to the first record: rejected as exact duplicate.
    FlatRecord {
      leader_id:   "L1".into(),
      reported_id: "V1".into(),
      fields:      fields("Ana", "111"),
    },
    FlatRecord {
      leader_id:   "L1".into(),
      reported_id: "V3".into(),
      fields:      fields("Clara", "333"),
    },
  ];

  let summary = s.ingest_batch(records, "importer".into()).await.unwrap();
  assert_eq!(summary.processed, 2);
  assert_eq!(summary.duplicates.len(), 1);
  assert_eq!(summary.errors.len(), 1);
  assert_eq!(summary.errors[0].capture.status, CaptureStatus::Error);

  // The bad record landed as an ERROR row, visible in the capture log.
  let errors = s
    .list_captures(&CaptureQuery {
      status: Some(CaptureStatus::Error),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(errors.len(), 1);
  assert_eq!(errors[0].leader_id, "NOPE");

  // The records after the bad one still landed.
  assert!(s.get_voter("V3").await.unwrap().is_some());
}

// ─── Assignments ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn assign_twice_fails() {
  let s = store().await;
  add_leader(&s, "L1").await;
  s.submit_capture(capture("L1", "V100", fields("Ana", "111")))
    .await
    .unwrap();

  let err = s
    .assign("V100", "L1", "test".into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::AlreadyAssigned { .. })));
}

#[tokio::test]
async fn unassign_keeps_first_leader() {
  let s = store().await;
  add_leader(&s, "L1").await;
  s.submit_capture(capture("L1", "V100", fields("Ana", "111")))
    .await
    .unwrap();

  s.unassign("V100", "L1", "test".into()).await.unwrap();
  assert!(
    s.list_assignments(Some("V100"), None)
      .await
      .unwrap()
      .is_empty()
  );

  // The historical fact survives the unassignment.
  let voter = s.get_voter("V100").await.unwrap().unwrap();
  assert_eq!(voter.first_leader.as_deref(), Some("L1"));

  let err = s
    .unassign("V100", "L1", "test".into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::NotAssigned { .. })));
}

#[tokio::test]
async fn first_leader_survives_unassign_then_assign_elsewhere() {
  let s = store().await;
  add_leader(&s, "L1").await;
  add_leader(&s, "L2").await;
  s.submit_capture(capture("L1", "V100", fields("Ana", "111")))
    .await
    .unwrap();

  s.unassign("V100", "L1", "test".into()).await.unwrap();
  s.assign("V100", "L2", "test".into()).await.unwrap();

  let pairs = s.list_assignments(Some("V100"), None).await.unwrap();
  assert_eq!(pairs.len(), 1);
  assert_eq!(pairs[0].leader_id, "L2");

  // first_leader records the original leader even after the voter moves.
  let voter = s.get_voter("V100").await.unwrap().unwrap();
  assert_eq!(voter.first_leader.as_deref(), Some("L1"));
}

#[tokio::test]
async fn reassign_moves_assignment_and_logs_manual_incident() {
  let s = store().await;
  add_leader(&s, "L1").await;
  add_leader(&s, "L2").await;
  s.submit_capture(capture("L1", "V100", fields("Ana", "111")))
    .await
    .unwrap();

  let incident = s
    .reassign(Reassignment {
      voter_id:      "V100".into(),
      old_leader_id: "L1".into(),
      new_leader_id: "L2".into(),
      actor:         "reviewer".into(),
    })
    .await
    .unwrap();
  assert_eq!(incident.kind, IncidentKind::Manual);

  let assignments = s.list_assignments(Some("V100"), None).await.unwrap();
  assert_eq!(assignments.len(), 1);
  assert_eq!(assignments[0].leader_id, "L2");

  let voter = s.get_voter("V100").await.unwrap().unwrap();
  assert_eq!(voter.first_leader.as_deref(), Some("L1"));

  let old = s.get_leader("L1").await.unwrap().unwrap();
  assert!(old.duplicate_log.contains("moved voter V100"));
}

#[tokio::test]
async fn reassign_to_same_leader_keeps_assignment() {
  let s = store().await;
  add_leader(&s, "L1").await;
  s.submit_capture(capture("L1", "V100", fields("Ana", "111")))
    .await
    .unwrap();

  let incident = s
    .reassign(Reassignment {
      voter_id:      "V100".into(),
      old_leader_id: "L1".into(),
      new_leader_id: "L1".into(),
      actor:         "reviewer".into(),
    })
    .await
    .unwrap();
  assert_eq!(incident.kind, IncidentKind::Manual);
  assert!(incident.detail.contains("kept leader L1"));

  let assignments = s.list_assignments(Some("V100"), None).await.unwrap();
  assert_eq!(assignments.len(), 1);
  assert_eq!(assignments[0].leader_id, "L1");
}

// ─── Catalog renames ─────────────────────────────────────────────────────────

#[tokio::test]
async fn leader_rename_cascades_everywhere() {
  let s = store().await;
  add_leader(&s, "L1").await;
  s.submit_capture(capture("L1", "V100", fields("Ana", "111")))
    .await
    .unwrap();

  s.update_leader(
    "L1",
    LeaderUpdate {
      new_id:      Some("L9".into()),
      given_name:  "Lidia".into(),
      family_name: "Gomez".into(),
      phone:       "300".into(),
      email:       String::new(),
      sponsor_id:  None,
      objective:   None,
    },
    "admin".into(),
  )
  .await
  .unwrap();

  assert!(s.get_leader("L1").await.unwrap().is_none());
  assert!(s.get_leader("L9").await.unwrap().is_some());

  let assignments = s.list_assignments(Some("V100"), None).await.unwrap();
  assert_eq!(assignments[0].leader_id, "L9");
  let variants = s
    .list_variants(&VariantQuery {
      voter: Some("V100".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(variants[0].leader_id, "L9");
  // The only sanctioned way first_leader ever changes.
  let voter = s.get_voter("V100").await.unwrap().unwrap();
  assert_eq!(voter.first_leader.as_deref(), Some("L9"));
}

#[tokio::test]
async fn rename_to_taken_identifier_fails() {
  let s = store().await;
  add_leader(&s, "L1").await;
  add_leader(&s, "L2").await;

  let err = s
    .update_leader(
      "L1",
      LeaderUpdate {
        new_id:      Some("L2".into()),
        given_name:  String::new(),
        family_name: String::new(),
        phone:       String::new(),
        email:       String::new(),
        sponsor_id:  None,
        objective:   None,
      },
      "admin".into(),
    )
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::IdentifierTaken {
      kind: EntityKind::Leader,
      ..
    })
  ));
}

#[tokio::test]
async fn voter_rename_cascades_into_history() {
  let s = store().await;
  add_leader(&s, "L1").await;
  s.submit_capture(capture("L1", "V100", fields("Ana", "111")))
    .await
    .unwrap();

  let updated = s
    .update_voter(
      "V100",
      VoterUpdate {
        new_id:      Some("V200".into()),
        given_name:  "Ana".into(),
        family_name: "Perez".into(),
        address:     "Calle 2".into(),
        phone:       "111".into(),
        email:       String::new(),
      },
      "admin".into(),
    )
    .await
    .unwrap();
  assert_eq!(updated.voter_id, "V200");
  assert_eq!(updated.address, "CALLE 2");

  assert!(s.get_voter("V100").await.unwrap().is_none());
  let assignments = s.list_assignments(Some("V200"), None).await.unwrap();
  assert_eq!(assignments.len(), 1);
  let variants = s
    .list_variants(&VariantQuery {
      voter: Some("V200".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(variants.len(), 1);
}

// ─── Soft deletion ───────────────────────────────────────────────────────────

#[tokio::test]
async fn deleted_leader_is_archived_with_history_intact() {
  let s = store().await;
  add_leader(&s, "L1").await;
  s.submit_capture(capture("L1", "V100", fields("Ana", "111")))
    .await
    .unwrap();

  let archived = s
    .delete_leader("L1", "admin".into(), "left the campaign".into())
    .await
    .unwrap();
  assert_eq!(archived.record.leader_id, "L1");
  assert_eq!(archived.reason, "left the campaign");

  assert!(s.get_leader("L1").await.unwrap().is_none());
  let graveyard = s.list_archived_leaders().await.unwrap();
  assert_eq!(graveyard.len(), 1);

  // Assignments and variants stay behind as history.
  let assignments = s.list_assignments(None, Some("L1")).await.unwrap();
  assert_eq!(assignments.len(), 1);
  let variants = s
    .list_variants(&VariantQuery {
      leader: Some("L1".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(variants.len(), 1);
}

#[tokio::test]
async fn sponsor_with_leaders_is_undeletable() {
  let s = store().await;
  s.add_sponsor(
    NewSponsor {
      sponsor_id:  "S1".into(),
      given_name:  "Sofia".into(),
      family_name: "Rojas".into(),
      phone:       String::new(),
      email:       String::new(),
    },
    "admin".into(),
  )
  .await
  .unwrap();
  s.add_leader(
    NewLeader {
      leader_id:   "L1".into(),
      given_name:  "Lidia".into(),
      family_name: "Gomez".into(),
      phone:       String::new(),
      email:       String::new(),
      sponsor_id:  Some("S1".into()),
      objective:   None,
    },
    "admin".into(),
  )
  .await
  .unwrap();

  let err = s
    .delete_sponsor("S1", "admin".into(), "cleanup".into())
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::Undeletable {
      kind: EntityKind::Sponsor,
      ..
    })
  ));

  // After its leader goes, the sponsor can go too.
  s.delete_leader("L1", "admin".into(), "cleanup".into())
    .await
    .unwrap();
  s.delete_sponsor("S1", "admin".into(), "cleanup".into())
    .await
    .unwrap();
  assert_eq!(s.list_archived_sponsors().await.unwrap().len(), 1);
}

#[tokio::test]
async fn bulk_delete_rolls_back_on_unknown_id() {
  let s = store().await;
  add_leader(&s, "L1").await;
  s.submit_capture(capture("L1", "V1", fields("Ana", "111")))
    .await
    .unwrap();
  s.submit_capture(capture("L1", "V2", fields("Berta", "222")))
    .await
    .unwrap();

  let err = s
    .delete_voters(
      vec!["V1".into(), "MISSING".into(), "V2".into()],
      "admin".into(),
      "purge".into(),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::VoterNotFound(_))));

  // Nothing was deleted, nothing was archived.
  assert!(s.get_voter("V1").await.unwrap().is_some());
  assert!(s.get_voter("V2").await.unwrap().is_some());
  assert!(s.list_archived_voters().await.unwrap().is_empty());

  let archived = s
    .delete_voters(vec!["V1".into(), "V2".into()], "admin".into(), "purge".into())
    .await
    .unwrap();
  assert_eq!(archived.len(), 2);
  assert!(s.get_voter("V1").await.unwrap().is_none());
}

// ─── Metrics & audit ─────────────────────────────────────────────────────────

#[tokio::test]
async fn variant_metrics_counts_resubmissions_and_clusters() {
  let s = store().await;
  add_leader(&s, "L1").await;
  add_leader(&s, "L2").await;

  s.submit_capture(capture("L1", "V1", fields("Ana", "111")))
    .await
    .unwrap();
  s.submit_capture(capture("L1", "V1", fields("Ana", "222")))
    .await
    .unwrap();
  s.submit_capture(capture("L1", "V2", fields("Berta", "333")))
    .await
    .unwrap();
  s.submit_capture(capture("L2", "V1", fields("Ana", "111")))
    .await
    .unwrap();

  let metrics = s.variant_metrics(None).await.unwrap();
  let l1 = metrics
    .per_leader
    .iter()
    .find(|m| m.leader_id == "L1")
    .unwrap();
  assert_eq!(l1.unique_voters, 2);
  assert_eq!(l1.total_variants, 3);
  assert!((l1.resubmission_rate - 1.5).abs() < f64::EPSILON);

  assert_eq!(metrics.clusters.len(), 1);
  assert_eq!(metrics.clusters[0].voter_id, "V1");
  assert_eq!(metrics.clusters[0].leaders, vec!["L1", "L2"]);

  let only_l2 = s.variant_metrics(Some("L2")).await.unwrap();
  assert_eq!(only_l2.per_leader.len(), 1);
  assert_eq!(only_l2.per_leader[0].leader_id, "L2");
}

#[tokio::test]
async fn every_mutation_lands_in_the_action_log() {
  let s = store().await;
  add_leader(&s, "L1").await;
  s.submit_capture(capture("L1", "V100", fields("Ana", "111")))
    .await
    .unwrap();
  s.delete_voter("V100", "admin".into(), "test".into())
    .await
    .unwrap();

  let actions = s
    .list_actions(&ActionQuery {
      entity_id: Some("V100".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  let names: Vec<&str> = actions.iter().map(|a| a.action.as_str()).collect();
  assert!(names.contains(&"CAPTURE"));
  assert!(names.contains(&"DELETE"));

  let leader_actions = s
    .list_actions(&ActionQuery {
      entity_kind: Some(EntityKind::Leader),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(leader_actions.len(), 1);
  assert_eq!(leader_actions[0].action, "CREATE");
}
