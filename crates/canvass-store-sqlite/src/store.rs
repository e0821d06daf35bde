//! [`SqliteStore`] — the SQLite implementation of [`CanvassStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, params_from_iter, types::Value};

use canvass_core::{
  Error as CoreError,
  assignment::Assignment,
  audit::{ActionLogEntry, Archived},
  entity::{
    CanonicalVoter, Leader, LeaderUpdate, NewLeader, NewSponsor, Sponsor,
    SponsorUpdate, VoterUpdate,
  },
  incident::Incident,
  report::{
    BatchError, BatchSummary, Capture, CaptureOutcome, CaptureStatus,
    FlatRecord, NewCapture,
  },
  store::{
    ActionQuery, CanvassStore, CaptureQuery, DuplicateCluster, IncidentQuery,
    LeaderVariantStats, Reassignment, VariantMetrics, VariantQuery,
  },
  variant::Variant,
};

use crate::{
  Error, Result,
  archive::{
    delete_leader_op, delete_sponsor_op, delete_voter_op, delete_voters_op,
  },
  cascade::{
    add_leader_op, add_sponsor_op, update_leader_op, update_sponsor_op,
    update_voter_op,
  },
  encode::{
    RawAction, RawArchiveMeta, RawAssignment, RawCapture, RawIncident,
    RawLeader, RawSponsor, RawVariant, RawVoter, encode_dt,
  },
  recon::{
    TxError, TxResult, assign_op, fetch_leader, fetch_sponsor, fetch_voter,
    reassign_op, record_error_capture, run_capture, unassign_op,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A canvass store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All
/// multi-step operations run on one transaction via [`Self::with_tx`].
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `op` inside a transaction. Commits on success; a domain failure or
  /// database error leaves the transaction uncommitted, which rolls it back.
  async fn with_tx<T, F>(&self, op: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Transaction<'_>) -> TxResult<T> + Send + 'static,
  {
    let out = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        match op(&tx) {
          Ok(value) => {
            tx.commit()?;
            Ok(Ok(value))
          }
          Err(TxError::Domain(e)) => Ok(Err(e)),
          Err(TxError::Db(e)) => Err(e.into()),
        }
      })
      .await?;
    out.map_err(Error::Core)
  }
}

// ─── Query plumbing ──────────────────────────────────────────────────────────

/// Append `LIMIT` / `OFFSET` clauses. Both are plain unsigned integers, so
/// they go straight into the SQL text rather than through a binding.
fn push_page(sql: &mut String, limit: Option<usize>, offset: Option<usize>) {
  match (limit, offset) {
    (Some(l), _) => sql.push_str(&format!(" LIMIT {l}")),
    (None, Some(_)) => sql.push_str(" LIMIT -1"),
    (None, None) => {}
  }
  if let Some(o) = offset {
    sql.push_str(&format!(" OFFSET {o}"));
  }
}

fn push_conds(sql: &mut String, conds: &[&str]) {
  if !conds.is_empty() {
    sql.push_str(" WHERE ");
    sql.push_str(&conds.join(" AND "));
  }
}

// ─── CanvassStore impl ───────────────────────────────────────────────────────

impl CanvassStore for SqliteStore {
  type Error = Error;

  // ── Sponsors ──────────────────────────────────────────────────────────────

  async fn add_sponsor(
    &self,
    input: NewSponsor,
    actor: String,
  ) -> Result<Sponsor> {
    let now = Utc::now();
    self
      .with_tx(move |tx| add_sponsor_op(tx, &input, &actor, now))
      .await
  }

  async fn get_sponsor(&self, id: &str) -> Result<Option<Sponsor>> {
    let id = id.to_owned();
    self.with_tx(move |tx| fetch_sponsor(tx, &id)).await
  }

  async fn list_sponsors(&self) -> Result<Vec<Sponsor>> {
    let raws: Vec<RawSponsor> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT sponsor_id, given_name, family_name, phone, email,
                  created_at
           FROM sponsors ORDER BY sponsor_id",
        )?;
        let rows = stmt
          .query_map([], RawSponsor::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawSponsor::into_sponsor).collect()
  }

  async fn update_sponsor(
    &self,
    id: &str,
    update: SponsorUpdate,
    actor: String,
  ) -> Result<Sponsor> {
    let id = id.to_owned();
    let now = Utc::now();
    self
      .with_tx(move |tx| update_sponsor_op(tx, &id, &update, &actor, now))
      .await
  }

  async fn delete_sponsor(
    &self,
    id: &str,
    actor: String,
    reason: String,
  ) -> Result<Archived<Sponsor>> {
    let id = id.to_owned();
    let now = Utc::now();
    self
      .with_tx(move |tx| delete_sponsor_op(tx, &id, &actor, &reason, now))
      .await
  }

  async fn list_archived_sponsors(&self) -> Result<Vec<Archived<Sponsor>>> {
    let rows: Vec<(RawSponsor, RawArchiveMeta)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT sponsor_id, given_name, family_name, phone, email,
                  created_at, deleted_by, reason, deleted_at
           FROM archived_sponsors ORDER BY deleted_at DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok((RawSponsor::from_row(row)?, RawArchiveMeta {
              deleted_by: row.get(6)?,
              reason:     row.get(7)?,
              deleted_at: row.get(8)?,
            }))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    rows
      .into_iter()
      .map(|(raw, meta)| meta.wrap(raw.into_sponsor()?))
      .collect()
  }

  // ── Leaders ───────────────────────────────────────────────────────────────

  async fn add_leader(
    &self,
    input: NewLeader,
    actor: String,
  ) -> Result<Leader> {
    let now = Utc::now();
    self
      .with_tx(move |tx| add_leader_op(tx, &input, &actor, now))
      .await
  }

  async fn get_leader(&self, id: &str) -> Result<Option<Leader>> {
    let id = id.to_owned();
    self.with_tx(move |tx| fetch_leader(tx, &id)).await
  }

  async fn list_leaders(&self) -> Result<Vec<Leader>> {
    let raws: Vec<RawLeader> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT leader_id, given_name, family_name, phone, email,
                  sponsor_id, objective, duplicate_log, created_at
           FROM leaders ORDER BY leader_id",
        )?;
        let rows = stmt
          .query_map([], RawLeader::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawLeader::into_leader).collect()
  }

  async fn update_leader(
    &self,
    id: &str,
    update: LeaderUpdate,
    actor: String,
  ) -> Result<Leader> {
    let id = id.to_owned();
    let now = Utc::now();
    self
      .with_tx(move |tx| update_leader_op(tx, &id, &update, &actor, now))
      .await
  }

  async fn delete_leader(
    &self,
    id: &str,
    actor: String,
    reason: String,
  ) -> Result<Archived<Leader>> {
    let id = id.to_owned();
    let now = Utc::now();
    self
      .with_tx(move |tx| delete_leader_op(tx, &id, &actor, &reason, now))
      .await
  }

  async fn list_archived_leaders(&self) -> Result<Vec<Archived<Leader>>> {
    let rows: Vec<(RawLeader, RawArchiveMeta)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT leader_id, given_name, family_name, phone, email,
                  sponsor_id, objective, duplicate_log, created_at,
                  deleted_by, reason, deleted_at
           FROM archived_leaders ORDER BY deleted_at DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok((RawLeader::from_row(row)?, RawArchiveMeta {
              deleted_by: row.get(9)?,
              reason:     row.get(10)?,
              deleted_at: row.get(11)?,
            }))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    rows
      .into_iter()
      .map(|(raw, meta)| meta.wrap(raw.into_leader()?))
      .collect()
  }

  // ── Canonical voters ──────────────────────────────────────────────────────

  async fn get_voter(&self, id: &str) -> Result<Option<CanonicalVoter>> {
    let id = id.to_owned();
    self.with_tx(move |tx| fetch_voter(tx, &id)).await
  }

  async fn list_voters(
    &self,
    leader: Option<&str>,
  ) -> Result<Vec<CanonicalVoter>> {
    let leader = leader.map(str::to_owned);
    let raws: Vec<RawVoter> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(leader_id) = leader {
          let mut stmt = conn.prepare(
            "SELECT v.voter_id, v.given_name, v.family_name, v.address,
                    v.phone, v.email, v.first_leader, v.created_at
             FROM voters v
             JOIN assignments a ON a.voter_id = v.voter_id
             WHERE a.leader_id = ?1
             ORDER BY v.voter_id",
          )?;
          stmt
            .query_map(params![leader_id], RawVoter::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(
            "SELECT voter_id, given_name, family_name, address, phone,
                    email, first_leader, created_at
             FROM voters ORDER BY voter_id",
          )?;
          stmt
            .query_map([], RawVoter::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawVoter::into_voter).collect()
  }

  async fn update_voter(
    &self,
    id: &str,
    update: VoterUpdate,
    actor: String,
  ) -> Result<CanonicalVoter> {
    let id = id.to_owned();
    let now = Utc::now();
    self
      .with_tx(move |tx| update_voter_op(tx, &id, &update, &actor, now))
      .await
  }

  async fn delete_voter(
    &self,
    id: &str,
    actor: String,
    reason: String,
  ) -> Result<Archived<CanonicalVoter>> {
    let id = id.to_owned();
    let now = Utc::now();
    self
      .with_tx(move |tx| delete_voter_op(tx, &id, &actor, &reason, now))
      .await
  }

  async fn delete_voters(
    &self,
    ids: Vec<String>,
    actor: String,
    reason: String,
  ) -> Result<Vec<Archived<CanonicalVoter>>> {
    let now = Utc::now();
    self
      .with_tx(move |tx| delete_voters_op(tx, &ids, &actor, &reason, now))
      .await
  }

  async fn list_archived_voters(
    &self,
  ) -> Result<Vec<Archived<CanonicalVoter>>> {
    let rows: Vec<(RawVoter, RawArchiveMeta)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT voter_id, given_name, family_name, address, phone, email,
                  first_leader, created_at, deleted_by, reason, deleted_at
           FROM archived_voters ORDER BY deleted_at DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok((RawVoter::from_row(row)?, RawArchiveMeta {
              deleted_by: row.get(8)?,
              reason:     row.get(9)?,
              deleted_at: row.get(10)?,
            }))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    rows
      .into_iter()
      .map(|(raw, meta)| meta.wrap(raw.into_voter()?))
      .collect()
  }

  // ── Captures ──────────────────────────────────────────────────────────────

  async fn submit_capture(&self, input: NewCapture) -> Result<CaptureOutcome> {
    let now = Utc::now();
    self.with_tx(move |tx| run_capture(tx, &input, now)).await
  }

  async fn ingest_batch(
    &self,
    records: Vec<FlatRecord>,
    actor: String,
  ) -> Result<BatchSummary> {
    let mut summary = BatchSummary {
      processed:  0,
      duplicates: Vec::new(),
      errors:     Vec::new(),
      incidents:  Vec::new(),
    };

    // One transaction per record: a bad record is logged and skipped, the
    // rest of the batch still lands.
    for record in records {
      let input = NewCapture {
        leader_id:   record.leader_id,
        reported_id: record.reported_id,
        fields:      record.fields,
        actor:       actor.clone(),
      };
      let attempt = self
        .with_tx({
          let input = input.clone();
          move |tx| run_capture(tx, &input, Utc::now())
        })
        .await;

      match attempt {
        Ok(outcome) => {
          if outcome.capture.status == CaptureStatus::RejectedDuplicate {
            summary.duplicates.push(outcome.capture);
          } else {
            summary.processed += 1;
            summary.incidents.extend(outcome.incidents);
          }
        }
        Err(Error::Core(
          domain @ (CoreError::Validation(_) | CoreError::LeaderNotFound(_)),
        )) => {
          let detail = domain.to_string();
          let capture = self
            .with_tx(move |tx| record_error_capture(tx, &input, Utc::now()))
            .await?;
          summary.errors.push(BatchError { capture, detail });
        }
        Err(other) => return Err(other),
      }
    }

    Ok(summary)
  }

  async fn list_captures(&self, query: &CaptureQuery) -> Result<Vec<Capture>> {
    let q = query.clone();
    let raws: Vec<RawCapture> = self
      .conn
      .call(move |conn| {
        let mut sql = String::from(
          "SELECT capture_id, leader_id, reported_id, given_name,
                  family_name, address, phone, email, content_hash, status,
                  canonical_id, actor, recorded_at
           FROM captures",
        );
        let mut conds: Vec<&str> = Vec::new();
        let mut args: Vec<Value> = Vec::new();
        if let Some(status) = q.status {
          conds.push("status = ?");
          args.push(Value::Text(status.as_str().to_owned()));
        }
        if let Some(leader) = q.leader {
          conds.push("leader_id = ?");
          args.push(Value::Text(leader));
        }
        if let Some(voter) = q.voter {
          conds.push("reported_id = ?");
          args.push(Value::Text(voter));
        }
        if let Some(from) = q.from {
          conds.push("recorded_at >= ?");
          args.push(Value::Text(encode_dt(from)));
        }
        if let Some(to) = q.to {
          conds.push("recorded_at <= ?");
          args.push(Value::Text(encode_dt(to)));
        }
        push_conds(&mut sql, &conds);
        sql.push_str(" ORDER BY recorded_at DESC, capture_id");
        push_page(&mut sql, q.limit, q.offset);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(args), RawCapture::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawCapture::into_capture).collect()
  }

  // ── Variants ──────────────────────────────────────────────────────────────

  async fn list_variants(&self, query: &VariantQuery) -> Result<Vec<Variant>> {
    let q = query.clone();
    let raws: Vec<RawVariant> = self
      .conn
      .call(move |conn| {
        let mut sql = String::from(
          "SELECT variant_id, voter_id, leader_id, capture_id, given_name,
                  family_name, address, phone, email, content_hash,
                  is_current, recorded_at
           FROM variants",
        );
        let mut conds: Vec<&str> = Vec::new();
        let mut args: Vec<Value> = Vec::new();
        if let Some(voter) = q.voter {
          conds.push("voter_id = ?");
          args.push(Value::Text(voter));
        }
        if let Some(leader) = q.leader {
          conds.push("leader_id = ?");
          args.push(Value::Text(leader));
        }
        if q.only_current {
          conds.push("is_current = 1");
        }
        push_conds(&mut sql, &conds);
        sql.push_str(" ORDER BY recorded_at, variant_id");
        push_page(&mut sql, q.limit, q.offset);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(args), RawVariant::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawVariant::into_variant).collect()
  }

  async fn variant_metrics(
    &self,
    leader: Option<&str>,
  ) -> Result<VariantMetrics> {
    let leader = leader.map(str::to_owned);
    let (per_leader, raw_clusters): (
      Vec<LeaderVariantStats>,
      Vec<(String, String)>,
    ) = self
      .conn
      .call(move |conn| {
        let mut sql = String::from(
          "SELECT leader_id, COUNT(DISTINCT voter_id), COUNT(*)
           FROM variants",
        );
        let mut args: Vec<Value> = Vec::new();
        if let Some(leader_id) = &leader {
          sql.push_str(" WHERE leader_id = ?");
          args.push(Value::Text(leader_id.clone()));
        }
        sql.push_str(" GROUP BY leader_id ORDER BY leader_id");

        let mut stmt = conn.prepare(&sql)?;
        let per_leader = stmt
          .query_map(params_from_iter(args), |row| {
            let leader_id: String = row.get(0)?;
            let unique_voters: u64 = row.get(1)?;
            let total_variants: u64 = row.get(2)?;
            Ok(LeaderVariantStats {
              leader_id,
              unique_voters,
              total_variants,
              resubmission_rate: total_variants as f64
                / unique_voters.max(1) as f64,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT voter_id, GROUP_CONCAT(DISTINCT leader_id)
           FROM assignments
           GROUP BY voter_id
           HAVING COUNT(DISTINCT leader_id) > 1
           ORDER BY voter_id",
        )?;
        let clusters = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<(String, String)>>>()?;

        Ok((per_leader, clusters))
      })
      .await?;

    let clusters = raw_clusters
      .into_iter()
      .map(|(voter_id, joined)| {
        let mut leaders: Vec<String> =
          joined.split(',').map(str::to_owned).collect();
        leaders.sort();
        DuplicateCluster { voter_id, leaders }
      })
      .collect();

    Ok(VariantMetrics { per_leader, clusters })
  }

  // ── Assignments ───────────────────────────────────────────────────────────

  async fn assign(
    &self,
    voter_id: &str,
    leader_id: &str,
    actor: String,
  ) -> Result<Assignment> {
    let voter_id = voter_id.to_owned();
    let leader_id = leader_id.to_owned();
    let now = Utc::now();
    self
      .with_tx(move |tx| assign_op(tx, &voter_id, &leader_id, &actor, now))
      .await
  }

  async fn unassign(
    &self,
    voter_id: &str,
    leader_id: &str,
    actor: String,
  ) -> Result<()> {
    let voter_id = voter_id.to_owned();
    let leader_id = leader_id.to_owned();
    let now = Utc::now();
    self
      .with_tx(move |tx| unassign_op(tx, &voter_id, &leader_id, &actor, now))
      .await
  }

  async fn reassign(&self, input: Reassignment) -> Result<Incident> {
    let now = Utc::now();
    self.with_tx(move |tx| reassign_op(tx, &input, now)).await
  }

  async fn list_assignments(
    &self,
    voter: Option<&str>,
    leader: Option<&str>,
  ) -> Result<Vec<Assignment>> {
    let voter = voter.map(str::to_owned);
    let leader = leader.map(str::to_owned);
    let raws: Vec<RawAssignment> = self
      .conn
      .call(move |conn| {
        let mut sql = String::from(
          "SELECT assignment_id, voter_id, leader_id, assigned_by,
                  created_at
           FROM assignments",
        );
        let mut conds: Vec<&str> = Vec::new();
        let mut args: Vec<Value> = Vec::new();
        if let Some(voter_id) = voter {
          conds.push("voter_id = ?");
          args.push(Value::Text(voter_id));
        }
        if let Some(leader_id) = leader {
          conds.push("leader_id = ?");
          args.push(Value::Text(leader_id));
        }
        push_conds(&mut sql, &conds);
        sql.push_str(" ORDER BY created_at, assignment_id");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(args), RawAssignment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws
      .into_iter()
      .map(RawAssignment::into_assignment)
      .collect()
  }

  // ── Incidents & audit ─────────────────────────────────────────────────────

  async fn list_incidents(
    &self,
    query: &IncidentQuery,
  ) -> Result<Vec<Incident>> {
    let q = query.clone();
    let raws: Vec<RawIncident> = self
      .conn
      .call(move |conn| {
        let mut sql = String::from(
          "SELECT incident_id, kind, voter_id, prior_leader_id,
                  new_leader_id, detail, actor, recorded_at
           FROM incidents",
        );
        let mut conds: Vec<&str> = Vec::new();
        let mut args: Vec<Value> = Vec::new();
        if let Some(kind) = q.kind {
          conds.push("kind = ?");
          args.push(Value::Text(kind.as_str().to_owned()));
        }
        if let Some(voter) = q.voter {
          conds.push("voter_id = ?");
          args.push(Value::Text(voter));
        }
        if let Some(leader) = q.leader {
          conds.push("(prior_leader_id = ? OR new_leader_id = ?)");
          args.push(Value::Text(leader.clone()));
          args.push(Value::Text(leader));
        }
        if let Some(from) = q.from {
          conds.push("recorded_at >= ?");
          args.push(Value::Text(encode_dt(from)));
        }
        if let Some(to) = q.to {
          conds.push("recorded_at <= ?");
          args.push(Value::Text(encode_dt(to)));
        }
        push_conds(&mut sql, &conds);
        sql.push_str(" ORDER BY recorded_at DESC, incident_id");
        push_page(&mut sql, q.limit, q.offset);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(args), RawIncident::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawIncident::into_incident).collect()
  }

  async fn list_actions(
    &self,
    query: &ActionQuery,
  ) -> Result<Vec<ActionLogEntry>> {
    let q = query.clone();
    let raws: Vec<RawAction> = self
      .conn
      .call(move |conn| {
        let mut sql = String::from(
          "SELECT action_id, entity_kind, entity_id, action, actor, detail,
                  recorded_at
           FROM action_log",
        );
        let mut conds: Vec<&str> = Vec::new();
        let mut args: Vec<Value> = Vec::new();
        if let Some(kind) = q.entity_kind {
          conds.push("entity_kind = ?");
          args.push(Value::Text(kind.as_str().to_owned()));
        }
        if let Some(entity_id) = q.entity_id {
          conds.push("entity_id = ?");
          args.push(Value::Text(entity_id));
        }
        push_conds(&mut sql, &conds);
        sql.push_str(" ORDER BY recorded_at DESC, action_id");
        push_page(&mut sql, q.limit, q.offset);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(args), RawAction::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawAction::into_entry).collect()
  }
}
