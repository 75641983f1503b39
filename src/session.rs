//! Unit of work over the shared connection.

use crate::error::{Error, Result};
use crate::models::{Entity, Persist};
use crate::query::Query;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, warn};

/// A unit of work holding the connection lock until dropped.
///
/// `add` inserts straight away inside the session's transaction so the
/// record gets its id immediately, and queries issued through the session
/// see those uncommitted rows. Nothing is durable until `commit`.
pub struct Session {
    conn: OwnedMutexGuard<Connection>,
    in_transaction: bool,
    // Highest id handed out per table in the open transaction
    issued: HashMap<&'static str, i64>,
}

impl Session {
    pub(crate) fn new(conn: OwnedMutexGuard<Connection>) -> Self {
        Self {
            conn,
            in_transaction: false,
            issued: HashMap::new(),
        }
    }

    fn begin(&mut self) -> Result<()> {
        if !self.in_transaction {
            self.conn.execute_batch("BEGIN")?;
            self.in_transaction = true;
            debug!("[SESSION] Transaction started");
        }
        Ok(())
    }

    /// Insert `record` and write the assigned id back into it.
    pub fn add(&mut self, record: &mut dyn Persist) -> Result<i64> {
        if let Some(id) = record.persisted_id() {
            return Err(Error::AlreadyPersisted {
                table: record.table(),
                id,
            });
        }
        self.begin()?;
        let id = record.insert_into(&self.conn)?;
        record.assign_id(id);
        let high = self.issued.entry(record.table()).or_insert(id);
        *high = (*high).max(id);
        debug!("[SESSION] Added {} row {}", record.table(), id);
        Ok(id)
    }

    pub fn add_all(&mut self, records: &mut [&mut dyn Persist]) -> Result<()> {
        for record in records.iter_mut() {
            self.add(&mut **record)?;
        }
        Ok(())
    }

    /// Make everything added since the last commit durable.
    ///
    /// Foreign keys are checked here. On failure the whole transaction is
    /// rolled back exactly as by [`Session::rollback`].
    pub fn commit(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        if let Err(err) = self.conn.execute_batch("COMMIT") {
            let err = Error::from(err);
            warn!("[SESSION] Commit failed, rolling back: {}", err);
            if let Err(rollback_err) = self.discard() {
                warn!("[SESSION] Rollback after failed commit failed: {}", rollback_err);
            }
            return Err(err);
        }
        self.issued.clear();
        debug!("[SESSION] Transaction committed");
        Ok(())
    }

    /// Discard everything added since the last commit.
    ///
    /// Records added in the discarded transaction keep the ids `add` gave
    /// them, but those ids are retired: no later insert reuses them, so a
    /// stale record loads nothing instead of another row's data. Such a
    /// record cannot be added again (`AlreadyPersisted`); rebuild it with
    /// `id: None` to save it.
    pub fn rollback(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        self.discard()?;
        debug!("[SESSION] Transaction rolled back");
        Ok(())
    }

    fn discard(&mut self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        self.retire_issued()
    }

    // The rollback also undid the sqlite_sequence bump, so push it back up
    // past every id we handed out.
    fn retire_issued(&mut self) -> Result<()> {
        for (table, high) in self.issued.drain() {
            self.conn.execute(
                "UPDATE sqlite_sequence SET seq = ?2 WHERE name = ?1 AND seq < ?2",
                params![table, high],
            )?;
            self.conn.execute(
                "INSERT INTO sqlite_sequence (name, seq)
                 SELECT ?1, ?2
                 WHERE NOT EXISTS (SELECT 1 FROM sqlite_sequence WHERE name = ?1)",
                params![table, high],
            )?;
            debug!("[SESSION] Retired {} ids up to {}", table, high);
        }
        Ok(())
    }

    pub fn query<E: Entity>(&self) -> Query<'_, E> {
        Query::new(&self.conn)
    }

    pub fn get<E: Entity>(&self, id: i64) -> Result<Option<E>> {
        self.query::<E>().filter_by("id", id).first()
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.in_transaction {
            debug!("[SESSION] Dropped with pending work, rolling back");
            if let Err(err) = self.discard() {
                warn!("[SESSION] Rollback on drop failed: {}", err);
            }
        }
    }
}
