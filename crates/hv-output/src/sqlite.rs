//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! three tables: `agent_snapshots`, `hub_scores` and `tick_summaries`.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::OutputWriter;
use crate::{AgentSnapshotRow, HubScoreRow, OutputResult, TickSummaryRow};

/// Writes simulation output to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS agent_snapshots (
                 tick     INTEGER NOT NULL,
                 time_ms  INTEGER NOT NULL,
                 agent_id INTEGER NOT NULL,
                 hub_id   INTEGER NOT NULL,
                 state    TEXT    NOT NULL,
                 x        REAL    NOT NULL,
                 z        REAL    NOT NULL,
                 carrying INTEGER NOT NULL,
                 target   INTEGER NOT NULL,
                 slot     INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS hub_scores (
                 tick       INTEGER NOT NULL,
                 hub_id     INTEGER NOT NULL,
                 faction    TEXT    NOT NULL,
                 store      INTEGER NOT NULL,
                 busy_slots INTEGER NOT NULL,
                 agents     INTEGER NOT NULL,
                 PRIMARY KEY (tick, hub_id)
             );
             CREATE TABLE IF NOT EXISTS tick_summaries (
                 tick                INTEGER PRIMARY KEY,
                 time_ms             INTEGER NOT NULL,
                 agents              INTEGER NOT NULL,
                 live_resources      INTEGER NOT NULL,
                 free_resources      INTEGER NOT NULL,
                 spawned             INTEGER NOT NULL,
                 deliveries          INTEGER NOT NULL,
                 empty_returns       INTEGER NOT NULL,
                 failed_takes        INTEGER NOT NULL,
                 slot_fallbacks      INTEGER NOT NULL,
                 watchdog_retargets  INTEGER NOT NULL,
                 resources_reclaimed INTEGER NOT NULL,
                 slots_reclaimed     INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_snapshots(&mut self, rows: &[AgentSnapshotRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO agent_snapshots \
                 (tick, time_ms, agent_id, hub_id, state, x, z, carrying, target, slot) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.tick as i64,
                    row.time_ms as i64,
                    row.agent_id,
                    row.hub_id,
                    row.state,
                    row.x as f64,
                    row.z as f64,
                    row.carrying as i64,
                    row.target,
                    row.slot,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_hub_scores(&mut self, rows: &[HubScoreRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO hub_scores (tick, hub_id, faction, store, busy_slots, agents) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.tick as i64,
                    row.hub_id,
                    row.faction,
                    row.store as i64,
                    row.busy_slots,
                    row.agents,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO tick_summaries \
             (tick, time_ms, agents, live_resources, free_resources, spawned, deliveries, \
              empty_returns, failed_takes, slot_fallbacks, watchdog_retargets, \
              resources_reclaimed, slots_reclaimed) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            rusqlite::params![
                row.tick as i64,
                row.time_ms as i64,
                row.agents,
                row.live_resources,
                row.free_resources,
                row.spawned as i64,
                row.deliveries,
                row.empty_returns,
                row.failed_takes,
                row.slot_fallbacks,
                row.watchdog_retargets,
                row.resources_reclaimed,
                row.slots_reclaimed,
            ],
        )?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
