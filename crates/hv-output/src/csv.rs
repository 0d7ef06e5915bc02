//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `agent_snapshots.csv`
//! - `hub_scores.csv`
//! - `tick_summaries.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{AgentSnapshotRow, HubScoreRow, OutputResult, TickSummaryRow};

pub const SNAPSHOT_HEADER: [&str; 10] =
    ["tick", "time_ms", "agent_id", "hub_id", "state", "x", "z", "carrying", "target", "slot"];

pub const HUB_SCORE_HEADER: [&str; 6] = ["tick", "hub_id", "faction", "store", "busy_slots", "agents"];

pub const SUMMARY_HEADER: [&str; 13] = [
    "tick",
    "time_ms",
    "agents",
    "live_resources",
    "free_resources",
    "spawned",
    "deliveries",
    "empty_returns",
    "failed_takes",
    "slot_fallbacks",
    "watchdog_retargets",
    "resources_reclaimed",
    "slots_reclaimed",
];

/// Writes simulation output to three CSV files.
pub struct CsvWriter {
    snapshots: Writer<File>,
    scores:    Writer<File>,
    summaries: Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Open (or create) the CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut snapshots = Writer::from_path(dir.join("agent_snapshots.csv"))?;
        snapshots.write_record(SNAPSHOT_HEADER)?;

        let mut scores = Writer::from_path(dir.join("hub_scores.csv"))?;
        scores.write_record(HUB_SCORE_HEADER)?;

        let mut summaries = Writer::from_path(dir.join("tick_summaries.csv"))?;
        summaries.write_record(SUMMARY_HEADER)?;

        Ok(Self {
            snapshots,
            scores,
            summaries,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_snapshots(&mut self, rows: &[AgentSnapshotRow]) -> OutputResult<()> {
        for row in rows {
            self.snapshots.write_record(&[
                row.tick.to_string(),
                row.time_ms.to_string(),
                row.agent_id.to_string(),
                row.hub_id.to_string(),
                row.state.to_string(),
                format!("{:.3}", row.x),
                format!("{:.3}", row.z),
                (row.carrying as u8).to_string(),
                row.target.to_string(),
                row.slot.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_hub_scores(&mut self, rows: &[HubScoreRow]) -> OutputResult<()> {
        for row in rows {
            self.scores.write_record(&[
                row.tick.to_string(),
                row.hub_id.to_string(),
                row.faction.clone(),
                row.store.to_string(),
                row.busy_slots.to_string(),
                row.agents.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.tick.to_string(),
            row.time_ms.to_string(),
            row.agents.to_string(),
            row.live_resources.to_string(),
            row.free_resources.to_string(),
            (row.spawned as u8).to_string(),
            row.deliveries.to_string(),
            row.empty_returns.to_string(),
            row.failed_takes.to_string(),
            row.slot_fallbacks.to_string(),
            row.watchdog_retargets.to_string(),
            row.resources_reclaimed.to_string(),
            row.slots_reclaimed.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.snapshots.flush()?;
        self.scores.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
