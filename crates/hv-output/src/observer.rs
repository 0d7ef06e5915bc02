//! `SimOutputObserver<W>` — bridges `SimObserver` to an `OutputWriter`.

use hv_core::{SimTime, Tick};
use hv_sim::{AgentSnapshot, HubScore, SimObserver, TickSummary};

use crate::row::{AgentSnapshotRow, HubScoreRow, TickSummaryRow};
use crate::writer::OutputWriter;
use crate::OutputError;

/// A [`SimObserver`] that writes agent snapshots, hub scores and tick
/// summaries to any [`OutputWriter`] backend.
///
/// Errors from the writer are stored internally because `SimObserver` methods
/// have no return value.  After `sim.run()` returns, check for errors with
/// [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer:     W,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, last_error: None }
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the sim).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: crate::OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_tick_end(&mut self, summary: &TickSummary) {
        let row = TickSummaryRow {
            tick:                summary.tick.0,
            time_ms:             summary.time.as_millis(),
            agents:              summary.agents as u32,
            live_resources:      summary.live_resources as u32,
            free_resources:      summary.free_resources as u32,
            spawned:             summary.spawned,
            deliveries:          summary.deliveries as u32,
            empty_returns:       summary.empty_returns as u32,
            failed_takes:        summary.failed_takes as u32,
            slot_fallbacks:      summary.slot_fallbacks as u32,
            watchdog_retargets:  summary.watchdog_retargets as u32,
            resources_reclaimed: summary.resources_reclaimed as u32,
            slots_reclaimed:     summary.slots_reclaimed as u32,
        };
        let result = self.writer.write_tick_summary(&row);
        self.store_err(result);
    }

    fn on_snapshot(&mut self, tick: Tick, time: SimTime, agents: &[AgentSnapshot], hubs: &[HubScore]) {
        let rows: Vec<AgentSnapshotRow> = agents
            .iter()
            .map(|a| AgentSnapshotRow {
                tick:     tick.0,
                time_ms:  time.as_millis(),
                agent_id: a.id.0,
                hub_id:   a.hub.0,
                state:    a.state.as_str(),
                x:        a.position.x,
                z:        a.position.z,
                carrying: a.carrying,
                target:   a.target.map_or(u32::MAX, |r| r.0),
                slot:     a.slot.0,
            })
            .collect();
        if !rows.is_empty() {
            let result = self.writer.write_snapshots(&rows);
            self.store_err(result);
        }

        let scores: Vec<HubScoreRow> = hubs
            .iter()
            .map(|h| HubScoreRow {
                tick:       tick.0,
                hub_id:     h.id.0,
                faction:    h.faction.clone(),
                store:      h.store,
                busy_slots: h.busy_slots as u32,
                agents:     h.agents as u32,
            })
            .collect();
        if !scores.is_empty() {
            let result = self.writer.write_hub_scores(&scores);
            self.store_err(result);
        }
    }

    fn on_sim_end(&mut self, _final_tick: Tick) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
