//! Simulation observer trait for progress reporting and data collection.

use hv_agent::AgentEvent;
use hv_core::{AgentId, HubId, SimTime, Tick};

use crate::{AgentSnapshot, HubScore, TickSummary};

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at key points in the
/// tick loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: delivery counter
///
/// ```rust,ignore
/// struct Deliveries(u64);
///
/// impl SimObserver for Deliveries {
///     fn on_tick_end(&mut self, summary: &TickSummary) {
///         self.0 += summary.deliveries as u64;
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before any processing.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called once per agent event, in agent order, after the agent phase.
    fn on_agent_event(&mut self, _tick: Tick, _agent: AgentId, _hub: HubId, _event: &AgentEvent) {}

    /// Called at the end of each tick with aggregate counts.
    fn on_tick_end(&mut self, _summary: &TickSummary) {}

    /// Called at snapshot intervals (every `config.output_interval_ticks` ticks).
    fn on_snapshot(
        &mut self,
        _tick:   Tick,
        _time:   SimTime,
        _agents: &[AgentSnapshot],
        _hubs:   &[HubScore],
    ) {}

    /// Called once after the final tick completes.
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
