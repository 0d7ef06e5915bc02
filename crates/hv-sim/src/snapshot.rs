//! Read-only views handed to observers and the scoreboard.

use hv_agent::TaskState;
use hv_core::{AgentId, HubId, ResourceId, SimTime, SlotId, Tick, Vec3};

/// One agent at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentSnapshot {
    pub id:       AgentId,
    pub hub:      HubId,
    pub state:    TaskState,
    pub position: Vec3,
    pub carrying: bool,
    pub target:   Option<ResourceId>,
    pub slot:     SlotId,
    /// Path corners; empty unless path visualization is on.
    pub path:     Vec<Vec3>,
}

/// A hub's public score: faction label and accumulated store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HubScore {
    pub id:         HubId,
    pub faction:    String,
    pub store:      u64,
    pub busy_slots: usize,
    pub agents:     usize,
}

/// Aggregate counts for one processed tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub tick:                Tick,
    pub time:                SimTime,
    pub agents:              usize,
    pub live_resources:      usize,
    pub free_resources:      usize,
    pub spawned:             bool,
    pub resources_reclaimed: usize,
    pub slots_reclaimed:     usize,
    pub deliveries:          usize,
    pub empty_returns:       usize,
    pub failed_takes:        usize,
    pub slot_fallbacks:      usize,
    pub watchdog_retargets:  usize,
}
