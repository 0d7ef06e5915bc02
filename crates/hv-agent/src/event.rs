//! Observable agent events.

use hv_core::{ResourceId, SlotId, Vec3};

use crate::TaskState;

/// One thing an agent did during a tick.
///
/// Returned from [`Agent::tick`](crate::Agent::tick) and
/// [`Agent::retire`](crate::Agent::retire) in the order they happened.
#[derive(Clone, Debug, PartialEq)]
pub enum AgentEvent {
    /// Reserved a resource and set off towards it.
    Targeted { resource: ResourceId, position: Vec3 },

    /// The resource being sought was consumed, invalidated or swept away.
    TargetLost { resource: ResourceId },

    /// Reached the resource and started the harvest wait.
    HarvestStarted { resource: ResourceId },

    /// Took the resource; now carrying one unit home.
    Harvested { resource: ResourceId },

    /// The take failed (the reservation was lost); heading home empty.
    HarvestFailed { resource: ResourceId },

    /// Reserved a docking slot at home.
    SlotGranted { slot: SlotId, position: Vec3 },

    /// Every slot was busy; heading for the fallback position.
    SlotFallback { position: Vec3 },

    /// Arrived home carrying; `store` is the hub's new total.
    Delivered { store: u64 },

    /// Arrived home with nothing to deliver.
    ReturnedEmpty,

    /// The stuck watchdog abandoned the current path.
    WatchdogRetarget { state: TaskState, position: Vec3 },

    /// Released everything ahead of removal.
    Retired,
}

impl AgentEvent {
    /// Short machine-readable name, used as a column value by writers.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentEvent::Targeted { .. } => "targeted",
            AgentEvent::TargetLost { .. } => "target_lost",
            AgentEvent::HarvestStarted { .. } => "harvest_started",
            AgentEvent::Harvested { .. } => "harvested",
            AgentEvent::HarvestFailed { .. } => "harvest_failed",
            AgentEvent::SlotGranted { .. } => "slot_granted",
            AgentEvent::SlotFallback { .. } => "slot_fallback",
            AgentEvent::Delivered { .. } => "delivered",
            AgentEvent::ReturnedEmpty => "returned_empty",
            AgentEvent::WatchdogRetarget { .. } => "watchdog_retarget",
            AgentEvent::Retired => "retired",
        }
    }
}
