//! Shared world state handed to every agent tick.

use hv_core::{AgentTuning, SimTime};
use hv_hub::Hub;
use hv_pool::ResourcePool;
use hv_spatial::NavSurface;

/// Everything an agent reads or reserves through during one tick.
///
/// Built by the coordinator for each agent from shared references, so any
/// number of agents may hold a context at once.  The pool and hub mediate
/// all cross-agent contention themselves.
pub struct AgentContext<'a> {
    /// Simulated time at the start of this tick.
    pub now:     SimTime,
    /// The shared resource pool.
    pub pool:    &'a ResourcePool,
    /// The agent's home hub.
    pub home:    &'a Hub,
    /// Navigable-surface service used to refine slot positions.
    pub surface: &'a dyn NavSurface,
    pub tuning:  &'a AgentTuning,
}

impl<'a> AgentContext<'a> {
    #[inline]
    pub fn new(
        now:     SimTime,
        pool:    &'a ResourcePool,
        home:    &'a Hub,
        surface: &'a dyn NavSurface,
        tuning:  &'a AgentTuning,
    ) -> Self {
        Self { now, pool, home, surface, tuning }
    }
}
