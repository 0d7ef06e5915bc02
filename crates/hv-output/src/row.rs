//! Plain data row types written by output backends.

/// One agent at one snapshot tick.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSnapshotRow {
    pub tick:     u64,
    pub time_ms:  u64,
    pub agent_id: u32,
    pub hub_id:   u16,
    /// `idle`, `seeking`, `harvesting` or `returning`.
    pub state:    &'static str,
    pub x:        f32,
    pub z:        f32,
    pub carrying: bool,
    /// Reserved resource; `u32::MAX` if none.
    pub target:   u32,
    /// Held slot; `u16::MAX` if none.
    pub slot:     u16,
}

/// One hub's score at one snapshot tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubScoreRow {
    pub tick:       u64,
    pub hub_id:     u16,
    pub faction:    String,
    pub store:      u64,
    pub busy_slots: u32,
    pub agents:     u32,
}

/// Aggregate counts for one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummaryRow {
    pub tick:                u64,
    pub time_ms:             u64,
    pub agents:              u32,
    pub live_resources:      u32,
    pub free_resources:      u32,
    pub spawned:             bool,
    pub deliveries:          u32,
    pub empty_returns:       u32,
    pub failed_takes:        u32,
    pub slot_fallbacks:      u32,
    pub watchdog_retargets:  u32,
    pub resources_reclaimed: u32,
    pub slots_reclaimed:     u32,
}
