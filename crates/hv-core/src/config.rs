//! Simulation configuration.
//!
//! Typically loaded from a JSON file by the application crate (with the
//! `serde` feature enabled) and passed to the simulation builder.  Every
//! struct has a `Default` matching the reference scenario, and missing JSON
//! fields fall back to those defaults.

use crate::{HvError, HvResult, Vec3};

/// Lower bound for the resource spawn interval, in seconds.
pub const MIN_SPAWN_INTERVAL_SECS: f32 = 0.2;

/// Allowed range for the per-hub agent population.
pub const MIN_AGENTS_PER_HUB: usize = 1;
pub const MAX_AGENTS_PER_HUB: usize = 10;

// ── PoolConfig ────────────────────────────────────────────────────────────────

/// Resource pool: capacity, spawn cadence and spawn region.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
    /// Maximum number of live nodes.
    pub capacity: usize,

    /// Seconds between spawn attempts.  Clamped to
    /// [`MIN_SPAWN_INTERVAL_SECS`].
    pub spawn_interval_secs: f32,

    /// Centre of the rectangular spawn region.
    pub spawn_center: Vec3,

    /// Half extents of the spawn region along `x` and `z`.
    pub spawn_half_extent: [f32; 2],

    /// How far a raw spawn point may be snapped onto the navigable surface.
    pub spawn_snap_distance: f32,

    /// Reserved-but-never-taken nodes older than this are freed again.
    /// `None` disables the sweep.
    pub reservation_timeout_secs: Option<f32>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity:                 25,
            spawn_interval_secs:      3.0,
            spawn_center:             Vec3::ZERO,
            spawn_half_extent:        [10.0, 10.0],
            spawn_snap_distance:      2.0,
            reservation_timeout_secs: Some(10.0),
        }
    }
}

// ── SlotConfig ────────────────────────────────────────────────────────────────

/// Where an agent is sent when every slot at its hub is busy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FallbackPolicy {
    /// The hub centre.
    #[default]
    HubCenter,
    /// A pseudo-random point on the slot ring.
    RandomOnRing,
}

/// Slot leasing behaviour shared by every hub.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SlotConfig {
    /// Reservations older than this are reclaimed by the per-tick sweep.
    pub timeout_secs: f32,

    /// Position policy when the ring is full.
    pub fallback: FallbackPolicy,

    /// Snap radius used to refine slot anchors onto the navigable surface.
    pub snap_distance: f32,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            timeout_secs:  3.0,
            fallback:      FallbackPolicy::HubCenter,
            snap_distance: 0.5,
        }
    }
}

// ── AgentTuning ───────────────────────────────────────────────────────────────

/// Timing constants of the agent state machine and its recovery loops.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AgentTuning {
    /// Duration of the harvesting wait.
    pub harvest_secs: f32,

    /// Remaining path distance under which a seeking agent has arrived.
    pub arrival_radius: f32,

    /// Period of the idle-retry loop.
    pub idle_retry_secs: f32,

    /// Period of the destination keepalive loop.
    pub keepalive_secs: f32,

    /// Sampling period of the stuck watchdog.
    pub watchdog_secs: f32,

    /// Minimum displacement between two watchdog samples.
    pub watchdog_epsilon: f32,
}

impl Default for AgentTuning {
    fn default() -> Self {
        Self {
            harvest_secs:     2.0,
            arrival_radius:   0.15,
            idle_retry_secs:  1.0,
            keepalive_secs:   0.5,
            watchdog_secs:    3.0,
            watchdog_epsilon: 0.1,
        }
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Simulated milliseconds per tick (one frame).  Default: 50.
    pub tick_duration_ms: u32,

    /// Total ticks to simulate.
    pub total_ticks: u64,

    /// Master RNG seed.  The same seed always produces identical results
    /// when the agent phase runs sequentially.
    pub seed: u64,

    /// Report a snapshot every N ticks.  0 disables snapshots.
    pub output_interval_ticks: u64,

    /// Initial agent population of every hub.
    pub agents_per_hub: usize,

    /// Agent travel speed in units per second.
    pub agent_speed: f32,

    pub pool: PoolConfig,
    pub slots: SlotConfig,
    pub agent: AgentTuning,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_duration_ms:      50,
            total_ticks:           1_200,
            seed:                  42,
            output_interval_ticks: 20,
            agents_per_hub:        3,
            agent_speed:           4.0,
            pool:                  PoolConfig::default(),
            slots:                 SlotConfig::default(),
            agent:                 AgentTuning::default(),
        }
    }
}

impl SimConfig {
    /// Reject values the scheduling core cannot work with.
    pub fn validate(&self) -> HvResult<()> {
        fn positive(name: &str, v: f32) -> HvResult<()> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(HvError::Config(format!("{name} must be positive, got {v}")))
            }
        }

        if self.tick_duration_ms == 0 {
            return Err(HvError::Config("tick_duration_ms must be non-zero".into()));
        }
        if !(MIN_AGENTS_PER_HUB..=MAX_AGENTS_PER_HUB).contains(&self.agents_per_hub) {
            return Err(HvError::Config(format!(
                "agents_per_hub must be in {MIN_AGENTS_PER_HUB}..={MAX_AGENTS_PER_HUB}, got {}",
                self.agents_per_hub
            )));
        }
        positive("agent_speed", self.agent_speed)?;
        positive("pool.spawn_interval_secs", self.pool.spawn_interval_secs)?;
        if self.pool.spawn_half_extent.iter().any(|e| !e.is_finite() || *e < 0.0) {
            return Err(HvError::Config("pool.spawn_half_extent must be non-negative".into()));
        }
        if let Some(t) = self.pool.reservation_timeout_secs {
            positive("pool.reservation_timeout_secs", t)?;
        }
        positive("slots.timeout_secs", self.slots.timeout_secs)?;
        positive("agent.harvest_secs", self.agent.harvest_secs)?;
        positive("agent.arrival_radius", self.agent.arrival_radius)?;
        positive("agent.idle_retry_secs", self.agent.idle_retry_secs)?;
        positive("agent.keepalive_secs", self.agent.keepalive_secs)?;
        positive("agent.watchdog_secs", self.agent.watchdog_secs)?;
        positive("agent.watchdog_epsilon", self.agent.watchdog_epsilon)?;
        Ok(())
    }

    /// Simulated time at which the run ends.
    pub fn end_tick(&self) -> crate::Tick {
        crate::Tick(self.total_ticks)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> crate::SimClock {
        crate::SimClock::new(self.tick_duration_ms)
    }
}
