//! The `Sim` struct and its tick loop.

use tracing::{debug, info, trace};

use hv_agent::{Agent, AgentContext, AgentEvent};
use hv_core::config::{MAX_AGENTS_PER_HUB, MIN_AGENTS_PER_HUB};
use hv_core::{AgentId, AgentRng, HubId, HvError, SimClock, SimConfig, SimRng, SimTime, Tick};
use hv_hub::Hub;
use hv_motion::{Motion, MotionFactory};
use hv_pool::ResourcePool;
use hv_spatial::NavSurface;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{AgentSnapshot, HubScore, SimError, SimObserver, SimResult, TickSummary};

/// The top-level simulation runner.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
///
/// `F` is the motion factory; every agent owns one `F::Motion`.
pub struct Sim<F: MotionFactory> {
    pub config: SimConfig,
    pub clock:  SimClock,

    pool:           ResourcePool,
    hubs:           Vec<Hub>,
    agents:         Vec<Agent<F::Motion>>,
    factory:        F,
    surface:        Box<dyn NavSurface>,
    rng:            SimRng,
    next_agent:     u32,
    agents_per_hub: usize,
    agent_speed:    f32,
    show_paths:     bool,
}

impl<F: MotionFactory> Sim<F> {
    /// Assemble a simulation and spawn the initial population at every hub.
    /// Inputs are validated by the builder.
    pub(crate) fn new(
        config:  SimConfig,
        factory: F,
        surface: Box<dyn NavSurface>,
        hubs:    Vec<Hub>,
    ) -> Self {
        let rng = SimRng::new(config.seed);
        let mut sim = Self {
            clock:          config.make_clock(),
            pool:           ResourcePool::new(&config.pool),
            agents:         Vec::with_capacity(hubs.len() * config.agents_per_hub),
            agents_per_hub: config.agents_per_hub,
            agent_speed:    config.agent_speed,
            hubs,
            factory,
            surface,
            rng,
            next_agent:     0,
            show_paths:     false,
            config,
        };
        let now = sim.clock.now();
        for h in 0..sim.hubs.len() {
            for _ in 0..sim.agents_per_hub {
                sim.spawn_agent(h, now);
            }
        }
        info!(
            hubs = sim.hubs.len(),
            agents = sim.agents.len(),
            seed = sim.config.seed,
            "simulation ready"
        );
        sim
    }

    // ── Main entry points ─────────────────────────────────────────────────

    /// Run the simulation until `config.end_tick()` (exclusive).
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        loop {
            let now = self.clock.current_tick;
            if now >= self.config.end_tick() {
                break;
            }
            self.step(now, observer)?;
        }
        observer.on_sim_end(self.clock.current_tick);
        Ok(())
    }

    /// Run exactly `n` ticks from the current position (ignores `end_tick`).
    ///
    /// Useful for tests and incremental stepping.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            let now = self.clock.current_tick;
            self.step(now, observer)?;
        }
        Ok(())
    }

    fn step<O: SimObserver>(&mut self, now: Tick, observer: &mut O) -> SimResult<()> {
        observer.on_tick_start(now);
        let summary = self.process_tick(now, observer)?;
        observer.on_tick_end(&summary);
        if self.config.output_interval_ticks > 0
            && now.0.is_multiple_of(self.config.output_interval_ticks)
        {
            let agents = self.snapshot();
            let hubs = self.scoreboard();
            observer.on_snapshot(now, summary.time, &agents, &hubs);
        }
        self.clock.advance();
        Ok(())
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn process_tick<O: SimObserver>(&mut self, now: Tick, observer: &mut O) -> SimResult<TickSummary> {
        let time = self.clock.time_at(now);
        let dt = self.clock.dt_secs();

        // ── Phase 1: movement ─────────────────────────────────────────────
        #[cfg(not(feature = "parallel"))]
        self.agents.iter_mut().for_each(|a| a.motion_mut().advance(dt));

        #[cfg(feature = "parallel")]
        self.agents.par_iter_mut().for_each(|a| a.motion_mut().advance(dt));

        // ── Phase 2: pool spawn timer and resource sweep ──────────────────
        let pool_tick = self.pool.tick(time, &*self.surface, &mut self.rng);

        // ── Phase 3: agent state machines ─────────────────────────────────
        //
        // Agents only share `&ResourcePool` and `&[Hub]`; node and slot
        // contention is settled inside those.
        let pool = &self.pool;
        let hubs = &self.hubs;
        let surface: &dyn NavSurface = &*self.surface;
        let tuning = &self.config.agent;
        let tick_agent = |agent: &mut Agent<F::Motion>| -> SimResult<(AgentId, HubId, Vec<AgentEvent>)> {
            let home = hubs
                .get(agent.home().index())
                .ok_or(SimError::UnknownHub(agent.home()))?;
            let ctx = AgentContext::new(time, pool, home, surface, tuning);
            Ok((agent.id(), agent.home(), agent.tick(&ctx)))
        };

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<_> = self.agents.iter_mut().map(tick_agent).collect::<SimResult<_>>()?;

        #[cfg(feature = "parallel")]
        let outcomes: Vec<_> = self.agents.par_iter_mut().map(tick_agent).collect::<SimResult<_>>()?;

        // ── Phase 4: hub slot sweeps ──────────────────────────────────────
        let slots_reclaimed: usize = self.hubs.iter().map(|h| h.reclaim_stale(time)).sum();

        let mut summary = TickSummary {
            tick:                now,
            time,
            agents:              self.agents.len(),
            live_resources:      self.pool.live_count(),
            free_resources:      self.pool.free_count(),
            spawned:             pool_tick.spawned.is_some(),
            resources_reclaimed: pool_tick.reclaimed,
            slots_reclaimed,
            ..TickSummary::default()
        };
        for (agent, hub, events) in &outcomes {
            for event in events {
                match event {
                    AgentEvent::Delivered { .. } => summary.deliveries += 1,
                    AgentEvent::ReturnedEmpty => summary.empty_returns += 1,
                    AgentEvent::HarvestFailed { .. } => summary.failed_takes += 1,
                    AgentEvent::SlotFallback { .. } => summary.slot_fallbacks += 1,
                    AgentEvent::WatchdogRetarget { .. } => summary.watchdog_retargets += 1,
                    _ => {}
                }
                observer.on_agent_event(now, *agent, *hub, event);
            }
        }

        trace!(
            tick = now.0,
            live = summary.live_resources,
            free = summary.free_resources,
            deliveries = summary.deliveries,
            "tick processed"
        );
        Ok(summary)
    }

    fn spawn_agent(&mut self, hub_index: usize, now: SimTime) -> AgentId {
        let id = AgentId(self.next_agent);
        self.next_agent += 1;
        let hub = &self.hubs[hub_index];
        let motion = self.factory.spawn(id, hub.center(), self.agent_speed);
        let rng = AgentRng::new(self.config.seed, id);
        self.agents.push(Agent::new(id, hub.id(), motion, rng, &self.config.agent, now));
        debug!(agent = %id, hub = %hub.id(), "agent spawned");
        id
    }

    // ── Tuning surface ────────────────────────────────────────────────────

    /// Change the resource spawn interval.  The next spawn attempt happens on
    /// the coming tick; values below the minimum are clamped.
    pub fn set_spawn_interval(&mut self, secs: f32) {
        let now = self.clock.now();
        self.pool.set_interval(secs, now);
    }

    /// Change the travel speed of every live agent and of later spawns.
    pub fn set_agent_speed(&mut self, speed: f32) -> SimResult<()> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(SimError::Config(format!("agent speed must be positive, got {speed}")));
        }
        self.agent_speed = speed;
        for agent in &mut self.agents {
            agent.motion_mut().set_speed(speed);
        }
        info!(speed, "agent speed changed");
        Ok(())
    }

    /// Grow or shrink every hub's population to `n`, clamped to
    /// `1..=10`.  Shrinking retires the oldest agents of each hub first.
    /// Returns the population actually applied.
    pub fn set_population_per_hub(&mut self, n: usize) -> usize {
        let target = n.clamp(MIN_AGENTS_PER_HUB, MAX_AGENTS_PER_HUB);
        self.agents_per_hub = target;
        let now = self.clock.now();

        for h in 0..self.hubs.len() {
            let hub_id = self.hubs[h].id();
            let current = self.agents.iter().filter(|a| a.home() == hub_id).count();
            if current > target {
                // Agents are kept in spawn order, so the first matches are
                // the oldest.
                let mut excess = current - target;
                let home = &self.hubs[h];
                self.agents.retain_mut(|a| {
                    if excess > 0 && a.home() == hub_id {
                        excess -= 1;
                        a.retire(home);
                        false
                    } else {
                        true
                    }
                });
            } else {
                for _ in current..target {
                    self.spawn_agent(h, now);
                }
            }
        }
        info!(per_hub = target, total = self.agents.len(), "population changed");
        target
    }

    /// Retire and remove one agent.
    pub fn remove_agent(&mut self, id: AgentId) -> SimResult<()> {
        let pos = self
            .agents
            .iter()
            .position(|a| a.id() == id)
            .ok_or(HvError::AgentNotFound(id))?;
        let mut agent = self.agents.remove(pos);
        let home = self
            .hubs
            .get(agent.home().index())
            .ok_or(SimError::UnknownHub(agent.home()))?;
        agent.retire(home);
        Ok(())
    }

    /// Include each agent's path corners in snapshots.
    pub fn set_path_visualization(&mut self, on: bool) {
        self.show_paths = on;
        info!(on, "path visualization toggled");
    }

    // ── Views ─────────────────────────────────────────────────────────────

    /// Per-hub faction label, store and current load, in hub order.
    pub fn scoreboard(&self) -> Vec<HubScore> {
        self.hubs
            .iter()
            .map(|hub| HubScore {
                id:         hub.id(),
                faction:    hub.faction().to_owned(),
                store:      hub.store(),
                busy_slots: hub.busy_slots(),
                agents:     self.agents.iter().filter(|a| a.home() == hub.id()).count(),
            })
            .collect()
    }

    /// Current state of every agent, in spawn order.
    pub fn snapshot(&self) -> Vec<AgentSnapshot> {
        self.agents
            .iter()
            .map(|a| AgentSnapshot {
                id:       a.id(),
                hub:      a.home(),
                state:    a.state(),
                position: a.position(),
                carrying: a.is_carrying(),
                target:   a.target_id(),
                slot:     a.slot(),
                path:     if self.show_paths { a.motion().path_corners() } else { Vec::new() },
            })
            .collect()
    }

    #[inline]
    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    pub fn hubs(&self) -> &[Hub] {
        &self.hubs
    }

    pub fn hub(&self, id: HubId) -> SimResult<&Hub> {
        self.hubs.get(id.index()).ok_or(SimError::UnknownHub(id))
    }

    pub fn agents(&self) -> &[Agent<F::Motion>] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent<F::Motion>> {
        self.agents.iter().find(|a| a.id() == id)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent<F::Motion>> {
        self.agents.iter_mut().find(|a| a.id() == id)
    }

    pub fn surface(&self) -> &dyn NavSurface {
        &*self.surface
    }

    #[inline]
    pub fn population_per_hub(&self) -> usize {
        self.agents_per_hub
    }

    #[inline]
    pub fn agent_speed(&self) -> f32 {
        self.agent_speed
    }

    #[inline]
    pub fn path_visualization(&self) -> bool {
        self.show_paths
    }
}

impl<F: MotionFactory> std::fmt::Debug for Sim<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sim")
            .field("clock", &self.clock)
            .field("hubs", &self.hubs.len())
            .field("agents", &self.agents.len())
            .field("pool", &self.pool)
            .finish()
    }
}
