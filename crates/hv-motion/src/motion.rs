//! Movement-layer traits.

use hv_core::{AgentId, Vec3};

/// Per-agent movement controller.
///
/// Implementations must be `Send` so agents can be ticked on Rayon workers.
pub trait Motion: Send {
    /// Request a path to `target`.  Planning may take a while; see
    /// [`path_pending`](Self::path_pending).
    fn set_destination(&mut self, target: Vec3);

    /// The destination of the current path, if any.
    fn destination(&self) -> Option<Vec3>;

    /// Distance left along the current path.  `f32::INFINITY` when there is
    /// no path or planning has not finished.
    fn remaining_distance(&self) -> f32;

    /// `true` while a requested path is still being planned.
    fn path_pending(&self) -> bool;

    /// `true` once a planned path exists.
    fn has_path(&self) -> bool;

    fn position(&self) -> Vec3;

    /// Drop the current path and stop.
    fn reset_path(&mut self);

    fn speed(&self) -> f32;

    fn set_speed(&mut self, speed: f32);

    /// How far from its destination the mover comes to rest.
    fn stopping_distance(&self) -> f32;

    /// Integrate `dt` seconds of movement.
    fn advance(&mut self, dt: f32);

    /// Corner points of the current path, for visualization.
    fn path_corners(&self) -> Vec<Vec3> {
        match (self.has_path(), self.destination()) {
            (true, Some(d)) => vec![self.position(), d],
            _ => Vec::new(),
        }
    }
}

/// Creates one [`Motion`] per agent.
///
/// The coordinator holds a single factory and calls it whenever the
/// population grows.
pub trait MotionFactory: Send + Sync {
    type Motion: Motion;

    fn spawn(&self, agent: AgentId, at: Vec3, speed: f32) -> Self::Motion;
}
