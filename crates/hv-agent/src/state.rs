use std::fmt;

/// Where an agent is in its harvest cycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// No target.  The idle-retry loop keeps polling the pool.
    #[default]
    Idle,
    /// Travelling to a reserved resource.
    Seeking,
    /// Waiting out the harvest duration at the resource.
    Harvesting,
    /// Heading home, possibly carrying a unit of resource.
    Returning,
}

impl TaskState {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Idle => "idle",
            TaskState::Seeking => "seeking",
            TaskState::Harvesting => "harvesting",
            TaskState::Returning => "returning",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
