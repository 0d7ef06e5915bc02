//! Tri-state resource node with lock-free ownership transitions.
//!
//! # State word
//!
//! All mutable ownership data lives in one `AtomicU64`:
//!
//! ```text
//!  63                         24 23                 2 1   0
//! ┌─────────────────────────────┬────────────────────┬─────┐
//! │ reservation stamp (ms, 40b) │ epoch (22b, wraps) │ st  │
//! └─────────────────────────────┴────────────────────┴─────┘
//! ```
//!
//! `st` is `Free = 0`, `Reserved = 1`, `Taken = 2`.  Every successful
//! reservation bumps the epoch, so the exact word written by a reservation
//! identifies it uniquely.  A [`ResourceLease`] remembers that word and only
//! ever CASes against it: a holder whose reservation was swept and handed to
//! someone else can neither take nor free the new holder's reservation.
//!
//! Legal transitions: `Free → Reserved → Taken` and `Reserved → Free`.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use hv_core::{ResourceId, SimTime, Vec3};

const STATE_MASK:  u64 = 0b11;
const EPOCH_SHIFT: u32 = 2;
const EPOCH_MASK:  u64 = (1 << 22) - 1;
const STAMP_SHIFT: u32 = 24;
const STAMP_MASK:  u64 = (1 << 40) - 1;

const FREE:     u64 = 0;
const RESERVED: u64 = 1;
const TAKEN:    u64 = 2;

#[inline]
fn state_of(word: u64) -> u64 {
    word & STATE_MASK
}

#[inline]
fn epoch_of(word: u64) -> u64 {
    (word >> EPOCH_SHIFT) & EPOCH_MASK
}

#[inline]
fn stamp_of(word: u64) -> SimTime {
    SimTime(word >> STAMP_SHIFT)
}

#[inline]
fn pack(state: u64, epoch: u64, stamp: SimTime) -> u64 {
    ((stamp.0 & STAMP_MASK) << STAMP_SHIFT) | ((epoch & EPOCH_MASK) << EPOCH_SHIFT) | state
}

/// `word` moved back to `Free`, keeping its epoch.
#[inline]
fn freed(word: u64) -> u64 {
    pack(FREE, epoch_of(word), SimTime::ZERO)
}

/// `word` moved to `Taken`, keeping epoch and stamp.
#[inline]
fn taken(word: u64) -> u64 {
    (word & !STATE_MASK) | TAKEN
}

// ── NodeState ─────────────────────────────────────────────────────────────────

/// Ownership state of a resource node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeState {
    Free,
    Reserved,
    Taken,
}

impl NodeState {
    fn from_word(word: u64) -> Self {
        match state_of(word) {
            FREE => NodeState::Free,
            RESERVED => NodeState::Reserved,
            _ => NodeState::Taken,
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeState::Free => "free",
            NodeState::Reserved => "reserved",
            NodeState::Taken => "taken",
        })
    }
}

// ── ResourceNode ──────────────────────────────────────────────────────────────

/// A single harvestable resource.
///
/// Position and identity are immutable.  Ownership is mutated only through
/// compare-and-swap on the state word, so any number of threads may call
/// the methods below through a shared reference.
pub struct ResourceNode {
    id:   ResourceId,
    pos:  Vec3,
    word: AtomicU64,
    live: AtomicBool,
}

impl ResourceNode {
    pub fn new(id: ResourceId, pos: Vec3) -> Self {
        Self {
            id,
            pos,
            word: AtomicU64::new(pack(FREE, 0, SimTime::ZERO)),
            live: AtomicBool::new(true),
        }
    }

    #[inline]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.pos
    }

    #[inline]
    pub fn state(&self) -> NodeState {
        NodeState::from_word(self.word.load(Ordering::Acquire))
    }

    /// Observational: `true` while the node is `Free`.
    #[inline]
    pub fn is_free(&self) -> bool {
        state_of(self.word.load(Ordering::Acquire)) == FREE
    }

    /// Time of the current reservation, if the node is `Reserved`.
    pub fn reserved_at(&self) -> Option<SimTime> {
        let w = self.word.load(Ordering::Acquire);
        (state_of(w) == RESERVED).then(|| stamp_of(w))
    }

    // ── Ownership transitions ────────────────────────────────────────────

    /// `Free → Reserved`.  Exactly one of any number of concurrent callers
    /// succeeds.  The reservation is stamped with time zero; use
    /// [`try_reserve_at`](Self::try_reserve_at) when the stale sweep matters.
    pub fn try_reserve(self: &Arc<Self>) -> bool {
        self.try_reserve_at(SimTime::ZERO).is_some()
    }

    /// `Free → Reserved`, stamped with `now`, returning the lease that
    /// proves ownership of this particular reservation.
    pub fn try_reserve_at(self: &Arc<Self>, now: SimTime) -> Option<ResourceLease> {
        let mut cur = self.word.load(Ordering::Acquire);
        loop {
            if state_of(cur) != FREE {
                return None;
            }
            let next = pack(RESERVED, epoch_of(cur) + 1, now);
            match self.word.compare_exchange(cur, next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return Some(ResourceLease { node: Arc::clone(self), word: next }),
                // Only a Free → Reserved → Free cycle can land us back here.
                Err(actual) => cur = actual,
            }
        }
    }

    /// `Reserved → Taken`, whoever holds the reservation.  No state change
    /// if the node is not `Reserved`.
    pub fn try_take(&self) -> bool {
        let mut cur = self.word.load(Ordering::Acquire);
        loop {
            if state_of(cur) != RESERVED {
                return false;
            }
            match self.word.compare_exchange(cur, taken(cur), Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return true,
                Err(actual) => cur = actual,
            }
        }
    }

    /// Force back to `Free`, whatever the current state.
    pub fn free(&self) {
        let _ = self
            .word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |w| Some(freed(w)));
    }

    /// `Reserved → Free` if the reservation is strictly older than
    /// `timeout_ms` at `now`.  Returns `true` if this call freed the node.
    pub fn reclaim_if_stale(&self, now: SimTime, timeout_ms: u64) -> bool {
        let cur = self.word.load(Ordering::Acquire);
        if state_of(cur) != RESERVED || now.saturating_since(stamp_of(cur)) <= timeout_ms {
            return false;
        }
        self.word
            .compare_exchange(cur, freed(cur), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    // ── Liveness ──────────────────────────────────────────────────────────

    /// Remove the node from play.  The pool purges it on its next spawn.
    pub fn deactivate(&self) {
        self.live.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

impl fmt::Debug for ResourceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceNode")
            .field("id", &self.id)
            .field("pos", &self.pos)
            .field("state", &self.state())
            .field("live", &self.is_live())
            .finish()
    }
}

// ── ResourceLease ─────────────────────────────────────────────────────────────

/// Proof of one specific reservation of a [`ResourceNode`].
///
/// Not `Clone`: there is exactly one lease per successful reservation.
/// Dropping a lease does not release it; call [`release`](Self::release).
pub struct ResourceLease {
    node: Arc<ResourceNode>,
    word: u64,
}

impl ResourceLease {
    #[inline]
    pub fn id(&self) -> ResourceId {
        self.node.id
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.node.pos
    }

    #[inline]
    pub fn node(&self) -> &Arc<ResourceNode> {
        &self.node
    }

    /// When this reservation was made or last renewed.
    #[inline]
    pub fn reserved_at(&self) -> SimTime {
        stamp_of(self.word)
    }

    /// `true` while the node is live and still carries this reservation.
    pub fn is_held(&self) -> bool {
        self.node.is_live() && self.node.word.load(Ordering::Acquire) == self.word
    }

    /// Restamp the reservation with `now`, keeping its epoch, so the stale
    /// sweep only catches holders that stopped renewing.  Fails, and leaves
    /// the lease untouched, once the reservation is no longer this lease's.
    pub fn renew(&mut self, now: SimTime) -> bool {
        if !self.node.is_live() {
            return false;
        }
        let next = pack(RESERVED, epoch_of(self.word), now);
        match self.node.word.compare_exchange(self.word, next, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => {
                self.word = next;
                true
            }
            Err(_) => false,
        }
    }

    /// `Reserved → Taken`, only if the reservation is still this lease's.
    pub fn try_take(&self) -> bool {
        self.node
            .word
            .compare_exchange(self.word, taken(self.word), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// `Reserved → Free`, only if the reservation is still this lease's.
    pub fn release(&self) -> bool {
        self.node
            .word
            .compare_exchange(self.word, freed(self.word), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl fmt::Debug for ResourceLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceLease")
            .field("node", &self.node.id)
            .field("epoch", &epoch_of(self.word))
            .field("reserved_at", &stamp_of(self.word))
            .finish()
    }
}
