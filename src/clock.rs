//! One-second tick cadence.
//!
//! The clock is driven by the caller's notion of "now", so the event loop
//! polls it and tests feed it synthetic instants. At most one cadence is
//! armed at a time; arming again replaces it.

use std::time::{Duration, Instant};
use tracing::debug;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Identifies one armed cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadenceId(u64);

#[derive(Debug, Clone, Copy)]
struct Cadence {
    id: CadenceId,
    next_fire: Instant,
}

#[derive(Debug)]
pub struct TickClock {
    interval: Duration,
    cadence: Option<Cadence>,
    next_id: u64,
}

impl TickClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            cadence: None,
            next_id: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arm a fresh cadence whose first firing is one interval after `now`.
    /// Any previously armed cadence is dropped first.
    pub fn arm(&mut self, now: Instant) -> CadenceId {
        if let Some(old) = self.cancel() {
            debug!(cadence = old.0, "replacing armed cadence");
        }
        self.next_id += 1;
        let id = CadenceId(self.next_id);
        self.cadence = Some(Cadence {
            id,
            next_fire: now + self.interval,
        });
        id
    }

    pub fn cancel(&mut self) -> Option<CadenceId> {
        self.cadence.take().map(|c| c.id)
    }

    pub fn is_armed(&self) -> bool {
        self.cadence.is_some()
    }

    pub fn active(&self) -> Option<CadenceId> {
        self.cadence.map(|c| c.id)
    }

    /// Report a single due firing, if any, and schedule the one after it.
    ///
    /// A caller that woke late gets each missed firing from successive
    /// calls, so the consumer can stop (and cancel) between them.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.cadence.as_mut() {
            Some(c) if now >= c.next_fire => {
                c.next_fire += self.interval;
                true
            }
            _ => false,
        }
    }

    /// Time left until the next firing; `None` when disarmed.
    pub fn until_next(&self, now: Instant) -> Option<Duration> {
        self.cadence
            .map(|c| c.next_fire.saturating_duration_since(now))
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(TICK_INTERVAL)
    }
}
