use std::time::{Duration, Instant};

/// Minimum spacing between pointer-move dispatches (~60 per second).
pub const MOVE_INTERVAL: Duration = Duration::from_millis(16);

// ============================================================================
// MOVE THROTTLE — Idle → CoolingDown → Idle
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ThrottleState {
    Idle,
    /// A dispatch went out; further moves are dropped until `until`.
    CoolingDown { until: Instant },
}

/// Rate limiter for continuous pointer-move painting.
///
/// At most one dispatch per `MOVE_INTERVAL`; moves inside the window are
/// dropped outright, never queued or delayed. Stroke start calls `reset()`
/// so the pointer-down paint always bypasses the cool-down — a tap paints
/// even if the pointer never moves again.
pub struct MoveThrottle {
    state: ThrottleState,
    interval: Duration,
}

impl Default for MoveThrottle {
    fn default() -> Self {
        Self::new(MOVE_INTERVAL)
    }
}

impl MoveThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            state: ThrottleState::Idle,
            interval,
        }
    }

    /// Ask to dispatch a move event at `now`. `true` starts a new cool-down
    /// window; `false` means the event falls inside the current window and
    /// must be dropped.
    pub fn try_dispatch(&mut self, now: Instant) -> bool {
        match self.state {
            ThrottleState::CoolingDown { until } if now < until => false,
            _ => {
                self.state = ThrottleState::CoolingDown {
                    until: now + self.interval,
                };
                true
            }
        }
    }

    /// Return to `Idle`. Called on pointer-down so the first paint of a
    /// stroke is never throttled, and on teardown.
    pub fn reset(&mut self) {
        self.state = ThrottleState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_dispatch_always_passes() {
        let mut t = MoveThrottle::default();
        assert!(t.try_dispatch(Instant::now()));
    }

    #[test]
    fn drops_moves_inside_the_window() {
        let mut t = MoveThrottle::default();
        let start = Instant::now();
        assert!(t.try_dispatch(start));
        assert!(!t.try_dispatch(start + Duration::from_millis(1)));
        assert!(!t.try_dispatch(start + Duration::from_millis(15)));
    }

    #[test]
    fn reopens_after_the_interval() {
        let mut t = MoveThrottle::default();
        let start = Instant::now();
        assert!(t.try_dispatch(start));
        assert!(t.try_dispatch(start + MOVE_INTERVAL));
        // And immediately cools down again.
        assert!(!t.try_dispatch(start + MOVE_INTERVAL + Duration::from_millis(1)));
    }

    #[test]
    fn reset_bypasses_an_active_cooldown() {
        let mut t = MoveThrottle::default();
        let start = Instant::now();
        assert!(t.try_dispatch(start));
        t.reset();
        // A new stroke's pointer-down dispatches immediately.
        assert!(t.try_dispatch(start + Duration::from_millis(1)));
    }

    #[test]
    fn dropped_events_are_lost_not_queued() {
        let mut t = MoveThrottle::new(Duration::from_millis(10));
        let start = Instant::now();
        assert!(t.try_dispatch(start));
        for ms in 1..10 {
            assert!(!t.try_dispatch(start + Duration::from_millis(ms)));
        }
        // Only one dispatch opens up after the window, regardless of how
        // many were dropped inside it.
        assert!(t.try_dispatch(start + Duration::from_millis(10)));
        assert!(!t.try_dispatch(start + Duration::from_millis(11)));
    }
}
