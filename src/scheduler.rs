use std::time::{Duration, Instant};

// ============================================================================
// TASK SCHEDULER — explicit delayed tasks, cancelled with their owner
// ============================================================================

struct Scheduled<T> {
    id: u64,
    due: Instant,
    task: T,
}

/// Delayed-task primitive for the simulated backend (wallet creation, mint
/// completion) and toast auto-dismiss.
///
/// Nothing fires on its own: the owning component polls each frame and the
/// whole schedule dies with its owner, so a pending task can never outlive
/// the component that created it.
pub struct TaskScheduler<T> {
    tasks: Vec<Scheduled<T>>,
    next_id: u64,
}

impl<T> Default for TaskScheduler<T> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T> TaskScheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to fire `delay` after `now`. Returns a handle usable
    /// with `cancel`. Time is passed in, like `poll`, so owners drive the
    /// whole schedule off one per-frame instant and tests stay deterministic.
    pub fn schedule(&mut self, now: Instant, delay: Duration, task: T) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.push(Scheduled {
            id,
            due: now + delay,
            task,
        });
        id
    }

    /// Cancel a pending task. Unknown or already-fired ids are ignored.
    pub fn cancel(&mut self, id: u64) {
        self.tasks.retain(|t| t.id != id);
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Time until the next task is due, for repaint scheduling.
    pub fn next_due_in(&self, now: Instant) -> Option<Duration> {
        self.tasks
            .iter()
            .map(|t| t.due.saturating_duration_since(now))
            .min()
    }

    /// Remove and return every task due at `now`, in scheduling order.
    pub fn poll(&mut self, now: Instant) -> Vec<T> {
        let mut fired = Vec::new();
        let mut remaining = Vec::with_capacity(self.tasks.len());
        for t in self.tasks.drain(..) {
            if t.due <= now {
                fired.push(t.task);
            } else {
                remaining.push(t);
            }
        }
        self.tasks = remaining;
        fired
    }
}
