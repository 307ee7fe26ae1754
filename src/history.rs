use std::collections::VecDeque;

use crate::pixels::PixelStore;

/// Default number of stroke snapshots kept per session.
pub const HISTORY_CAPACITY: usize = 50;

// ============================================================================
// HISTORY TIMELINE — bounded, linear, cursor-addressed snapshots
// ============================================================================

/// Undo/redo timeline over whole-board snapshots.
///
/// One snapshot per *stroke* (pointer-down to release), never per pixel, so
/// each undo step is meaningful and the timeline stays small. The sequence is
/// linear: committing while undone discards the redo branch. When the
/// capacity bound is hit the oldest snapshot is evicted and the cursor is
/// decremented so it keeps pointing at the same logical snapshot.
pub struct HistoryTimeline {
    snapshots: VecDeque<PixelStore>,
    cursor: usize,
    capacity: usize,
}

impl Default for HistoryTimeline {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

impl HistoryTimeline {
    /// A fresh timeline holds a single empty snapshot at cursor 0, mirroring
    /// the board at mount time.
    pub fn new(capacity: usize) -> Self {
        let mut snapshots = VecDeque::with_capacity(capacity.max(1) + 1);
        snapshots.push_back(PixelStore::new());
        Self {
            snapshots,
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Commit the active store as a new snapshot. Returns `false` (no-op)
    /// when `active` equals the snapshot at the cursor — an empty stroke or
    /// one that painted and then un-painted itself commits nothing.
    pub fn commit(&mut self, active: &PixelStore) -> bool {
        if *active == self.snapshots[self.cursor] {
            return false;
        }

        // Linear history: drop any redo branch beyond the cursor.
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push_back(active.clone());
        self.cursor = self.snapshots.len() - 1;

        // Capacity bound: evict the oldest snapshot and pull the cursor back
        // one so it still addresses the same content.
        if self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
            self.cursor = self.cursor.saturating_sub(1);
        }
        true
    }

    /// Step the cursor back and return the snapshot to make active.
    /// `None` at the start of the timeline.
    pub fn undo(&mut self) -> Option<PixelStore> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.snapshots[self.cursor].clone())
    }

    /// Step the cursor forward and return the snapshot to make active.
    /// `None` at the end of the timeline.
    pub fn redo(&mut self) -> Option<PixelStore> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.snapshots[self.cursor].clone())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        false // Always holds at least the initial snapshot.
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}
