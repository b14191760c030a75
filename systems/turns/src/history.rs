use std::collections::VecDeque;

use ghost_trail_world::PuzzleState;

/// Bounded undo buffer of settled puzzle states, oldest first.
#[derive(Clone, Debug)]
pub struct History {
    capacity: usize,
    snapshots: VecDeque<PuzzleState>,
}

impl History {
    /// Creates a history seeded with the initial state.
    #[must_use]
    pub fn new(initial: PuzzleState, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut snapshots = VecDeque::with_capacity(capacity + 1);
        snapshots.push_back(initial);
        Self {
            capacity,
            snapshots,
        }
    }

    /// Records a snapshot, evicting the oldest one past capacity.
    pub fn push(&mut self, state: &PuzzleState) {
        self.snapshots.push_back(state.clone());
        if self.snapshots.len() > self.capacity {
            let _ = self.snapshots.pop_front();
        }
    }

    /// Drops the latest snapshot and copies the one before it into `target`.
    ///
    /// Returns `false` without touching anything when only one snapshot is left.
    pub fn undo_into(&mut self, target: &mut PuzzleState) -> bool {
        if self.snapshots.len() < 2 {
            return false;
        }
        let _ = self.snapshots.pop_back();
        match self.snapshots.back() {
            Some(previous) => {
                previous.clone_to(target);
                true
            }
            None => false,
        }
    }

    /// Number of stored snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always `false`; the initial snapshot is never discarded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Most recent snapshot.
    #[must_use]
    pub fn latest(&self) -> Option<&PuzzleState> {
        self.snapshots.back()
    }
}
