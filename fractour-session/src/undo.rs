use std::collections::VecDeque;

use tracing::debug;

use fractour_core::Viewport;

/// Bounded history of viewport snapshots.
///
/// Behaves as a stack for [`undo`](Self::undo) and as a queue at capacity:
/// pushing onto a full stack evicts the oldest snapshot. There is no redo.
#[derive(Debug, Clone)]
pub struct UndoStack {
    entries: VecDeque<Viewport>,
    capacity: usize,
}

impl UndoStack {
    pub const DEFAULT_CAPACITY: usize = 100;

    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn save(&mut self, viewport: Viewport) {
        self.entries.push_back(viewport);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
            debug!(capacity = self.capacity, "Undo history full, evicted oldest entry");
        }
    }

    /// Pop the most recent snapshot.
    pub fn undo(&mut self) -> Option<Viewport> {
        self.entries.pop_back()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
