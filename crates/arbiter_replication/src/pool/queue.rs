//! # Transmission Priority Queue
//!
//! Array-backed binary max-heap over (handle, score) pairs. Rebuilt
//! from scratch by every rating pass, so there is no decrease-key;
//! extraction order is all that matters.

use super::store::DeltaHandle;

#[derive(Clone, Copy, Debug)]
struct Entry {
    handle: DeltaHandle,
    score: f32,
}

/// Max-heap of rated deltas.
#[derive(Debug, Default)]
pub struct PriorityQueue {
    entries: Vec<Entry>,
}

impl PriorityQueue {
    /// Initial backing capacity.
    const INITIAL_CAPACITY: usize = 8;

    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(Self::INITIAL_CAPACITY),
        }
    }

    /// Empties the queue, keeping the backing array.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of queued deltas.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a rated delta, sifting it up to its heap position.
    pub fn insert(&mut self, handle: DeltaHandle, score: f32) {
        self.entries.push(Entry { handle, score });
        let mut i = self.entries.len() - 1;
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.entries[parent].score >= score {
                break;
            }
            self.entries.swap(parent, i);
            i = parent;
        }
    }

    /// Removes and returns the highest-scored delta.
    pub fn extract(&mut self) -> Option<DeltaHandle> {
        if self.entries.is_empty() {
            return None;
        }

        let top = self.entries[0].handle;
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        self.entries.pop();

        // Sift the relocated tail element down.
        let size = self.entries.len();
        let mut i = 0;
        loop {
            let left = 2 * i + 1;
            let right = 2 * i + 2;
            let mut big = i;
            if left < size && self.entries[left].score > self.entries[big].score {
                big = left;
            }
            if right < size && self.entries[right].score > self.entries[big].score {
                big = right;
            }
            if big == i {
                break;
            }
            self.entries.swap(i, big);
            i = big;
        }

        Some(top)
    }
}
