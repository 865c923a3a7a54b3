// Bounded record of recently committed cells.
//
// The oscillation guard consults this before accepting a re-decided step:
// a destination that is already in the history would send the agent back
// over ground it just covered. Capacity is small (five by default), so a
// linear scan of a `VecDeque` is the whole lookup.
//
// See also: `chase.rs` (`ChaseAgent::commit`), the only writer.

use crate::types::CellCoord;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// FIFO of the last `capacity` cells, oldest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveHistory {
    cells: VecDeque<CellCoord>,
    capacity: usize,
}

impl MoveHistory {
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            cells: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `coord`, evicting the oldest entry when full.
    pub fn push(&mut self, coord: CellCoord) {
        if self.cells.len() == self.capacity {
            self.cells.pop_front();
        }
        self.cells.push_back(coord);
    }

    pub fn contains(&self, coord: CellCoord) -> bool {
        self.cells.contains(&coord)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The most recent entry.
    pub fn latest(&self) -> Option<CellCoord> {
        self.cells.back().copied()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: i32) -> CellCoord {
        CellCoord::new(x, 0, 0)
    }

    #[test]
    fn evicts_oldest_first() {
        let mut history = MoveHistory::new(3);
        for x in 0..5 {
            history.push(at(x));
            assert!(history.len() <= 3);
        }
        assert_eq!(history.len(), 3);
        assert!(!history.contains(at(1)));
        assert!((2..5).all(|x| history.contains(at(x))));
        assert_eq!(history.latest(), Some(at(4)));
    }

    #[test]
    fn zero_capacity_holds_one() {
        let mut history = MoveHistory::new(0);
        history.push(at(0));
        history.push(at(1));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest(), Some(at(1)));
        assert!(!history.contains(at(0)));
    }

    #[test]
    fn clear_empties() {
        let mut history = MoveHistory::new(5);
        history.push(at(7));
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.latest(), None);
    }
}
