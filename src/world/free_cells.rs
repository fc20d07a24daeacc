use super::position::Position;
use rand::Rng;

/// Set of unoccupied cells with O(1) insert, remove and uniform sampling.
///
/// Members live in a dense vector; `slots` maps a cell index to its place in
/// that vector. Removal swaps the last member into the hole.
#[derive(Debug, Clone)]
pub struct FreeCells {
    members: Vec<(usize, Position)>,
    slots: Vec<Option<usize>>,
}

impl FreeCells {
    pub fn with_capacity(cell_count: usize) -> Self {
        Self {
            members: Vec::new(),
            slots: vec![None; cell_count],
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.slots.get(index).copied().flatten().is_some()
    }

    pub fn insert(&mut self, index: usize, position: Position) -> bool {
        if self.contains(index) {
            return false;
        }
        self.slots[index] = Some(self.members.len());
        self.members.push((index, position));
        true
    }

    pub fn remove(&mut self, index: usize) -> bool {
        let Some(slot) = self.slots.get_mut(index).and_then(Option::take) else {
            return false;
        };

        self.members.swap_remove(slot);
        if let Some(&(moved, _)) = self.members.get(slot) {
            self.slots[moved] = Some(slot);
        }
        true
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        if self.members.is_empty() {
            return None;
        }
        Some(self.members[rng.gen_range(0..self.members.len())].1)
    }
}
