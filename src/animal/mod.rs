pub mod genome;
pub mod lineage;
pub mod metabolism;
pub mod reproduction;

use crate::world::{Boundary, Direction, Position};
use genome::Genome;
use lineage::Fate;
use metabolism::Metabolism;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub type AnimalId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Forward,
    Backward,
    Rotate(u8),
}

impl Action {
    pub fn from_gene(gene: u8) -> Self {
        match gene % 8 {
            0 => Action::Forward,
            4 => Action::Backward,
            turn => Action::Rotate(turn),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Animal {
    pub id: AnimalId,
    position: Position,
    heading: Direction,
    pub genome: Genome,
    pub metabolism: Metabolism,
    birth_day: u64,
    age: u64,
    children: u32,
    alive: bool,
    observed: bool,
    observed_children: Vec<AnimalId>,
}

impl Animal {
    pub fn new(
        id: AnimalId,
        position: Position,
        heading: Direction,
        genome: Genome,
        energy: f64,
        birth_day: u64,
    ) -> Self {
        Self {
            id,
            position,
            heading,
            genome,
            metabolism: Metabolism::new(energy),
            birth_day,
            age: 0,
            children: 0,
            alive: true,
            observed: false,
            observed_children: Vec::new(),
        }
    }

    pub fn random<R: Rng + ?Sized>(
        id: AnimalId,
        position: Position,
        energy: f64,
        birth_day: u64,
        rng: &mut R,
    ) -> Self {
        let heading = Direction::from_index(rng.gen_range(0..8));
        let genome = Genome::random(rng);
        Self::new(id, position, heading, genome, energy, birth_day)
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn energy(&self) -> f64 {
        self.metabolism.energy()
    }

    pub fn gain_energy(&mut self, amount: f64) {
        self.metabolism.gain_energy(amount)
    }

    pub fn can_move(&self, move_cost: f64) -> bool {
        self.metabolism.can_afford(move_cost)
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn birth_day(&self) -> u64 {
        self.birth_day
    }

    pub fn children(&self) -> u32 {
        self.children
    }

    pub fn increment_children(&mut self) {
        self.children += 1;
    }

    /// Spends one turn: draws a gene, turns in place or works out the cell
    /// the animal steps into, pays `move_cost` and ages by one day.
    ///
    /// Returns the target cell for steps. The caller relocates the animal
    /// on the map; the animal never touches map bookkeeping itself.
    pub fn plan_move<R: Rng + ?Sized>(
        &mut self,
        move_cost: f64,
        boundary: Boundary,
        width: usize,
        height: usize,
        rng: &mut R,
    ) -> Option<Position> {
        let action = Action::from_gene(self.genome.sample(rng));
        let target = self.apply(action, boundary, width, height);
        self.metabolism.consume_energy(move_cost);
        self.age += 1;
        target
    }

    fn apply(&mut self, action: Action, boundary: Boundary, width: usize, height: usize) -> Option<Position> {
        match action {
            Action::Forward => Some(boundary.resolve(self.position + self.heading.to_unit(), width, height)),
            Action::Backward => Some(boundary.resolve(self.position - self.heading.to_unit(), width, height)),
            Action::Rotate(turn) => {
                self.heading = self.heading.rotate(turn);
                None
            }
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn mark_dead(&mut self) {
        self.alive = false;
    }

    pub fn fate(&self) -> Fate {
        if self.alive {
            Fate::Alive
        } else {
            Fate::Died {
                day: self.birth_day + self.age,
            }
        }
    }

    pub fn is_observed(&self) -> bool {
        self.observed
    }

    pub fn set_observed(&mut self, observed: bool) {
        self.observed = observed;
    }

    pub fn record_observed_child(&mut self, child: AnimalId) {
        self.observed_children.push(child);
    }

    pub fn observed_children(&self) -> &[AnimalId] {
        &self.observed_children
    }

    pub fn stop_observing(&mut self) -> Vec<AnimalId> {
        self.observed = false;
        std::mem::take(&mut self.observed_children)
    }
}
