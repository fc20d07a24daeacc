use serde::{Deserialize, Serialize};

pub const PARENT_ENERGY_SHARE: f64 = 0.25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metabolism {
    energy: f64,
}

impl Metabolism {
    pub fn new(initial_energy: f64) -> Self {
        Self {
            energy: initial_energy.max(0.0),
        }
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn can_afford(&self, cost: f64) -> bool {
        self.energy >= cost
    }

    pub fn consume_energy(&mut self, amount: f64) -> bool {
        if self.energy >= amount {
            self.energy -= amount;
            true
        } else {
            self.energy = 0.0;
            false
        }
    }

    pub fn gain_energy(&mut self, amount: f64) {
        self.energy += amount.max(0.0);
    }

    pub fn give_to_child(&mut self) -> f64 {
        let share = self.energy * PARENT_ENERGY_SHARE;
        self.energy -= share;
        share
    }
}
