use super::position::Position;
use crate::animal::{Animal, AnimalId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grass {
    pub position: Position,
    pub energy: f64,
}

impl Grass {
    pub fn new(position: Position, energy: f64) -> Self {
        Self {
            position,
            energy: energy.max(0.0),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Occupant {
    Grass(Grass),
    Animal(Animal),
}

impl Occupant {
    pub fn position(&self) -> Position {
        match self {
            Occupant::Grass(grass) => grass.position,
            Occupant::Animal(animal) => animal.position(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OccupantRef {
    Grass,
    Animal(AnimalId),
}

#[derive(Debug, Clone, Default)]
pub struct Cell {
    animals: Vec<AnimalId>,
    grass: Option<Grass>,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        self.animals.is_empty() && self.grass.is_none()
    }

    pub fn has_grass(&self) -> bool {
        self.grass.is_some()
    }

    pub fn grass(&self) -> Option<&Grass> {
        self.grass.as_ref()
    }

    pub fn animals(&self) -> &[AnimalId] {
        &self.animals
    }

    pub fn animal_count(&self) -> usize {
        self.animals.len()
    }

    pub(crate) fn add_animal(&mut self, id: AnimalId) {
        if !self.animals.contains(&id) {
            self.animals.push(id);
        }
    }

    pub(crate) fn remove_animal(&mut self, id: AnimalId) -> bool {
        match self.animals.iter().position(|&a| a == id) {
            Some(index) => {
                self.animals.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn put_grass(&mut self, grass: Grass) -> Option<Grass> {
        self.grass.replace(grass)
    }

    pub(crate) fn take_grass(&mut self) -> Option<Grass> {
        self.grass.take()
    }
}
