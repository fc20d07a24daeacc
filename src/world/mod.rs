pub mod boundary;
pub mod cell;
pub mod free_cells;
pub mod genotypes;
pub mod position;
pub mod resources;

pub use boundary::Boundary;
pub use cell::{Cell, Grass, Occupant, OccupantRef};
pub use position::{Direction, Position};

use crate::animal::genome::Genome;
use crate::animal::{Animal, AnimalId};
use free_cells::FreeCells;
use genotypes::GenotypeTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Jungle,
    Steppe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyOrder {
    Ascending,
    Descending,
}

/// Grid of cells split into a centred jungle rectangle and the surrounding
/// steppe.
///
/// The map owns every occupant. Free cells (no grass, no animals) are
/// tracked per zone, and a genotype table counts the genomes of the animals
/// currently placed.
#[derive(Debug, Clone)]
pub struct WorldMap {
    width: usize,
    height: usize,
    boundary: Boundary,
    jungle_lower_left: Position,
    jungle_upper_right: Position,
    cells: Vec<Cell>,
    animals: BTreeMap<AnimalId, Animal>,
    jungle_free: FreeCells,
    steppe_free: FreeCells,
    genotypes: GenotypeTable,
    grass_count: usize,
}

impl WorldMap {
    pub fn new(width: usize, height: usize, jungle_ratio: f64, boundary: Boundary) -> Self {
        let jungle_width = (width as f64 * jungle_ratio).round() as i32;
        let jungle_height = (height as f64 * jungle_ratio).round() as i32;
        let jungle_lower_left = Position::new(
            (width as i32 - jungle_width) / 2,
            (height as i32 - jungle_height) / 2,
        );
        let jungle_upper_right =
            jungle_lower_left + Position::new(jungle_width - 1, jungle_height - 1);

        let cell_count = width * height;
        let mut map = Self {
            width,
            height,
            boundary,
            jungle_lower_left,
            jungle_upper_right,
            cells: vec![Cell::default(); cell_count],
            animals: BTreeMap::new(),
            jungle_free: FreeCells::with_capacity(cell_count),
            steppe_free: FreeCells::with_capacity(cell_count),
            genotypes: GenotypeTable::new(),
            grass_count: 0,
        };

        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let position = Position::new(x, y);
                let index = map.index(position);
                map.free_cells_mut(position).insert(index, position);
            }
        }

        map
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    pub fn jungle_bounds(&self) -> (Position, Position) {
        (self.jungle_lower_left, self.jungle_upper_right)
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && (position.x as usize) < self.width
            && (position.y as usize) < self.height
    }

    pub fn is_in_jungle(&self, position: Position) -> bool {
        self.jungle_lower_left.precedes(&position) && self.jungle_upper_right.follows(&position)
    }

    pub fn zone_of(&self, position: Position) -> Zone {
        if self.is_in_jungle(position) {
            Zone::Jungle
        } else {
            Zone::Steppe
        }
    }

    fn index(&self, position: Position) -> usize {
        position.y as usize * self.width + position.x as usize
    }

    fn free_cells_mut(&mut self, position: Position) -> &mut FreeCells {
        match self.zone_of(position) {
            Zone::Jungle => &mut self.jungle_free,
            Zone::Steppe => &mut self.steppe_free,
        }
    }

    pub fn free_cells(&self, zone: Zone) -> &FreeCells {
        match zone {
            Zone::Jungle => &self.jungle_free,
            Zone::Steppe => &self.steppe_free,
        }
    }

    pub fn is_free(&self, position: Position) -> bool {
        self.contains(position) && self.free_cells(self.zone_of(position)).contains(self.index(position))
    }

    pub fn cell(&self, position: Position) -> Option<&Cell> {
        if !self.contains(position) {
            return None;
        }
        self.cells.get(self.index(position))
    }

    pub fn place_element(&mut self, occupant: Occupant) {
        let position = occupant.position();
        if !self.contains(position) {
            log::warn!("Ignoring occupant placed off the map at {}", position);
            return;
        }

        let index = self.index(position);
        self.free_cells_mut(position).remove(index);

        match occupant {
            Occupant::Grass(grass) => {
                if self.cells[index].put_grass(grass).is_none() {
                    self.grass_count += 1;
                }
            }
            Occupant::Animal(animal) => {
                self.cells[index].add_animal(animal.id);
                self.genotypes.add(&animal.genome);
                if let Some(previous) = self.animals.insert(animal.id, animal) {
                    log::warn!("Animal {} placed twice", previous.id);
                    self.genotypes.remove(&previous.genome);
                    if previous.position() != position {
                        let old_index = self.index(previous.position());
                        self.cells[old_index].remove_animal(previous.id);
                        self.release_if_empty(previous.position());
                    }
                }
            }
        }
    }

    pub fn remove_element(&mut self, target: OccupantRef, position: Position) -> Option<Occupant> {
        if !self.contains(position) {
            return None;
        }

        let index = self.index(position);
        let removed = match target {
            OccupantRef::Grass => self.cells[index].take_grass().map(|grass| {
                self.grass_count -= 1;
                Occupant::Grass(grass)
            }),
            OccupantRef::Animal(id) => {
                if !self.cells[index].remove_animal(id) {
                    return None;
                }
                self.animals.remove(&id).map(|animal| {
                    self.genotypes.remove(&animal.genome);
                    Occupant::Animal(animal)
                })
            }
        };

        self.release_if_empty(position);
        removed
    }

    fn release_if_empty(&mut self, position: Position) {
        let index = self.index(position);
        if self.cells[index].is_empty() {
            self.free_cells_mut(position).insert(index, position);
        }
    }

    // Moves an animal to `to`, keeping occupancy and free-cell bookkeeping
    // in step. Returns false for unknown animals or off-map targets.
    pub fn position_changed(&mut self, id: AnimalId, to: Position) -> bool {
        if !self.contains(to) {
            return false;
        }
        let Some(from) = self.animals.get(&id).map(Animal::position) else {
            return false;
        };
        if from == to {
            return true;
        }

        match self.remove_element(OccupantRef::Animal(id), from) {
            Some(Occupant::Animal(mut animal)) => {
                animal.set_position(to);
                self.place_element(Occupant::Animal(animal));
                true
            }
            Some(other) => {
                self.place_element(other);
                false
            }
            None => false,
        }
    }

    pub fn animal(&self, id: AnimalId) -> Option<&Animal> {
        self.animals.get(&id)
    }

    pub fn animal_mut(&mut self, id: AnimalId) -> Option<&mut Animal> {
        self.animals.get_mut(&id)
    }

    pub fn with_pair_mut<T>(
        &mut self,
        first: AnimalId,
        second: AnimalId,
        f: impl FnOnce(&mut Animal, &mut Animal) -> T,
    ) -> Option<T> {
        if first == second {
            return None;
        }
        let mut a = self.animals.remove(&first)?;
        let result = self.animals.get_mut(&second).map(|b| f(&mut a, b));
        self.animals.insert(first, a);
        result
    }

    pub fn animals(&self) -> impl Iterator<Item = &Animal> {
        self.animals.values()
    }

    pub fn animal_ids(&self) -> Vec<AnimalId> {
        self.animals.keys().copied().collect()
    }

    pub fn animal_count(&self) -> usize {
        self.animals.len()
    }

    pub fn grass_count(&self) -> usize {
        self.grass_count
    }

    pub fn has_grass(&self, position: Position) -> bool {
        self.cell(position).map(Cell::has_grass).unwrap_or(false)
    }

    pub fn grass_at(&self, position: Position) -> Option<&Grass> {
        self.cell(position).and_then(Cell::grass)
    }

    pub fn grasses(&self) -> impl Iterator<Item = &Grass> {
        self.cells.iter().filter_map(Cell::grass)
    }

    pub fn occupants_at(&self, position: Position) -> Vec<OccupantRef> {
        let Some(cell) = self.cell(position) else {
            return Vec::new();
        };
        cell.grass()
            .map(|_| OccupantRef::Grass)
            .into_iter()
            .chain(cell.animals().iter().map(|&id| OccupantRef::Animal(id)))
            .collect()
    }

    pub fn animals_at(&self, position: Position) -> Vec<&Animal> {
        self.cell(position)
            .map(|cell| cell.animals().iter().filter_map(|id| self.animals.get(id)).collect())
            .unwrap_or_default()
    }

    // Animals on `position` sorted by energy. The sort is stable, so equal
    // energies keep arrival order in both directions.
    pub fn animals_sorted_by_energy(&self, position: Position, order: EnergyOrder) -> Vec<&Animal> {
        let mut animals = self.animals_at(position);
        match order {
            EnergyOrder::Ascending => animals.sort_by(|a, b| a.energy().total_cmp(&b.energy())),
            EnergyOrder::Descending => animals.sort_by(|a, b| b.energy().total_cmp(&a.energy())),
        }
        animals
    }

    pub fn crowded_positions(&self, min_animals: usize, min_energy: f64) -> Vec<(Position, Vec<AnimalId>)> {
        let mut result = Vec::new();
        for (index, cell) in self.cells.iter().enumerate() {
            if cell.animal_count() < min_animals {
                continue;
            }
            let eligible: Vec<AnimalId> = cell
                .animals()
                .iter()
                .copied()
                .filter(|id| self.animals.get(id).map(|a| a.energy() >= min_energy).unwrap_or(false))
                .collect();
            if eligible.len() >= min_animals {
                result.push((self.position_of(index), eligible));
            }
        }
        result
    }

    pub fn positions_without_animals(&self) -> Vec<Position> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.animal_count() == 0)
            .map(|(index, _)| self.position_of(index))
            .collect()
    }

    fn position_of(&self, index: usize) -> Position {
        Position::new((index % self.width) as i32, (index / self.width) as i32)
    }

    pub fn genotypes(&self) -> &GenotypeTable {
        &self.genotypes
    }

    pub fn dominant_genome(&self) -> Option<&Genome> {
        self.genotypes.dominant().map(|(genome, _)| genome)
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let map = self;
        let mut free_total = 0;
        for y in 0..map.height() as i32 {
            for x in 0..map.width() as i32 {
                let pos = Position::new(x, y);
                let index = map.index(pos);
                let empty = map.cell(pos).unwrap().is_empty();
                let in_jungle = map.jungle_free.contains(index);
                let in_steppe = map.steppe_free.contains(index);

                assert!(!(in_jungle && in_steppe), "{} is free in both zones", pos);
                assert_eq!(in_jungle || in_steppe, empty, "free-set mismatch at {}", pos);
                if in_jungle {
                    assert!(map.is_in_jungle(pos));
                }
                if in_steppe {
                    assert!(!map.is_in_jungle(pos));
                }
                if empty {
                    free_total += 1;
                }
            }
        }
        assert_eq!(free_total, map.jungle_free.len() + map.steppe_free.len());

        let mut expected: std::collections::HashMap<&Genome, usize> = std::collections::HashMap::new();
        for a in map.animals() {
            *expected.entry(&a.genome).or_default() += 1;
            assert!(map.cell(a.position()).unwrap().animals().contains(&a.id));
        }
        assert_eq!(expected.len(), map.genotypes().distinct());
        for (genome, count) in expected {
            assert_eq!(map.genotypes().count(genome), count);
        }

        assert_eq!(map.grass_count(), map.grasses().count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animal::genome::GENOME_LENGTH;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn animal(id: AnimalId, x: i32, y: i32, energy: f64, code: u8) -> Animal {
        let genome = Genome::from_genes(&[code; GENOME_LENGTH]).unwrap();
        Animal::new(id, Position::new(x, y), Direction::North, genome, energy, 0)
    }

    #[test]
    fn test_map_creation() {
        let map = WorldMap::new(10, 10, 0.4, Boundary::Bounded);
        assert_eq!(map.jungle_bounds(), (Position::new(3, 3), Position::new(6, 6)));
        assert_eq!(map.free_cells(Zone::Jungle).len(), 16);
        assert_eq!(map.free_cells(Zone::Steppe).len(), 84);
        map.assert_consistent();
    }

    #[test]
    fn test_jungle_extremes() {
        let none = WorldMap::new(10, 10, 0.0, Boundary::Wrap);
        assert_eq!(none.free_cells(Zone::Jungle).len(), 0);
        assert!(!none.is_in_jungle(Position::new(5, 5)));

        let all = WorldMap::new(10, 10, 1.0, Boundary::Wrap);
        assert_eq!(all.free_cells(Zone::Steppe).len(), 0);
        assert!(all.is_in_jungle(Position::new(0, 9)));
    }

    #[test]
    fn test_place_and_remove_animal() {
        let mut map = WorldMap::new(5, 5, 0.2, Boundary::Bounded);
        let pos = Position::new(1, 1);

        map.place_element(Occupant::Animal(animal(1, 1, 1, 10.0, 0)));
        map.place_element(Occupant::Animal(animal(2, 1, 1, 10.0, 0)));
        assert!(!map.is_free(pos));
        assert_eq!(map.animal_count(), 2);
        assert_eq!(map.genotypes().distinct(), 1);
        map.assert_consistent();

        assert!(map.remove_element(OccupantRef::Animal(1), pos).is_some());
        assert!(!map.is_free(pos));
        assert!(map.remove_element(OccupantRef::Animal(2), pos).is_some());
        assert!(map.is_free(pos));
        assert_eq!(map.genotypes().distinct(), 0);
        assert!(map.remove_element(OccupantRef::Animal(2), pos).is_none());
        map.assert_consistent();
    }

    #[test]
    fn test_grass_keeps_cell_occupied() {
        let mut map = WorldMap::new(5, 5, 0.2, Boundary::Bounded);
        let pos = Position::new(0, 4);

        map.place_element(Occupant::Grass(Grass::new(pos, 30.0)));
        map.place_element(Occupant::Animal(animal(1, 0, 4, 10.0, 0)));
        map.remove_element(OccupantRef::Animal(1), pos);

        assert!(!map.is_free(pos));
        assert!(map.has_grass(pos));
        assert_eq!(map.grass_count(), 1);

        map.remove_element(OccupantRef::Grass, pos);
        assert!(map.is_free(pos));
        assert_eq!(map.grass_count(), 0);
        map.assert_consistent();
    }

    #[test]
    fn test_position_changed_moves_bookkeeping() {
        let mut map = WorldMap::new(5, 5, 0.2, Boundary::Wrap);
        map.place_element(Occupant::Animal(animal(1, 0, 0, 10.0, 0)));

        assert!(map.position_changed(1, Position::new(4, 0)));
        assert!(map.is_free(Position::new(0, 0)));
        assert!(!map.is_free(Position::new(4, 0)));
        assert_eq!(map.animal(1).unwrap().position(), Position::new(4, 0));
        assert_eq!(map.genotypes().count(&map.animal(1).unwrap().genome), 1);

        assert!(!map.position_changed(1, Position::new(5, 0)));
        assert!(!map.position_changed(99, Position::new(1, 0)));
        map.assert_consistent();
    }

    #[test]
    fn test_sorted_animals_and_ties() {
        let mut map = WorldMap::new(5, 5, 0.2, Boundary::Wrap);
        map.place_element(Occupant::Animal(animal(1, 2, 2, 30.0, 0)));
        map.place_element(Occupant::Animal(animal(2, 2, 2, 10.0, 1)));
        map.place_element(Occupant::Animal(animal(3, 2, 2, 30.0, 2)));

        let asc: Vec<_> = map
            .animals_sorted_by_energy(Position::new(2, 2), EnergyOrder::Ascending)
            .iter()
            .map(|a| a.id)
            .collect();
        let desc: Vec<_> = map
            .animals_sorted_by_energy(Position::new(2, 2), EnergyOrder::Descending)
            .iter()
            .map(|a| a.id)
            .collect();

        assert_eq!(asc, vec![2, 1, 3]);
        assert_eq!(desc, vec![1, 3, 2]);
    }

    #[test]
    fn test_crowded_positions_filter_on_energy() {
        let mut map = WorldMap::new(5, 5, 0.2, Boundary::Wrap);
        map.place_element(Occupant::Animal(animal(1, 0, 0, 120.0, 0)));
        map.place_element(Occupant::Animal(animal(2, 0, 0, 100.0, 0)));
        map.place_element(Occupant::Animal(animal(3, 3, 3, 150.0, 0)));
        map.place_element(Occupant::Animal(animal(4, 3, 3, 50.0, 0)));

        let crowded = map.crowded_positions(2, 100.0);
        assert_eq!(crowded, vec![(Position::new(0, 0), vec![1, 2])]);

        let empty = map.positions_without_animals();
        assert_eq!(empty.len(), 23);
        assert!(!empty.contains(&Position::new(3, 3)));
    }

    #[test]
    fn test_with_pair_mut() {
        let mut map = WorldMap::new(5, 5, 0.2, Boundary::Wrap);
        map.place_element(Occupant::Animal(animal(1, 0, 0, 10.0, 0)));
        map.place_element(Occupant::Animal(animal(2, 0, 0, 20.0, 0)));

        let total = map.with_pair_mut(1, 2, |a, b| a.energy() + b.energy());
        assert_eq!(total, Some(30.0));
        assert_eq!(map.with_pair_mut(1, 1, |_, _| ()), None);
        assert_eq!(map.with_pair_mut(1, 7, |_, _| ()), None);
        assert_eq!(map.animal_count(), 2);
    }

    #[test]
    fn test_dominant_genome() {
        let mut map = WorldMap::new(5, 5, 0.2, Boundary::Wrap);
        assert!(map.dominant_genome().is_none());

        map.place_element(Occupant::Animal(animal(1, 0, 0, 10.0, 6)));
        map.place_element(Occupant::Animal(animal(2, 1, 0, 10.0, 2)));
        map.place_element(Occupant::Animal(animal(3, 2, 0, 10.0, 2)));

        assert_eq!(map.dominant_genome().unwrap().genes()[0], 2);
    }

    #[derive(Debug, Clone)]
    enum Op {
        PlaceAnimal(i32, i32, u8),
        PlaceGrass(i32, i32),
        Move(usize, i32, i32),
        RemoveAnimal(usize),
        EatGrass(i32, i32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..6i32, 0..6i32, 0..3u8).prop_map(|(x, y, c)| Op::PlaceAnimal(x, y, c)),
            (0..6i32, 0..6i32).prop_map(|(x, y)| Op::PlaceGrass(x, y)),
            (0..20usize, 0..6i32, 0..6i32).prop_map(|(i, x, y)| Op::Move(i, x, y)),
            (0..20usize).prop_map(Op::RemoveAnimal),
            (0..6i32, 0..6i32).prop_map(|(x, y)| Op::EatGrass(x, y)),
        ]
    }

    proptest! {
        #[test]
        fn bookkeeping_survives_random_operations(ops in proptest::collection::vec(op(), 1..60)) {
            let mut map = WorldMap::new(6, 6, 0.5, Boundary::Wrap);
            let mut next_id = 0;

            for op in ops {
                match op {
                    Op::PlaceAnimal(x, y, code) => {
                        map.place_element(Occupant::Animal(animal(next_id, x, y, 10.0, code)));
                        next_id += 1;
                    }
                    Op::PlaceGrass(x, y) => {
                        map.place_element(Occupant::Grass(Grass::new(Position::new(x, y), 5.0)));
                    }
                    Op::Move(i, x, y) => {
                        let ids = map.animal_ids();
                        if !ids.is_empty() {
                            map.position_changed(ids[i % ids.len()], Position::new(x, y));
                        }
                    }
                    Op::RemoveAnimal(i) => {
                        let ids = map.animal_ids();
                        if !ids.is_empty() {
                            let id = ids[i % ids.len()];
                            let pos = map.animal(id).unwrap().position();
                            map.remove_element(OccupantRef::Animal(id), pos);
                        }
                    }
                    Op::EatGrass(x, y) => {
                        map.remove_element(OccupantRef::Grass, Position::new(x, y));
                    }
                }
            }

            map.assert_consistent();
        }
    }

    #[test]
    fn test_grass_growing_uses_free_cells_only() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let mut map = WorldMap::new(4, 4, 0.5, Boundary::Bounded);

        for _ in 0..40 {
            map.grass_growing(10.0, &mut rng);
            map.assert_consistent();
        }
        assert_eq!(map.grass_count(), 16);
        assert!(map.free_cells(Zone::Jungle).is_empty());
        assert!(map.free_cells(Zone::Steppe).is_empty());
    }
}
