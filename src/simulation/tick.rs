use super::SimulationEngine;
use crate::animal::{Animal, AnimalId};
use crate::world::{EnergyOrder, Occupant, OccupantRef};
use rand::seq::SliceRandom;

pub const MAGIC_BORN_LIMIT: u32 = 3;
pub const MAGIC_BORN_POPULATION: usize = 5;

impl SimulationEngine {
    /// Advances the world by one day. Returns false once the engine has
    /// terminated, either by request or because no animals are left.
    pub fn tick(&mut self) -> bool {
        if self.terminated {
            return false;
        }
        if self.map.animal_count() == 0 {
            log::info!("{} map: all animals died by day {}", self.boundary(), self.day);
            self.request_termination();
            return false;
        }

        self.remove_dead_animals();
        self.move_animals();
        self.eat_grass();
        self.reproduce();
        self.map.grass_growing(self.settings.grass_energy, &mut self.rng);
        self.day += 1;

        log::trace!(
            "{} map day {}: {} animals, {} grass",
            self.boundary(),
            self.day,
            self.living_count(),
            self.map.grass_count()
        );
        true
    }

    fn remove_dead_animals(&mut self) {
        for id in std::mem::take(&mut self.dead) {
            let Some(position) = self.map.animal(id).map(Animal::position) else {
                continue;
            };
            if let Some(Occupant::Animal(animal)) =
                self.map.remove_element(OccupantRef::Animal(id), position)
            {
                self.lifetimes.record(animal.age());
                if animal.is_observed() {
                    self.archive.retire(animal);
                }
            }
        }
    }

    // Animals that cannot pay for a move are flagged and stay put until
    // the next cleanup.
    fn move_animals(&mut self) {
        let move_energy = self.settings.move_energy;
        let (boundary, width, height) = (self.map.boundary(), self.map.width(), self.map.height());

        for id in self.map.animal_ids() {
            let Some(animal) = self.map.animal_mut(id) else {
                continue;
            };
            if !animal.can_move(move_energy) {
                animal.mark_dead();
                self.dead.insert(id);
                continue;
            }

            let Some(target) = animal.plan_move(move_energy, boundary, width, height, &mut self.rng) else {
                continue;
            };
            self.map.position_changed(id, target);
            if self.map.has_grass(target) {
                self.feeding.insert(target);
            }
        }
    }

    fn eat_grass(&mut self) {
        for position in std::mem::take(&mut self.feeding) {
            let Some(grass_energy) = self.map.grass_at(position).map(|grass| grass.energy) else {
                continue;
            };

            let eaters: Vec<AnimalId> = {
                let candidates: Vec<&Animal> = self
                    .map
                    .animals_sorted_by_energy(position, EnergyOrder::Descending)
                    .into_iter()
                    .filter(|animal| !self.dead.contains(&animal.id))
                    .collect();
                let Some(strongest) = candidates.first().map(|animal| animal.energy()) else {
                    continue;
                };
                candidates
                    .iter()
                    .take_while(|animal| animal.energy() == strongest)
                    .map(|animal| animal.id)
                    .collect()
            };

            let share = grass_energy / eaters.len() as f64;
            for id in eaters {
                if let Some(animal) = self.map.animal_mut(id) {
                    animal.gain_energy(share);
                }
            }
            self.map.remove_element(OccupantRef::Grass, position);
        }
    }

    fn reproduce(&mut self) {
        let threshold = self.settings.reproduction_threshold();

        for (position, eligible) in self.map.crowded_positions(2, threshold) {
            let mut parents: Vec<&Animal> = eligible
                .iter()
                .filter(|id| !self.dead.contains(id))
                .filter_map(|&id| self.map.animal(id))
                .collect();
            if parents.len() < 2 {
                continue;
            }
            parents.sort_by(|a, b| b.energy().total_cmp(&a.energy()));
            let (dad, mom) = (parents[0].id, parents[1].id);

            let child_id = self.allocate_id();
            let birth_day = self.day;
            let rng = &mut self.rng;
            let Some(mut child) = self
                .map
                .with_pair_mut(dad, mom, |dad, mom| Animal::mate(dad, mom, child_id, birth_day, rng))
            else {
                continue;
            };

            self.record_observed_birth(dad, mom, &mut child);
            log::trace!("Animal {} born at {} to {} and {}", child_id, position, dad, mom);
            self.map.place_element(Occupant::Animal(child));
            self.total_births += 1;
        }

        if self.settings.magic_born
            && self.magic_born < MAGIC_BORN_LIMIT
            && self.living_count() == MAGIC_BORN_POPULATION
        {
            self.magic_birth();
        }
    }

    fn record_observed_birth(&mut self, dad: AnimalId, mom: AnimalId, child: &mut Animal) {
        for parent in [dad, mom] {
            if let Some(parent) = self.map.animal_mut(parent).filter(|p| p.is_observed()) {
                parent.record_observed_child(child.id);
                child.set_observed(true);
            }
        }
    }

    fn magic_birth(&mut self) {
        let sources: Vec<AnimalId> = self.living_animals().map(|animal| animal.id).collect();
        let mut cells = self.map.positions_without_animals();
        let amount = sources.len().min(cells.len());
        let (chosen, _) = cells.partial_shuffle(&mut self.rng, amount);
        let chosen = chosen.to_vec();

        for (source, position) in sources.into_iter().zip(chosen) {
            let Some(source) = self.map.animal(source) else {
                continue;
            };
            let id = self.next_animal_id;
            let clone = Animal::magic_clone(source, id, position, self.settings.start_energy, self.day);
            self.next_animal_id += 1;
            self.map.place_element(Occupant::Animal(clone));
        }

        self.magic_born += 1;
        log::info!(
            "{} map: magic birth #{} on day {} placed {} clones",
            self.boundary(),
            self.magic_born,
            self.day,
            amount
        );
    }
}
