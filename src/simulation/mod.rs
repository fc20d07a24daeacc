pub mod control;
pub mod observer;
pub mod tick;

use crate::animal::genome::Genome;
use crate::animal::lineage::{self, LineageArchive, ObservedReport};
use crate::animal::{Animal, AnimalId};
use crate::config::Config;
use crate::error::ControlError;
use crate::stats::{EngineCounters, LifetimeTracker, SimulationMetrics};
use crate::world::{Boundary, Occupant, Position, WorldMap};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub start_energy: f64,
    pub move_energy: f64,
    pub grass_energy: f64,
    pub magic_born: bool,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            start_energy: config.animal.start_energy,
            move_energy: config.animal.move_energy,
            grass_energy: config.grass.energy,
            magic_born: config.simulation.magic_born,
        }
    }

    pub fn reproduction_threshold(&self) -> f64 {
        self.start_energy / 2.0
    }
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub boundary: Boundary,
    pub map: WorldMap,
    pub metrics: SimulationMetrics,
    pub dominant_genome: Option<Genome>,
    pub observed: Option<ObservedReport>,
}

impl Snapshot {
    // Animals flagged as dead during the day are still on the map until
    // the next cleanup and are skipped here.
    pub fn living_animals(&self) -> impl Iterator<Item = &Animal> {
        self.map.animals().filter(|animal| animal.is_alive())
    }
}

#[derive(Debug)]
pub struct SimulationEngine {
    map: WorldMap,
    rng: ChaCha8Rng,
    settings: EngineSettings,
    dead: BTreeSet<AnimalId>,
    feeding: BTreeSet<Position>,
    day: u64,
    next_animal_id: AnimalId,
    total_births: u64,
    lifetimes: LifetimeTracker,
    magic_born: u32,
    archive: LineageArchive,
    observed: Option<AnimalId>,
    terminated: bool,
}

impl SimulationEngine {
    pub fn new(config: &Config, boundary: Boundary, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let map = WorldMap::new(
            config.world.width,
            config.world.height,
            config.world.jungle_ratio,
            boundary,
        );
        let mut engine = Self::with_map(map, EngineSettings::from_config(config), rng);
        engine.populate(config.animal.initial_population);
        engine
    }

    pub fn with_map(map: WorldMap, settings: EngineSettings, rng: ChaCha8Rng) -> Self {
        let next_animal_id = map.animal_ids().last().map(|id| id + 1).unwrap_or(0);
        Self {
            map,
            rng,
            settings,
            dead: BTreeSet::new(),
            feeding: BTreeSet::new(),
            day: 0,
            next_animal_id,
            total_births: 0,
            lifetimes: LifetimeTracker::new(),
            magic_born: 0,
            archive: LineageArchive::new(),
            observed: None,
            terminated: false,
        }
    }

    fn populate(&mut self, count: usize) {
        let mut cells = self.map.positions_without_animals();
        cells.retain(|&position| self.map.is_free(position));
        if count > cells.len() {
            log::warn!(
                "Only {} free cells for {} starting animals",
                cells.len(),
                count
            );
        }

        let amount = count.min(cells.len());
        let (chosen, _) = cells.partial_shuffle(&mut self.rng, amount);
        for position in chosen.to_vec() {
            let id = self.allocate_id();
            let animal = Animal::random(id, position, self.settings.start_energy, self.day, &mut self.rng);
            self.map.place_element(Occupant::Animal(animal));
        }

        log::debug!("Placed {} starting animals on a {} map", amount, self.map.boundary());
    }

    fn allocate_id(&mut self) -> AnimalId {
        let id = self.next_animal_id;
        self.next_animal_id += 1;
        id
    }

    pub fn map(&self) -> &WorldMap {
        &self.map
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn boundary(&self) -> Boundary {
        self.map.boundary()
    }

    pub fn day(&self) -> u64 {
        self.day
    }

    pub fn magic_born_count(&self) -> u32 {
        self.magic_born
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn request_termination(&mut self) {
        if !self.terminated {
            log::info!("{} simulation terminated on day {}", self.boundary(), self.day);
        }
        self.terminated = true;
    }

    pub fn is_marked_dead(&self, id: AnimalId) -> bool {
        self.dead.contains(&id)
    }

    pub fn living_animals(&self) -> impl Iterator<Item = &Animal> {
        self.map.animals().filter(|animal| !self.dead.contains(&animal.id))
    }

    pub fn living_count(&self) -> usize {
        self.map.animal_count() - self.dead.len()
    }

    pub fn metrics(&self) -> SimulationMetrics {
        let counters = EngineCounters {
            day: self.day,
            grass: self.map.grass_count(),
            total_births: self.total_births,
            magic_born: self.magic_born,
            distinct_genotypes: self.map.genotypes().distinct(),
        };
        SimulationMetrics::compute(self.living_animals(), counters, &self.lifetimes)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            boundary: self.boundary(),
            map: self.map.clone(),
            metrics: self.metrics(),
            dominant_genome: self.map.dominant_genome().cloned(),
            observed: self.observed_report(),
        }
    }

    fn lookup(&self, id: AnimalId) -> Option<&Animal> {
        self.map.animal(id).or_else(|| self.archive.get(id))
    }

    pub fn observed_animal(&self) -> Option<&Animal> {
        self.observed.and_then(|id| self.lookup(id))
    }

    pub fn observed_report(&self) -> Option<ObservedReport> {
        let root = self.observed_animal()?;
        let descendants = lineage::collect_descendants(root, |id| self.lookup(id));
        Some(ObservedReport::new(root, descendants.len()))
    }

    // Starts or stops observing one animal. Only one animal is observed at
    // a time; observing a new one releases the previous lineage.
    pub fn set_observed(&mut self, id: AnimalId, observed: bool) -> Result<(), ControlError> {
        if observed {
            if self.map.animal(id).is_none() {
                return Err(ControlError::UnknownAnimal(id));
            }
            if self.observed == Some(id) {
                return Ok(());
            }
            if let Some(previous) = self.observed.take() {
                self.release_lineage(previous);
            }
            if let Some(animal) = self.map.animal_mut(id) {
                animal.set_observed(true);
            }
            self.observed = Some(id);
            log::info!("Observing animal {}", id);
            return Ok(());
        }

        if self.lookup(id).is_none() {
            return Err(ControlError::UnknownAnimal(id));
        }
        self.release_lineage(id);
        if self.observed == Some(id) {
            self.observed = None;
            log::info!("Stopped observing animal {}", id);
        }
        Ok(())
    }

    fn release_lineage(&mut self, root: AnimalId) {
        let mut stack = vec![root];
        let mut seen = BTreeSet::new();

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(animal) = self.map.animal_mut(id) {
                stack.extend(animal.stop_observing());
            } else if let Some(mut animal) = self.archive.take(id) {
                stack.extend(animal.stop_observing());
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn archive(&self) -> &LineageArchive {
        &self.archive
    }

    #[cfg(test)]
    pub(crate) fn place_for_test(&mut self, animal: Animal) {
        self.next_animal_id = self.next_animal_id.max(animal.id + 1);
        self.map.place_element(Occupant::Animal(animal));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animal::genome::GENOME_LENGTH;
    use crate::world::Direction;

    fn settings() -> EngineSettings {
        EngineSettings {
            start_energy: 200.0,
            move_energy: 5.0,
            grass_energy: 30.0,
            magic_born: false,
        }
    }

    fn empty_engine() -> SimulationEngine {
        let map = WorldMap::new(5, 5, 0.2, Boundary::Wrap);
        SimulationEngine::with_map(map, settings(), ChaCha8Rng::seed_from_u64(4))
    }

    fn animal(id: AnimalId, x: i32, y: i32, energy: f64) -> Animal {
        let genome = Genome::from_genes(&[2; GENOME_LENGTH]).unwrap();
        Animal::new(id, Position::new(x, y), Direction::North, genome, energy, 0)
    }

    #[test]
    fn test_engine_creation() {
        let config = Config::default();
        let engine = SimulationEngine::new(&config, Boundary::Bounded, Some(7));

        assert_eq!(engine.day(), 0);
        assert_eq!(engine.map().animal_count(), 20);
        assert_eq!(engine.map().grass_count(), 0);
        assert!(!engine.is_terminated());

        // founders never share a cell
        let cells: BTreeSet<Position> = engine.map().animals().map(Animal::position).collect();
        assert_eq!(cells.len(), 20);
        assert!(engine.map().animals().all(|a| a.energy() == 200.0));
        assert_eq!(engine.settings().reproduction_threshold(), 100.0);
        engine.map().assert_consistent();
    }

    #[test]
    fn test_same_seed_same_world() {
        let config = Config::default();
        let a = SimulationEngine::new(&config, Boundary::Wrap, Some(99));
        let b = SimulationEngine::new(&config, Boundary::Wrap, Some(99));

        let layout = |engine: &SimulationEngine| -> Vec<(Position, Genome)> {
            engine.map().animals().map(|a| (a.position(), a.genome.clone())).collect()
        };
        assert_eq!(layout(&a), layout(&b));
    }

    #[test]
    fn test_overcrowded_population_is_capped() {
        let mut config = Config::default();
        config.world.width = 3;
        config.world.height = 3;
        config.animal.initial_population = 12;

        let engine = SimulationEngine::new(&config, Boundary::Wrap, Some(1));
        assert_eq!(engine.map().animal_count(), 9);
    }

    #[test]
    fn test_metrics_skip_animals_marked_dead() {
        let mut engine = empty_engine();
        engine.place_for_test(animal(0, 0, 0, 100.0));
        engine.place_for_test(animal(1, 1, 0, 50.0));
        engine.dead.insert(1);

        let metrics = engine.metrics();
        assert_eq!(metrics.population, 1);
        assert_eq!(metrics.avg_energy, 100.0);
        assert_eq!(engine.living_count(), 1);
    }

    #[test]
    fn test_observe_and_unobserve() {
        let mut engine = empty_engine();
        engine.place_for_test(animal(0, 0, 0, 100.0));

        assert_eq!(engine.set_observed(9, true), Err(ControlError::UnknownAnimal(9)));
        engine.set_observed(0, true).unwrap();
        assert!(engine.map().animal(0).unwrap().is_observed());

        let report = engine.observed_report().unwrap();
        assert_eq!(report.id, 0);
        assert_eq!(report.children_since_observed, 0);
        assert_eq!(report.descendants, 0);

        let energy_before = engine.metrics().total_energy;
        engine.set_observed(0, false).unwrap();
        assert!(!engine.map().animal(0).unwrap().is_observed());
        assert!(engine.observed_report().is_none());
        assert_eq!(engine.metrics().total_energy, energy_before);
        assert_eq!(engine.map().animal_count(), 1);
    }

    #[test]
    fn test_observing_another_animal_releases_previous_lineage() {
        let mut engine = empty_engine();
        engine.place_for_test(animal(0, 0, 0, 100.0));
        engine.place_for_test(animal(1, 2, 2, 100.0));

        engine.set_observed(0, true).unwrap();
        engine.set_observed(1, true).unwrap();

        assert!(!engine.map().animal(0).unwrap().is_observed());
        assert!(engine.map().animal(1).unwrap().is_observed());
        assert_eq!(engine.observed_animal().map(|a| a.id), Some(1));
    }

    #[test]
    fn test_snapshot_is_detached_from_engine() {
        let mut engine = empty_engine();
        engine.place_for_test(animal(0, 0, 0, 100.0));

        let snapshot = engine.snapshot();
        engine.place_for_test(animal(1, 1, 1, 100.0));

        assert_eq!(snapshot.map.animal_count(), 1);
        assert_eq!(snapshot.metrics.population, 1);
        assert_eq!(snapshot.boundary, Boundary::Wrap);
        assert_eq!(engine.map().animal_count(), 2);
    }
}
