use crate::animal::Animal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetrics {
    pub day: u64,
    pub population: usize,
    pub grass: usize,
    pub total_energy: f64,
    pub avg_energy: f64,
    pub avg_lifetime: f64,
    pub avg_children: f64,
    pub total_births: u64,
    pub total_deaths: u64,
    pub magic_born: u32,
    pub distinct_genotypes: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineCounters {
    pub day: u64,
    pub grass: usize,
    pub total_births: u64,
    pub magic_born: u32,
    pub distinct_genotypes: usize,
}

impl SimulationMetrics {
    // Averages over an empty population are reported as 0.
    pub fn compute<'a, I>(animals: I, counters: EngineCounters, lifetimes: &LifetimeTracker) -> Self
    where
        I: IntoIterator<Item = &'a Animal>,
    {
        let mut population = 0usize;
        let mut total_energy = 0.0;
        let mut total_children = 0u64;
        for animal in animals {
            population += 1;
            total_energy += animal.energy();
            total_children += u64::from(animal.children());
        }

        let (avg_energy, avg_children) = if population == 0 {
            (0.0, 0.0)
        } else {
            (
                total_energy / population as f64,
                total_children as f64 / population as f64,
            )
        };

        Self {
            day: counters.day,
            population,
            grass: counters.grass,
            total_energy,
            avg_energy,
            avg_lifetime: lifetimes.average(),
            avg_children,
            total_births: counters.total_births,
            total_deaths: lifetimes.deaths(),
            magic_born: counters.magic_born,
            distinct_genotypes: counters.distinct_genotypes,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LifetimeTracker {
    deaths: u64,
    average: f64,
}

impl LifetimeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, age: u64) {
        self.deaths += 1;
        let n = self.deaths as f64;
        self.average = self.average * (n - 1.0) / n + age as f64 / n;
    }

    pub fn deaths(&self) -> u64 {
        self.deaths
    }

    pub fn average(&self) -> f64 {
        self.average
    }
}
