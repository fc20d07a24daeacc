use super::genome::Genome;
use super::{Animal, AnimalId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Fate {
    Alive,
    Died { day: u64 },
}

impl fmt::Display for Fate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fate::Alive => f.write_str("is alive"),
            Fate::Died { day } => write!(f, "{}", day),
        }
    }
}

/// Every flagged animal reachable from `root` through recorded children,
/// `root` excluded. `lookup` must resolve both living and archived animals.
pub fn collect_descendants<'a, F>(root: &Animal, lookup: F) -> BTreeSet<AnimalId>
where
    F: Fn(AnimalId) -> Option<&'a Animal>,
{
    let mut visited = BTreeSet::new();
    let mut flagged = BTreeSet::new();
    let mut stack: Vec<AnimalId> = root.observed_children().to_vec();

    while let Some(id) = stack.pop() {
        if id == root.id || !visited.insert(id) {
            continue;
        }
        // an unflagged animal ends its branch
        if let Some(animal) = lookup(id).filter(|animal| animal.is_observed()) {
            flagged.insert(id);
            stack.extend_from_slice(animal.observed_children());
        }
    }

    flagged
}

#[derive(Debug, Clone, Default)]
pub struct LineageArchive {
    retired: BTreeMap<AnimalId, Animal>,
}

impl LineageArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retire(&mut self, animal: Animal) {
        self.retired.insert(animal.id, animal);
    }

    pub fn get(&self, id: AnimalId) -> Option<&Animal> {
        self.retired.get(&id)
    }

    pub fn take(&mut self, id: AnimalId) -> Option<Animal> {
        self.retired.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.retired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retired.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedReport {
    pub id: AnimalId,
    pub genome: Genome,
    pub energy: f64,
    pub children_since_observed: usize,
    pub descendants: usize,
    pub fate: Fate,
}

impl ObservedReport {
    pub fn new(animal: &Animal, descendants: usize) -> Self {
        Self {
            id: animal.id,
            genome: animal.genome.clone(),
            energy: animal.energy(),
            children_since_observed: animal.observed_children().len(),
            descendants,
            fate: animal.fate(),
        }
    }
}
