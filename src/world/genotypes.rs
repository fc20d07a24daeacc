use crate::animal::genome::Genome;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct Entry {
    count: usize,
    first_seen: u64,
}

/// Number of living animals carrying each genome.
///
/// Ties for the most frequent genome go to the one that entered the table
/// first. A genome whose count drops to zero is forgotten and re-enters as
/// new.
#[derive(Debug, Clone, Default)]
pub struct GenotypeTable {
    entries: HashMap<Genome, Entry>,
    next_sequence: u64,
}

impl GenotypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, genome: &Genome) {
        if let Some(entry) = self.entries.get_mut(genome) {
            entry.count += 1;
            return;
        }
        self.entries.insert(
            genome.clone(),
            Entry {
                count: 1,
                first_seen: self.next_sequence,
            },
        );
        self.next_sequence += 1;
    }

    pub fn remove(&mut self, genome: &Genome) {
        let Some(entry) = self.entries.get_mut(genome) else {
            log::warn!("Removing untracked genome {}", genome);
            return;
        };
        entry.count -= 1;
        if entry.count == 0 {
            self.entries.remove(genome);
        }
    }

    pub fn count(&self, genome: &Genome) -> usize {
        self.entries.get(genome).map(|e| e.count).unwrap_or(0)
    }

    pub fn distinct(&self) -> usize {
        self.entries.len()
    }

    pub fn dominant(&self) -> Option<(&Genome, usize)> {
        self.entries
            .iter()
            .min_by(|(_, a), (_, b)| b.count.cmp(&a.count).then(a.first_seen.cmp(&b.first_seen)))
            .map(|(genome, entry)| (genome, entry.count))
    }
}
