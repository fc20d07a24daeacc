use crate::error::GenomeError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const GENOME_LENGTH: usize = 32;
pub const GENE_CODES: u8 = 8;

/// Fixed-length list of movement instructions.
///
/// Code 0 steps forward, code 4 steps backward, every other code turns the
/// heading clockwise by that many eighths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Genome {
    genes: [u8; GENOME_LENGTH],
}

impl Genome {
    pub fn from_genes(genes: &[u8]) -> Result<Self, GenomeError> {
        if genes.len() != GENOME_LENGTH {
            return Err(GenomeError::Length {
                expected: GENOME_LENGTH,
                actual: genes.len(),
            });
        }
        if let Some((index, &value)) = genes.iter().enumerate().find(|&(_, &g)| g >= GENE_CODES) {
            return Err(GenomeError::GeneOutOfRange { index, value });
        }

        let mut array = [0u8; GENOME_LENGTH];
        array.copy_from_slice(genes);
        Ok(Self { genes: array })
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut genes = [0u8; GENOME_LENGTH];
        for gene in &mut genes {
            *gene = rng.gen_range(0..GENE_CODES);
        }
        genes.sort_unstable();
        Self { genes }
    }

    // Single-point crossover. The dad contributes a share of the genes
    // proportional to his share of the couple's energy; which parent
    // supplies the head of the genome is a coin flip.
    pub fn crossover<R: Rng + ?Sized>(
        dad: &Genome,
        dad_energy: f64,
        mom: &Genome,
        mom_energy: f64,
        rng: &mut R,
    ) -> Self {
        let dad_on_left = rng.gen_bool(0.5);
        Self::crossover_with_side(dad, dad_energy, mom, mom_energy, dad_on_left)
    }

    pub(crate) fn crossover_with_side(
        dad: &Genome,
        dad_energy: f64,
        mom: &Genome,
        mom_energy: f64,
        dad_on_left: bool,
    ) -> Self {
        let dad_genes = Self::dad_gene_count(dad_energy, mom_energy);
        let mut genes = [0u8; GENOME_LENGTH];

        if dad_on_left {
            genes[..dad_genes].copy_from_slice(&dad.genes[..dad_genes]);
            genes[dad_genes..].copy_from_slice(&mom.genes[dad_genes..]);
        } else {
            let split = GENOME_LENGTH - dad_genes;
            genes[..split].copy_from_slice(&mom.genes[..split]);
            genes[split..].copy_from_slice(&dad.genes[split..]);
        }

        Self { genes }
    }

    fn dad_gene_count(dad_energy: f64, mom_energy: f64) -> usize {
        let total = dad_energy + mom_energy;
        if total <= 0.0 || !total.is_finite() {
            return GENOME_LENGTH / 2;
        }
        let share = (dad_energy / total).clamp(0.0, 1.0);
        ((GENOME_LENGTH as f64 * share).round() as usize).min(GENOME_LENGTH)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u8 {
        self.genes[rng.gen_range(0..GENOME_LENGTH)]
    }

    pub fn genes(&self) -> &[u8] {
        &self.genes
    }
}

impl TryFrom<Vec<u8>> for Genome {
    type Error = GenomeError;

    fn try_from(genes: Vec<u8>) -> Result<Self, Self::Error> {
        Genome::from_genes(&genes)
    }
}

impl From<Genome> for Vec<u8> {
    fn from(genome: Genome) -> Self {
        genome.genes.to_vec()
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for gene in &self.genes {
            write!(f, "{}", gene)?;
        }
        Ok(())
    }
}
