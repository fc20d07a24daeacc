use super::genome::Genome;
use super::{Animal, AnimalId};
use crate::world::{Direction, Position};
use rand::Rng;

impl Animal {
    pub fn mate<R: Rng + ?Sized>(
        dad: &mut Animal,
        mom: &mut Animal,
        child_id: AnimalId,
        birth_day: u64,
        rng: &mut R,
    ) -> Animal {
        let genome = Genome::crossover(&dad.genome, dad.energy(), &mom.genome, mom.energy(), rng);
        let heading = Direction::from_index(rng.gen_range(0..8));

        let energy = dad.metabolism.give_to_child() + mom.metabolism.give_to_child();
        dad.increment_children();
        mom.increment_children();

        Animal::new(child_id, dad.position(), heading, genome, energy, birth_day)
    }

    pub fn magic_clone(
        source: &Animal,
        child_id: AnimalId,
        position: Position,
        energy: f64,
        birth_day: u64,
    ) -> Animal {
        Animal::new(
            child_id,
            position,
            source.heading(),
            source.genome.clone(),
            energy,
            birth_day,
        )
    }
}
