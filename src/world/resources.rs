use super::{Grass, Occupant, WorldMap, Zone};
use rand::Rng;

impl WorldMap {
    // Grows one grass in each zone that still has a free cell. The cell is
    // drawn uniformly from that zone's free cells.
    pub fn grass_growing<R: Rng + ?Sized>(&mut self, energy: f64, rng: &mut R) -> usize {
        let mut grown = 0;
        for zone in [Zone::Jungle, Zone::Steppe] {
            if let Some(position) = self.free_cells(zone).choose(rng) {
                self.place_element(Occupant::Grass(Grass::new(position, energy)));
                grown += 1;
            }
        }
        grown
    }

    pub fn grass_energy(&self) -> f64 {
        self.grasses().map(|g| g.energy).sum()
    }
}
