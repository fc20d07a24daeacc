use super::position::Position;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    // Walls: each axis is clamped to `[0, dimension - 1]`.
    Bounded,
    // Torus: each axis wraps modulo the dimension.
    Wrap,
}

impl Boundary {
    pub fn resolve(self, raw: Position, width: usize, height: usize) -> Position {
        let (w, h) = (width as i32, height as i32);
        match self {
            Boundary::Bounded => Position::new(raw.x.clamp(0, w - 1), raw.y.clamp(0, h - 1)),
            Boundary::Wrap => Position::new(raw.x.rem_euclid(w), raw.y.rem_euclid(h)),
        }
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boundary::Bounded => f.write_str("bounded"),
            Boundary::Wrap => f.write_str("wrap"),
        }
    }
}
