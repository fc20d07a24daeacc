use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn precedes(&self, other: &Position) -> bool {
        self.x <= other.x && self.y <= other.y
    }

    pub fn follows(&self, other: &Position) -> bool {
        self.x >= other.x && self.y >= other.y
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, other: Position) -> Position {
        Position::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, other: Position) -> Position {
        Position::new(self.x - other.x, self.y - other.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    pub fn from_index(index: u8) -> Self {
        Self::ALL[(index % 8) as usize]
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn rotate(self, steps: u8) -> Self {
        Self::from_index((self.index() + steps % 8) % 8)
    }

    pub fn to_unit(self) -> Position {
        match self {
            Direction::North => Position::new(0, 1),
            Direction::NorthEast => Position::new(1, 1),
            Direction::East => Position::new(1, 0),
            Direction::SouthEast => Position::new(1, -1),
            Direction::South => Position::new(0, -1),
            Direction::SouthWest => Position::new(-1, -1),
            Direction::West => Position::new(-1, 0),
            Direction::NorthWest => Position::new(-1, 1),
        }
    }
}
