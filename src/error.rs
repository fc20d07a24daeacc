use crate::animal::AnimalId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("map dimensions must be positive, got {width}x{height}")]
    EmptyMap { width: usize, height: usize },

    #[error("jungle ratio must be between 0 and 1, got {0}")]
    JungleRatio(f64),

    #[error("{name} must be a finite, non-negative number, got {value}")]
    Energy { name: &'static str, value: f64 },

    #[error("{animals} starting animals do not fit on {cells} cells")]
    Overcrowded { animals: usize, cells: usize },

    #[error("at least one map must be configured")]
    NoMaps,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenomeError {
    #[error("genome must have exactly {expected} genes, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("gene {value} at index {index} is outside 0..=7")]
    GeneOutOfRange { index: usize, value: u8 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error("the simulation must be paused first")]
    NotPaused,

    #[error("the simulation has terminated")]
    Terminated,

    #[error("no animal with id {0}")]
    UnknownAnimal(AnimalId),
}
