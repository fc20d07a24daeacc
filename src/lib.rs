//! Animals with 32-gene genomes wander a grid, eat grass that regrows in a
//! jungle and a steppe, and reproduce when they meet. One engine runs per
//! boundary policy, each on its own worker thread.

pub mod animal;
pub mod config;
pub mod error;
pub mod server;
pub mod simulation;
pub mod stats;
pub mod world;

pub use config::Config;
pub use error::{Error, Result};
pub use simulation::{SimulationEngine, Snapshot};
