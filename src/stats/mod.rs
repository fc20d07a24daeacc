pub mod metrics;

pub use metrics::{EngineCounters, LifetimeTracker, SimulationMetrics};
