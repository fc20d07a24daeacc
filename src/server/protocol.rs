use crate::animal::lineage::ObservedReport;
use crate::animal::Animal;
use crate::simulation::control::EngineState;
use crate::simulation::Snapshot;
use crate::stats::SimulationMetrics;
use crate::world::{Boundary, Position};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "update")]
    Update { engines: Vec<EngineUpdate> },
    #[serde(rename = "full_state")]
    FullState { engines: Vec<EngineFullState> },
    #[serde(rename = "error")]
    Error { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineUpdate {
    pub engine: usize,
    pub boundary: Boundary,
    pub state: EngineState,
    pub metrics: SimulationMetrics,
    pub animals: Vec<AnimalSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineFullState {
    pub engine: usize,
    pub boundary: Boundary,
    pub state: EngineState,
    pub metrics: SimulationMetrics,
    pub width: usize,
    pub height: usize,
    pub jungle_lower_left: Position,
    pub jungle_upper_right: Position,
    pub animals: Vec<AnimalSnapshot>,
    pub grass: Vec<GrassSnapshot>,
    pub dominant_genome: Option<String>,
    pub observed: Option<ObservedReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimalSnapshot {
    pub id: u64,
    pub x: i32,
    pub y: i32,
    pub energy: f64,
    pub heading: u8,
    pub observed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrassSnapshot {
    pub x: i32,
    pub y: i32,
    pub energy: f64,
}

impl From<&Animal> for AnimalSnapshot {
    fn from(animal: &Animal) -> Self {
        let position = animal.position();
        Self {
            id: animal.id,
            x: position.x,
            y: position.y,
            energy: animal.energy(),
            heading: animal.heading().index(),
            observed: animal.is_observed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "get_state")]
    GetState,
    #[serde(rename = "start")]
    Start { engine: Option<usize> },
    #[serde(rename = "stop")]
    Stop { engine: Option<usize> },
    #[serde(rename = "terminate")]
    Terminate { engine: Option<usize> },
    #[serde(rename = "observe")]
    Observe { engine: usize, animal_id: u64 },
    #[serde(rename = "unobserve")]
    Unobserve { engine: usize, animal_id: u64 },
}

impl EngineUpdate {
    pub fn new(engine: usize, state: EngineState, snapshot: &Snapshot) -> Self {
        Self {
            engine,
            boundary: snapshot.boundary,
            state,
            metrics: snapshot.metrics.clone(),
            animals: snapshot.living_animals().map(AnimalSnapshot::from).collect(),
        }
    }
}

impl EngineFullState {
    pub fn new(
        engine: usize,
        state: EngineState,
        snapshot: &Snapshot,
        observed: Option<ObservedReport>,
    ) -> Self {
        let map = &snapshot.map;
        let (jungle_lower_left, jungle_upper_right) = map.jungle_bounds();
        let grass = map
            .grasses()
            .map(|grass| GrassSnapshot {
                x: grass.position.x,
                y: grass.position.y,
                energy: grass.energy,
            })
            .collect();

        Self {
            engine,
            boundary: snapshot.boundary,
            state,
            metrics: snapshot.metrics.clone(),
            width: map.width(),
            height: map.height(),
            jungle_lower_left,
            jungle_upper_right,
            animals: snapshot.living_animals().map(AnimalSnapshot::from).collect(),
            grass,
            dominant_genome: snapshot.dominant_genome.as_ref().map(ToString::to_string),
            observed,
        }
    }
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}
