use crate::error::{ConfigError, Result};
use crate::world::Boundary;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub world: WorldConfig,
    pub animal: AnimalConfig,
    pub grass: GrassConfig,
    pub simulation: SimulationConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    pub width: usize,
    pub height: usize,
    pub jungle_ratio: f64,
    pub maps: Vec<Boundary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimalConfig {
    pub initial_population: usize,
    pub start_energy: f64,
    pub move_energy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrassConfig {
    pub energy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub tick_delay_ms: u64,
    pub magic_born: bool,
    pub seed: Option<u64>,
    pub autostart: bool,
    pub max_days: Option<u64>,
    pub log_interval_days: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub enabled: bool,
    pub address: String,
    pub port: u16,
    pub update_rate_hz: u64,
    pub static_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world: WorldConfig {
                width: 10,
                height: 10,
                jungle_ratio: 0.5,
                maps: vec![Boundary::Wrap, Boundary::Bounded],
            },
            animal: AnimalConfig {
                initial_population: 20,
                start_energy: 200.0,
                move_energy: 5.0,
            },
            grass: GrassConfig { energy: 30.0 },
            simulation: SimulationConfig {
                tick_delay_ms: 300,
                magic_born: false,
                seed: None,
                autostart: false,
                max_days: None,
                log_interval_days: 100,
            },
            server: ServerConfig {
                enabled: true,
                address: "0.0.0.0".to_string(),
                port: 8080,
                update_rate_hz: 5,
                static_dir: "static".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn load_validated(path: &str) -> Result<Self> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let world = &self.world;
        if world.width == 0 || world.height == 0 {
            return Err(ConfigError::EmptyMap {
                width: world.width,
                height: world.height,
            });
        }
        if !(0.0..=1.0).contains(&world.jungle_ratio) {
            return Err(ConfigError::JungleRatio(world.jungle_ratio));
        }
        if world.maps.is_empty() {
            return Err(ConfigError::NoMaps);
        }

        for (name, value) in [
            ("start energy", self.animal.start_energy),
            ("move energy", self.animal.move_energy),
            ("grass energy", self.grass.energy),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Energy { name, value });
            }
        }

        let cells = world.width * world.height;
        if self.animal.initial_population > cells {
            return Err(ConfigError::Overcrowded {
                animals: self.animal.initial_population,
                cells,
            });
        }

        Ok(())
    }
}
