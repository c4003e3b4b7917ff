pub mod board_config;
pub mod bus_config;
pub mod sensor_config;

pub use board_config::{load_board_config, BoardConfig, LinkKind};
pub use bus_config::{load_bus_config, BusConfig, BusEntry};
pub use sensor_config::{load_sensor_config, SensorClass, SensorConfig, SensorEntry};

use crate::errors::{ConfigError, ConfigResult};
use serde::de::DeserializeOwned;
use std::fs;

/// Read and parse one TOML file
pub(crate) fn load_toml<T: DeserializeOwned>(path: &str) -> ConfigResult<T> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::LoadError {
        path: path.to_string(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// All three configuration files of a board directory
#[derive(Debug)]
pub struct Config {
    pub board: BoardConfig,
    pub buses: BusConfig,
    pub sensors: SensorConfig,
}

impl Config {
    pub fn load(config_dir: &str) -> ConfigResult<Self> {
        Ok(Self {
            board: load_board_config(&format!("{}/board.toml", config_dir))?,
            buses: load_bus_config(&format!("{}/buses.toml", config_dir))?,
            sensors: load_sensor_config(&format!("{}/sensors.toml", config_dir))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_bus_config("/nonexistent/buses.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/buses.toml"));
    }
}
