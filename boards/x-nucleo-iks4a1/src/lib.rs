/// Board-specific constants and configuration for X-NUCLEO-IKS4A1
///
/// This shield carries:
/// - LSM6DSOX 6-axis IMU
/// - LIS2DW12 accelerometer
/// - LIS2MDL magnetometer
/// - LPS22DF barometer
/// - SHT40-AD1B humidity and temperature sensor

/// Default configuration directory (embedded at compile time)
pub const CONFIG_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/config");

/// Embedded TOML configurations
pub const BOARD_TOML: &str = include_str!("../config/board.toml");
pub const BUSES_TOML: &str = include_str!("../config/buses.toml");
pub const SENSORS_TOML: &str = include_str!("../config/sensors.toml");

/// Board name
pub const BOARD_NAME: &str = "X-NUCLEO-IKS4A1";

/// Get the configuration path (allow override via CONFIG_PATH env var)
pub fn get_config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| CONFIG_DIR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mems_bsp::config::{BoardConfig, BusConfig, SensorClass, SensorConfig};

    #[test]
    fn test_embedded_configs_parse() {
        let board: BoardConfig = toml::from_str(BOARD_TOML).unwrap();
        let buses: BusConfig = toml::from_str(BUSES_TOML).unwrap();
        let sensors: SensorConfig = toml::from_str(SENSORS_TOML).unwrap();

        assert_eq!(board.board.name, BOARD_NAME);
        for sensor in &sensors.sensors {
            assert!(buses.find(&sensor.bus).is_ok(), "unknown bus for {}", sensor.id);
            assert!(sensor.function_mask().is_ok(), "bad functions for {}", sensor.id);
        }

        let motion = sensors.sensors.iter().filter(|s| s.kind == SensorClass::Motion).count();
        assert!(motion <= board.board.motion_instances.unwrap_or(motion));
    }
}
