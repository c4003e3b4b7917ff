use serde::Deserialize;

use super::load_toml;
use crate::drivers::{EnvFunction, MotionFunction};
use crate::errors::{ConfigError, ConfigResult};

/// Root configuration struct expecting `[[sensor]]` TOML array format
#[derive(Debug, Deserialize)]
pub struct SensorConfig {
    #[serde(rename = "sensor")]
    pub sensors: Vec<SensorEntry>,
}

/// Which board table a component lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorClass {
    Motion,
    Env,
}

/// One sensor entry, matching each `[[sensor]]` section
#[derive(Debug, Clone, Deserialize)]
pub struct SensorEntry {
    pub id: String,
    pub driver: String,
    pub kind: SensorClass,
    pub bus: String,
    /// 7-bit I2C address; the driver default when absent
    pub address: Option<u8>,
    /// Functions to enable at start-up; every supported function when absent
    pub functions: Option<Vec<String>>,
}

impl SensorEntry {
    /// Function mask requested for this entry, or `None` for "all supported"
    pub fn function_mask(&self) -> ConfigResult<Option<u32>> {
        let Some(names) = &self.functions else {
            return Ok(None);
        };

        let mut mask = 0;
        for name in names {
            let bit = match self.kind {
                SensorClass::Motion => MotionFunction::ALL
                    .into_iter()
                    .find(|f| f.name().eq_ignore_ascii_case(name))
                    .map(MotionFunction::mask),
                SensorClass::Env => EnvFunction::ALL
                    .into_iter()
                    .find(|f| f.name().eq_ignore_ascii_case(name))
                    .map(EnvFunction::mask),
            };
            mask |= bit.ok_or_else(|| ConfigError::InvalidValue {
                field: format!("sensor.{}.functions", self.id),
                reason: format!("unknown function '{}'", name),
            })?;
        }
        Ok(Some(mask))
    }
}

pub fn load_sensor_config(path: &str) -> ConfigResult<SensorConfig> {
    load_toml(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENSORS: &str = r#"
        [[sensor]]
        id = "imu"
        driver = "lsm6dsox"
        kind = "motion"
        bus = "i2c1"
        address = 0x6B
        functions = ["accelero", "gyro"]

        [[sensor]]
        id = "baro"
        driver = "lps22df"
        kind = "env"
        bus = "i2c1"
    "#;

    #[test]
    fn test_parse_sensors() {
        let cfg: SensorConfig = toml::from_str(SENSORS).unwrap();
        assert_eq!(cfg.sensors.len(), 2);

        let imu = &cfg.sensors[0];
        assert_eq!(imu.kind, SensorClass::Motion);
        assert_eq!(imu.address, Some(0x6B));
        assert_eq!(imu.function_mask().unwrap(), Some(0x03));

        let baro = &cfg.sensors[1];
        assert_eq!(baro.address, None);
        assert_eq!(baro.function_mask().unwrap(), None);
    }

    #[test]
    fn test_function_names_depend_on_class() {
        let mut cfg: SensorConfig = toml::from_str(SENSORS).unwrap();
        let baro = &mut cfg.sensors[1];
        baro.functions = Some(vec!["Pressure".into(), "temperature".into()]);
        assert_eq!(baro.function_mask().unwrap(), Some(0x03));

        baro.functions = Some(vec!["gyro".into()]);
        assert!(matches!(baro.function_mask(), Err(ConfigError::InvalidValue { .. })));
    }
}
