use serde::Deserialize;

use super::load_toml;
use crate::bus::BusType;
use crate::errors::{ConfigError, ConfigResult};

/// Root structure for loading `[[bus]]` style TOML config
#[derive(Debug, Deserialize)]
pub struct BusConfig {
    #[serde(rename = "bus")]
    pub buses: Vec<BusEntry>,
}

/// One bus entry: an I2C adapter or a SPI device node
#[derive(Debug, Clone, Deserialize)]
pub struct BusEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub r#type: String,
    pub path: String,
    /// SPI clock, ignored for I2C
    pub speed_hz: Option<u32>,
}

impl BusEntry {
    pub fn bus_type(&self) -> ConfigResult<BusType> {
        BusType::from_str(&self.r#type).ok_or_else(|| ConfigError::InvalidValue {
            field: format!("bus.{}.type", self.id),
            reason: format!("unknown bus type '{}'", self.r#type),
        })
    }
}

impl BusConfig {
    pub fn find(&self, id: &str) -> ConfigResult<&BusEntry> {
        self.buses
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| ConfigError::BusNotFound { bus: id.to_string() })
    }
}

pub fn load_bus_config(path: &str) -> ConfigResult<BusConfig> {
    load_toml(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_buses() {
        let cfg: BusConfig = toml::from_str(
            r#"
            [[bus]]
            id = "i2c1"
            type = "i2c"
            path = "/dev/i2c-1"

            [[bus]]
            id = "spi0"
            type = "spi3"
            path = "/dev/spidev0.0"
            speed_hz = 1000000
            "#,
        )
        .unwrap();

        assert_eq!(cfg.buses.len(), 2);
        assert_eq!(cfg.find("i2c1").unwrap().bus_type().unwrap(), BusType::I2c);
        assert_eq!(cfg.find("spi0").unwrap().bus_type().unwrap(), BusType::Spi3Wires);
        assert_eq!(cfg.find("spi0").unwrap().speed_hz, Some(1_000_000));
        assert!(matches!(cfg.find("i2c9"), Err(ConfigError::BusNotFound { .. })));
    }

    #[test]
    fn test_unknown_bus_type() {
        let entry = BusEntry {
            id: "uart0".into(),
            r#type: "uart".into(),
            path: "/dev/ttyS0".into(),
            speed_hz: None,
        };
        assert!(matches!(entry.bus_type(), Err(ConfigError::InvalidValue { .. })));
    }
}
