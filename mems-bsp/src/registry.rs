use tracing::{info, warn};

use crate::board::Board;
use crate::config::{Config, SensorClass, SensorEntry};
use crate::drivers::{find_factory, ComponentFactory};
use crate::errors::{ConfigError, ConfigResult, RegistryResult};
use crate::hal::BusOpener;

/// Build the board: size both tables, open one bus handle per sensor and run
/// the BSP init for each entry.
///
/// Configuration mistakes abort; a part that does not answer is logged and
/// left out of the sensor lists.
pub fn init_board(config: &Config, opener: &dyn BusOpener) -> RegistryResult<Board> {
    let motion: Vec<&SensorEntry> = entries_of(config, SensorClass::Motion);
    let env: Vec<&SensorEntry> = entries_of(config, SensorClass::Env);

    let motion_instances = capacity("board.motion_instances", config.board.board.motion_instances, motion.len())?;
    let env_instances = capacity("board.env_instances", config.board.board.env_instances, env.len())?;
    let mut board = Board::new(config.board.board.name.clone(), motion_instances, env_instances);

    info!("[registry] initializing {} sensors...", config.sensors.sensors.len());

    for (instance, entry) in motion.into_iter().enumerate() {
        let (factory, functions) = resolve(entry)?;
        let bus = config.buses.find(&entry.bus)?;
        let io = opener.open(bus, entry.address.unwrap_or_else(|| factory.default_address()))?;

        info!("[registry] registering sensor: id={} driver={} bus={}", entry.id, entry.driver, entry.bus);
        let res = board
            .motion()
            .init(instance, factory, io, functions)
            .and_then(|()| board.list_motion(instance));
        if let Err(e) = res {
            warn!("[registry] sensor {} unavailable: {}", entry.id, e);
        }
    }

    for (instance, entry) in env.into_iter().enumerate() {
        let (factory, functions) = resolve(entry)?;
        let bus = config.buses.find(&entry.bus)?;
        let io = opener.open(bus, entry.address.unwrap_or_else(|| factory.default_address()))?;

        info!("[registry] registering sensor: id={} driver={} bus={}", entry.id, entry.driver, entry.bus);
        let res = board
            .env()
            .init(instance, factory, io, functions)
            .and_then(|()| board.list_env(instance));
        if let Err(e) = res {
            warn!("[registry] sensor {} unavailable: {}", entry.id, e);
        }
    }

    Ok(board)
}

fn entries_of(config: &Config, class: SensorClass) -> Vec<&SensorEntry> {
    config.sensors.sensors.iter().filter(|s| s.kind == class).collect()
}

fn capacity(field: &str, configured: Option<usize>, needed: usize) -> ConfigResult<usize> {
    match configured {
        Some(n) if n < needed => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("{} sensors configured but only {} instances", needed, n),
        }),
        Some(n) => Ok(n),
        None => Ok(needed),
    }
}

/// Factory and requested function mask of one entry
fn resolve(entry: &SensorEntry) -> ConfigResult<(&'static dyn ComponentFactory, u32)> {
    let factory = find_factory(&entry.driver).ok_or_else(|| ConfigError::UnsupportedDriver {
        driver: entry.driver.clone(),
    })?;
    let functions = entry.function_mask()?.unwrap_or_else(|| factory.functions());
    Ok((factory, functions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::SensorKind;
    use crate::bus::mock::FakeRegisters;
    use crate::commands::{CommandHandler, HostCommand, HostReply};
    use crate::logger::StreamControl;
    use std::sync::Arc;
    use tokio::sync::{watch, Mutex};
    use crate::config::{BoardConfig, BusConfig, SensorConfig};
    use crate::errors::RegistryError;
    use crate::hal::fake::FakeBusOpener;

    fn config(sensors: &str) -> Config {
        let board: BoardConfig = toml::from_str(
            r#"
            [board]
            name = "X-NUCLEO-IKS4A1"
            [link]
            type = "stdio"
            "#,
        )
        .unwrap();
        let buses: BusConfig = toml::from_str(
            r#"
            [[bus]]
            id = "i2c1"
            type = "i2c"
            path = "/dev/i2c-1"
            "#,
        )
        .unwrap();
        let sensors: SensorConfig = toml::from_str(sensors).unwrap();
        Config { board, buses, sensors }
    }

    const SENSORS: &str = r#"
        [[sensor]]
        id = "imu"
        driver = "lsm6dsox"
        kind = "motion"
        bus = "i2c1"

        [[sensor]]
        id = "mag"
        driver = "lis2mdl"
        kind = "motion"
        bus = "i2c1"

        [[sensor]]
        id = "baro"
        driver = "lps22df"
        kind = "env"
        bus = "i2c1"
        functions = ["pressure"]
    "#;

    #[test]
    fn test_init_board_from_config() {
        let opener = FakeBusOpener::default()
            .with("i2c1", 0x6B, FakeRegisters::new().with(0x0F, 0x6C))
            .with("i2c1", 0x1E, FakeRegisters::new().with(0x4F, 0x40))
            .with("i2c1", 0x5D, FakeRegisters::new().with(0x0F, 0xB4));

        let mut board = init_board(&config(SENSORS), &opener).unwrap();

        assert_eq!(board.name(), "X-NUCLEO-IKS4A1");
        assert_eq!(board.motion().instances(), 2);
        assert_eq!(board.sensor_list(SensorKind::Gyroscope), "LSM6DSOX");
        assert_eq!(board.sensor_list(SensorKind::Magnetometer), "LIS2MDL");
        assert_eq!(board.sensor_list(SensorKind::Temperature), "LPS22DF");
        // Only pressure was requested, so temperature stays off
        assert_eq!(board.output_data_rate(SensorKind::Pressure).unwrap(), 25.0);
    }

    #[test]
    fn test_missing_part_is_skipped() {
        let opener = FakeBusOpener::default()
            .with("i2c1", 0x6B, FakeRegisters::new().with(0x0F, 0x6C))
            .with("i2c1", 0x1E, FakeRegisters::new())
            .with("i2c1", 0x5D, FakeRegisters::new().with(0x0F, 0xB4));

        let board = init_board(&config(SENSORS), &opener).unwrap();
        assert_eq!(board.sensor_list(SensorKind::Magnetometer), "");
        assert_eq!(board.sensor_list(SensorKind::Accelerometer), "LSM6DSOX");
    }

    #[test]
    fn test_configuration_errors_abort() {
        let opener = FakeBusOpener::default();

        let err = init_board(
            &config("[[sensor]]\nid = \"x\"\ndriver = \"bmp280\"\nkind = \"env\"\nbus = \"i2c1\"\n"),
            &opener,
        )
        .err();
        assert!(matches!(
            err,
            Some(RegistryError::Config(ConfigError::UnsupportedDriver { .. }))
        ));

        let err = init_board(
            &config("[[sensor]]\nid = \"x\"\ndriver = \"lps22df\"\nkind = \"env\"\nbus = \"spi9\"\n"),
            &opener,
        )
        .err();
        assert!(matches!(err, Some(RegistryError::Config(ConfigError::BusNotFound { .. }))));

        let err = init_board(&config(SENSORS), &opener).err();
        assert!(matches!(err, Some(RegistryError::BusOpen { .. })));
    }

    /// Sensor table shipped with the X-NUCLEO-IKS4A1 board crate
    const IKS4A1_SENSORS: &str = include_str!("../../boards/x-nucleo-iks4a1/config/sensors.toml");

    #[tokio::test]
    async fn test_every_iks4a1_listing_offers_rates_and_ranges() {
        let opener = FakeBusOpener::default()
            .with("i2c1", 0x6B, FakeRegisters::new().with(0x0F, 0x6C))
            .with("i2c1", 0x19, FakeRegisters::new().with(0x0F, 0x44))
            .with("i2c1", 0x1E, FakeRegisters::new().with(0x4F, 0x40))
            .with("i2c1", 0x5D, FakeRegisters::new().with(0x0F, 0xB4))
            .with("i2c1", 0x44, FakeRegisters::new());
        let board = init_board(&config(IKS4A1_SENSORS), &opener).unwrap();

        let listings: Vec<(SensorKind, usize)> = SensorKind::ALL
            .into_iter()
            .flat_map(|kind| (0..board.sensors(kind).len()).map(move |index| (kind, index)))
            .collect();
        assert_eq!(listings.len(), 8);

        let (tx, _rx) = watch::channel(StreamControl::default());
        let handler = CommandHandler::new(Arc::new(Mutex::new(board)), "X-NUCLEO-IKS4A1", tx);

        for (kind, index) in listings {
            let reply = handler.handle(HostCommand::SetSensorIndex { kind, index }).await;
            assert_eq!(reply, HostReply::SensorIndex { kind, index });

            let name = match handler.handle(HostCommand::GetSensorName { kind }).await {
                HostReply::SensorName { name, .. } => name,
                other => panic!("unexpected reply {:?}", other),
            };
            let rates = match handler.handle(HostCommand::GetOdrList { kind }).await {
                HostReply::OdrList { values, .. } => values,
                other => panic!("unexpected reply {:?}", other),
            };
            let ranges = match handler.handle(HostCommand::GetFullScaleList { kind }).await {
                HostReply::FullScaleList { values, .. } => values,
                other => panic!("unexpected reply {:?}", other),
            };

            // The SHT40 has a single fixed rate and no environmental part has ranges
            assert_eq!(rates.is_empty(), name == "SHT40AD1B", "{} {}", kind, name);
            let motion = matches!(
                kind,
                SensorKind::Accelerometer | SensorKind::Gyroscope | SensorKind::Magnetometer
            );
            assert_eq!(!ranges.is_empty(), motion, "{} {}", kind, name);
        }
    }

    #[test]
    fn test_capacity_must_cover_entries() {
        assert_eq!(capacity("f", None, 3).unwrap(), 3);
        assert_eq!(capacity("f", Some(4), 3).unwrap(), 4);
        assert!(capacity("f", Some(1), 3).is_err());
    }
}
