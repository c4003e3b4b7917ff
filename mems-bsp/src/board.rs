//! The assembled board: both BSP tables plus, for every sensor kind, the list
//! of instances that provide it and which of them the host has selected.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

use crate::bsp::{EnvSensors, MotionSensors};
use crate::drivers::{Axes, EnvFunction, MotionFunction};
use crate::errors::{BspResult, CommandError, CommandResult};

/// Sensor kinds the host addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Accelerometer,
    Gyroscope,
    Magnetometer,
    Temperature,
    Humidity,
    Pressure,
}

/// The BSP function behind a sensor kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Motion(MotionFunction),
    Env(EnvFunction),
}

impl SensorKind {
    pub const ALL: [SensorKind; 6] = [
        SensorKind::Accelerometer,
        SensorKind::Gyroscope,
        SensorKind::Magnetometer,
        SensorKind::Temperature,
        SensorKind::Humidity,
        SensorKind::Pressure,
    ];

    pub fn function(self) -> Function {
        match self {
            SensorKind::Accelerometer => Function::Motion(MotionFunction::Accelero),
            SensorKind::Gyroscope => Function::Motion(MotionFunction::Gyro),
            SensorKind::Magnetometer => Function::Motion(MotionFunction::Magneto),
            SensorKind::Temperature => Function::Env(EnvFunction::Temperature),
            SensorKind::Humidity => Function::Env(EnvFunction::Humidity),
            SensorKind::Pressure => Function::Env(EnvFunction::Pressure),
        }
    }

    pub fn from_motion(function: MotionFunction) -> Self {
        match function {
            MotionFunction::Accelero => SensorKind::Accelerometer,
            MotionFunction::Gyro => SensorKind::Gyroscope,
            MotionFunction::Magneto => SensorKind::Magnetometer,
        }
    }

    /// Kind behind an env function; gas has no host-visible kind
    pub fn from_env(function: EnvFunction) -> Option<Self> {
        match function {
            EnvFunction::Temperature => Some(SensorKind::Temperature),
            EnvFunction::Humidity => Some(SensorKind::Humidity),
            EnvFunction::Pressure => Some(SensorKind::Pressure),
            EnvFunction::Gas => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "acc",
            SensorKind::Gyroscope => "gyr",
            SensorKind::Magnetometer => "mag",
            SensorKind::Temperature => "tmp",
            SensorKind::Humidity => "hum",
            SensorKind::Pressure => "prs",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One selectable instance for a sensor kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorListing {
    /// Part name shown to the host, e.g. `LSM6DSOX`
    pub name: String,
    pub driver: &'static str,
    /// Slot in the motion or env table
    pub instance: usize,
}

/// One sample of a sensor kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Axes(Axes),
    Value(f32),
}

/// Full-scale values offered to the host for a driver and kind (g, dps, gauss)
pub fn full_scale_list(driver: &str, kind: SensorKind) -> &'static [u32] {
    match (driver, kind) {
        ("lis2dw12" | "lsm6dsox", SensorKind::Accelerometer) => &[2, 4, 8, 16],
        ("lsm6dsox", SensorKind::Gyroscope) => &[125, 250, 500, 1000, 2000],
        ("lis2mdl", SensorKind::Magnetometer) => &[50],
        _ => &[],
    }
}

/// Output data rates offered to the host for a driver and kind (Hz)
pub fn odr_list(driver: &str, kind: SensorKind) -> &'static [f32] {
    match (driver, kind) {
        ("lis2dw12", SensorKind::Accelerometer) => &[12.5, 25.0, 50.0, 100.0, 200.0, 400.0, 800.0, 1600.0],
        ("lsm6dsox", SensorKind::Accelerometer | SensorKind::Gyroscope) => {
            &[12.5, 26.0, 52.0, 104.0, 208.0, 417.0, 833.0, 1667.0, 3333.0, 6667.0]
        }
        ("lis2mdl", SensorKind::Magnetometer) => &[10.0, 20.0, 50.0, 100.0],
        ("lps22df", SensorKind::Pressure | SensorKind::Temperature) => {
            &[1.0, 4.0, 10.0, 25.0, 50.0, 75.0, 100.0, 200.0]
        }
        _ => &[],
    }
}

pub struct Board {
    name: String,
    motion: MotionSensors,
    env: EnvSensors,
    listings: HashMap<SensorKind, Vec<SensorListing>>,
    selected: HashMap<SensorKind, usize>,
}

impl Board {
    pub fn new(name: impl Into<String>, motion_instances: usize, env_instances: usize) -> Self {
        Self {
            name: name.into(),
            motion: MotionSensors::new(motion_instances),
            env: EnvSensors::new(env_instances),
            listings: HashMap::new(),
            selected: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn motion(&mut self) -> &mut MotionSensors {
        &mut self.motion
    }

    pub fn env(&mut self) -> &mut EnvSensors {
        &mut self.env
    }

    /// List an initialized motion instance under every kind it supports
    pub fn list_motion(&mut self, instance: usize) -> BspResult<()> {
        let mask = self.motion.functions(instance)?;
        let name = self.motion.name(instance)?;
        let driver = self.motion.driver(instance)?;
        for function in MotionFunction::from_mask(mask) {
            self.push_listing(SensorKind::from_motion(function), name, driver, instance);
        }
        Ok(())
    }

    /// List an initialized env instance under every kind it supports
    pub fn list_env(&mut self, instance: usize) -> BspResult<()> {
        let mask = self.env.functions(instance)?;
        let name = self.env.name(instance)?;
        let driver = self.env.driver(instance)?;
        for kind in EnvFunction::from_mask(mask).filter_map(SensorKind::from_env) {
            self.push_listing(kind, name, driver, instance);
        }
        Ok(())
    }

    fn push_listing(&mut self, kind: SensorKind, name: &str, driver: &'static str, instance: usize) {
        let listing = SensorListing {
            name: name.to_string(),
            driver,
            instance,
        };
        debug!("[board] {} #{} -> {}", kind, self.sensors(kind).len(), listing.name);
        self.listings.entry(kind).or_default().push(listing);
    }

    pub fn sensors(&self, kind: SensorKind) -> &[SensorListing] {
        self.listings.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names of every instance of `kind`, comma separated
    pub fn sensor_list(&self, kind: SensorKind) -> String {
        self.sensors(kind)
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn selected_index(&self, kind: SensorKind) -> usize {
        self.selected.get(&kind).copied().unwrap_or(0)
    }

    pub fn selected(&self, kind: SensorKind) -> CommandResult<&SensorListing> {
        let index = self.selected_index(kind);
        self.sensors(kind).get(index).ok_or_else(|| CommandError::NoSensor {
            kind: kind.to_string(),
            index,
        })
    }

    /// Switch `kind` to another listed instance.
    ///
    /// When the instance changes, the function is disabled on the old one and
    /// enabled on the new one.
    pub fn select(&mut self, kind: SensorKind, index: usize) -> CommandResult<()> {
        let target = self
            .sensors(kind)
            .get(index)
            .map(|s| s.instance)
            .ok_or_else(|| CommandError::NoSensor {
                kind: kind.to_string(),
                index,
            })?;

        let current = self.selected(kind).map(|s| s.instance).ok();
        if current != Some(target) {
            if let Some(instance) = current {
                self.disable_instance(kind, instance)?;
            }
            self.enable_instance(kind, target)?;
            info!("[board] {} switched to {}", kind, self.sensors(kind)[index].name);
        }
        self.selected.insert(kind, index);
        Ok(())
    }

    pub fn enable(&mut self, kind: SensorKind) -> CommandResult<()> {
        let instance = self.selected(kind)?.instance;
        self.enable_instance(kind, instance)
    }

    pub fn disable(&mut self, kind: SensorKind) -> CommandResult<()> {
        let instance = self.selected(kind)?.instance;
        self.disable_instance(kind, instance)
    }

    fn enable_instance(&mut self, kind: SensorKind, instance: usize) -> CommandResult<()> {
        match kind.function() {
            Function::Motion(f) => self.motion.enable(instance, f)?,
            Function::Env(f) => self.env.enable(instance, f)?,
        }
        Ok(())
    }

    fn disable_instance(&mut self, kind: SensorKind, instance: usize) -> CommandResult<()> {
        match kind.function() {
            Function::Motion(f) => self.motion.disable(instance, f)?,
            Function::Env(f) => self.env.disable(instance, f)?,
        }
        Ok(())
    }

    pub fn read_register(&mut self, kind: SensorKind, reg: u8) -> CommandResult<u8> {
        let instance = self.selected(kind)?.instance;
        Ok(match kind.function() {
            Function::Motion(_) => self.motion.read_register(instance, reg)?,
            Function::Env(_) => self.env.read_register(instance, reg)?,
        })
    }

    pub fn write_register(&mut self, kind: SensorKind, reg: u8, value: u8) -> CommandResult<()> {
        let instance = self.selected(kind)?.instance;
        match kind.function() {
            Function::Motion(_) => self.motion.write_register(instance, reg, value)?,
            Function::Env(_) => self.env.write_register(instance, reg, value)?,
        }
        Ok(())
    }

    pub fn output_data_rate(&mut self, kind: SensorKind) -> CommandResult<f32> {
        let instance = self.selected(kind)?.instance;
        Ok(match kind.function() {
            Function::Motion(f) => self.motion.output_data_rate(instance, f)?,
            Function::Env(f) => self.env.output_data_rate(instance, f)?,
        })
    }

    pub fn set_output_data_rate(&mut self, kind: SensorKind, odr: f32) -> CommandResult<()> {
        let instance = self.selected(kind)?.instance;
        match kind.function() {
            Function::Motion(f) => self.motion.set_output_data_rate(instance, f, odr)?,
            Function::Env(f) => self.env.set_output_data_rate(instance, f, odr)?,
        }
        Ok(())
    }

    /// Full scale of a motion kind; environmental kinds report 0
    pub fn full_scale(&mut self, kind: SensorKind) -> CommandResult<i32> {
        let instance = self.selected(kind)?.instance;
        match kind.function() {
            Function::Motion(f) => Ok(self.motion.full_scale(instance, f)?),
            Function::Env(_) => Ok(0),
        }
    }

    /// Set the full scale of a motion kind; ignored for environmental kinds
    pub fn set_full_scale(&mut self, kind: SensorKind, full_scale: i32) -> CommandResult<()> {
        let instance = self.selected(kind)?.instance;
        if let Function::Motion(f) = kind.function() {
            self.motion.set_full_scale(instance, f, full_scale)?;
        }
        Ok(())
    }

    /// Read the selected instance of `kind` if it has fresh data
    pub fn sample(&mut self, kind: SensorKind) -> CommandResult<Option<Reading>> {
        let instance = self.selected(kind)?.instance;
        match kind.function() {
            Function::Motion(f) => {
                if !self.motion.drdy_status(instance, f)? {
                    return Ok(None);
                }
                Ok(Some(Reading::Axes(self.motion.axes(instance, f)?)))
            }
            Function::Env(f) => {
                if !self.env.drdy_status(instance, f)? {
                    return Ok(None);
                }
                Ok(Some(Reading::Value(self.env.value(instance, f)?)))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::bus::mock::{FakeRegisters, NoopDelay};
    use crate::bus::BusIo;
    use crate::errors::BspError;

    pub(crate) struct Devices {
        pub lis2dw12: FakeRegisters,
        pub lsm6dsox: FakeRegisters,
        pub lps22df: FakeRegisters,
    }

    /// LSM6DSOX in motion slot 0, LIS2DW12 in slot 1, LPS22DF in env slot 0
    pub(crate) fn board() -> (Board, Devices) {
        let devices = Devices {
            lis2dw12: FakeRegisters::new().with(0x0F, 0x44),
            lsm6dsox: FakeRegisters::new().with(0x0F, 0x6C),
            lps22df: FakeRegisters::new().with(0x0F, 0xB4),
        };

        let mut board = Board::new("test", 2, 1);
        board
            .motion()
            .init_by_name(0, "lsm6dsox", BusIo::i2c(devices.lsm6dsox.clone(), 0x6B, NoopDelay), 0x03)
            .unwrap();
        board
            .motion()
            .init_by_name(1, "lis2dw12", BusIo::i2c(devices.lis2dw12.clone(), 0x19, NoopDelay), 0x02)
            .unwrap();
        board
            .env()
            .init_by_name(0, "lps22df", BusIo::i2c(devices.lps22df.clone(), 0x5D, NoopDelay), 0x03)
            .unwrap();
        board.list_motion(0).unwrap();
        board.list_motion(1).unwrap();
        board.list_env(0).unwrap();
        (board, devices)
    }

    #[test]
    fn test_listings_follow_capabilities() {
        let (board, _) = board();

        assert_eq!(board.sensor_list(SensorKind::Accelerometer), "LSM6DSOX,LIS2DW12");
        assert_eq!(board.sensor_list(SensorKind::Gyroscope), "LSM6DSOX");
        assert_eq!(board.sensor_list(SensorKind::Pressure), "LPS22DF");
        assert_eq!(board.sensor_list(SensorKind::Temperature), "LPS22DF");
        assert_eq!(board.sensor_list(SensorKind::Humidity), "");
        assert_eq!(board.selected(SensorKind::Accelerometer).unwrap().driver, "lsm6dsox");
    }

    #[test]
    fn test_select_moves_the_function() {
        let (mut board, devices) = board();

        board.select(SensorKind::Accelerometer, 1).unwrap();
        assert_eq!(board.selected(SensorKind::Accelerometer).unwrap().driver, "lis2dw12");
        // LSM6DSOX accelerometer powered down, LIS2DW12 running
        assert_eq!(devices.lsm6dsox.get(0x10) >> 4, 0);
        assert_eq!(board.output_data_rate(SensorKind::Accelerometer).unwrap(), 100.0);

        // Re-selecting the current index does nothing on the bus
        let writes = devices.lis2dw12.write_count();
        board.select(SensorKind::Accelerometer, 1).unwrap();
        assert_eq!(devices.lis2dw12.write_count(), writes);
    }

    #[test]
    fn test_select_out_of_range() {
        let (mut board, _) = board();
        let err = board.select(SensorKind::Gyroscope, 3).unwrap_err();
        assert_eq!(
            err,
            CommandError::NoSensor {
                kind: "gyr".into(),
                index: 3
            }
        );
        assert!(matches!(board.enable(SensorKind::Humidity), Err(CommandError::NoSensor { .. })));
    }

    #[test]
    fn test_env_full_scale_is_zero() {
        let (mut board, _) = board();
        assert_eq!(board.full_scale(SensorKind::Pressure).unwrap(), 0);
        board.set_full_scale(SensorKind::Pressure, 4).unwrap();
        assert_eq!(board.full_scale(SensorKind::Gyroscope).unwrap(), 2000);
    }

    #[test]
    fn test_sample_waits_for_data_ready() {
        let (mut board, devices) = board();

        assert_eq!(board.sample(SensorKind::Pressure).unwrap(), None);

        devices.lps22df.set(0x27, 0x01);
        devices.lps22df.set_bytes(0x28, &[0x00, 0x00, 0x40]);
        assert_eq!(board.sample(SensorKind::Pressure).unwrap(), Some(Reading::Value(1024.0)));

        devices.lps22df.fail(true);
        assert_eq!(
            board.sample(SensorKind::Pressure).unwrap_err(),
            CommandError::Bsp(BspError::ComponentFailure)
        );
    }

    #[test]
    fn test_lists() {
        assert_eq!(full_scale_list("lsm6dsox", SensorKind::Gyroscope).len(), 5);
        assert!(full_scale_list("lps22df", SensorKind::Pressure).is_empty());
        assert_eq!(odr_list("lis2mdl", SensorKind::Magnetometer), &[10.0, 20.0, 50.0, 100.0]);
        assert!(odr_list("sht40ad1b", SensorKind::Humidity).is_empty());
    }
}
