//! Register-level drivers for the supported ST MEMS parts.
//!
//! Each driver owns its bus and caches the output data rate, full scale and
//! power mode it last applied, so a disabled sensor can be reconfigured
//! without touching the hardware.

#[cfg(feature = "lis2dw12")]
pub mod lis2dw12;
#[cfg(feature = "lis2mdl")]
pub mod lis2mdl;
#[cfg(feature = "lps22df")]
pub mod lps22df;
#[cfg(feature = "lsm6dsox")]
pub mod lsm6dsox;
#[cfg(feature = "sht40ad1b")]
pub mod sht40ad1b;

use crate::bus::BusIo;
use crate::errors::{DriverError, DriverResult};
use serde::{Deserialize, Serialize};

/// Scaled 3-axis sample (mg, mdps or mgauss depending on the function)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axes {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Raw 3-axis sample in LSB
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxesRaw {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl AxesRaw {
    /// Decode the six little-endian output bytes of an X/Y/Z block
    pub fn from_le_bytes(buf: &[u8; 6]) -> Self {
        Self {
            x: i16::from_le_bytes([buf[0], buf[1]]),
            y: i16::from_le_bytes([buf[2], buf[3]]),
            z: i16::from_le_bytes([buf[4], buf[5]]),
        }
    }

    /// Apply a sensitivity, truncating toward zero
    pub fn scale(&self, sensitivity: f32) -> Axes {
        Axes {
            x: (self.x as f32 * sensitivity) as i32,
            y: (self.y as f32 * sensitivity) as i32,
            z: (self.z as f32 * sensitivity) as i32,
        }
    }
}

/// Fixed description of what a motion component can do
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct MotionCapabilities {
    pub acc: bool,
    pub gyro: bool,
    pub magneto: bool,
    pub low_power: bool,
    pub gyro_max_fs: u32,
    pub acc_max_fs: u32,
    pub mag_max_fs: u32,
    pub gyro_max_odr: f32,
    pub acc_max_odr: f32,
    pub mag_max_odr: f32,
}

/// Fixed description of what an environmental component can do
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct EnvCapabilities {
    pub temperature: bool,
    pub pressure: bool,
    pub humidity: bool,
    pub gas: bool,
    pub low_power: bool,
    pub hum_max_odr: f32,
    pub temp_max_odr: f32,
    pub press_max_odr: f32,
    pub gas_max_odr: f32,
}

/// Motion functions; discriminants are the board's function mask bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionFunction {
    Gyro = 1,
    Accelero = 2,
    Magneto = 4,
}

impl MotionFunction {
    pub const ALL: [MotionFunction; 3] = [MotionFunction::Gyro, MotionFunction::Accelero, MotionFunction::Magneto];

    pub fn mask(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            MotionFunction::Gyro => "gyro",
            MotionFunction::Accelero => "accelero",
            MotionFunction::Magneto => "magneto",
        }
    }

    /// Functions set in `mask`, in bit order
    pub fn from_mask(mask: u32) -> impl Iterator<Item = MotionFunction> {
        Self::ALL.into_iter().filter(move |f| mask & f.mask() != 0)
    }

    pub fn is_supported_by(self, caps: &MotionCapabilities) -> bool {
        match self {
            MotionFunction::Gyro => caps.gyro,
            MotionFunction::Accelero => caps.acc,
            MotionFunction::Magneto => caps.magneto,
        }
    }
}

/// Environmental functions; discriminants are the board's function mask bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvFunction {
    Temperature = 1,
    Pressure = 2,
    Humidity = 4,
    Gas = 8,
}

impl EnvFunction {
    pub const ALL: [EnvFunction; 4] = [
        EnvFunction::Temperature,
        EnvFunction::Pressure,
        EnvFunction::Humidity,
        EnvFunction::Gas,
    ];

    pub fn mask(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            EnvFunction::Temperature => "temperature",
            EnvFunction::Pressure => "pressure",
            EnvFunction::Humidity => "humidity",
            EnvFunction::Gas => "gas",
        }
    }

    pub fn from_mask(mask: u32) -> impl Iterator<Item = EnvFunction> {
        Self::ALL.into_iter().filter(move |f| mask & f.mask() != 0)
    }

    pub fn is_supported_by(self, caps: &EnvCapabilities) -> bool {
        match self {
            EnvFunction::Temperature => caps.temperature,
            EnvFunction::Pressure => caps.pressure,
            EnvFunction::Humidity => caps.humidity,
            EnvFunction::Gas => caps.gas,
        }
    }
}

/// Uniform interface over accelerometers, gyroscopes and magnetometers.
///
/// Every per-function operation returns [`DriverError::NotSupported`] for a
/// function the component does not have.
pub trait MotionSensor: Send {
    fn name(&self) -> &'static str;
    fn init(&mut self) -> DriverResult<()>;
    fn deinit(&mut self) -> DriverResult<()>;
    fn read_id(&mut self) -> DriverResult<u8>;
    fn capabilities(&self) -> MotionCapabilities;

    fn enable(&mut self, function: MotionFunction) -> DriverResult<()>;
    fn disable(&mut self, function: MotionFunction) -> DriverResult<()>;
    fn sensitivity(&mut self, function: MotionFunction) -> DriverResult<f32>;
    fn output_data_rate(&mut self, function: MotionFunction) -> DriverResult<f32>;
    fn set_output_data_rate(&mut self, function: MotionFunction, odr: f32) -> DriverResult<()>;
    fn full_scale(&mut self, function: MotionFunction) -> DriverResult<i32>;
    fn set_full_scale(&mut self, function: MotionFunction, full_scale: i32) -> DriverResult<()>;
    fn axes(&mut self, function: MotionFunction) -> DriverResult<Axes>;
    fn axes_raw(&mut self, function: MotionFunction) -> DriverResult<AxesRaw>;
    fn drdy_status(&mut self, function: MotionFunction) -> DriverResult<bool>;

    fn read_register(&mut self, reg: u8) -> DriverResult<u8>;
    fn write_register(&mut self, reg: u8, value: u8) -> DriverResult<()>;
}

/// Uniform interface over temperature, pressure, humidity and gas sensors
pub trait EnvSensor: Send {
    fn name(&self) -> &'static str;
    fn init(&mut self) -> DriverResult<()>;
    fn deinit(&mut self) -> DriverResult<()>;
    fn read_id(&mut self) -> DriverResult<u8>;
    fn capabilities(&self) -> EnvCapabilities;

    fn enable(&mut self, function: EnvFunction) -> DriverResult<()>;
    fn disable(&mut self, function: EnvFunction) -> DriverResult<()>;
    fn output_data_rate(&mut self, function: EnvFunction) -> DriverResult<f32>;
    fn set_output_data_rate(&mut self, function: EnvFunction, odr: f32) -> DriverResult<()>;
    /// Measurement in °C, hPa or %RH depending on the function
    fn value(&mut self, function: EnvFunction) -> DriverResult<f32>;
    fn drdy_status(&mut self, function: EnvFunction) -> DriverResult<bool>;

    fn read_register(&mut self, reg: u8) -> DriverResult<u8>;
    fn write_register(&mut self, reg: u8, value: u8) -> DriverResult<()>;
}

/// A driver instance ready to be placed in a board slot
pub enum Component {
    Motion(Box<dyn MotionSensor>),
    Env(Box<dyn EnvSensor>),
}

impl Component {
    pub fn name(&self) -> &'static str {
        match self {
            Component::Motion(sensor) => sensor.name(),
            Component::Env(sensor) => sensor.name(),
        }
    }
}

/// Builds driver instances for one part number
pub trait ComponentFactory: Sync {
    /// Driver name as written in the configuration
    fn name(&self) -> &'static str;
    /// Expected WHO_AM_I value
    fn id(&self) -> u8;
    /// 7-bit I2C address used when the configuration gives none
    fn default_address(&self) -> u8;
    /// Function mask the component supports
    fn functions(&self) -> u32;
    fn create(&self, io: BusIo) -> DriverResult<Component>;
}

/// All compiled-in component factories
pub static COMPONENT_FACTORIES: &[&dyn ComponentFactory] = &[
    #[cfg(feature = "lis2dw12")]
    &lis2dw12::LIS2DW12_FACTORY,
    #[cfg(feature = "lsm6dsox")]
    &lsm6dsox::LSM6DSOX_FACTORY,
    #[cfg(feature = "lis2mdl")]
    &lis2mdl::LIS2MDL_FACTORY,
    #[cfg(feature = "lps22df")]
    &lps22df::LPS22DF_FACTORY,
    #[cfg(feature = "sht40ad1b")]
    &sht40ad1b::SHT40AD1B_FACTORY,
];

pub fn find_factory(driver: &str) -> Option<&'static dyn ComponentFactory> {
    COMPONENT_FACTORIES
        .iter()
        .copied()
        .find(|factory| factory.name().eq_ignore_ascii_case(driver))
}

/// Unsupported-function error shared by the trait impls
pub(crate) fn not_supported<T>(component: &'static str) -> DriverResult<T> {
    Err(DriverError::NotSupported { component })
}

/// Pick the first table entry whose rate is at or above `odr`, else `top`.
///
/// Tables are sorted by ascending rate; this is the clamp-and-round-up step
/// every `set_output_data_rate` shares.
pub(crate) fn round_up<T: Copy>(odr: f32, table: &[(f32, T)], top: T) -> T {
    table
        .iter()
        .find(|(limit, _)| odr <= *limit)
        .map(|(_, code)| *code)
        .unwrap_or(top)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_up_picks_first_rate_not_below_request() {
        let table = [(10.0, 0u8), (20.0, 1), (50.0, 2)];
        assert_eq!(round_up(0.0, &table, 3), 0);
        assert_eq!(round_up(10.0, &table, 3), 0);
        assert_eq!(round_up(10.5, &table, 3), 1);
        assert_eq!(round_up(50.0, &table, 3), 2);
        assert_eq!(round_up(51.0, &table, 3), 3);
    }

    #[test]
    fn test_scale_truncates_toward_zero() {
        let raw = AxesRaw { x: 3, y: -3, z: 1000 };
        let axes = raw.scale(0.5);
        assert_eq!(axes, Axes { x: 1, y: -1, z: 500 });
    }

    #[test]
    fn test_function_masks() {
        let functions: Vec<_> = MotionFunction::from_mask(0x03).collect();
        assert_eq!(functions, vec![MotionFunction::Gyro, MotionFunction::Accelero]);

        let functions: Vec<_> = EnvFunction::from_mask(EnvFunction::Pressure.mask() | EnvFunction::Gas.mask()).collect();
        assert_eq!(functions, vec![EnvFunction::Pressure, EnvFunction::Gas]);
        assert_eq!(MotionFunction::from_mask(0).count(), 0);
    }

    #[test]
    fn test_find_factory_is_case_insensitive() {
        assert_eq!(find_factory("LIS2DW12").map(|f| f.id()), Some(0x44));
        assert_eq!(find_factory("lsm6dsox").map(|f| f.id()), Some(0x6C));
        assert!(find_factory("bmp280").is_none());
    }

    #[test]
    fn test_axes_raw_decoding() {
        let raw = AxesRaw::from_le_bytes(&[0x01, 0x00, 0xFF, 0xFF, 0x00, 0x80]);
        assert_eq!(raw, AxesRaw { x: 1, y: -1, z: i16::MIN });
    }
}
