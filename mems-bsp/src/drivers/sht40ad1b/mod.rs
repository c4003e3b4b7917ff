//! SHT40-AD1B humidity and temperature sensor.
//!
//! Command based: there is no register map, every reading is a measure
//! command followed by a six-byte CRC-protected answer.

use super::{not_supported, Component, ComponentFactory, EnvCapabilities, EnvFunction, EnvSensor};
use crate::bus::{BusIo, DynDelay, DynI2c};
use crate::errors::{DriverError, DriverResult};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{self, I2c};
use tracing::trace;

pub const I2C_ADD: u8 = 0x44;

/// The part has no WHO_AM_I; this is the value reported as its ID
pub const ID: u8 = 0x00;

const NAME: &str = "SHT40AD1B";

const CMD_MEASURE_HIGH_PRECISION: u8 = 0xFD;
const CMD_READ_SERIAL: u8 = 0x89;
const MEASURE_DELAY_MS: u32 = 10;

const CRC8_POLYNOMIAL: u8 = 0x31;
const CRC8_INIT: u8 = 0xFF;

/// CRC-8 over a data word as sent by the sensor
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = CRC8_INIT;
    for byte in data {
        crc ^= *byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC8_POLYNOMIAL
            } else {
                crc << 1
            };
        }
    }
    crc
}

pub struct Sht40ad1b<P, D> {
    i2c: P,
    address: u8,
    delay: D,
    is_initialized: bool,
    temp_is_enabled: bool,
    hum_is_enabled: bool,
    temp_value: f32,
    hum_value: f32,
}

impl<P: I2c, D: DelayNs> Sht40ad1b<P, D> {
    pub fn new(i2c: P, address: u8, delay: D) -> Self {
        Self {
            i2c,
            address,
            delay,
            is_initialized: false,
            temp_is_enabled: false,
            hum_is_enabled: false,
            temp_value: 0.0,
            hum_value: 0.0,
        }
    }

    pub fn init(&mut self) -> DriverResult<()> {
        self.is_initialized = true;
        Ok(())
    }

    pub fn deinit(&mut self) -> DriverResult<()> {
        self.temp_disable();
        self.hum_disable();
        self.is_initialized = false;
        Ok(())
    }

    pub fn read_id(&self) -> u8 {
        ID
    }

    pub fn capabilities(&self) -> EnvCapabilities {
        EnvCapabilities {
            temperature: true,
            humidity: true,
            ..Default::default()
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    pub fn temp_enable(&mut self) {
        self.temp_is_enabled = true;
    }

    pub fn temp_disable(&mut self) {
        self.temp_is_enabled = false;
    }

    pub fn hum_enable(&mut self) {
        self.hum_is_enabled = true;
    }

    pub fn hum_disable(&mut self) {
        self.hum_is_enabled = false;
    }

    /// Temperature in °C from a fresh high-precision measurement
    pub fn temperature(&mut self) -> DriverResult<f32> {
        self.measure()?;
        Ok(self.temp_value)
    }

    /// Relative humidity in %, clamped to 0..=100
    pub fn humidity(&mut self) -> DriverResult<f32> {
        self.measure()?;
        Ok(self.hum_value)
    }

    /// Factory-programmed 32-bit serial number
    pub fn serial_number(&mut self) -> DriverResult<u32> {
        let (first, second) = self.command(CMD_READ_SERIAL)?;
        Ok(((first as u32) << 16) | second as u32)
    }

    fn measure(&mut self) -> DriverResult<()> {
        let (temp_raw, hum_raw) = self.command(CMD_MEASURE_HIGH_PRECISION)?;

        self.temp_value = -45.0 + 175.0 * temp_raw as f32 / 65535.0;
        self.hum_value = (-6.0 + 125.0 * hum_raw as f32 / 65535.0).clamp(0.0, 100.0);
        trace!(
            "[{}] T={:.2} RH={:.2}",
            NAME,
            self.temp_value,
            self.hum_value
        );
        Ok(())
    }

    /// Send a command and read back its two CRC-checked words
    fn command(&mut self, command: u8) -> DriverResult<(u16, u16)> {
        self.i2c
            .write(self.address, &[command])
            .map_err(|e| DriverError::bus(i2c::Error::kind(&e)))?;
        self.delay.delay_ms(MEASURE_DELAY_MS);

        let mut buf = [0u8; 6];
        self.i2c
            .read(self.address, &mut buf)
            .map_err(|e| DriverError::bus(i2c::Error::kind(&e)))?;

        for word in buf.chunks_exact(3) {
            let expected = crc8(&word[..2]);
            if expected != word[2] {
                return Err(DriverError::Crc {
                    expected,
                    actual: word[2],
                });
            }
        }

        Ok((
            u16::from_be_bytes([buf[0], buf[1]]),
            u16::from_be_bytes([buf[3], buf[4]]),
        ))
    }
}

impl<P, D> EnvSensor for Sht40ad1b<P, D>
where
    P: I2c + Send,
    D: DelayNs + Send,
{
    fn name(&self) -> &'static str {
        NAME
    }

    fn init(&mut self) -> DriverResult<()> {
        Sht40ad1b::init(self)
    }

    fn deinit(&mut self) -> DriverResult<()> {
        Sht40ad1b::deinit(self)
    }

    fn read_id(&mut self) -> DriverResult<u8> {
        Ok(Sht40ad1b::read_id(self))
    }

    fn capabilities(&self) -> EnvCapabilities {
        Sht40ad1b::capabilities(self)
    }

    fn enable(&mut self, function: EnvFunction) -> DriverResult<()> {
        match function {
            EnvFunction::Temperature => self.temp_enable(),
            EnvFunction::Humidity => self.hum_enable(),
            _ => return not_supported(NAME),
        }
        Ok(())
    }

    fn disable(&mut self, function: EnvFunction) -> DriverResult<()> {
        match function {
            EnvFunction::Temperature => self.temp_disable(),
            EnvFunction::Humidity => self.hum_disable(),
            _ => return not_supported(NAME),
        }
        Ok(())
    }

    // Measurements run on demand, there is no rate to report or set
    fn output_data_rate(&mut self, function: EnvFunction) -> DriverResult<f32> {
        match function {
            EnvFunction::Temperature | EnvFunction::Humidity => Ok(0.0),
            _ => not_supported(NAME),
        }
    }

    fn set_output_data_rate(&mut self, function: EnvFunction, _odr: f32) -> DriverResult<()> {
        match function {
            EnvFunction::Temperature | EnvFunction::Humidity => Ok(()),
            _ => not_supported(NAME),
        }
    }

    fn value(&mut self, function: EnvFunction) -> DriverResult<f32> {
        match function {
            EnvFunction::Temperature => self.temperature(),
            EnvFunction::Humidity => self.humidity(),
            _ => not_supported(NAME),
        }
    }

    fn drdy_status(&mut self, function: EnvFunction) -> DriverResult<bool> {
        match function {
            EnvFunction::Temperature | EnvFunction::Humidity => Ok(true),
            _ => not_supported(NAME),
        }
    }

    fn read_register(&mut self, _reg: u8) -> DriverResult<u8> {
        not_supported(NAME)
    }

    fn write_register(&mut self, _reg: u8, _value: u8) -> DriverResult<()> {
        not_supported(NAME)
    }
}

pub static SHT40AD1B_FACTORY: Sht40ad1bFactory = Sht40ad1bFactory;

pub struct Sht40ad1bFactory;

impl ComponentFactory for Sht40ad1bFactory {
    fn name(&self) -> &'static str {
        "sht40ad1b"
    }

    fn id(&self) -> u8 {
        ID
    }

    fn default_address(&self) -> u8 {
        I2C_ADD
    }

    fn functions(&self) -> u32 {
        EnvFunction::Temperature.mask() | EnvFunction::Humidity.mask()
    }

    fn create(&self, io: BusIo) -> DriverResult<Component> {
        let (i2c, address, delay): (DynI2c, u8, DynDelay) = io.into_i2c(NAME)?;
        Ok(Component::Env(Box::new(Sht40ad1b::new(i2c, address, delay))))
    }
}
