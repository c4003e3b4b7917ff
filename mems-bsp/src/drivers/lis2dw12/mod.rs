//! LIS2DW12 3-axis accelerometer.
//!
//! The part trades resolution for current through five operating modes;
//! the sensitivity and the raw-sample shift both depend on which one is
//! active, so every conversion reads the power mode back from the chip.

pub mod register;

use self::register::*;
use super::{round_up, Axes, AxesRaw, ComponentFactory, MotionCapabilities, MotionFunction, MotionSensor};
use crate::bus::{BusIo, BusType, I2cBus, RegisterBus, SpiBus};
use crate::drivers::Component;
use crate::errors::{DriverError, DriverResult};
use embedded_hal::i2c::I2c;
use embedded_hal::spi::SpiDevice;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const I2C_ADD_L: u8 = 0x18;
pub const I2C_ADD_H: u8 = 0x19;

const NAME: &str = "LIS2DW12";

/// Sensitivities in mg/LSB for 2/4/8/16 g, 14-bit output
const SENS_14BIT: [f32; 4] = [0.244, 0.488, 0.976, 1.952];
/// Sensitivities in mg/LSB for 2/4/8/16 g, 12-bit output (low-power mode 1)
const SENS_12BIT: [f32; 4] = [0.976, 1.952, 3.904, 7.808];

const ODR_TABLE: [(f32, Odr); 8] = [
    (1.6, Odr::Hz1_6LpOnly),
    (12.5, Odr::Hz12_5),
    (25.0, Odr::Hz25),
    (50.0, Odr::Hz50),
    (100.0, Odr::Hz100),
    (200.0, Odr::Hz200),
    (400.0, Odr::Hz400),
    (800.0, Odr::Hz800),
];

const ODR_VALUES: [(f32, f32); 8] = [
    (1.6, 1.6),
    (12.5, 12.5),
    (25.0, 25.0),
    (50.0, 50.0),
    (100.0, 100.0),
    (200.0, 200.0),
    (400.0, 400.0),
    (800.0, 800.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    HighPerformance,
    LowPower4,
    LowPower3,
    LowPower2,
    LowPower1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LowNoise {
    Disabled,
    Enabled,
}

/// Self-test excitation selection (CTRL3.st)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfTest {
    Disabled = 0,
    Positive = 1,
    Negative = 2,
}

impl OperatingMode {
    fn power_mode(self, noise: LowNoise) -> PowerMode {
        let low_noise = noise == LowNoise::Enabled;
        match (self, low_noise) {
            (OperatingMode::HighPerformance, false) => PowerMode::HIGH_PERFORMANCE,
            (OperatingMode::HighPerformance, true) => PowerMode::HIGH_PERFORMANCE_LOW_NOISE,
            (OperatingMode::LowPower4, false) => PowerMode::CONT_LOW_PWR_4,
            (OperatingMode::LowPower4, true) => PowerMode::CONT_LOW_PWR_LOW_NOISE_4,
            (OperatingMode::LowPower3, false) => PowerMode::CONT_LOW_PWR_3,
            (OperatingMode::LowPower3, true) => PowerMode::CONT_LOW_PWR_LOW_NOISE_3,
            (OperatingMode::LowPower2, false) => PowerMode::CONT_LOW_PWR_2,
            (OperatingMode::LowPower2, true) => PowerMode::CONT_LOW_PWR_LOW_NOISE_2,
            (OperatingMode::LowPower1, false) => PowerMode::CONT_LOW_PWR_12BIT,
            (OperatingMode::LowPower1, true) => PowerMode::CONT_LOW_PWR_LOW_NOISE_12BIT,
        }
    }
}

/// LIS2DW12 driver object
pub struct Lis2dw12<B> {
    bus: B,
    is_initialized: bool,
    acc_is_enabled: bool,
    acc_odr: f32,
    acc_operating_mode: OperatingMode,
    acc_low_noise: LowNoise,
}

impl<P: I2c> Lis2dw12<I2cBus<P>> {
    pub fn new_i2c(i2c: P, address: u8) -> Self {
        Self::from_bus(I2cBus::new(i2c, address))
    }
}

impl<P: SpiDevice> Lis2dw12<SpiBus<P>> {
    pub fn new_spi(spi: P) -> Self {
        Self::from_bus(SpiBus::new(spi))
    }
}

impl<B: RegisterBus> Lis2dw12<B> {
    pub fn from_bus(bus: B) -> Self {
        Self {
            bus,
            is_initialized: false,
            acc_is_enabled: false,
            acc_odr: 0.0,
            acc_operating_mode: OperatingMode::HighPerformance,
            acc_low_noise: LowNoise::Disabled,
        }
    }

    /// Switch the part to the wiring of its bus; must run before any read
    pub fn configure_bus(&mut self) -> DriverResult<()> {
        if !self.is_initialized && self.bus.bus_type() == BusType::Spi3Wires {
            self.bus.write_reg(Reg::Ctrl2 as u8, CTRL2_SPI_3WIRES)?;
        }
        Ok(())
    }

    pub fn init(&mut self) -> DriverResult<()> {
        // Auto-increment and BDU are needed for consistent multi-byte reads
        self.bus.modify::<Ctrl2>(|r| {
            r.set_if_add_inc(true);
            r.set_bdu(true);
        })?;
        self.fifo_set_mode(FifoMode::Bypass)?;
        self.write_power_mode(PowerMode::HIGH_PERFORMANCE)?;

        self.acc_odr = 100.0;
        self.acc_operating_mode = OperatingMode::HighPerformance;
        self.acc_low_noise = LowNoise::Disabled;

        self.write_odr(Odr::Off)?;
        self.bus.modify::<Ctrl6>(|r| r.set_fs(Fs::G2 as u8))?;

        self.is_initialized = true;
        debug!("[{}] initialized", NAME);
        Ok(())
    }

    pub fn deinit(&mut self) -> DriverResult<()> {
        self.acc_disable()?;

        self.acc_odr = 0.0;
        self.acc_operating_mode = OperatingMode::HighPerformance;
        self.acc_low_noise = LowNoise::Disabled;
        self.is_initialized = false;
        Ok(())
    }

    pub fn read_id(&mut self) -> DriverResult<u8> {
        self.bus.read_reg(Reg::WhoAmI as u8)
    }

    pub fn capabilities(&self) -> MotionCapabilities {
        MotionCapabilities {
            acc: true,
            acc_max_fs: 16,
            acc_max_odr: 1600.0,
            ..Default::default()
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    pub fn acc_is_enabled(&self) -> bool {
        self.acc_is_enabled
    }

    pub fn acc_enable(&mut self) -> DriverResult<()> {
        if self.acc_is_enabled {
            return Ok(());
        }

        self.set_odr_when_enabled(self.acc_odr, self.acc_operating_mode, self.acc_low_noise)?;
        self.acc_is_enabled = true;
        Ok(())
    }

    pub fn acc_disable(&mut self) -> DriverResult<()> {
        if !self.acc_is_enabled {
            return Ok(());
        }

        self.write_odr(Odr::Off)?;
        self.acc_is_enabled = false;
        Ok(())
    }

    /// Sensitivity in mg/LSB for the current full scale and power mode
    pub fn acc_sensitivity(&mut self) -> DriverResult<f32> {
        let fs = self.read_fs()?;
        let mode = self.read_power_mode()?;

        let table = if mode.is_12bit() { &SENS_12BIT } else { &SENS_14BIT };
        Ok(table[fs as usize])
    }

    pub fn acc_output_data_rate(&mut self) -> DriverResult<f32> {
        let odr = self.read_odr()?;
        let mode = self.read_power_mode()?;
        let hp = mode.is_high_performance();

        Ok(match odr {
            Odr::Off | Odr::SwTrigger | Odr::PinTrigger => 0.0,
            Odr::Hz1_6LpOnly => {
                if hp {
                    12.5
                } else {
                    1.6
                }
            }
            Odr::Hz12_5 => 12.5,
            Odr::Hz25 => 25.0,
            Odr::Hz50 => 50.0,
            Odr::Hz100 => 100.0,
            Odr::Hz200 => 200.0,
            // Low-power modes top out at 200 Hz whatever the code says
            Odr::Hz400 => if hp { 400.0 } else { 200.0 },
            Odr::Hz800 => if hp { 800.0 } else { 200.0 },
            Odr::Hz1600 => if hp { 1600.0 } else { 200.0 },
        })
    }

    pub fn acc_set_output_data_rate(&mut self, odr: f32) -> DriverResult<()> {
        self.acc_set_output_data_rate_with_mode(odr, OperatingMode::HighPerformance, LowNoise::Disabled)
    }

    pub fn acc_set_output_data_rate_with_mode(
        &mut self,
        odr: f32,
        mode: OperatingMode,
        noise: LowNoise,
    ) -> DriverResult<()> {
        if self.acc_is_enabled {
            self.set_odr_when_enabled(odr, mode, noise)
        } else {
            self.set_odr_when_disabled(odr, mode, noise);
            Ok(())
        }
    }

    pub fn acc_full_scale(&mut self) -> DriverResult<i32> {
        Ok(match self.read_fs()? {
            Fs::G2 => 2,
            Fs::G4 => 4,
            Fs::G8 => 8,
            Fs::G16 => 16,
        })
    }

    pub fn acc_set_full_scale(&mut self, full_scale: i32) -> DriverResult<()> {
        let fs = match full_scale {
            fs if fs <= 2 => Fs::G2,
            fs if fs <= 4 => Fs::G4,
            fs if fs <= 8 => Fs::G8,
            _ => Fs::G16,
        };
        self.bus.modify::<Ctrl6>(|r| r.set_fs(fs as u8))
    }

    /// Raw samples, right-aligned to the output resolution of the current mode
    pub fn acc_axes_raw(&mut self) -> DriverResult<AxesRaw> {
        let mode = self.read_power_mode()?;

        let mut buf = [0u8; 6];
        self.bus.read_regs(Reg::OutXL as u8, &mut buf)?;
        let raw = AxesRaw::from_le_bytes(&buf);

        let div: i16 = if mode.is_12bit() { 16 } else { 4 };
        Ok(AxesRaw {
            x: raw.x / div,
            y: raw.y / div,
            z: raw.z / div,
        })
    }

    /// Acceleration in mg
    pub fn acc_axes(&mut self) -> DriverResult<Axes> {
        let raw = self.acc_axes_raw()?;
        let sensitivity = self.acc_sensitivity()?;
        Ok(raw.scale(sensitivity))
    }

    pub fn read_register(&mut self, reg: u8) -> DriverResult<u8> {
        self.bus.read_reg(reg)
    }

    pub fn write_register(&mut self, reg: u8, value: u8) -> DriverResult<()> {
        self.bus.write_reg(reg, value)
    }

    pub fn acc_drdy_status(&mut self) -> DriverResult<bool> {
        Ok(self.bus.read::<Status>()?.drdy())
    }

    pub fn fifo_set_mode(&mut self, mode: FifoMode) -> DriverResult<()> {
        self.bus.modify::<FifoCtrl>(|r| r.set_fmode(mode as u8))
    }

    pub fn acc_set_self_test(&mut self, mode: SelfTest) -> DriverResult<()> {
        self.bus.modify::<Ctrl3>(|r| r.set_st(mode as u8))
    }

    fn set_odr_when_enabled(&mut self, odr: f32, mode: OperatingMode, noise: LowNoise) -> DriverResult<()> {
        let odr = match mode {
            OperatingMode::HighPerformance => odr.max(12.5),
            _ => odr.min(200.0),
        };

        let new_odr = round_up(odr, &ODR_TABLE, Odr::Hz1600);
        self.write_odr(new_odr)?;
        self.write_power_mode(mode.power_mode(noise))?;

        self.acc_odr = odr;
        self.acc_operating_mode = mode;
        self.acc_low_noise = noise;
        Ok(())
    }

    fn set_odr_when_disabled(&mut self, odr: f32, mode: OperatingMode, noise: LowNoise) {
        self.acc_operating_mode = mode;
        self.acc_low_noise = noise;
        self.acc_odr = round_up(odr, &ODR_VALUES, 1600.0);
    }

    fn write_odr(&mut self, odr: Odr) -> DriverResult<()> {
        let code = odr as u8;
        self.bus.modify::<Ctrl1>(|r| r.set_odr(code & 0x0F))?;
        self.bus.modify::<Ctrl3>(|r| r.set_slp_mode((code & 0x30) >> 4))
    }

    fn read_odr(&mut self) -> DriverResult<Odr> {
        let ctrl1 = self.bus.read::<Ctrl1>()?;
        let ctrl3 = self.bus.read::<Ctrl3>()?;
        Ok(Odr::from_bits(ctrl1.odr(), ctrl3.slp_mode()))
    }

    fn write_power_mode(&mut self, mode: PowerMode) -> DriverResult<()> {
        self.bus.modify::<Ctrl1>(|r| {
            r.set_mode(mode.mode());
            r.set_lp_mode(mode.lp_mode());
        })?;
        self.bus.modify::<Ctrl6>(|r| r.set_low_noise(mode.low_noise()))
    }

    fn read_power_mode(&mut self) -> DriverResult<PowerMode> {
        let ctrl1 = self.bus.read::<Ctrl1>()?;
        let ctrl6 = self.bus.read::<Ctrl6>()?;
        // mode 0b11 is reserved and reads as high performance
        if ctrl1.mode() > 0x02 {
            return Ok(PowerMode::HIGH_PERFORMANCE);
        }
        Ok(PowerMode(((ctrl6.low_noise() as u8) << 4) | (ctrl1.mode() << 2) | ctrl1.lp_mode()))
    }

    fn read_fs(&mut self) -> DriverResult<Fs> {
        Ok(Fs::from_bits(self.bus.read::<Ctrl6>()?.fs()))
    }
}

impl<B: RegisterBus + Send> MotionSensor for Lis2dw12<B> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn init(&mut self) -> DriverResult<()> {
        Lis2dw12::init(self)
    }

    fn deinit(&mut self) -> DriverResult<()> {
        Lis2dw12::deinit(self)
    }

    fn read_id(&mut self) -> DriverResult<u8> {
        Lis2dw12::read_id(self)
    }

    fn capabilities(&self) -> MotionCapabilities {
        Lis2dw12::capabilities(self)
    }

    fn enable(&mut self, function: MotionFunction) -> DriverResult<()> {
        self.accelero_only(function)?;
        self.acc_enable()
    }

    fn disable(&mut self, function: MotionFunction) -> DriverResult<()> {
        self.accelero_only(function)?;
        self.acc_disable()
    }

    fn sensitivity(&mut self, function: MotionFunction) -> DriverResult<f32> {
        self.accelero_only(function)?;
        self.acc_sensitivity()
    }

    fn output_data_rate(&mut self, function: MotionFunction) -> DriverResult<f32> {
        self.accelero_only(function)?;
        self.acc_output_data_rate()
    }

    fn set_output_data_rate(&mut self, function: MotionFunction, odr: f32) -> DriverResult<()> {
        self.accelero_only(function)?;
        self.acc_set_output_data_rate(odr)
    }

    fn full_scale(&mut self, function: MotionFunction) -> DriverResult<i32> {
        self.accelero_only(function)?;
        self.acc_full_scale()
    }

    fn set_full_scale(&mut self, function: MotionFunction, full_scale: i32) -> DriverResult<()> {
        self.accelero_only(function)?;
        self.acc_set_full_scale(full_scale)
    }

    fn axes(&mut self, function: MotionFunction) -> DriverResult<Axes> {
        self.accelero_only(function)?;
        self.acc_axes()
    }

    fn axes_raw(&mut self, function: MotionFunction) -> DriverResult<AxesRaw> {
        self.accelero_only(function)?;
        self.acc_axes_raw()
    }

    fn drdy_status(&mut self, function: MotionFunction) -> DriverResult<bool> {
        self.accelero_only(function)?;
        self.acc_drdy_status()
    }

    fn read_register(&mut self, reg: u8) -> DriverResult<u8> {
        Lis2dw12::read_register(self, reg)
    }

    fn write_register(&mut self, reg: u8, value: u8) -> DriverResult<()> {
        Lis2dw12::write_register(self, reg, value)
    }
}

impl<B> Lis2dw12<B> {
    fn accelero_only(&self, function: MotionFunction) -> DriverResult<()> {
        match function {
            MotionFunction::Accelero => Ok(()),
            _ => Err(DriverError::NotSupported { component: NAME }),
        }
    }
}

pub static LIS2DW12_FACTORY: Lis2dw12Factory = Lis2dw12Factory;

pub struct Lis2dw12Factory;

impl ComponentFactory for Lis2dw12Factory {
    fn name(&self) -> &'static str {
        "lis2dw12"
    }

    fn id(&self) -> u8 {
        ID
    }

    fn default_address(&self) -> u8 {
        I2C_ADD_H
    }

    fn functions(&self) -> u32 {
        MotionFunction::Accelero.mask()
    }

    fn create(&self, io: BusIo) -> DriverResult<Component> {
        let mut dev = Lis2dw12::from_bus(io.into_register_bus());
        dev.configure_bus()?;
        Ok(Component::Motion(Box::new(dev)))
    }
}
