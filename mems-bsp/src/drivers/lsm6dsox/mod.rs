//! LSM6DSOX 6-axis inertial module (accelerometer + gyroscope).

pub mod register;

use self::register::*;
use super::{
    not_supported, round_up, Axes, AxesRaw, Component, ComponentFactory, MotionCapabilities, MotionFunction,
    MotionSensor,
};
use crate::bus::{BusIo, BusType, I2cBus, RegisterBus, SpiBus};
use crate::errors::{DriverError, DriverResult};
use embedded_hal::i2c::I2c;
use embedded_hal::spi::SpiDevice;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const I2C_ADD_L: u8 = 0x6A;
pub const I2C_ADD_H: u8 = 0x6B;

const NAME: &str = "LSM6DSOX";

/// mg/LSB indexed by the CTRL1_XL.fs_xl encoding (2, 16, 4, 8 g)
const ACC_SENS: [f32; 4] = [0.061, 0.488, 0.122, 0.244];

const ODR_TABLE: [(f32, Odr); 10] = [
    (1.6, Odr::Hz1_6),
    (12.5, Odr::Hz12_5),
    (26.0, Odr::Hz26),
    (52.0, Odr::Hz52),
    (104.0, Odr::Hz104),
    (208.0, Odr::Hz208),
    (417.0, Odr::Hz417),
    (833.0, Odr::Hz833),
    (1667.0, Odr::Hz1667),
    (3333.0, Odr::Hz3333),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccOperatingMode {
    HighPerformance,
    LowPowerNormal,
    UltraLowPower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GyroOperatingMode {
    HighPerformance,
    LowPowerNormal,
}

pub struct Lsm6dsox<B> {
    bus: B,
    is_initialized: bool,
    acc_is_enabled: bool,
    gyro_is_enabled: bool,
    acc_odr: Odr,
    gyro_odr: Odr,
}

impl<P: I2c> Lsm6dsox<I2cBus<P>> {
    pub fn new_i2c(i2c: P, address: u8) -> Self {
        Self::from_bus(I2cBus::new(i2c, address))
    }
}

impl<P: SpiDevice> Lsm6dsox<SpiBus<P>> {
    pub fn new_spi(spi: P) -> Self {
        Self::from_bus(SpiBus::new(spi))
    }
}

impl<B: RegisterBus> Lsm6dsox<B> {
    pub fn from_bus(bus: B) -> Self {
        Self {
            bus,
            is_initialized: false,
            acc_is_enabled: false,
            gyro_is_enabled: false,
            acc_odr: Odr::Off,
            gyro_odr: Odr::Off,
        }
    }

    /// Switch the part to the wiring of its bus; must run before any read
    pub fn configure_bus(&mut self) -> DriverResult<()> {
        if !self.is_initialized && self.bus.bus_type() == BusType::Spi3Wires {
            self.bus.write_reg(Reg::Ctrl3C as u8, CTRL3_C_SPI_3WIRES)?;
        }
        Ok(())
    }

    pub fn init(&mut self) -> DriverResult<()> {
        self.bus.modify::<Ctrl9Xl>(|r| r.set_i3c_disable(true))?;
        self.bus.modify::<Ctrl3C>(|r| {
            r.set_if_inc(true);
            r.set_bdu(true);
        })?;
        self.fifo_set_mode(FifoMode::Bypass)?;

        self.acc_odr = Odr::Hz104;
        self.bus.modify::<Ctrl1Xl>(|r| r.set_odr_xl(Odr::Off as u8))?;
        self.bus.modify::<Ctrl1Xl>(|r| r.set_fs_xl(FsXl::G2 as u8))?;

        self.gyro_odr = Odr::Hz104;
        self.bus.modify::<Ctrl2G>(|r| r.set_odr_g(Odr::Off as u8))?;
        self.bus.modify::<Ctrl2G>(|r| r.set_fs_g(FsG::Dps2000 as u8))?;

        self.is_initialized = true;
        debug!("[{}] initialized", NAME);
        Ok(())
    }

    pub fn deinit(&mut self) -> DriverResult<()> {
        self.acc_disable()?;
        self.gyro_disable()?;

        self.acc_odr = Odr::Off;
        self.gyro_odr = Odr::Off;
        self.is_initialized = false;
        Ok(())
    }

    pub fn read_id(&mut self) -> DriverResult<u8> {
        self.bus.read_reg(Reg::WhoAmI as u8)
    }

    pub fn capabilities(&self) -> MotionCapabilities {
        MotionCapabilities {
            acc: true,
            gyro: true,
            gyro_max_fs: 2000,
            acc_max_fs: 16,
            gyro_max_odr: 6660.0,
            acc_max_odr: 6660.0,
            ..Default::default()
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    pub fn acc_is_enabled(&self) -> bool {
        self.acc_is_enabled
    }

    pub fn gyro_is_enabled(&self) -> bool {
        self.gyro_is_enabled
    }

    pub fn acc_enable(&mut self) -> DriverResult<()> {
        if self.acc_is_enabled {
            return Ok(());
        }

        let odr = self.acc_odr;
        self.bus.modify::<Ctrl1Xl>(|r| r.set_odr_xl(odr as u8))?;
        self.acc_is_enabled = true;
        Ok(())
    }

    /// Powers the accelerometer down, remembering the rate it was running at
    pub fn acc_disable(&mut self) -> DriverResult<()> {
        if !self.acc_is_enabled {
            return Ok(());
        }

        self.acc_odr = self.read_acc_odr()?;
        self.bus.modify::<Ctrl1Xl>(|r| r.set_odr_xl(Odr::Off as u8))?;
        self.acc_is_enabled = false;
        Ok(())
    }

    pub fn acc_sensitivity(&mut self) -> DriverResult<f32> {
        let fs = self.bus.read::<Ctrl1Xl>()?.fs_xl();
        Ok(ACC_SENS[fs as usize])
    }

    pub fn acc_output_data_rate(&mut self) -> DriverResult<f32> {
        Ok(self.read_acc_odr()?.hz())
    }

    pub fn acc_set_output_data_rate(&mut self, odr: f32) -> DriverResult<()> {
        let new_odr = round_up(odr, &ODR_TABLE, Odr::Hz6667);
        if self.acc_is_enabled {
            self.bus.modify::<Ctrl1Xl>(|r| r.set_odr_xl(new_odr as u8))
        } else {
            self.acc_odr = new_odr;
            Ok(())
        }
    }

    /// Switch the accelerometer power mode, then apply `odr` within the mode's limits.
    ///
    /// Ultra-low-power mode cannot run alongside the gyroscope, which is
    /// disabled first.
    pub fn acc_set_output_data_rate_with_mode(&mut self, odr: f32, mode: AccOperatingMode) -> DriverResult<()> {
        let odr = match mode {
            AccOperatingMode::HighPerformance => {
                self.leave_ultra_low_power()?;
                self.bus.modify::<Ctrl6C>(|r| r.set_xl_hm_mode(false))?;
                odr.max(12.5)
            }
            AccOperatingMode::LowPowerNormal => {
                self.leave_ultra_low_power()?;
                self.bus.modify::<Ctrl6C>(|r| r.set_xl_hm_mode(true))?;
                odr.min(208.0)
            }
            AccOperatingMode::UltraLowPower => {
                self.bus.modify::<Ctrl6C>(|r| r.set_xl_hm_mode(false))?;
                self.gyro_disable()?;
                if !self.bus.read::<Ctrl5C>()?.xl_ulp_en() {
                    self.power_down_acc_if_enabled()?;
                    self.bus.modify::<Ctrl5C>(|r| r.set_xl_ulp_en(true))?;
                }
                odr.min(208.0)
            }
        };

        self.acc_set_output_data_rate(odr)
    }

    pub fn acc_full_scale(&mut self) -> DriverResult<i32> {
        Ok(match FsXl::from_bits(self.bus.read::<Ctrl1Xl>()?.fs_xl()) {
            FsXl::G2 => 2,
            FsXl::G4 => 4,
            FsXl::G8 => 8,
            FsXl::G16 => 16,
        })
    }

    pub fn acc_set_full_scale(&mut self, full_scale: i32) -> DriverResult<()> {
        let fs = match full_scale {
            fs if fs <= 2 => FsXl::G2,
            fs if fs <= 4 => FsXl::G4,
            fs if fs <= 8 => FsXl::G8,
            _ => FsXl::G16,
        };
        self.bus.modify::<Ctrl1Xl>(|r| r.set_fs_xl(fs as u8))
    }

    pub fn acc_axes_raw(&mut self) -> DriverResult<AxesRaw> {
        self.read_axes_raw(Reg::OutxLA)
    }

    /// Acceleration in mg
    pub fn acc_axes(&mut self) -> DriverResult<Axes> {
        let raw = self.acc_axes_raw()?;
        let sensitivity = self.acc_sensitivity()?;
        Ok(raw.scale(sensitivity))
    }

    pub fn acc_drdy_status(&mut self) -> DriverResult<bool> {
        Ok(self.bus.read::<Status>()?.xlda())
    }

    pub fn gyro_enable(&mut self) -> DriverResult<()> {
        if self.gyro_is_enabled {
            return Ok(());
        }

        let odr = self.gyro_odr;
        self.bus.modify::<Ctrl2G>(|r| r.set_odr_g(odr as u8))?;
        self.gyro_is_enabled = true;
        Ok(())
    }

    pub fn gyro_disable(&mut self) -> DriverResult<()> {
        if !self.gyro_is_enabled {
            return Ok(());
        }

        self.gyro_odr = self.read_gyro_odr()?;
        self.bus.modify::<Ctrl2G>(|r| r.set_odr_g(Odr::Off as u8))?;
        self.gyro_is_enabled = false;
        Ok(())
    }

    /// Sensitivity in mdps/LSB
    pub fn gyro_sensitivity(&mut self) -> DriverResult<f32> {
        Ok(match self.read_gyro_fs()? {
            FsG::Dps125 => 4.375,
            FsG::Dps250 => 8.75,
            FsG::Dps500 => 17.5,
            FsG::Dps1000 => 35.0,
            FsG::Dps2000 => 70.0,
        })
    }

    pub fn gyro_output_data_rate(&mut self) -> DriverResult<f32> {
        Ok(self.read_gyro_odr()?.hz())
    }

    pub fn gyro_set_output_data_rate(&mut self, odr: f32) -> DriverResult<()> {
        // The gyroscope has no 1.6 Hz setting
        let new_odr = round_up(odr, &ODR_TABLE[1..], Odr::Hz6667);
        if self.gyro_is_enabled {
            self.bus.modify::<Ctrl2G>(|r| r.set_odr_g(new_odr as u8))
        } else {
            self.gyro_odr = new_odr;
            Ok(())
        }
    }

    pub fn gyro_set_output_data_rate_with_mode(&mut self, odr: f32, mode: GyroOperatingMode) -> DriverResult<()> {
        let odr = match mode {
            GyroOperatingMode::HighPerformance => {
                self.bus.modify::<Ctrl7G>(|r| r.set_g_hm_mode(false))?;
                odr
            }
            GyroOperatingMode::LowPowerNormal => {
                self.bus.modify::<Ctrl7G>(|r| r.set_g_hm_mode(true))?;
                odr.min(208.0)
            }
        };

        self.gyro_set_output_data_rate(odr)
    }

    pub fn gyro_full_scale(&mut self) -> DriverResult<i32> {
        Ok(match self.read_gyro_fs()? {
            FsG::Dps125 => 125,
            FsG::Dps250 => 250,
            FsG::Dps500 => 500,
            FsG::Dps1000 => 1000,
            FsG::Dps2000 => 2000,
        })
    }

    pub fn gyro_set_full_scale(&mut self, full_scale: i32) -> DriverResult<()> {
        let fs = match full_scale {
            fs if fs <= 125 => FsG::Dps125,
            fs if fs <= 250 => FsG::Dps250,
            fs if fs <= 500 => FsG::Dps500,
            fs if fs <= 1000 => FsG::Dps1000,
            _ => FsG::Dps2000,
        };
        self.bus.modify::<Ctrl2G>(|r| r.set_fs_g(fs as u8))
    }

    pub fn gyro_axes_raw(&mut self) -> DriverResult<AxesRaw> {
        self.read_axes_raw(Reg::OutxLG)
    }

    /// Angular rate in mdps
    pub fn gyro_axes(&mut self) -> DriverResult<Axes> {
        let raw = self.gyro_axes_raw()?;
        let sensitivity = self.gyro_sensitivity()?;
        Ok(raw.scale(sensitivity))
    }

    pub fn gyro_drdy_status(&mut self) -> DriverResult<bool> {
        Ok(self.bus.read::<Status>()?.gda())
    }

    /// Die temperature in °C
    pub fn temperature(&mut self) -> DriverResult<f32> {
        let mut buf = [0u8; 2];
        self.bus.read_regs(Reg::OutTempL as u8, &mut buf)?;
        Ok(i16::from_le_bytes(buf) as f32 / 256.0 + 25.0)
    }

    pub fn temp_drdy_status(&mut self) -> DriverResult<bool> {
        Ok(self.bus.read::<Status>()?.tda())
    }

    pub fn fifo_set_mode(&mut self, mode: FifoMode) -> DriverResult<()> {
        self.bus.modify::<FifoCtrl4>(|r| r.set_fifo_mode(mode as u8))
    }

    pub fn read_register(&mut self, reg: u8) -> DriverResult<u8> {
        self.bus.read_reg(reg)
    }

    pub fn write_register(&mut self, reg: u8, value: u8) -> DriverResult<()> {
        self.bus.write_reg(reg, value)
    }

    fn leave_ultra_low_power(&mut self) -> DriverResult<()> {
        if self.bus.read::<Ctrl5C>()?.xl_ulp_en() {
            self.power_down_acc_if_enabled()?;
            self.bus.modify::<Ctrl5C>(|r| r.set_xl_ulp_en(false))?;
        }
        Ok(())
    }

    // The ULP bit may only change while the accelerometer is powered down
    fn power_down_acc_if_enabled(&mut self) -> DriverResult<()> {
        if self.acc_is_enabled {
            self.bus.modify::<Ctrl1Xl>(|r| r.set_odr_xl(Odr::Off as u8))?;
        }
        Ok(())
    }

    /// Unknown codes read as powered down
    fn read_acc_odr(&mut self) -> DriverResult<Odr> {
        Ok(Odr::from_bits(self.bus.read::<Ctrl1Xl>()?.odr_xl()).unwrap_or(Odr::Off))
    }

    fn read_gyro_odr(&mut self) -> DriverResult<Odr> {
        match Odr::from_bits(self.bus.read::<Ctrl2G>()?.odr_g()) {
            Some(Odr::Hz1_6) | None => Ok(Odr::Off),
            Some(odr) => Ok(odr),
        }
    }

    fn read_gyro_fs(&mut self) -> DriverResult<FsG> {
        FsG::from_bits(self.bus.read::<Ctrl2G>()?.fs_g()).ok_or(DriverError::UnexpectedValue)
    }

    fn read_axes_raw(&mut self, reg: Reg) -> DriverResult<AxesRaw> {
        let mut buf = [0u8; 6];
        self.bus.read_regs(reg as u8, &mut buf)?;
        Ok(AxesRaw::from_le_bytes(&buf))
    }
}

impl<B: RegisterBus + Send> MotionSensor for Lsm6dsox<B> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn init(&mut self) -> DriverResult<()> {
        Lsm6dsox::init(self)
    }

    fn deinit(&mut self) -> DriverResult<()> {
        Lsm6dsox::deinit(self)
    }

    fn read_id(&mut self) -> DriverResult<u8> {
        Lsm6dsox::read_id(self)
    }

    fn capabilities(&self) -> MotionCapabilities {
        Lsm6dsox::capabilities(self)
    }

    fn enable(&mut self, function: MotionFunction) -> DriverResult<()> {
        match function {
            MotionFunction::Accelero => self.acc_enable(),
            MotionFunction::Gyro => self.gyro_enable(),
            MotionFunction::Magneto => not_supported(NAME),
        }
    }

    fn disable(&mut self, function: MotionFunction) -> DriverResult<()> {
        match function {
            MotionFunction::Accelero => self.acc_disable(),
            MotionFunction::Gyro => self.gyro_disable(),
            MotionFunction::Magneto => not_supported(NAME),
        }
    }

    fn sensitivity(&mut self, function: MotionFunction) -> DriverResult<f32> {
        match function {
            MotionFunction::Accelero => self.acc_sensitivity(),
            MotionFunction::Gyro => self.gyro_sensitivity(),
            MotionFunction::Magneto => not_supported(NAME),
        }
    }

    fn output_data_rate(&mut self, function: MotionFunction) -> DriverResult<f32> {
        match function {
            MotionFunction::Accelero => self.acc_output_data_rate(),
            MotionFunction::Gyro => self.gyro_output_data_rate(),
            MotionFunction::Magneto => not_supported(NAME),
        }
    }

    fn set_output_data_rate(&mut self, function: MotionFunction, odr: f32) -> DriverResult<()> {
        match function {
            MotionFunction::Accelero => self.acc_set_output_data_rate(odr),
            MotionFunction::Gyro => self.gyro_set_output_data_rate(odr),
            MotionFunction::Magneto => not_supported(NAME),
        }
    }

    fn full_scale(&mut self, function: MotionFunction) -> DriverResult<i32> {
        match function {
            MotionFunction::Accelero => self.acc_full_scale(),
            MotionFunction::Gyro => self.gyro_full_scale(),
            MotionFunction::Magneto => not_supported(NAME),
        }
    }

    fn set_full_scale(&mut self, function: MotionFunction, full_scale: i32) -> DriverResult<()> {
        match function {
            MotionFunction::Accelero => self.acc_set_full_scale(full_scale),
            MotionFunction::Gyro => self.gyro_set_full_scale(full_scale),
            MotionFunction::Magneto => not_supported(NAME),
        }
    }

    fn axes(&mut self, function: MotionFunction) -> DriverResult<Axes> {
        match function {
            MotionFunction::Accelero => self.acc_axes(),
            MotionFunction::Gyro => self.gyro_axes(),
            MotionFunction::Magneto => not_supported(NAME),
        }
    }

    fn axes_raw(&mut self, function: MotionFunction) -> DriverResult<AxesRaw> {
        match function {
            MotionFunction::Accelero => self.acc_axes_raw(),
            MotionFunction::Gyro => self.gyro_axes_raw(),
            MotionFunction::Magneto => not_supported(NAME),
        }
    }

    fn drdy_status(&mut self, function: MotionFunction) -> DriverResult<bool> {
        match function {
            MotionFunction::Accelero => self.acc_drdy_status(),
            MotionFunction::Gyro => self.gyro_drdy_status(),
            MotionFunction::Magneto => not_supported(NAME),
        }
    }

    fn read_register(&mut self, reg: u8) -> DriverResult<u8> {
        Lsm6dsox::read_register(self, reg)
    }

    fn write_register(&mut self, reg: u8, value: u8) -> DriverResult<()> {
        Lsm6dsox::write_register(self, reg, value)
    }
}

pub static LSM6DSOX_FACTORY: Lsm6dsoxFactory = Lsm6dsoxFactory;

pub struct Lsm6dsoxFactory;

impl ComponentFactory for Lsm6dsoxFactory {
    fn name(&self) -> &'static str {
        "lsm6dsox"
    }

    fn id(&self) -> u8 {
        ID
    }

    fn default_address(&self) -> u8 {
        I2C_ADD_H
    }

    fn functions(&self) -> u32 {
        MotionFunction::Gyro.mask() | MotionFunction::Accelero.mask()
    }

    fn create(&self, io: BusIo) -> DriverResult<Component> {
        let mut dev = Lsm6dsox::from_bus(io.into_register_bus());
        dev.configure_bus()?;
        Ok(Component::Motion(Box::new(dev)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::FakeRegisters;

    fn driver() -> (Lsm6dsox<I2cBus<FakeRegisters>>, FakeRegisters) {
        let fake = FakeRegisters::new().with(Reg::WhoAmI as u8, ID);
        let mut dev = Lsm6dsox::new_i2c(fake.clone(), I2C_ADD_H);
        dev.init().unwrap();
        (dev, fake)
    }

    #[test]
    fn test_init_defaults() {
        let (mut dev, fake) = driver();

        assert_eq!(dev.read_id().unwrap(), ID);
        assert!(Ctrl9Xl::from(fake.get(Reg::Ctrl9Xl as u8)).i3c_disable());
        let ctrl3 = Ctrl3C::from(fake.get(Reg::Ctrl3C as u8));
        assert!(ctrl3.if_inc() && ctrl3.bdu());
        assert_eq!(dev.acc_output_data_rate().unwrap(), 0.0);
        assert_eq!(dev.gyro_output_data_rate().unwrap(), 0.0);
        assert_eq!(dev.acc_full_scale().unwrap(), 2);
        assert_eq!(dev.gyro_full_scale().unwrap(), 2000);
    }

    #[test]
    fn test_enable_uses_cached_rate_and_disable_remembers_it() {
        let (mut dev, fake) = driver();

        dev.acc_enable().unwrap();
        assert_eq!(dev.acc_output_data_rate().unwrap(), 104.0);
        let writes = fake.write_count();
        dev.acc_enable().unwrap();
        assert_eq!(fake.write_count(), writes);

        dev.acc_set_output_data_rate(800.0).unwrap();
        assert_eq!(dev.acc_output_data_rate().unwrap(), 833.0);
        dev.acc_disable().unwrap();
        assert_eq!(dev.acc_output_data_rate().unwrap(), 0.0);
        dev.acc_enable().unwrap();
        assert_eq!(dev.acc_output_data_rate().unwrap(), 833.0);
    }

    #[test]
    fn test_gyro_rate_set_while_disabled_applies_on_enable() {
        let (mut dev, fake) = driver();

        let writes = fake.write_count();
        dev.gyro_set_output_data_rate(5.0).unwrap();
        assert_eq!(fake.write_count(), writes);
        assert_eq!(dev.gyro_output_data_rate().unwrap(), 0.0);

        dev.gyro_enable().unwrap();
        assert_eq!(Ctrl2G::from(fake.get(Reg::Ctrl2G as u8)).odr_g(), Odr::Hz12_5 as u8);
        assert_eq!(dev.gyro_output_data_rate().unwrap(), 12.5);

        dev.gyro_disable().unwrap();
        assert_eq!(dev.gyro_output_data_rate().unwrap(), 0.0);
        dev.gyro_enable().unwrap();
        assert_eq!(dev.gyro_output_data_rate().unwrap(), 12.5);
    }

    #[test]
    fn test_odr_rounding() {
        let (mut dev, _fake) = driver();
        dev.acc_enable().unwrap();
        dev.gyro_enable().unwrap();

        dev.acc_set_output_data_rate(1.0).unwrap();
        assert_eq!(dev.acc_output_data_rate().unwrap(), 1.6);
        dev.gyro_set_output_data_rate(1.0).unwrap();
        assert_eq!(dev.gyro_output_data_rate().unwrap(), 12.5);
        dev.gyro_set_output_data_rate(10_000.0).unwrap();
        assert_eq!(dev.gyro_output_data_rate().unwrap(), 6667.0);
    }

    #[test]
    fn test_full_scale_encoding() {
        let (mut dev, fake) = driver();

        dev.acc_set_full_scale(3).unwrap();
        assert_eq!(Ctrl1Xl::from(fake.get(Reg::Ctrl1Xl as u8)).fs_xl(), FsXl::G4 as u8);
        assert_eq!(dev.acc_full_scale().unwrap(), 4);
        assert_eq!(dev.acc_sensitivity().unwrap(), 0.122);

        dev.acc_set_full_scale(16).unwrap();
        assert_eq!(dev.acc_sensitivity().unwrap(), 0.488);

        for (requested, expected) in [(100, 125), (200, 250), (500, 500), (900, 1000), (4000, 2000)] {
            dev.gyro_set_full_scale(requested).unwrap();
            assert_eq!(dev.gyro_full_scale().unwrap(), expected);
        }
    }

    #[test]
    fn test_ultra_low_power_turns_gyro_off() {
        let (mut dev, fake) = driver();
        dev.acc_enable().unwrap();
        dev.gyro_enable().unwrap();

        dev.acc_set_output_data_rate_with_mode(833.0, AccOperatingMode::UltraLowPower)
            .unwrap();
        assert!(!dev.gyro_is_enabled());
        assert!(Ctrl5C::from(fake.get(Reg::Ctrl5C as u8)).xl_ulp_en());
        assert_eq!(dev.acc_output_data_rate().unwrap(), 208.0);

        dev.acc_set_output_data_rate_with_mode(5.0, AccOperatingMode::HighPerformance)
            .unwrap();
        assert!(!Ctrl5C::from(fake.get(Reg::Ctrl5C as u8)).xl_ulp_en());
        assert_eq!(dev.acc_output_data_rate().unwrap(), 12.5);
    }

    #[test]
    fn test_low_power_normal_sets_hm_mode_and_caps_rate() {
        let (mut dev, fake) = driver();

        dev.gyro_set_output_data_rate_with_mode(1000.0, GyroOperatingMode::LowPowerNormal)
            .unwrap();
        assert!(Ctrl7G::from(fake.get(Reg::Ctrl7G as u8)).g_hm_mode());
        dev.gyro_enable().unwrap();
        assert_eq!(dev.gyro_output_data_rate().unwrap(), 208.0);

        dev.acc_set_output_data_rate_with_mode(1000.0, AccOperatingMode::LowPowerNormal)
            .unwrap();
        assert!(Ctrl6C::from(fake.get(Reg::Ctrl6C as u8)).xl_hm_mode());
    }

    #[test]
    fn test_gyro_axes_and_temperature() {
        let (mut dev, fake) = driver();

        fake.set_bytes(Reg::OutxLG as u8, &[0x64, 0x00, 0x9C, 0xFF, 0x00, 0x00]);
        assert_eq!(dev.gyro_axes().unwrap(), Axes { x: 7000, y: -7000, z: 0 });

        // 512 LSB above the 25 °C offset
        fake.set_bytes(Reg::OutTempL as u8, &[0x00, 0x02]);
        assert_eq!(dev.temperature().unwrap(), 27.0);
    }

    #[test]
    fn test_trait_dispatches_per_function() {
        let (dev, fake) = driver();
        let mut sensor: Box<dyn MotionSensor> = Box::new(dev);

        sensor.set_full_scale(MotionFunction::Gyro, 250).unwrap();
        assert_eq!(sensor.sensitivity(MotionFunction::Gyro).unwrap(), 8.75);
        assert_eq!(sensor.sensitivity(MotionFunction::Accelero).unwrap(), 0.061);
        assert!(matches!(
            sensor.enable(MotionFunction::Magneto),
            Err(DriverError::NotSupported { .. })
        ));

        fake.set(Reg::Status as u8, 0x02);
        assert!(sensor.drdy_status(MotionFunction::Gyro).unwrap());
        assert!(!sensor.drdy_status(MotionFunction::Accelero).unwrap());
    }
}
