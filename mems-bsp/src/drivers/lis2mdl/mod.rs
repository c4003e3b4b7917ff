//! LIS2MDL 3-axis magnetometer.
//!
//! Fixed ±50 gauss range; the output data rate is written straight to the
//! chip and only the operating mode changes on enable/disable.

pub mod register;

use self::register::*;
use super::{
    not_supported, round_up, Axes, AxesRaw, Component, ComponentFactory, MotionCapabilities, MotionFunction,
    MotionSensor,
};
use crate::bus::{BusIo, BusType, I2cBus, RegisterBus, SpiBus};
use crate::errors::DriverResult;
use embedded_hal::i2c::I2c;
use embedded_hal::spi::SpiDevice;
use tracing::debug;

pub const I2C_ADD: u8 = 0x1E;

const NAME: &str = "LIS2MDL";

/// mgauss/LSB
const SENSITIVITY: f32 = 1.5;
const FULL_SCALE: i32 = 50;

const ODR_TABLE: [(f32, Odr); 3] = [(10.0, Odr::Hz10), (20.0, Odr::Hz20), (50.0, Odr::Hz50)];

pub struct Lis2mdl<B> {
    bus: B,
    is_initialized: bool,
    mag_is_enabled: bool,
}

impl<P: I2c> Lis2mdl<I2cBus<P>> {
    pub fn new_i2c(i2c: P) -> Self {
        Self::from_bus(I2cBus::new(i2c, I2C_ADD))
    }
}

impl<P: SpiDevice> Lis2mdl<SpiBus<P>> {
    pub fn new_spi(spi: P) -> Self {
        Self::from_bus(SpiBus::new(spi))
    }
}

impl<B: RegisterBus> Lis2mdl<B> {
    pub fn from_bus(bus: B) -> Self {
        Self {
            bus,
            is_initialized: false,
            mag_is_enabled: false,
        }
    }

    /// Disable the I2C interface when wired on SPI; must run before any read
    pub fn configure_bus(&mut self) -> DriverResult<()> {
        if !self.is_initialized {
            match self.bus.bus_type() {
                BusType::I2c => {}
                BusType::Spi4Wires => self.bus.write_reg(Reg::CfgC as u8, CFG_C_SPI_4WIRES)?,
                BusType::Spi3Wires => self.bus.modify::<CfgC>(|r| r.set_i2c_dis(true))?,
            }
        }
        Ok(())
    }

    pub fn init(&mut self) -> DriverResult<()> {
        self.bus.modify::<CfgC>(|r| r.set_bdu(true))?;
        self.set_mode(Mode::PowerDown)?;
        self.bus.modify::<CfgA>(|r| r.set_odr(Odr::Hz100 as u8))?;
        self.mag_set_self_test(false)?;

        self.is_initialized = true;
        debug!("[{}] initialized", NAME);
        Ok(())
    }

    pub fn deinit(&mut self) -> DriverResult<()> {
        self.mag_disable()?;
        self.is_initialized = false;
        Ok(())
    }

    pub fn read_id(&mut self) -> DriverResult<u8> {
        self.bus.read_reg(Reg::WhoAmI as u8)
    }

    pub fn capabilities(&self) -> MotionCapabilities {
        MotionCapabilities {
            magneto: true,
            mag_max_fs: FULL_SCALE as u32,
            mag_max_odr: 100.0,
            ..Default::default()
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    pub fn mag_is_enabled(&self) -> bool {
        self.mag_is_enabled
    }

    pub fn mag_enable(&mut self) -> DriverResult<()> {
        if self.mag_is_enabled {
            return Ok(());
        }

        self.set_mode(Mode::Continuous)?;
        self.mag_is_enabled = true;
        Ok(())
    }

    pub fn mag_disable(&mut self) -> DriverResult<()> {
        if !self.mag_is_enabled {
            return Ok(());
        }

        self.set_mode(Mode::PowerDown)?;
        self.mag_is_enabled = false;
        Ok(())
    }

    pub fn mag_sensitivity(&self) -> f32 {
        SENSITIVITY
    }

    pub fn mag_output_data_rate(&mut self) -> DriverResult<f32> {
        Ok(Odr::from_bits(self.bus.read::<CfgA>()?.odr()).hz())
    }

    pub fn mag_set_output_data_rate(&mut self, odr: f32) -> DriverResult<()> {
        let new_odr = round_up(odr, &ODR_TABLE, Odr::Hz100);
        self.bus.modify::<CfgA>(|r| r.set_odr(new_odr as u8))
    }

    pub fn mag_full_scale(&self) -> i32 {
        FULL_SCALE
    }

    /// The range is fixed; any request is accepted
    pub fn mag_set_full_scale(&mut self, _full_scale: i32) -> DriverResult<()> {
        Ok(())
    }

    pub fn mag_axes_raw(&mut self) -> DriverResult<AxesRaw> {
        let mut buf = [0u8; 6];
        self.bus.read_regs(Reg::OutxL as u8, &mut buf)?;
        Ok(AxesRaw::from_le_bytes(&buf))
    }

    /// Magnetic field in mgauss
    pub fn mag_axes(&mut self) -> DriverResult<Axes> {
        Ok(self.mag_axes_raw()?.scale(SENSITIVITY))
    }

    pub fn mag_drdy_status(&mut self) -> DriverResult<bool> {
        Ok(self.bus.read::<Status>()?.zyxda())
    }

    pub fn mag_set_self_test(&mut self, enable: bool) -> DriverResult<()> {
        self.bus.modify::<CfgC>(|r| r.set_self_test(enable))
    }

    /// Low-power mode halves the current at the cost of noise
    pub fn mag_set_low_power(&mut self, enable: bool) -> DriverResult<()> {
        self.bus.modify::<CfgA>(|r| r.set_lp(enable))
    }

    /// Die temperature in °C
    pub fn temperature(&mut self) -> DriverResult<f32> {
        let mut buf = [0u8; 2];
        self.bus.read_regs(Reg::TempOutL as u8, &mut buf)?;
        Ok(i16::from_le_bytes(buf) as f32 / 8.0 + 25.0)
    }

    pub fn read_register(&mut self, reg: u8) -> DriverResult<u8> {
        self.bus.read_reg(reg)
    }

    pub fn write_register(&mut self, reg: u8, value: u8) -> DriverResult<()> {
        self.bus.write_reg(reg, value)
    }

    fn set_mode(&mut self, mode: Mode) -> DriverResult<()> {
        self.bus.modify::<CfgA>(|r| r.set_md(mode as u8))
    }
}

impl<B: RegisterBus + Send> MotionSensor for Lis2mdl<B> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn init(&mut self) -> DriverResult<()> {
        Lis2mdl::init(self)
    }

    fn deinit(&mut self) -> DriverResult<()> {
        Lis2mdl::deinit(self)
    }

    fn read_id(&mut self) -> DriverResult<u8> {
        Lis2mdl::read_id(self)
    }

    fn capabilities(&self) -> MotionCapabilities {
        Lis2mdl::capabilities(self)
    }

    fn enable(&mut self, function: MotionFunction) -> DriverResult<()> {
        match function {
            MotionFunction::Magneto => self.mag_enable(),
            _ => not_supported(NAME),
        }
    }

    fn disable(&mut self, function: MotionFunction) -> DriverResult<()> {
        match function {
            MotionFunction::Magneto => self.mag_disable(),
            _ => not_supported(NAME),
        }
    }

    fn sensitivity(&mut self, function: MotionFunction) -> DriverResult<f32> {
        match function {
            MotionFunction::Magneto => Ok(self.mag_sensitivity()),
            _ => not_supported(NAME),
        }
    }

    fn output_data_rate(&mut self, function: MotionFunction) -> DriverResult<f32> {
        match function {
            MotionFunction::Magneto => self.mag_output_data_rate(),
            _ => not_supported(NAME),
        }
    }

    fn set_output_data_rate(&mut self, function: MotionFunction, odr: f32) -> DriverResult<()> {
        match function {
            MotionFunction::Magneto => self.mag_set_output_data_rate(odr),
            _ => not_supported(NAME),
        }
    }

    fn full_scale(&mut self, function: MotionFunction) -> DriverResult<i32> {
        match function {
            MotionFunction::Magneto => Ok(self.mag_full_scale()),
            _ => not_supported(NAME),
        }
    }

    fn set_full_scale(&mut self, function: MotionFunction, full_scale: i32) -> DriverResult<()> {
        match function {
            MotionFunction::Magneto => self.mag_set_full_scale(full_scale),
            _ => not_supported(NAME),
        }
    }

    fn axes(&mut self, function: MotionFunction) -> DriverResult<Axes> {
        match function {
            MotionFunction::Magneto => self.mag_axes(),
            _ => not_supported(NAME),
        }
    }

    fn axes_raw(&mut self, function: MotionFunction) -> DriverResult<AxesRaw> {
        match function {
            MotionFunction::Magneto => self.mag_axes_raw(),
            _ => not_supported(NAME),
        }
    }

    fn drdy_status(&mut self, function: MotionFunction) -> DriverResult<bool> {
        match function {
            MotionFunction::Magneto => self.mag_drdy_status(),
            _ => not_supported(NAME),
        }
    }

    fn read_register(&mut self, reg: u8) -> DriverResult<u8> {
        Lis2mdl::read_register(self, reg)
    }

    fn write_register(&mut self, reg: u8, value: u8) -> DriverResult<()> {
        Lis2mdl::write_register(self, reg, value)
    }
}

pub static LIS2MDL_FACTORY: Lis2mdlFactory = Lis2mdlFactory;

pub struct Lis2mdlFactory;

impl ComponentFactory for Lis2mdlFactory {
    fn name(&self) -> &'static str {
        "lis2mdl"
    }

    fn id(&self) -> u8 {
        ID
    }

    fn default_address(&self) -> u8 {
        I2C_ADD
    }

    fn functions(&self) -> u32 {
        MotionFunction::Magneto.mask()
    }

    fn create(&self, io: BusIo) -> DriverResult<Component> {
        let mut dev = Lis2mdl::from_bus(io.into_register_bus());
        dev.configure_bus()?;
        Ok(Component::Motion(Box::new(dev)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DriverError;
    use crate::bus::mock::FakeRegisters;

    fn driver() -> (Lis2mdl<I2cBus<FakeRegisters>>, FakeRegisters) {
        // Reset value of CFG_REG_A is idle mode
        let fake = FakeRegisters::new()
            .with(Reg::WhoAmI as u8, ID)
            .with(Reg::CfgA as u8, 0x03);
        let mut dev = Lis2mdl::new_i2c(fake.clone());
        dev.init().unwrap();
        (dev, fake)
    }

    #[test]
    fn test_init_powers_down_at_100hz() {
        let (mut dev, fake) = driver();

        let cfg_a = CfgA::from(fake.get(Reg::CfgA as u8));
        assert_eq!(cfg_a.md(), Mode::PowerDown as u8);
        assert_eq!(cfg_a.odr(), Odr::Hz100 as u8);
        let cfg_c = CfgC::from(fake.get(Reg::CfgC as u8));
        assert!(cfg_c.bdu());
        assert!(!cfg_c.self_test());
        assert_eq!(dev.mag_output_data_rate().unwrap(), 100.0);
    }

    #[test]
    fn test_enable_switches_to_continuous_mode() {
        let (mut dev, fake) = driver();

        dev.mag_enable().unwrap();
        assert_eq!(CfgA::from(fake.get(Reg::CfgA as u8)).md(), Mode::Continuous as u8);
        let writes = fake.write_count();
        dev.mag_enable().unwrap();
        assert_eq!(fake.write_count(), writes);

        dev.mag_disable().unwrap();
        assert_eq!(CfgA::from(fake.get(Reg::CfgA as u8)).md(), Mode::PowerDown as u8);
    }

    #[test]
    fn test_odr_rounds_up() {
        let (mut dev, _fake) = driver();

        for (requested, expected) in [(1.0, 10.0), (10.0, 10.0), (15.0, 20.0), (40.0, 50.0), (75.0, 100.0)] {
            dev.mag_set_output_data_rate(requested).unwrap();
            assert_eq!(dev.mag_output_data_rate().unwrap(), expected);
        }
    }

    #[test]
    fn test_axes_in_mgauss() {
        let (mut dev, fake) = driver();

        fake.set_bytes(Reg::OutxL as u8, &[0x64, 0x00, 0x38, 0xFF, 0x01, 0x00]);
        assert_eq!(dev.mag_axes().unwrap(), Axes { x: 150, y: -300, z: 1 });

        fake.set_bytes(Reg::TempOutL as u8, &[0x10, 0x00]);
        assert_eq!(dev.temperature().unwrap(), 27.0);
    }

    #[test]
    fn test_spi_4wires_disables_i2c_before_init() {
        struct Spi4(FakeRegisters);

        impl RegisterBus for Spi4 {
            fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> DriverResult<()> {
                I2cBus::new(self.0.clone(), I2C_ADD).read_regs(reg, buf)
            }

            fn write_regs(&mut self, reg: u8, data: &[u8]) -> DriverResult<()> {
                I2cBus::new(self.0.clone(), I2C_ADD).write_regs(reg, data)
            }

            fn bus_type(&self) -> BusType {
                BusType::Spi4Wires
            }
        }

        let fake = FakeRegisters::new();
        let mut dev = Lis2mdl::from_bus(Spi4(fake.clone()));
        dev.configure_bus().unwrap();
        dev.init().unwrap();

        let cfg_c = CfgC::from(fake.get(Reg::CfgC as u8));
        assert!(cfg_c.spi_4wire());
        assert!(cfg_c.i2c_dis());
        assert!(cfg_c.bdu());
    }

    #[test]
    fn test_trait_rejects_accelero() {
        let (dev, _fake) = driver();
        let mut sensor: Box<dyn MotionSensor> = Box::new(dev);

        assert_eq!(sensor.full_scale(MotionFunction::Magneto).unwrap(), 50);
        assert!(matches!(
            sensor.axes(MotionFunction::Accelero),
            Err(DriverError::NotSupported { .. })
        ));
    }
}
