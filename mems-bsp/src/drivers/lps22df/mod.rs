//! LPS22DF barometer with embedded temperature sensor.
//!
//! Pressure and temperature share one conversion engine: the part only
//! powers down once both channels are disabled, and a rate change applies
//! to both.

pub mod register;

use self::register::*;
use super::{not_supported, round_up, Component, ComponentFactory, EnvCapabilities, EnvFunction, EnvSensor};
use crate::bus::{BusIo, BusType, I2cBus, RegisterBus, SpiBus};
use crate::errors::{DriverError, DriverResult};
use embedded_hal::i2c::I2c;
use embedded_hal::spi::SpiDevice;
use tracing::debug;

pub const I2C_ADD_L: u8 = 0x5C;
pub const I2C_ADD_H: u8 = 0x5D;

const NAME: &str = "LPS22DF";

const ODR_TABLE: [(f32, Odr); 7] = [
    (1.0, Odr::Hz1),
    (4.0, Odr::Hz4),
    (10.0, Odr::Hz10),
    (25.0, Odr::Hz25),
    (50.0, Odr::Hz50),
    (75.0, Odr::Hz75),
    (100.0, Odr::Hz100),
];

pub struct Lps22df<B> {
    bus: B,
    is_initialized: bool,
    press_is_enabled: bool,
    temp_is_enabled: bool,
    last_md: Md,
}

impl<P: I2c> Lps22df<I2cBus<P>> {
    pub fn new_i2c(i2c: P, address: u8) -> Self {
        Self::from_bus(I2cBus::new(i2c, address))
    }
}

impl<P: SpiDevice> Lps22df<SpiBus<P>> {
    pub fn new_spi(spi: P) -> Self {
        Self::from_bus(SpiBus::new(spi))
    }
}

impl<B: RegisterBus> Lps22df<B> {
    pub fn from_bus(bus: B) -> Self {
        Self {
            bus,
            is_initialized: false,
            press_is_enabled: false,
            temp_is_enabled: false,
            last_md: Md {
                odr: Odr::OneShot,
                avg: Avg::Avg4,
                lpf: Lpf::Disabled,
            },
        }
    }

    /// Switch the part to the wiring of its bus; must run before any read
    pub fn configure_bus(&mut self) -> DriverResult<()> {
        if !self.is_initialized && self.bus.bus_type() == BusType::Spi3Wires {
            self.bus.write_reg(Reg::IfCtrl as u8, IF_CTRL_SPI_3WIRES)?;
        }
        Ok(())
    }

    pub fn init(&mut self) -> DriverResult<()> {
        if self.is_initialized {
            return Ok(());
        }

        let mut regs = [0u8; 2];
        self.bus.read_regs(Reg::Ctrl2 as u8, &mut regs)?;
        let ctrl2 = Ctrl2::from(regs[0]).with_bdu(true);
        let ctrl3 = Ctrl3::from(regs[1]).with_if_add_inc(true);
        self.bus.write_regs(Reg::Ctrl2 as u8, &[ctrl2.into(), ctrl3.into()])?;

        self.write_bus_mode()?;

        self.write_md(Md {
            odr: Odr::OneShot,
            avg: Avg::Avg4,
            lpf: Lpf::OdrDiv4,
        })?;
        self.last_md = Md {
            odr: Odr::Hz25,
            ..self.read_md()?
        };

        self.is_initialized = true;
        debug!("[{}] initialized", NAME);
        Ok(())
    }

    pub fn deinit(&mut self) -> DriverResult<()> {
        if self.is_initialized {
            self.press_disable()?;
            self.temp_disable()?;
        }
        self.is_initialized = false;
        Ok(())
    }

    pub fn read_id(&mut self) -> DriverResult<u8> {
        self.bus.read_reg(Reg::WhoAmI as u8)
    }

    pub fn capabilities(&self) -> EnvCapabilities {
        EnvCapabilities {
            temperature: true,
            pressure: true,
            temp_max_odr: 200.0,
            press_max_odr: 200.0,
            ..Default::default()
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    pub fn press_is_enabled(&self) -> bool {
        self.press_is_enabled
    }

    pub fn temp_is_enabled(&self) -> bool {
        self.temp_is_enabled
    }

    pub fn press_enable(&mut self) -> DriverResult<()> {
        if self.press_is_enabled {
            return Ok(());
        }

        self.write_md(self.last_md)?;
        self.press_is_enabled = true;
        Ok(())
    }

    pub fn press_disable(&mut self) -> DriverResult<()> {
        if !self.press_is_enabled {
            return Ok(());
        }

        if !self.temp_is_enabled {
            self.power_down()?;
        }
        self.press_is_enabled = false;
        Ok(())
    }

    pub fn temp_enable(&mut self) -> DriverResult<()> {
        if self.temp_is_enabled {
            return Ok(());
        }

        self.write_md(self.last_md)?;
        self.temp_is_enabled = true;
        Ok(())
    }

    pub fn temp_disable(&mut self) -> DriverResult<()> {
        if !self.temp_is_enabled {
            return Ok(());
        }

        if !self.press_is_enabled {
            self.power_down()?;
        }
        self.temp_is_enabled = false;
        Ok(())
    }

    /// Current rate in Hz, 0 when powered down
    pub fn output_data_rate(&mut self) -> DriverResult<f32> {
        Ok(self.read_md()?.odr.hz())
    }

    pub fn set_output_data_rate(&mut self, odr: f32) -> DriverResult<()> {
        let new_odr = round_up(odr, &ODR_TABLE, Odr::Hz200);

        if self.press_is_enabled || self.temp_is_enabled {
            let md = self.read_md()?;
            self.write_md(Md { odr: new_odr, ..md })?;
            self.last_md = self.read_md()?;
        } else {
            self.last_md.odr = new_odr;
        }
        Ok(())
    }

    /// Pressure in hPa
    pub fn pressure(&mut self) -> DriverResult<f32> {
        let mut buf = [0u8; 3];
        self.bus.read_regs(Reg::PressOutXl as u8, &mut buf)?;
        let raw = i32::from_le_bytes([0, buf[0], buf[1], buf[2]]);
        Ok(raw as f32 / 1_048_576.0)
    }

    /// Temperature in °C
    pub fn temperature(&mut self) -> DriverResult<f32> {
        let mut buf = [0u8; 2];
        self.bus.read_regs(Reg::TempOutL as u8, &mut buf)?;
        Ok(i16::from_le_bytes(buf) as f32 / 100.0)
    }

    pub fn press_drdy_status(&mut self) -> DriverResult<bool> {
        Ok(self.bus.read::<Status>()?.p_da())
    }

    pub fn temp_drdy_status(&mut self) -> DriverResult<bool> {
        Ok(self.bus.read::<Status>()?.t_da())
    }

    /// Trigger a single conversion; ignored unless the part is in one-shot mode
    pub fn one_shot(&mut self) -> DriverResult<()> {
        let md = self.read_md()?;
        if md.odr == Odr::OneShot {
            self.bus.modify::<Ctrl2>(|r| r.set_oneshot(true))?;
        }
        Ok(())
    }

    /// True once both pressure and temperature of a one-shot conversion are ready
    pub fn one_shot_status(&mut self) -> DriverResult<bool> {
        let status = self.bus.read::<Status>()?;
        Ok(status.p_da() && status.t_da())
    }

    pub fn set_avg(&mut self, avg: Avg) -> DriverResult<()> {
        let md = self.read_md()?;
        self.write_md(Md { avg, ..md })
    }

    pub fn set_lpf(&mut self, lpf: Lpf) -> DriverResult<()> {
        let md = self.read_md()?;
        self.write_md(Md { lpf, ..md })
    }

    /// Route data-ready to the INT pin
    pub fn enable_drdy_interrupt(&mut self) -> DriverResult<()> {
        self.bus.modify::<Ctrl4>(|r| r.set_drdy(true))
    }

    pub fn read_register(&mut self, reg: u8) -> DriverResult<u8> {
        self.bus.read_reg(reg)
    }

    pub fn write_register(&mut self, reg: u8, value: u8) -> DriverResult<()> {
        self.bus.write_reg(reg, value)
    }

    fn power_down(&mut self) -> DriverResult<()> {
        let md = self.read_md()?;
        self.last_md = md;
        self.write_md(Md {
            odr: Odr::OneShot,
            ..md
        })
    }

    fn write_bus_mode(&mut self) -> DriverResult<()> {
        let (sim, i2c_disabled) = match self.bus.bus_type() {
            BusType::I2c => (false, false),
            BusType::Spi4Wires => (false, true),
            BusType::Spi3Wires => (true, true),
        };
        self.bus.modify::<IfCtrl>(|r| {
            r.set_int_en_i3c(false);
            r.set_i2c_i3c_dis(i2c_disabled);
            r.set_sim(sim);
        })?;
        // Anti-spike filter follows the bus speed automatically
        self.bus.modify::<I3cIfCtrl>(|r| r.set_asf_on(false))
    }

    fn read_md(&mut self) -> DriverResult<Md> {
        let mut regs = [0u8; 2];
        self.bus.read_regs(Reg::Ctrl1 as u8, &mut regs)?;
        let ctrl1 = Ctrl1::from(regs[0]);
        let ctrl2 = Ctrl2::from(regs[1]);
        Ok(Md {
            odr: Odr::from_bits(ctrl1.odr()),
            avg: Avg::from_bits(ctrl1.avg()),
            lpf: Lpf::from_bits(ctrl2.en_lpfp(), ctrl2.lfpf_cfg()),
        })
    }

    fn write_md(&mut self, md: Md) -> DriverResult<()> {
        let mut regs = [0u8; 2];
        self.bus.read_regs(Reg::Ctrl1 as u8, &mut regs)?;
        let ctrl1 = Ctrl1::from(regs[0]).with_odr(md.odr as u8).with_avg(md.avg as u8);
        let lpf = md.lpf as u8;
        let ctrl2 = Ctrl2::from(regs[1])
            .with_en_lpfp(lpf & 0x01 != 0)
            .with_lfpf_cfg(lpf & 0x02 != 0);
        self.bus.write_regs(Reg::Ctrl1 as u8, &[ctrl1.into(), ctrl2.into()])
    }
}

impl<B: RegisterBus + Send> EnvSensor for Lps22df<B> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn init(&mut self) -> DriverResult<()> {
        Lps22df::init(self)
    }

    fn deinit(&mut self) -> DriverResult<()> {
        Lps22df::deinit(self)
    }

    fn read_id(&mut self) -> DriverResult<u8> {
        Lps22df::read_id(self)
    }

    fn capabilities(&self) -> EnvCapabilities {
        Lps22df::capabilities(self)
    }

    fn enable(&mut self, function: EnvFunction) -> DriverResult<()> {
        match function {
            EnvFunction::Pressure => self.press_enable(),
            EnvFunction::Temperature => self.temp_enable(),
            _ => not_supported(NAME),
        }
    }

    fn disable(&mut self, function: EnvFunction) -> DriverResult<()> {
        match function {
            EnvFunction::Pressure => self.press_disable(),
            EnvFunction::Temperature => self.temp_disable(),
            _ => not_supported(NAME),
        }
    }

    fn output_data_rate(&mut self, function: EnvFunction) -> DriverResult<f32> {
        match function {
            EnvFunction::Pressure | EnvFunction::Temperature => Lps22df::output_data_rate(self),
            _ => not_supported(NAME),
        }
    }

    fn set_output_data_rate(&mut self, function: EnvFunction, odr: f32) -> DriverResult<()> {
        match function {
            EnvFunction::Pressure | EnvFunction::Temperature => Lps22df::set_output_data_rate(self, odr),
            _ => not_supported(NAME),
        }
    }

    fn value(&mut self, function: EnvFunction) -> DriverResult<f32> {
        match function {
            EnvFunction::Pressure => self.pressure(),
            EnvFunction::Temperature => self.temperature(),
            _ => not_supported(NAME),
        }
    }

    fn drdy_status(&mut self, function: EnvFunction) -> DriverResult<bool> {
        match function {
            EnvFunction::Pressure => self.press_drdy_status(),
            EnvFunction::Temperature => self.temp_drdy_status(),
            _ => not_supported(NAME),
        }
    }

    fn read_register(&mut self, reg: u8) -> DriverResult<u8> {
        Lps22df::read_register(self, reg)
    }

    fn write_register(&mut self, reg: u8, value: u8) -> DriverResult<()> {
        Lps22df::write_register(self, reg, value)
    }
}

pub static LPS22DF_FACTORY: Lps22dfFactory = Lps22dfFactory;

pub struct Lps22dfFactory;

impl ComponentFactory for Lps22dfFactory {
    fn name(&self) -> &'static str {
        "lps22df"
    }

    fn id(&self) -> u8 {
        ID
    }

    fn default_address(&self) -> u8 {
        I2C_ADD_H
    }

    fn functions(&self) -> u32 {
        EnvFunction::Temperature.mask() | EnvFunction::Pressure.mask()
    }

    fn create(&self, io: BusIo) -> DriverResult<Component> {
        let mut dev = Lps22df::from_bus(io.into_register_bus());
        dev.configure_bus()?;
        Ok(Component::Env(Box::new(dev)))
    }
}
