//! Register-level bus access shared by every register-mapped driver.
//!
//! Drivers never talk to an `embedded-hal` bus directly; they go through
//! [`RegisterBus`], which hides whether the part sits on I2C or SPI.

use crate::errors::{DriverError, DriverResult};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{self, I2c, SevenBitAddress};
use embedded_hal::spi::{self, SpiDevice};
use serde::Deserialize;

/// SPI read flag on the register address byte
const SPI_READ: u8 = 0x80;

/// Bus wiring of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusType {
    I2c,
    Spi4Wires,
    Spi3Wires,
}

impl BusType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i2c" => Some(BusType::I2c),
            "spi" | "spi4" | "spi_4wires" => Some(BusType::Spi4Wires),
            "spi3" | "spi_3wires" => Some(BusType::Spi3Wires),
            _ => None,
        }
    }
}

/// A one-byte bit-field register at a fixed address
pub trait Register: Copy + From<u8> + Into<u8> {
    const ADDRESS: u8;
}

/// Binds bit-field register types to their addresses
macro_rules! registers {
    ($($ty:ident => $addr:expr),* $(,)?) => {
        $(
            impl $crate::bus::Register for $ty {
                const ADDRESS: u8 = $addr as u8;
            }
        )*
    };
}
pub(crate) use registers;

/// Register read/write primitives a driver needs from its bus
pub trait RegisterBus {
    fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> DriverResult<()>;
    fn write_regs(&mut self, reg: u8, data: &[u8]) -> DriverResult<()>;
    fn bus_type(&self) -> BusType;

    fn read_reg(&mut self, reg: u8) -> DriverResult<u8> {
        let mut buf = [0u8; 1];
        self.read_regs(reg, &mut buf)?;
        Ok(buf[0])
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> DriverResult<()> {
        self.write_regs(reg, &[value])
    }

    fn read<R: Register>(&mut self) -> DriverResult<R>
    where
        Self: Sized,
    {
        Ok(R::from(self.read_reg(R::ADDRESS)?))
    }

    fn write<R: Register>(&mut self, value: R) -> DriverResult<()>
    where
        Self: Sized,
    {
        self.write_reg(R::ADDRESS, value.into())
    }

    /// Read-modify-write of a single bit-field register
    fn modify<R: Register>(&mut self, f: impl FnOnce(&mut R)) -> DriverResult<()>
    where
        Self: Sized,
    {
        let mut value = self.read::<R>()?;
        f(&mut value);
        self.write(value)
    }
}

/// Register bus over an I2C peripheral at a fixed 7-bit address
pub struct I2cBus<P> {
    i2c: P,
    address: SevenBitAddress,
}

impl<P: I2c> I2cBus<P> {
    pub fn new(i2c: P, address: SevenBitAddress) -> Self {
        Self { i2c, address }
    }
}

impl<P: I2c> RegisterBus for I2cBus<P> {
    fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> DriverResult<()> {
        self.i2c
            .write_read(self.address, &[reg], buf)
            .map_err(|e| DriverError::bus(i2c::Error::kind(&e)))
    }

    fn write_regs(&mut self, reg: u8, data: &[u8]) -> DriverResult<()> {
        // Register pointer and payload go out as one write message
        let mut frame = Vec::with_capacity(data.len() + 1);
        frame.push(reg);
        frame.extend_from_slice(data);
        self.i2c
            .write(self.address, &frame)
            .map_err(|e| DriverError::bus(i2c::Error::kind(&e)))
    }

    fn bus_type(&self) -> BusType {
        BusType::I2c
    }
}

/// Register bus over an SPI device with chip-select handled by the device
pub struct SpiBus<P> {
    spi: P,
    wiring: BusType,
}

impl<P: SpiDevice> SpiBus<P> {
    pub fn new(spi: P) -> Self {
        Self {
            spi,
            wiring: BusType::Spi4Wires,
        }
    }

    /// SDI and SDO share one line; the driver reconfigures the part on first init
    pub fn new_3wires(spi: P) -> Self {
        Self {
            spi,
            wiring: BusType::Spi3Wires,
        }
    }
}

impl<P: SpiDevice> RegisterBus for SpiBus<P> {
    fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> DriverResult<()> {
        self.spi
            .transaction(&mut [
                spi::Operation::Write(&[reg | SPI_READ]),
                spi::Operation::Read(buf),
            ])
            .map_err(|e| DriverError::bus(spi::Error::kind(&e)))
    }

    fn write_regs(&mut self, reg: u8, data: &[u8]) -> DriverResult<()> {
        self.spi
            .transaction(&mut [
                spi::Operation::Write(&[reg & !SPI_READ]),
                spi::Operation::Write(data),
            ])
            .map_err(|e| DriverError::bus(spi::Error::kind(&e)))
    }

    fn bus_type(&self) -> BusType {
        self.wiring
    }
}

impl RegisterBus for Box<dyn RegisterBus + Send> {
    fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> DriverResult<()> {
        (**self).read_regs(reg, buf)
    }

    fn write_regs(&mut self, reg: u8, data: &[u8]) -> DriverResult<()> {
        (**self).write_regs(reg, data)
    }

    fn bus_type(&self) -> BusType {
        (**self).bus_type()
    }
}

/// Reports any HAL error as its portable `ErrorKind`
struct KindErrors<P>(P);

impl<P: I2c> i2c::ErrorType for KindErrors<P> {
    type Error = i2c::ErrorKind;
}

impl<P: I2c> I2c for KindErrors<P> {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.0
            .transaction(address, operations)
            .map_err(|e| i2c::Error::kind(&e))
    }
}

/// Owned I2C peripheral with its concrete type erased
pub struct DynI2c(Box<dyn I2c<Error = i2c::ErrorKind> + Send>);

impl DynI2c {
    pub fn new<P: I2c + Send + 'static>(i2c: P) -> Self {
        Self(Box::new(KindErrors(i2c)))
    }
}

impl i2c::ErrorType for DynI2c {
    type Error = i2c::ErrorKind;
}

impl I2c for DynI2c {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.0.transaction(address, operations)
    }
}

struct SpiKindErrors<P>(P);

impl<P: SpiDevice> spi::ErrorType for SpiKindErrors<P> {
    type Error = spi::ErrorKind;
}

impl<P: SpiDevice> SpiDevice for SpiKindErrors<P> {
    fn transaction(&mut self, operations: &mut [spi::Operation<'_, u8>]) -> Result<(), Self::Error> {
        self.0
            .transaction(operations)
            .map_err(|e| spi::Error::kind(&e))
    }
}

/// Owned SPI device (bus plus chip select) with its concrete type erased
pub struct DynSpi(Box<dyn SpiDevice<Error = spi::ErrorKind> + Send>);

impl DynSpi {
    pub fn new<P: SpiDevice + Send + 'static>(spi: P) -> Self {
        Self(Box::new(SpiKindErrors(spi)))
    }
}

impl spi::ErrorType for DynSpi {
    type Error = spi::ErrorKind;
}

impl SpiDevice for DynSpi {
    fn transaction(&mut self, operations: &mut [spi::Operation<'_, u8>]) -> Result<(), Self::Error> {
        self.0.transaction(operations)
    }
}

pub struct DynDelay(Box<dyn DelayNs + Send>);

impl DynDelay {
    pub fn new<D: DelayNs + Send + 'static>(delay: D) -> Self {
        Self(Box::new(delay))
    }
}

impl DelayNs for DynDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.delay_ns(ns)
    }
}

pub enum BusLink {
    I2c { i2c: DynI2c, address: SevenBitAddress },
    Spi { spi: DynSpi, wiring: BusType },
}

/// Everything a component factory needs to build a driver: the wired bus and a delay source
pub struct BusIo {
    pub link: BusLink,
    pub delay: DynDelay,
}

impl BusIo {
    pub fn i2c<P, D>(i2c: P, address: SevenBitAddress, delay: D) -> Self
    where
        P: I2c + Send + 'static,
        D: DelayNs + Send + 'static,
    {
        Self {
            link: BusLink::I2c {
                i2c: DynI2c::new(i2c),
                address,
            },
            delay: DynDelay::new(delay),
        }
    }

    pub fn spi<P, D>(spi: P, wiring: BusType, delay: D) -> Self
    where
        P: SpiDevice + Send + 'static,
        D: DelayNs + Send + 'static,
    {
        Self {
            link: BusLink::Spi {
                spi: DynSpi::new(spi),
                wiring,
            },
            delay: DynDelay::new(delay),
        }
    }

    pub fn bus_type(&self) -> BusType {
        match &self.link {
            BusLink::I2c { .. } => BusType::I2c,
            BusLink::Spi { wiring, .. } => *wiring,
        }
    }

    /// Register access for register-mapped parts; the delay is dropped
    pub fn into_register_bus(self) -> Box<dyn RegisterBus + Send> {
        match self.link {
            BusLink::I2c { i2c, address } => Box::new(I2cBus::new(i2c, address)),
            BusLink::Spi { spi, wiring } => Box::new(SpiBus { spi, wiring }),
        }
    }

    /// Raw I2C access for command-based parts
    pub fn into_i2c(self, component: &'static str) -> DriverResult<(DynI2c, SevenBitAddress, DynDelay)> {
        match self.link {
            BusLink::I2c { i2c, address } => Ok((i2c, address, self.delay)),
            BusLink::Spi { .. } => Err(DriverError::NotSupported { component }),
        }
    }
}
