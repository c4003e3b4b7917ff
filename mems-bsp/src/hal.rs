//! Platform bus access: turns a configured bus entry into a [`BusIo`] the
//! component factories can consume.

use crate::bus::BusIo;
use crate::config::BusEntry;
use crate::errors::{DriverError, RegistryError, RegistryResult};

/// Opens one device handle per sensor on a configured bus
pub trait BusOpener {
    fn open(&self, bus: &BusEntry, address: u8) -> RegistryResult<BusIo>;
}

fn open_error(bus: &BusEntry) -> impl FnOnce(DriverError) -> RegistryError + '_ {
    move |source| RegistryError::BusOpen {
        bus: bus.id.clone(),
        source,
    }
}

#[cfg(feature = "linux-hal")]
pub mod linux {
    use super::*;
    use crate::bus::BusType;
    use crate::errors::DriverResult;
    use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
    use linux_embedded_hal::{Delay, I2cdev, SpidevDevice};
    use tracing::debug;

    const DEFAULT_SPI_SPEED_HZ: u32 = 1_000_000;

    /// Opens `/dev/i2c-*` and `/dev/spidev*` nodes through linux-embedded-hal
    pub struct LinuxBusOpener;

    impl LinuxBusOpener {
        fn open_i2c(path: &str, address: u8) -> DriverResult<BusIo> {
            let i2c = I2cdev::new(path).map_err(DriverError::bus)?;
            Ok(BusIo::i2c(i2c, address, Delay))
        }

        fn open_spi(path: &str, wiring: BusType, speed_hz: u32) -> DriverResult<BusIo> {
            let mut spi = SpidevDevice::open(path).map_err(DriverError::bus)?;

            let mut mode = SpiModeFlags::SPI_MODE_3;
            if wiring == BusType::Spi3Wires {
                mode |= SpiModeFlags::SPI_3WIRE;
            }
            let options = SpidevOptions::new()
                .bits_per_word(8)
                .max_speed_hz(speed_hz)
                .mode(mode)
                .build();
            spi.0.configure(&options).map_err(DriverError::bus)?;

            Ok(BusIo::spi(spi, wiring, Delay))
        }
    }

    impl BusOpener for LinuxBusOpener {
        fn open(&self, bus: &BusEntry, address: u8) -> RegistryResult<BusIo> {
            let wiring = bus.bus_type()?;
            debug!("[hal] opening {} ({:?}) for {:#04x}", bus.path, wiring, address);

            match wiring {
                BusType::I2c => Self::open_i2c(&bus.path, address),
                BusType::Spi4Wires | BusType::Spi3Wires => {
                    Self::open_spi(&bus.path, wiring, bus.speed_hz.unwrap_or(DEFAULT_SPI_SPEED_HZ))
                }
            }
            .map_err(open_error(bus))
        }
    }
}

#[cfg(feature = "linux-hal")]
pub use linux::LinuxBusOpener;
