use tokio::io::{split, ReadHalf, WriteHalf};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::info;

use super::LineLink;
use crate::errors::LinkResult;

/// Default baud rate of the ST-LINK virtual COM port
pub const DEFAULT_BAUD: u32 = 115_200;

pub type SerialLink = LineLink<ReadHalf<SerialStream>, WriteHalf<SerialStream>>;

/// Open a serial port as a host link
pub fn open_serial(path: &str, baud_rate: u32) -> LinkResult<SerialLink> {
    let port = tokio_serial::new(path, baud_rate).open_native_async()?;
    info!("[SerialLink] opened {} at {} baud", path, baud_rate);

    let (reader, writer) = split(port);
    Ok(LineLink::new(reader, writer, path))
}
