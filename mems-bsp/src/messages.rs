use serde::{Deserialize, Serialize};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::commands::HostReply;
use crate::drivers::Axes;

/// Header metadata common to all streamed frames
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Header {
    /// Board name from the configuration
    pub device_id: String,
    /// Sequence number for message ordering
    pub seq: u64,
    /// UTC timestamp in nanoseconds
    pub t_utc_ns: u64,
    /// Microseconds since streaming started
    pub t_stream_us: u64,
    /// Message schema version for evolution
    pub schema_v: u16,
}

impl Header {
    /// Create a header stamped now, relative to the stream start
    pub fn new(device_id: String, seq: u64, started: Instant) -> Self {
        let t_utc_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;

        Self {
            device_id,
            seq,
            t_utc_ns,
            t_stream_us: started.elapsed().as_micros() as u64,
            schema_v: 1,
        }
    }
}

/// One sampling round; only kinds that had fresh data are present
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DataFrame {
    pub h: Header,
    /// Acceleration in mg
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acc: Option<Axes>,
    /// Angular rate in mdps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gyr: Option<Axes>,
    /// Magnetic field in mgauss
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mag: Option<Axes>,
    /// Pressure in hPa
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f32>,
    /// Temperature in °C
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Relative humidity in %
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f32>,
}

impl DataFrame {
    pub fn new(h: Header) -> Self {
        Self {
            h,
            acc: None,
            gyr: None,
            mag: None,
            pressure: None,
            temperature: None,
            humidity: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.acc.is_none()
            && self.gyr.is_none()
            && self.mag.is_none()
            && self.pressure.is_none()
            && self.temperature.is_none()
            && self.humidity.is_none()
    }
}

/// Everything the board sends to the host
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum OutboundMessage {
    Reply(HostReply),
    Frame(DataFrame),
}

impl OutboundMessage {
    /// Single-line JSON, as written on the link
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
