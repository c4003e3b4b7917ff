use thiserror::Error;

/// Errors raised by the register-level sensor drivers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    #[error("bus transfer failed: {0}")]
    Bus(String),

    #[error("register held an unexpected value")]
    UnexpectedValue,

    #[error("wrong chip ID: expected {expected:#04x}, got {actual:#04x}")]
    WrongChipId { expected: u8, actual: u8 },

    #[error("operation not supported by {component}")]
    NotSupported { component: &'static str },

    #[error("CRC mismatch: expected {expected:#04x}, got {actual:#04x}")]
    Crc { expected: u8, actual: u8 },
}

impl DriverError {
    /// Wrap a HAL bus error, keeping only its debug rendering
    pub fn bus<E: core::fmt::Debug>(error: E) -> Self {
        DriverError::Bus(format!("{:?}", error))
    }
}

/// Board support layer status, one variant per failure class the board reports
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BspError {
    #[error("wrong parameter")]
    WrongParam,

    #[error("instance not initialized")]
    NoInit,

    #[error("unknown component")]
    UnknownComponent,

    #[error("component failure")]
    ComponentFailure,
}

impl From<DriverError> for BspError {
    fn from(_: DriverError) -> Self {
        BspError::ComponentFailure
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from '{path}': {source}")]
    LoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration format: {0}")]
    FormatError(#[from] toml::de::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Bus '{bus}' not found or unavailable")]
    BusNotFound { bus: String },

    #[error("Unsupported sensor driver: '{driver}'")]
    UnsupportedDriver { driver: String },
}

/// Errors raised while assembling the board from its configuration
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to open bus '{bus}': {source}")]
    BusOpen {
        bus: String,
        #[source]
        source: DriverError,
    },
}

/// Host command handling errors, reported back to the host as a NACK
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("no {kind} sensor available at index {index}")]
    NoSensor { kind: String, index: usize },

    #[error("board rejected the request: {0}")]
    Bsp(#[from] BspError),

    #[error("malformed command: {0}")]
    Malformed(String),

    #[error("could not switch {kind} sensor: {source}")]
    Switch {
        kind: String,
        source: Box<CommandError>,
    },
}

/// Host link errors
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    #[error("Link I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Message encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Link '{path}' closed by peer")]
    Closed { path: String },
}

/// Result type aliases for convenience
pub type DriverResult<T> = Result<T, DriverError>;
pub type BspResult<T> = Result<T, BspError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type RegistryResult<T> = Result<T, RegistryError>;
pub type CommandResult<T> = Result<T, CommandError>;
pub type LinkResult<T> = Result<T, LinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_errors_collapse_to_component_failure() {
        let err: BspError = DriverError::bus("nack").into();
        assert_eq!(err, BspError::ComponentFailure);

        let err: BspError = DriverError::UnexpectedValue.into();
        assert_eq!(err, BspError::ComponentFailure);
    }

    #[test]
    fn test_error_messages() {
        let err = DriverError::WrongChipId { expected: 0x44, actual: 0x6c };
        assert_eq!(err.to_string(), "wrong chip ID: expected 0x44, got 0x6c");

        let err = CommandError::from(BspError::WrongParam);
        assert!(err.to_string().contains("wrong parameter"));
    }
}
