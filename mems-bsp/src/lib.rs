// Public modules
pub mod board;
pub mod bsp;
pub mod bus;
pub mod commands;
pub mod config;
pub mod drivers;
pub mod errors;
pub mod hal;
pub mod link;
pub mod logger;
pub mod messages;
pub mod registry;
pub mod session;

// Re-export commonly used types
pub use board::{Board, SensorKind};
pub use bsp::{EnvSensors, MotionSensors};
pub use bus::{BusIo, BusType};
pub use commands::{CommandHandler, HostCommand, HostReply};
pub use config::Config;
pub use errors::{BspError, BspResult, DriverError, DriverResult};
pub use registry::init_board;
pub use session::run_session;

use tracing_subscriber::EnvFilter;

/// Initialize tracing with default configuration.
///
/// Logs go to stderr so a stdio host link stays clean.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();
}

/// Run the data logger with the given configuration directory
#[cfg(feature = "linux-hal")]
pub async fn run_data_logger(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    use config::LinkKind;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tokio::time::Duration;
    use tracing::info;

    info!("[DataLogger] starting up...");

    let config = Config::load(config_path)?;
    info!(
        "[config] loaded {} bus(es), {} sensor(s)",
        config.buses.buses.len(),
        config.sensors.sensors.len()
    );

    let board = init_board(&config, &hal::LinuxBusOpener)?;
    info!("[registry] board {} ready", board.name());

    let period = Duration::from_millis(config.board.stream.period_ms);
    let board = Arc::new(Mutex::new(board));
    let link_cfg = &config.board.link;

    match link_cfg.kind {
        LinkKind::Serial => {
            let path = link_cfg.path.as_deref().ok_or_else(|| errors::ConfigError::InvalidValue {
                field: "link.path".to_string(),
                reason: "required for a serial link".to_string(),
            })?;
            let mut link = link::open_serial(path, link_cfg.baud.unwrap_or(link::serial::DEFAULT_BAUD))?;
            run_session(&mut link, board, period).await?;
        }
        LinkKind::Stdio => {
            let mut link = link::open_stdio();
            run_session(&mut link, board, period).await?;
        }
    }

    info!("[DataLogger] shut down");
    Ok(())
}
