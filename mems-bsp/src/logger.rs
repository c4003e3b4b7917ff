use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::board::{Board, Reading, SensorKind};
use crate::messages::{DataFrame, Header, OutboundMessage};

/// Streaming state shared between the command handler and the stream task
#[derive(Debug, Clone, PartialEq)]
pub struct StreamControl {
    pub active: bool,
    /// Kinds sampled on every tick
    pub sensors: Vec<SensorKind>,
    pub started: Instant,
}

impl Default for StreamControl {
    fn default() -> Self {
        Self {
            active: false,
            sensors: Vec::new(),
            started: Instant::now(),
        }
    }
}

/// Sample every requested kind that has fresh data
pub fn sample_frame(board: &mut Board, control: &StreamControl, device_id: &str, seq: u64) -> DataFrame {
    let mut frame = DataFrame::new(Header::new(device_id.to_string(), seq, control.started));

    for &kind in &control.sensors {
        let reading = match board.sample(kind) {
            Ok(Some(reading)) => reading,
            Ok(None) => continue,
            Err(e) => {
                debug!("[logger] {} read error: {}", kind, e);
                continue;
            }
        };

        match (kind, reading) {
            (SensorKind::Accelerometer, Reading::Axes(axes)) => frame.acc = Some(axes),
            (SensorKind::Gyroscope, Reading::Axes(axes)) => frame.gyr = Some(axes),
            (SensorKind::Magnetometer, Reading::Axes(axes)) => frame.mag = Some(axes),
            (SensorKind::Pressure, Reading::Value(v)) => frame.pressure = Some(v),
            (SensorKind::Temperature, Reading::Value(v)) => frame.temperature = Some(v),
            (SensorKind::Humidity, Reading::Value(v)) => frame.humidity = Some(v),
            _ => {}
        }
    }

    frame
}

/// Spawn the periodic sampling task.
///
/// Frames are only emitted while streaming is active and at least one kind
/// had new data. The task ends when the control sender or the frame receiver
/// goes away.
pub fn spawn_stream_task(
    board: Arc<Mutex<Board>>,
    control: watch::Receiver<StreamControl>,
    frames: mpsc::Sender<OutboundMessage>,
    period: Duration,
    device_id: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("[logger] stream task running every {}ms", period.as_millis());
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut seq = 0u64;

        loop {
            ticker.tick().await;
            if control.has_changed().is_err() {
                break;
            }

            let snapshot = control.borrow().clone();
            if !snapshot.active || snapshot.sensors.is_empty() {
                continue;
            }

            let frame = {
                let mut board = board.lock().await;
                sample_frame(&mut board, &snapshot, &device_id, seq + 1)
            };
            if frame.is_empty() {
                continue;
            }

            seq += 1;
            if frames.send(OutboundMessage::Frame(frame)).await.is_err() {
                break;
            }
        }

        debug!("[logger] stream task stopped");
    })
}
