//! Host command protocol: newline-delimited JSON requests and replies.
//!
//! Sensor sub-commands address the currently selected instance of a
//! [`SensorKind`]. Every failure turns into a [`HostReply::Nack`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::board::{full_scale_list, odr_list, Board, SensorKind};
use crate::errors::{CommandError, CommandResult};
use crate::logger::StreamControl;

/// Mode number answered to CheckModeSupport
pub const DATALOG_EXT_MODE: u32 = 101;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterValue {
    pub reg: u8,
    pub value: u8,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum HostCommand {
    Ping,
    ReadPresentationString,
    CheckModeSupport,
    StartDataStreaming { sensors: Vec<SensorKind> },
    StopDataStreaming,
    EnableDisableSensors { sensors: Vec<SensorKind> },
    GetSensorName { kind: SensorKind },
    ReadRegister { kind: SensorKind, reg: u8 },
    WriteRegister { kind: SensorKind, reg: u8, value: u8 },
    ReadMultiRegister { kind: SensorKind, regs: Vec<u8> },
    WriteMultiRegister { kind: SensorKind, writes: Vec<RegisterValue> },
    /// New value is `(current & mask) | value`
    ReadModifyWriteRegister { kind: SensorKind, reg: u8, mask: u8, value: u8 },
    GetFullScaleList { kind: SensorKind },
    SetFullScale { kind: SensorKind, full_scale: i32 },
    GetFullScale { kind: SensorKind },
    GetOdrList { kind: SensorKind },
    SetOdr { kind: SensorKind, odr: f32 },
    GetOdr { kind: SensorKind },
    GetSensorList { kind: SensorKind },
    SetSensorIndex { kind: SensorKind, index: usize },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum HostReply {
    Pong,
    PresentationString { text: String },
    ModeSupport { mode: u32 },
    StreamingStarted { sensors: Vec<SensorKind> },
    StreamingStopped,
    SensorsEnabled { sensors: Vec<SensorKind> },
    SensorName { kind: SensorKind, name: String },
    Register { kind: SensorKind, reg: u8, value: u8 },
    RegisterWritten { kind: SensorKind, reg: u8, value: u8 },
    Registers { kind: SensorKind, values: Vec<RegisterValue> },
    RegistersWritten { kind: SensorKind, count: usize },
    FullScaleList { kind: SensorKind, values: Vec<u32> },
    FullScaleSet { kind: SensorKind, full_scale: i32 },
    FullScale { kind: SensorKind, full_scale: i32 },
    OdrList { kind: SensorKind, values: Vec<f32> },
    OdrSet { kind: SensorKind, odr: f32 },
    Odr { kind: SensorKind, odr: f32 },
    SensorList { kind: SensorKind, names: String },
    SensorIndex { kind: SensorKind, index: usize },
    Nack { reason: String },
}

/// Parse one line from the host
pub fn parse_command(line: &str) -> CommandResult<HostCommand> {
    serde_json::from_str(line.trim()).map_err(|e| CommandError::Malformed(e.to_string()))
}

/// Executes host commands against the shared board
pub struct CommandHandler {
    board: Arc<Mutex<Board>>,
    stream: watch::Sender<StreamControl>,
    presentation: String,
}

impl CommandHandler {
    pub fn new(board: Arc<Mutex<Board>>, board_name: &str, stream: watch::Sender<StreamControl>) -> Self {
        Self {
            board,
            stream,
            presentation: format!(
                "MEMS shield demo,{},{},0.0.0,{}",
                DATALOG_EXT_MODE,
                env!("CARGO_PKG_VERSION"),
                board_name
            ),
        }
    }

    /// Handle a raw line; malformed input is answered with a NACK
    pub async fn handle_line(&self, line: &str) -> HostReply {
        match parse_command(line) {
            Ok(cmd) => self.handle(cmd).await,
            Err(e) => {
                warn!("[commands] {}", e);
                HostReply::Nack { reason: e.to_string() }
            }
        }
    }

    pub async fn handle(&self, cmd: HostCommand) -> HostReply {
        debug!("[commands] {:?}", cmd);
        match self.execute(cmd).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("[commands] request failed: {}", e);
                HostReply::Nack { reason: e.to_string() }
            }
        }
    }

    async fn execute(&self, cmd: HostCommand) -> CommandResult<HostReply> {
        let mut board = self.board.lock().await;

        Ok(match cmd {
            HostCommand::Ping => HostReply::Pong,
            HostCommand::ReadPresentationString => HostReply::PresentationString {
                text: self.presentation.clone(),
            },
            HostCommand::CheckModeSupport => HostReply::ModeSupport { mode: DATALOG_EXT_MODE },
            HostCommand::StartDataStreaming { sensors } => {
                apply_enabled(&mut board, &sensors)?;
                self.stream.send_replace(StreamControl {
                    active: true,
                    sensors: sensors.clone(),
                    started: Instant::now(),
                });
                info!("[commands] streaming started: {:?}", sensors);
                HostReply::StreamingStarted { sensors }
            }
            HostCommand::StopDataStreaming => {
                // Sensors keep running until the host disables them
                self.stream.send_modify(|control| control.active = false);
                info!("[commands] streaming stopped");
                HostReply::StreamingStopped
            }
            HostCommand::EnableDisableSensors { sensors } => {
                apply_enabled(&mut board, &sensors)?;
                self.stream.send_modify(|control| control.sensors = sensors.clone());
                HostReply::SensorsEnabled { sensors }
            }
            HostCommand::GetSensorName { kind } => HostReply::SensorName {
                kind,
                name: board.selected(kind)?.name.clone(),
            },
            HostCommand::ReadRegister { kind, reg } => HostReply::Register {
                kind,
                reg,
                value: board.read_register(kind, reg)?,
            },
            HostCommand::WriteRegister { kind, reg, value } => {
                board.write_register(kind, reg, value)?;
                HostReply::RegisterWritten { kind, reg, value }
            }
            HostCommand::ReadMultiRegister { kind, regs } => {
                let values = regs
                    .into_iter()
                    .map(|reg| Ok(RegisterValue { reg, value: board.read_register(kind, reg)? }))
                    .collect::<CommandResult<Vec<_>>>()?;
                HostReply::Registers { kind, values }
            }
            HostCommand::WriteMultiRegister { kind, writes } => {
                for w in &writes {
                    board.write_register(kind, w.reg, w.value)?;
                }
                HostReply::RegistersWritten {
                    kind,
                    count: writes.len(),
                }
            }
            HostCommand::ReadModifyWriteRegister { kind, reg, mask, value } => {
                let current = board.read_register(kind, reg)?;
                let value = (current & mask) | value;
                board.write_register(kind, reg, value)?;
                HostReply::RegisterWritten { kind, reg, value }
            }
            HostCommand::GetFullScaleList { kind } => HostReply::FullScaleList {
                kind,
                values: full_scale_list(board.selected(kind)?.driver, kind).to_vec(),
            },
            HostCommand::SetFullScale { kind, full_scale } => {
                board.set_full_scale(kind, full_scale)?;
                HostReply::FullScaleSet { kind, full_scale }
            }
            HostCommand::GetFullScale { kind } => HostReply::FullScale {
                kind,
                full_scale: board.full_scale(kind)?,
            },
            HostCommand::GetOdrList { kind } => HostReply::OdrList {
                kind,
                values: odr_list(board.selected(kind)?.driver, kind).to_vec(),
            },
            HostCommand::SetOdr { kind, odr } => {
                if !odr.is_finite() || odr < 0.0 {
                    return Err(CommandError::Malformed(format!("invalid output data rate {}", odr)));
                }
                board.set_output_data_rate(kind, odr)?;
                HostReply::OdrSet { kind, odr }
            }
            HostCommand::GetOdr { kind } => HostReply::Odr {
                kind,
                odr: board.output_data_rate(kind)?,
            },
            HostCommand::GetSensorList { kind } => HostReply::SensorList {
                kind,
                names: board.sensor_list(kind),
            },
            HostCommand::SetSensorIndex { kind, index } => {
                board.select(kind, index)?;
                HostReply::SensorIndex { kind, index }
            }
        })
    }
}

/// Enable the selected instance of every listed kind and disable the rest.
///
/// Kinds without a sensor are skipped. Every kind is attempted; the first
/// failure is reported.
fn apply_enabled(board: &mut Board, sensors: &[SensorKind]) -> CommandResult<()> {
    let mut first_err = None;
    for kind in SensorKind::ALL {
        if board.selected(kind).is_err() {
            continue;
        }
        let res = if sensors.contains(&kind) {
            board.enable(kind)
        } else {
            board.disable(kind)
        };
        if let Err(e) = res {
            warn!("[commands] could not switch {}: {}", kind, e);
            first_err.get_or_insert(CommandError::Switch {
                kind: kind.to_string(),
                source: Box::new(e),
            });
        }
    }
    first_err.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::{board, Devices};
    use crate::drivers::lps22df::register::Ctrl1;

    fn handler() -> (CommandHandler, watch::Receiver<StreamControl>, Devices) {
        let (board, devices) = board();
        let (tx, rx) = watch::channel(StreamControl::default());
        let handler = CommandHandler::new(Arc::new(Mutex::new(board)), "IKS4A1", tx);
        (handler, rx, devices)
    }

    #[tokio::test]
    async fn test_ping_and_presentation() {
        let (handler, _rx, _) = handler();

        assert_eq!(handler.handle_line("{\"cmd\":\"ping\"}").await, HostReply::Pong);
        match handler.handle(HostCommand::ReadPresentationString).await {
            HostReply::PresentationString { text } => {
                assert!(text.starts_with("MEMS shield demo,101,"));
                assert!(text.ends_with(",IKS4A1"));
            }
            other => panic!("unexpected reply {:?}", other),
        }
        assert_eq!(
            handler.handle(HostCommand::CheckModeSupport).await,
            HostReply::ModeSupport { mode: 101 }
        );
    }

    #[tokio::test]
    async fn test_malformed_line_is_nacked() {
        let (handler, _rx, _) = handler();
        let reply = handler.handle_line("{\"cmd\":\"self_destruct\"}").await;
        assert!(matches!(reply, HostReply::Nack { .. }));
        let reply = handler.handle_line("not json").await;
        assert!(matches!(reply, HostReply::Nack { .. }));
    }

    #[tokio::test]
    async fn test_register_commands() {
        let (handler, _rx, devices) = handler();

        let reply = handler
            .handle_line("{\"cmd\":\"read_register\",\"kind\":\"accelerometer\",\"reg\":15}")
            .await;
        assert_eq!(
            reply,
            HostReply::Register {
                kind: SensorKind::Accelerometer,
                reg: 0x0F,
                value: 0x6C
            }
        );

        devices.lps22df.set(0x11, 0b1010_1010);
        let reply = handler
            .handle(HostCommand::ReadModifyWriteRegister {
                kind: SensorKind::Pressure,
                reg: 0x11,
                mask: 0xF0,
                value: 0x01,
            })
            .await;
        assert_eq!(
            reply,
            HostReply::RegisterWritten {
                kind: SensorKind::Pressure,
                reg: 0x11,
                value: 0b1010_0001
            }
        );
        assert_eq!(devices.lps22df.get(0x11), 0b1010_0001);

        let reply = handler
            .handle(HostCommand::WriteMultiRegister {
                kind: SensorKind::Gyroscope,
                writes: vec![RegisterValue { reg: 0x5E, value: 1 }, RegisterValue { reg: 0x5F, value: 2 }],
            })
            .await;
        assert_eq!(
            reply,
            HostReply::RegistersWritten {
                kind: SensorKind::Gyroscope,
                count: 2
            }
        );
        let reply = handler
            .handle(HostCommand::ReadMultiRegister {
                kind: SensorKind::Gyroscope,
                regs: vec![0x5E, 0x5F],
            })
            .await;
        assert_eq!(
            reply,
            HostReply::Registers {
                kind: SensorKind::Gyroscope,
                values: vec![RegisterValue { reg: 0x5E, value: 1 }, RegisterValue { reg: 0x5F, value: 2 }],
            }
        );
    }

    #[tokio::test]
    async fn test_full_scale_and_odr() {
        let (handler, _rx, _) = handler();

        handler
            .handle_line("{\"cmd\":\"set_full_scale\",\"kind\":\"accelerometer\",\"full_scale\":8}")
            .await;
        assert_eq!(
            handler.handle(HostCommand::GetFullScale { kind: SensorKind::Accelerometer }).await,
            HostReply::FullScale {
                kind: SensorKind::Accelerometer,
                full_scale: 8
            }
        );

        let reply = handler
            .handle_line("{\"cmd\":\"set_odr\",\"kind\":\"gyroscope\",\"odr\":400}")
            .await;
        assert_eq!(
            reply,
            HostReply::OdrSet {
                kind: SensorKind::Gyroscope,
                odr: 400.0
            }
        );
        assert_eq!(
            handler.handle(HostCommand::GetOdr { kind: SensorKind::Gyroscope }).await,
            HostReply::Odr {
                kind: SensorKind::Gyroscope,
                odr: 417.0
            }
        );

        match handler.handle(HostCommand::GetOdrList { kind: SensorKind::Pressure }).await {
            HostReply::OdrList { values, .. } => assert_eq!(values.len(), 8),
            other => panic!("unexpected reply {:?}", other),
        }
        let reply = handler
            .handle(HostCommand::SetOdr {
                kind: SensorKind::Pressure,
                odr: f32::NAN,
            })
            .await;
        assert!(matches!(reply, HostReply::Nack { .. }));
    }

    #[tokio::test]
    async fn test_sensor_selection() {
        let (handler, _rx, _) = handler();

        assert_eq!(
            handler.handle(HostCommand::GetSensorList { kind: SensorKind::Accelerometer }).await,
            HostReply::SensorList {
                kind: SensorKind::Accelerometer,
                names: "LSM6DSOX,LIS2DW12".into()
            }
        );
        handler
            .handle(HostCommand::SetSensorIndex {
                kind: SensorKind::Accelerometer,
                index: 1,
            })
            .await;
        assert_eq!(
            handler.handle(HostCommand::GetSensorName { kind: SensorKind::Accelerometer }).await,
            HostReply::SensorName {
                kind: SensorKind::Accelerometer,
                name: "LIS2DW12".into()
            }
        );

        let reply = handler
            .handle(HostCommand::SetSensorIndex {
                kind: SensorKind::Humidity,
                index: 0,
            })
            .await;
        assert_eq!(
            reply,
            HostReply::Nack {
                reason: "no hum sensor available at index 0".into()
            }
        );
    }

    #[tokio::test]
    async fn test_streaming_control() {
        let (handler, rx, devices) = handler();

        let reply = handler
            .handle(HostCommand::StartDataStreaming {
                sensors: vec![SensorKind::Gyroscope, SensorKind::Pressure],
            })
            .await;
        assert!(matches!(reply, HostReply::StreamingStarted { .. }));
        assert!(rx.borrow().active);
        assert_eq!(rx.borrow().sensors, vec![SensorKind::Gyroscope, SensorKind::Pressure]);
        // Accelerometer not requested: powered down
        assert_eq!(devices.lsm6dsox.get(0x10) >> 4, 0);

        handler.handle(HostCommand::StopDataStreaming).await;
        assert!(!rx.borrow().active);
        // Stopping only halts the stream; the sensors stay powered
        assert_ne!(devices.lsm6dsox.get(0x11) >> 4, 0);
        assert_ne!(Ctrl1::from(devices.lps22df.get(0x10)).odr(), 0);
    }

    #[tokio::test]
    async fn test_enable_failure_is_nacked_with_the_kind() {
        let (handler, rx, devices) = handler();
        let reply = handler
            .handle(HostCommand::EnableDisableSensors {
                sensors: vec![SensorKind::Accelerometer],
            })
            .await;
        assert!(matches!(reply, HostReply::SensorsEnabled { .. }));

        devices.lps22df.fail(true);
        let reply = handler
            .handle(HostCommand::StartDataStreaming {
                sensors: vec![SensorKind::Gyroscope, SensorKind::Pressure],
            })
            .await;
        match reply {
            HostReply::Nack { reason } => assert!(reason.contains("prs"), "{}", reason),
            other => panic!("unexpected reply {:?}", other),
        }
        assert!(!rx.borrow().active);
        // The healthy part was still switched
        assert_eq!(devices.lsm6dsox.get(0x10) >> 4, 0);
        assert_ne!(devices.lsm6dsox.get(0x11) >> 4, 0);

        devices.lps22df.fail(false);
        let reply = handler
            .handle(HostCommand::StartDataStreaming {
                sensors: vec![SensorKind::Pressure],
            })
            .await;
        assert!(matches!(reply, HostReply::StreamingStarted { .. }));
        assert!(rx.borrow().active);
    }
}
