use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::board::Board;
use crate::commands::CommandHandler;
use crate::errors::{LinkError, LinkResult};
use crate::link::Link;
use crate::logger::{spawn_stream_task, StreamControl};
use crate::messages::OutboundMessage;

/// Frames buffered between the stream task and the link writer
const FRAME_QUEUE: usize = 32;

/// Serve one host over `link` until it disconnects.
///
/// Commands are answered in order. Streamed frames are interleaved between
/// replies, never inside one.
pub async fn run_session(
    link: &mut dyn Link,
    board: Arc<Mutex<Board>>,
    period: Duration,
) -> LinkResult<()> {
    let board_name = board.lock().await.name().to_string();
    let (control_tx, control_rx) = watch::channel(StreamControl::default());
    let (frames_tx, mut frames_rx) = mpsc::channel(FRAME_QUEUE);

    let stream = spawn_stream_task(board.clone(), control_rx, frames_tx, period, board_name.clone());
    let handler = CommandHandler::new(board, &board_name, control_tx);
    info!("[session] serving host on {}", link.path());

    let res = loop {
        tokio::select! {
            line = link.recv_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(e),
                };
                let reply = handler.handle_line(&line).await;
                if let Err(e) = send(link, &OutboundMessage::Reply(reply)).await {
                    break Err(e);
                }
            }
            Some(frame) = frames_rx.recv() => {
                if let Err(e) = send(link, &frame).await {
                    break Err(e);
                }
            }
        }
    };

    // Closing the control channel ends the stream task
    drop(handler);
    drop(frames_rx);
    if let Err(e) = stream.await {
        warn!("[session] stream task failed: {}", e);
    }

    match res {
        Err(LinkError::Closed { path }) => {
            info!("[session] host on {} went away", path);
            Ok(())
        }
        Ok(()) => {
            info!("[session] host on {} disconnected", link.path());
            Ok(())
        }
        Err(e) => Err(e),
    }
}

async fn send(link: &mut dyn Link, msg: &OutboundMessage) -> LinkResult<()> {
    let json = msg.to_json()?;
    debug!("[session] -> {}", json);
    link.send_line(&json).await
}
