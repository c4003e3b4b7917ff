//! Host links: newline-delimited JSON over a byte stream

pub mod serial;
pub mod stdio;

pub use serial::open_serial;
pub use stdio::open_stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::errors::{LinkError, LinkResult};

#[async_trait]
pub trait Link: Send {
    /// Port path or stream name, for logs
    fn path(&self) -> &str;

    /// Next complete line without its terminator; `None` once the peer is gone.
    ///
    /// Cancel safe: a partially received line is kept for the next call.
    async fn recv_line(&mut self) -> LinkResult<Option<String>>;

    async fn send_line(&mut self, line: &str) -> LinkResult<()>;
}

/// A [`Link`] over any split reader/writer pair
pub struct LineLink<R, W> {
    reader: BufReader<R>,
    writer: W,
    pending: Vec<u8>,
    path: String,
}

impl<R, W> LineLink<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W, path: impl Into<String>) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            pending: Vec::new(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl<R, W> Link for LineLink<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn path(&self) -> &str {
        &self.path
    }

    async fn recv_line(&mut self) -> LinkResult<Option<String>> {
        loop {
            let n = self.reader.read_until(b'\n', &mut self.pending).await?;
            if n == 0 {
                return Ok(None);
            }
            if self.pending.last() != Some(&b'\n') {
                continue;
            }

            let bytes = std::mem::take(&mut self.pending);
            let line = String::from_utf8_lossy(&bytes).trim_end().to_string();
            if !line.is_empty() {
                return Ok(Some(line));
            }
        }
    }

    async fn send_line(&mut self, line: &str) -> LinkResult<()> {
        let res = async {
            self.writer.write_all(line.as_bytes()).await?;
            self.writer.write_all(b"\n").await?;
            self.writer.flush().await
        }
        .await;

        match res {
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Err(LinkError::Closed {
                path: self.path.clone(),
            }),
            other => other.map_err(LinkError::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, split, AsyncReadExt};

    #[tokio::test]
    async fn test_lines_round_trip_over_duplex() {
        let (board_side, host_side) = duplex(256);
        let (r, w) = split(board_side);
        let mut link = LineLink::new(r, w, "duplex");
        let (mut host_r, mut host_w) = split(host_side);

        host_w.write_all(b"{\"cmd\":\"ping\"}\r\n\n{\"cmd\":").await.unwrap();
        assert_eq!(link.recv_line().await.unwrap().as_deref(), Some("{\"cmd\":\"ping\"}"));

        host_w.write_all(b"\"stop_data_streaming\"}\n").await.unwrap();
        assert_eq!(
            link.recv_line().await.unwrap().as_deref(),
            Some("{\"cmd\":\"stop_data_streaming\"}")
        );

        link.send_line("{\"reply\":\"pong\"}").await.unwrap();
        let mut buf = [0u8; 17];
        host_r.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"{\"reply\":\"pong\"}\n");

        drop(host_w);
        drop(host_r);
        assert_eq!(link.recv_line().await.unwrap(), None);
        assert_eq!(link.path(), "duplex");
    }
}
