//! Line-oriented command transport.
//!
//! Instruments in this workspace speak ASCII: the host writes one command
//! line, the device answers with one response line. The transport moves
//! those lines and nothing else. It does not interpret replies, does not
//! retry, and reports every I/O failure as a [`TransportError`].

use crate::error::{TransportError, TransportResult};
use crate::serial::SharedPort;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt};

/// Line terminator appended to every command and stripped from every reply.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Default time to wait for one response line.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to listen for leftover bytes before the port is trusted again.
const STALE_INPUT_WINDOW: Duration = Duration::from_millis(50);

/// Contract between a driver and the wire.
///
/// All methods take `&self`; implementations serialize access internally so
/// that several axis handles can share one transport.
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Write one command line. No reply is consumed.
    async fn send(&self, command: &str) -> TransportResult<()>;

    /// Read one response line with the terminator stripped.
    async fn read_line(&self) -> TransportResult<String>;

    /// Write one command line and read one response line.
    ///
    /// Implementations backed by a shared port should override this to hold
    /// the port for the whole exchange.
    async fn query(&self, command: &str) -> TransportResult<String> {
        self.send(command).await?;
        self.read_line().await
    }
}

/// [`CommandTransport`] over a [`SharedPort`].
///
/// A read that times out leaves the device's late reply on the way. The
/// transport remembers this and discards whatever is pending before it
/// writes the next command, so that reply is never taken as the answer to
/// a later one.
#[derive(Clone)]
pub struct LineTransport {
    port: SharedPort,
    read_timeout: Duration,
    stale: Arc<AtomicBool>,
}

impl LineTransport {
    /// Wrap an already shared port with the default read timeout.
    pub fn new(port: SharedPort) -> Self {
        Self {
            port,
            read_timeout: DEFAULT_READ_TIMEOUT,
            stale: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Open a serial port (8N1), discard stale input, and wrap it.
    #[cfg(feature = "serial")]
    pub async fn open(port_path: &str, baud_rate: u32, device_name: &str) -> TransportResult<Self> {
        let mut stream = crate::serial::open_serial_async(port_path, baud_rate, device_name).await?;
        tracing::info!(port = port_path, baud_rate, "{} serial port opened", device_name);

        let discarded = crate::serial::drain_serial_buffer(&mut stream, STALE_INPUT_WINDOW).await;
        if discarded > 0 {
            tracing::debug!(discarded, "Discarded stale bytes from {} input buffer", device_name);
        }

        Ok(Self::new(crate::serial::wrap_shared(Box::new(stream))))
    }

    /// Set how long a read may wait for a full line.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    async fn write_locked(
        &self,
        guard: &mut tokio::io::BufReader<crate::serial::DynSerial>,
        command: &str,
    ) -> TransportResult<()> {
        if self.stale.swap(false, Ordering::AcqRel) {
            let discarded = crate::serial::drain_serial_buffer(&mut *guard, STALE_INPUT_WINDOW).await;
            tracing::debug!(discarded, "Discarded late input after a read timeout");
        }

        let line = format!("{command}{LINE_TERMINATOR}");
        let writer = guard.get_mut();
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        tracing::trace!(command, "line sent");
        Ok(())
    }

    async fn read_locked(
        &self,
        guard: &mut tokio::io::BufReader<crate::serial::DynSerial>,
    ) -> TransportResult<String> {
        let mut line = String::new();
        let timeout = self.read_timeout;
        let n = match tokio::time::timeout(timeout, guard.read_line(&mut line)).await {
            Ok(read) => read?,
            Err(_) => {
                self.stale.store(true, Ordering::Release);
                tracing::warn!(?timeout, "No complete reply before timeout");
                return Err(TransportError::Timeout(timeout));
            }
        };
        if n == 0 {
            return Err(TransportError::Disconnected);
        }
        let reply = strip_terminator(&line).to_string();
        tracing::trace!(reply = %reply, "line received");
        Ok(reply)
    }
}

#[async_trait]
impl CommandTransport for LineTransport {
    async fn send(&self, command: &str) -> TransportResult<()> {
        let mut guard = self.port.lock().await;
        self.write_locked(&mut guard, command).await
    }

    async fn read_line(&self) -> TransportResult<String> {
        let mut guard = self.port.lock().await;
        self.read_locked(&mut guard).await
    }

    async fn query(&self, command: &str) -> TransportResult<String> {
        let mut guard = self.port.lock().await;
        self.write_locked(&mut guard, command).await?;
        self.read_locked(&mut guard).await
    }
}

/// Remove a trailing `\r\n` (or a bare `\n`) from a raw line.
pub fn strip_terminator(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}
