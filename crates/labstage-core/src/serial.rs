//! Shared serial port types.
//!
//! A stage controller and all of its axes talk over one physical port. The
//! port is boxed behind [`DynSerial`] so real hardware and in-memory test
//! streams are interchangeable, wrapped in a `BufReader` for line reads, and
//! guarded by a `tokio::sync::Mutex` so exactly one command/response exchange
//! is in flight at a time.
//!
//! # Feature Flag
//!
//! [`open_serial_async`] needs the `serial` feature (on by default). The type
//! aliases are always available so tests can build a [`SharedPort`] from a
//! `tokio::io::DuplexStream`.

use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, BufReader};
use tokio::sync::Mutex;

/// Anything that can stand in for a serial port.
///
/// Implemented for `tokio_serial::SerialStream`, `tokio::io::DuplexStream`
/// and any other `AsyncRead + AsyncWrite` stream.
pub trait SerialPortIO: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> SerialPortIO for T {}

/// Type-erased boxed serial port.
pub type DynSerial = Box<dyn SerialPortIO>;

/// Serial port shared between a controller and its axes.
///
/// Hold the lock for a whole write+read exchange; releasing it between the
/// two lets another caller's command interleave with the pending reply.
pub type SharedPort = Arc<Mutex<BufReader<DynSerial>>>;

/// Wrap a boxed port for sharing.
pub fn wrap_shared(port: DynSerial) -> SharedPort {
    Arc::new(Mutex::new(BufReader::new(port)))
}

/// Open a serial port at `baud_rate`, 8N1, no flow control.
///
/// Opening can block on some platforms, so it runs on the blocking pool.
///
/// # Errors
///
/// Returns [`TransportError::Open`](crate::TransportError::Open) if the port
/// cannot be opened.
#[cfg(feature = "serial")]
pub async fn open_serial_async(
    port_path: &str,
    baud_rate: u32,
    device_name: &str,
) -> crate::TransportResult<tokio_serial::SerialStream> {
    use crate::TransportError;
    use tokio_serial::SerialPortBuilderExt;

    let port = port_path.to_string();
    let device = device_name.to_string();

    tokio::task::spawn_blocking(move || {
        tokio_serial::new(&port, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| TransportError::Open {
                device,
                port,
                message: e.to_string(),
            })
    })
    .await
    .map_err(|e| TransportError::Io(std::io::Error::other(e)))?
}

/// Read and discard whatever is already waiting on the port.
///
/// Stops at EOF, on the first read error, or once `window` passes without
/// the buffer emptying. Returns the number of bytes thrown away.
pub async fn drain_serial_buffer<R: AsyncRead + Unpin>(port: &mut R, window: Duration) -> usize {
    let mut scratch = [0u8; 256];
    let deadline = tokio::time::Instant::now() + window;
    let mut discarded = 0usize;

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        match tokio::time::timeout(remaining, port.read(&mut scratch)).await {
            Ok(Ok(0)) | Ok(Err(_)) | Err(_) => break,
            Ok(Ok(n)) => discarded += n,
        }
    }

    discarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn shared_port_reads_lines_from_duplex() {
        let (mut device, host) = tokio::io::duplex(64);
        let port = wrap_shared(Box::new(host));

        device.write_all(b"C,1,K,K,K,R\r\n").await.unwrap();

        let mut guard = port.lock().await;
        let mut line = String::new();
        guard.read_line(&mut line).await.unwrap();
        assert_eq!(line, "C,1,K,K,K,R\r\n");
    }

    #[tokio::test]
    async fn clones_share_one_port() {
        let (mut device, host) = tokio::io::duplex(64);
        let port = wrap_shared(Box::new(host));
        let other = port.clone();

        device.write_all(b"3\r\n").await.unwrap();

        let mut guard = other.lock().await;
        let mut line = String::new();
        guard.read_line(&mut line).await.unwrap();
        assert_eq!(line.trim_end(), "3");
    }

    #[tokio::test]
    async fn drain_discards_stale_bytes() {
        let (mut device, mut host) = tokio::io::duplex(64);
        device.write_all(b"OK\r\nOK\r\n").await.unwrap();

        let discarded = drain_serial_buffer(&mut host, Duration::from_millis(20)).await;
        assert_eq!(discarded, 8);
    }
}
