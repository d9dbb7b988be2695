//! Byte-level serial mock for transport tests.
//!
//! [`pair`] returns a [`SharedPort`] for the code under test and a
//! [`MockDevice`] that plays the instrument: it reads the lines the host
//! wrote, asserts on them, and writes back `\r\n`-terminated replies.
//! Use this when the framing itself is under test; for driver logic the
//! command-level [`MockTransport`](crate::mock::MockTransport) is simpler.
//!
//! # Example
//!
//! ```rust,ignore
//! let (port, mut device) = mock_serial::pair();
//! let transport = LineTransport::new(port);
//!
//! let host = tokio::spawn(async move { transport.query("CONNECT?").await });
//! device.expect_and_reply("CONNECT?", "3").await;
//! assert_eq!(host.await??, "3");
//! ```

use crate::serial::{wrap_shared, SharedPort};
use crate::transport::{strip_terminator, LINE_TERMINATOR};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

/// How long [`MockDevice::expect_line`] waits before failing the test.
const EXPECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Instrument side of a mock serial link.
#[derive(Debug)]
pub struct MockDevice {
    io: BufReader<DuplexStream>,
}

/// Create a connected host port / mock device pair.
pub fn pair() -> (SharedPort, MockDevice) {
    let (host, device) = tokio::io::duplex(1024);
    (
        wrap_shared(Box::new(host)),
        MockDevice {
            io: BufReader::new(device),
        },
    )
}

impl MockDevice {
    /// Read the next line the host wrote, terminator stripped.
    ///
    /// # Panics
    ///
    /// Panics if no full line arrives within two seconds or the host hung up.
    pub async fn next_line(&mut self) -> String {
        let mut line = String::new();
        let n = tokio::time::timeout(EXPECT_TIMEOUT, self.io.read_line(&mut line))
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for a host line, got {line:?}"))
            .unwrap_or_else(|e| panic!("mock device read failed: {e}"));
        assert!(n > 0, "host closed the port while a line was expected");
        assert!(
            line.ends_with(LINE_TERMINATOR),
            "host line {line:?} is not CRLF-terminated"
        );
        strip_terminator(&line).to_string()
    }

    /// Assert the host's next line equals `expected`.
    pub async fn expect_line(&mut self, expected: &str) {
        let actual = self.next_line().await;
        assert_eq!(actual, expected, "unexpected command from host");
    }

    /// Write one reply line, appending `\r\n`.
    pub async fn reply(&mut self, line: &str) {
        let framed = format!("{line}{LINE_TERMINATOR}");
        self.io
            .get_mut()
            .write_all(framed.as_bytes())
            .await
            .unwrap_or_else(|e| panic!("mock device write failed: {e}"));
    }

    /// Expect a command, then answer it.
    pub async fn expect_and_reply(&mut self, expected: &str, reply: &str) {
        self.expect_line(expected).await;
        self.reply(reply).await;
    }
}
