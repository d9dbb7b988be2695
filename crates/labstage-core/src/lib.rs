//! Core types and traits for labstage.
//!
//! This crate holds everything a line-protocol instrument driver needs that
//! is not specific to one device:
//!
//! - [`transport`]: the [`CommandTransport`] contract (send a line, read a line)
//!   and [`LineTransport`], its implementation over a shared serial port
//! - [`serial`]: shared-port type aliases and the async port opener
//! - [`error`]: [`TransportError`], the fatal I/O failure type
//! - [`capabilities`]: the [`Movable`](capabilities::Movable) capability trait
//! - [`driver`]: the [`DriverFactory`](driver::DriverFactory) trait for config-driven construction
//! - [`mock`] and [`mock_serial`]: test doubles at the command and byte level
//!
//! # Example
//!
//! ```rust,ignore
//! use labstage_core::{CommandTransport, LineTransport};
//!
//! let transport = LineTransport::open("/dev/ttyUSB0", 38400, "SBIS26").await?;
//! let count = transport.query("CONNECT?").await?;
//! ```

pub mod capabilities;
pub mod driver;
pub mod error;
pub mod mock;
pub mod mock_serial;
pub mod serial;
pub mod transport;

pub use error::{TransportError, TransportResult};
pub use transport::{CommandTransport, LineTransport, DEFAULT_READ_TIMEOUT, LINE_TERMINATOR};
