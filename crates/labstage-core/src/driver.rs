//! Config-driven driver construction.
//!
//! Each driver crate exposes a factory that knows its `type` name, can check
//! a TOML table before anything touches hardware, and can build the device
//! from that table.
//!
//! ```toml
//! [stage]
//! type = "sbis26"
//! port = "/dev/ttyUSB0"
//! baud_rate = 38400
//! ```

use anyhow::Result;
use futures::future::BoxFuture;

/// Builds one kind of device from a TOML configuration table.
///
/// # Error Handling
///
/// `validate()` should fail with an actionable message for anything that
/// would make `build()` fail before opening a port. `build()` may also fail
/// on hardware errors (port missing, device silent).
pub trait DriverFactory: Send + Sync + 'static {
    /// The device handle produced by [`build`](Self::build).
    type Device: Send + Sync + 'static;

    /// Name used in the config `type` field.
    fn driver_type(&self) -> &'static str;

    /// Human-readable name for logs and error messages.
    fn name(&self) -> &'static str;

    /// Check a configuration table without opening hardware.
    fn validate(&self, config: &toml::Value) -> Result<()>;

    /// Open the hardware described by `config` and return the device.
    fn build(&self, config: toml::Value) -> BoxFuture<'static, Result<Self::Device>>;

    /// Whether a config table names this driver in its `type` field.
    fn matches(&self, config: &toml::Value) -> bool {
        config
            .get("type")
            .and_then(toml::Value::as_str)
            .is_some_and(|t| t == self.driver_type())
    }
}
