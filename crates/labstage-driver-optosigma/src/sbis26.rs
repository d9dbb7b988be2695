//! OptoSigma SBIS26 stage controller.
//!
//! # Usage
//!
//! ```rust,ignore
//! use labstage_driver_optosigma::{Sbis26, Sbis26Config};
//!
//! let config = Sbis26Config::new("/dev/ttyUSB0");
//! let stage = Sbis26::connect(&config).await?;
//!
//! stage.axis(2)?.move_to(5000).await?;
//! println!("{} devices attached", stage.count_devices().await?);
//! ```
//!
//! Opening a stage always sends the default speed profile
//! (200000 / 200000 / 100) to all three axes.

use crate::axis::{Axis, PollSettings};
use crate::error::{StageError, StageResult};
use crate::observer::{StageObserver, TracingObserver};
use crate::protocol::{parse_device_count, Command, AXIS_COUNT, DEFAULT_SPEED_PROFILE};
use crate::reply::Reply;
use crate::session::Session;
use anyhow::Context;
use futures::future::BoxFuture;
use labstage_core::driver::DriverFactory;
use labstage_core::{CommandTransport, LineTransport};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

// =============================================================================
// Sbis26Config / Sbis26Factory
// =============================================================================

/// Connection and polling settings for one controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sbis26Config {
    /// Serial port path (e.g. "/dev/ttyUSB0", "COM3")
    pub port: String,
    /// Baud rate (controller default 38400)
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Per-line read timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Delay between ready-polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Give up waiting for ready after this many seconds
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
}

fn default_baud_rate() -> u32 {
    38400
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_poll_interval_ms() -> u64 {
    200
}

fn default_ready_timeout_secs() -> u64 {
    60
}

impl Sbis26Config {
    /// Defaults for everything but the port.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            ready_timeout_secs: default_ready_timeout_secs(),
        }
    }

    /// Reject settings that cannot work.
    pub fn validate(&self) -> StageResult<()> {
        if self.port.trim().is_empty() {
            return Err(StageError::Config("port must not be empty".into()));
        }
        if self.baud_rate == 0 {
            return Err(StageError::Config("baud_rate must be positive".into()));
        }
        if self.timeout_ms == 0 {
            return Err(StageError::Config("timeout_ms must be positive".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(StageError::Config("poll_interval_ms must be positive".into()));
        }
        Ok(())
    }

    /// Ready-poll timing derived from this config.
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Duration::from_secs(self.ready_timeout_secs),
        }
    }

    /// Per-line read timeout.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Builds [`Sbis26`] stages from TOML tables.
pub struct Sbis26Factory;

impl DriverFactory for Sbis26Factory {
    type Device = Sbis26;

    fn driver_type(&self) -> &'static str {
        "sbis26"
    }

    fn name(&self) -> &'static str {
        "OptoSigma SBIS26 Motorized Stage"
    }

    fn validate(&self, config: &toml::Value) -> anyhow::Result<()> {
        let cfg: Sbis26Config = config.clone().try_into()?;
        cfg.validate()?;
        Ok(())
    }

    fn build(&self, config: toml::Value) -> BoxFuture<'static, anyhow::Result<Sbis26>> {
        Box::pin(async move {
            let cfg: Sbis26Config = config.try_into().context("Invalid SBIS26 config")?;
            Ok(Sbis26::connect(&cfg).await?)
        })
    }
}

// =============================================================================
// Sbis26
// =============================================================================

/// An SBIS26 controller with its three axes.
pub struct Sbis26 {
    session: Arc<Session>,
    axes: Vec<Axis>,
}

impl std::fmt::Debug for Sbis26 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sbis26")
            .field("axes", &self.axes)
            .field("poll", &self.session.poll)
            .finish()
    }
}

impl Sbis26 {
    /// Open the serial port named in `config` and initialize the stage.
    ///
    /// # Errors
    /// Returns error if:
    /// - the config is invalid
    /// - the serial port cannot be opened
    /// - the default speed profile cannot be written
    pub async fn connect(config: &Sbis26Config) -> StageResult<Self> {
        config.validate()?;
        let transport = LineTransport::open(&config.port, config.baud_rate, "SBIS26")
            .await?
            .with_read_timeout(config.read_timeout());
        Self::open(
            Arc::new(transport),
            Arc::new(TracingObserver),
            config.poll_settings(),
        )
        .await
    }

    /// Initialize a stage on an existing transport with default polling.
    pub async fn with_transport(transport: Arc<dyn CommandTransport>) -> StageResult<Self> {
        Self::open(transport, Arc::new(TracingObserver), PollSettings::default()).await
    }

    /// Initialize a stage on an existing transport.
    ///
    /// Sends the batch default speed profile before returning.
    pub async fn open(
        transport: Arc<dyn CommandTransport>,
        observer: Arc<dyn StageObserver>,
        poll: PollSettings,
    ) -> StageResult<Self> {
        let session = Arc::new(Session::new(transport, observer, poll));
        let axes = (1..=AXIS_COUNT)
            .map(|id| Axis::new(id, session.clone()))
            .collect();

        session
            .send(&Command::SetSpeedAll {
                profiles: [DEFAULT_SPEED_PROFILE; 3],
            })
            .await?;
        tracing::info!("SBIS26 opened, default speed profile applied to all axes");

        Ok(Self { session, axes })
    }

    /// Handle for axis `id` (1-3).
    pub fn axis(&self, id: u8) -> StageResult<&Axis> {
        id.checked_sub(1)
            .and_then(|i| self.axes.get(usize::from(i)))
            .ok_or(StageError::InvalidAxis(id))
    }

    /// All three axes, in order.
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Number of sub-devices attached to the controller.
    #[instrument(skip(self), err)]
    pub async fn count_devices(&self) -> StageResult<u32> {
        let _link = self.session.exclusive().await;
        let raw = self.session.query(&Command::CountDevices).await?;
        Ok(parse_device_count(&raw)?)
    }

    /// Handshake with the controller (`#CONNECT:`).
    #[instrument(skip(self), err)]
    pub async fn initialize(&self) -> StageResult<Reply> {
        let _link = self.session.exclusive().await;
        self.session.send(&Command::Connect).await?;
        self.session.read_reply().await
    }

    /// Read one reply line.
    ///
    /// An `NG` reply is reported to the observer and returned tagged as
    /// [`Reply::SoftFailure`]; it is not an error.
    pub async fn read(&self) -> StageResult<Reply> {
        let _link = self.session.exclusive().await;
        self.session.read_reply().await
    }

    /// Read the reply to a setting and collect any rejection.
    ///
    /// Returns the `NG` reply text (if any) as an error entry. Transport
    /// failures are logged and propagated.
    #[instrument(skip(self), err)]
    pub async fn check_set_errors(&self) -> StageResult<Vec<String>> {
        match self.read().await {
            Ok(Reply::Ok(_)) => Ok(Vec::new()),
            Ok(Reply::SoftFailure(raw)) => Ok(vec![raw]),
            Err(e) => {
                tracing::error!(error = %e, "Setting a property failed");
                Err(e)
            }
        }
    }
}
