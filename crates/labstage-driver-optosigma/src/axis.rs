//! One SBIS26 axis.
//!
//! An [`Axis`] is a cheap handle (axis number plus the shared session) handed
//! out by [`Sbis26`](crate::Sbis26). Motion commands clamp their target into
//! the travel range, then block on [`Axis::wait_for_ready`] before reading
//! the controller's reply.
//!
//! Each public operation holds the session for its whole exchange, so a
//! poll on one axis never reads the reply meant for another caller.
//!
//! The ready-poll is a bounded loop: query status, return on `R`, give up
//! once [`PollSettings::timeout`] has elapsed, otherwise sleep
//! [`PollSettings::interval`]. Giving up is not an error. The observer is
//! told and the caller continues.

use crate::ack::AxisReport;
use crate::error::StageResult;
use crate::protocol::{clamp_position, parse_position, plan_relative_move, Command, SpeedProfile, StatusToken};
use crate::reply::Reply;
use crate::session::Session;
use anyhow::anyhow;
use async_trait::async_trait;
use labstage_core::capabilities::Movable;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Ready-poll timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay between status queries.
    pub interval: Duration,
    /// Give up after this long without reaching ready.
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(200),
            timeout: Duration::from_secs(60),
        }
    }
}

/// How a ready-poll ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// The axis reported `R`.
    Ready,
    /// The poll timed out; the axis may still be moving.
    TimedOut {
        /// Time spent polling.
        elapsed: Duration,
    },
}

/// Handle to one axis of an SBIS26 controller.
#[derive(Clone)]
pub struct Axis {
    id: u8,
    session: Arc<Session>,
}

impl std::fmt::Debug for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Axis").field("id", &self.id).finish()
    }
}

impl Axis {
    pub(crate) fn new(id: u8, session: Arc<Session>) -> Self {
        Self { id, session }
    }

    /// Axis number (1-3).
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Send the axis to its mechanical origin and wait for it to get there.
    #[instrument(skip(self), fields(axis = self.id), err)]
    pub async fn home(&self) -> StageResult<Reply> {
        let _link = self.session.exclusive().await;
        self.session.send(&Command::Home { axis: self.id }).await?;
        self.poll_until_ready().await?;
        self.session.read_reply().await
    }

    /// Set speed, speed range and acceleration time.
    ///
    /// If any component is zero or negative nothing is sent and the `NG`
    /// sentinel ([`Reply::rejected`]) comes back.
    #[instrument(skip(self), fields(axis = self.id), err)]
    pub async fn set_speed(&self, speed: i64, range: i64, acceleration: i64) -> StageResult<Reply> {
        let Some(profile) = SpeedProfile::new(speed, range, acceleration) else {
            self.session
                .observer
                .speed_rejected(self.id, speed, range, acceleration);
            return Ok(Reply::rejected());
        };
        let _link = self.session.exclusive().await;
        self.session
            .send(&Command::SetSpeed {
                axis: self.id,
                profile,
            })
            .await?;
        self.session.read_reply().await
    }

    /// Read back the current speed profile (`?:D,<ch>,D`).
    #[instrument(skip(self), fields(axis = self.id), err)]
    pub async fn speed_profile(&self) -> StageResult<SpeedProfile> {
        let _link = self.session.exclusive().await;
        let raw = self.session.query(&Command::QuerySpeed { axis: self.id }).await?;
        Ok(SpeedProfile::parse_reply(&raw)?)
    }

    /// Query the status letter. Always a fresh query; nothing is cached.
    pub async fn status(&self) -> StageResult<StatusToken> {
        let _link = self.session.exclusive().await;
        self.query_status().await
    }

    async fn query_status(&self) -> StageResult<StatusToken> {
        let raw = self.session.query(&Command::Status { axis: self.id }).await?;
        Ok(StatusToken::parse(&raw)?)
    }

    /// Query status and decode all four acknowledgement fields.
    #[instrument(skip(self), fields(axis = self.id), err)]
    pub async fn report(&self) -> StageResult<AxisReport> {
        let _link = self.session.exclusive().await;
        let raw = self.session.query(&Command::Status { axis: self.id }).await?;
        Ok(AxisReport::parse(&raw)?)
    }

    /// Poll status until `R` or until the poll timeout passes.
    ///
    /// A timeout is reported to the observer and returned as
    /// [`ReadyOutcome::TimedOut`]; it is never an error. Transport and parse
    /// failures while polling do propagate.
    #[instrument(skip(self), fields(axis = self.id), err)]
    pub async fn wait_for_ready(&self) -> StageResult<ReadyOutcome> {
        let _link = self.session.exclusive().await;
        self.poll_until_ready().await
    }

    /// The ready-poll loop. Callers already hold the session.
    async fn poll_until_ready(&self) -> StageResult<ReadyOutcome> {
        let poll = self.session.poll;
        let start = tokio::time::Instant::now();

        loop {
            let status = self.query_status().await?;
            if status.is_ready() {
                return Ok(ReadyOutcome::Ready);
            }
            self.session.observer.polled(self.id, &status);

            let elapsed = start.elapsed();
            if elapsed >= poll.timeout {
                self.session.observer.ready_timeout(self.id, elapsed);
                return Ok(ReadyOutcome::TimedOut { elapsed });
            }

            tokio::time::sleep(poll.interval).await;
        }
    }

    /// Absolute move. Out-of-range targets saturate to the nearest bound.
    #[instrument(skip(self), fields(axis = self.id), err)]
    pub async fn move_to(&self, position: i64) -> StageResult<Reply> {
        let target = clamp_position(position);
        if target != position {
            self.session.observer.clamped(self.id, position, target);
        }
        let _link = self.session.exclusive().await;
        self.session
            .send(&Command::MoveAbsolute {
                axis: self.id,
                position: target,
            })
            .await?;
        self.poll_until_ready().await?;
        self.session.read_reply().await
    }

    /// Relative move.
    ///
    /// Reads the current position first. When `current - delta` is inside
    /// the travel range the relative command is sent as is; otherwise an
    /// absolute move to the nearest bound is sent instead.
    #[instrument(skip(self), fields(axis = self.id), err)]
    pub async fn move_relative(&self, delta: i64) -> StageResult<Reply> {
        let _link = self.session.exclusive().await;
        let current = self.query_position().await?;
        let command = plan_relative_move(self.id, current, delta);
        if let Command::MoveAbsolute { position, .. } = command {
            self.session
                .observer
                .clamped(self.id, current.saturating_sub(delta), position);
        }
        self.session.send(&command).await?;
        self.poll_until_ready().await?;
        self.session.read_reply().await
    }

    /// Stop **every** axis on the controller.
    ///
    /// The controller only has a broadcast stop (`LE:A`), so calling this on
    /// axis 1 halts axes 2 and 3 as well.
    #[instrument(skip(self), fields(axis = self.id), err)]
    pub async fn stop(&self) -> StageResult<Reply> {
        let _link = self.session.exclusive().await;
        self.session.send(&Command::StopAll).await?;
        self.session.read_reply().await
    }

    /// Current absolute position in pulses.
    pub async fn position(&self) -> StageResult<i64> {
        let _link = self.session.exclusive().await;
        self.query_position().await
    }

    async fn query_position(&self) -> StageResult<i64> {
        let raw = self
            .session
            .query(&Command::QueryPosition { axis: self.id })
            .await?;
        Ok(parse_position(&raw)?)
    }
}

/// Strict view of an axis: `NG` replies and ready timeouts become errors.
#[async_trait]
impl Movable for Axis {
    async fn move_abs(&self, position: i64) -> anyhow::Result<()> {
        self.move_to(position).await?.into_strict()?;
        Ok(())
    }

    async fn move_rel(&self, distance: i64) -> anyhow::Result<()> {
        self.move_relative(distance).await?.into_strict()?;
        Ok(())
    }

    async fn position(&self) -> anyhow::Result<i64> {
        Ok(Axis::position(self).await?)
    }

    async fn wait_settled(&self) -> anyhow::Result<()> {
        match self.wait_for_ready().await? {
            ReadyOutcome::Ready => Ok(()),
            ReadyOutcome::TimedOut { elapsed } => Err(anyhow!(
                "SBIS26 axis {} not ready after {:?}",
                self.id,
                elapsed
            )),
        }
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Axis::stop(self).await?.into_strict()?;
        Ok(())
    }
}
