//! Driver event observer.
//!
//! A stage reports noteworthy events (rejected input, `NG` replies, polls,
//! the ready timeout) to the [`StageObserver`] it was built with instead of
//! writing to a global logger. [`TracingObserver`] is the default and turns
//! each event into a `tracing` event; tests inject their own to assert on
//! events directly.

use crate::protocol::StatusToken;
use std::time::Duration;

/// Receives driver events. Every method defaults to a no-op.
pub trait StageObserver: Send + Sync {
    /// A reply ended in `NG`.
    fn not_good(&self, _raw: &str) {}

    /// A speed profile was rejected locally; nothing was sent.
    fn speed_rejected(&self, _axis: u8, _speed: i64, _range: i64, _acceleration: i64) {}

    /// One ready-poll saw the axis not ready yet.
    fn polled(&self, _axis: u8, _status: &StatusToken) {}

    /// The ready-poll gave up. Control returns to the caller regardless.
    fn ready_timeout(&self, _axis: u8, _elapsed: Duration) {}

    /// A motion target was outside the travel range and got clamped.
    fn clamped(&self, _axis: u8, _requested: i64, _sent: i64) {}
}

/// Logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl StageObserver for TracingObserver {
    fn not_good(&self, raw: &str) {
        tracing::warn!(reply = raw, "SBIS26 reply: Not OK");
    }

    fn speed_rejected(&self, axis: u8, speed: i64, range: i64, acceleration: i64) {
        tracing::warn!(
            axis,
            speed,
            range,
            acceleration,
            "speed profile rejected: NG (all components must be positive)"
        );
    }

    fn polled(&self, axis: u8, status: &StatusToken) {
        tracing::debug!(axis, status = %status, "axis not ready");
    }

    fn ready_timeout(&self, axis: u8, elapsed: Duration) {
        tracing::warn!(axis, ?elapsed, "Timeout waiting for axis to become ready");
    }

    fn clamped(&self, axis: u8, requested: i64, sent: i64) {
        tracing::debug!(axis, requested, sent, "target clamped to travel range");
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl StageObserver for NullObserver {}
