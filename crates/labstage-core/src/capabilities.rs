//! Capability traits.
//!
//! A capability is a narrow, device-independent view of what an instrument
//! can do. Code that only needs "something that moves" depends on
//! [`Movable`] instead of a concrete driver.

use anyhow::Result;
use async_trait::async_trait;

/// Capability: Motion Control
///
/// Devices that move to positions (stages, actuators).
///
/// # Contract
/// - Positions are in device-native integer units (pulses for stepper stages)
/// - `move_abs` and `move_rel` return once the device reports the move done
///   or the driver's settle timeout expires
/// - `wait_settled` fails if the device never settles
/// - Protocol-level rejections are reported as errors on this surface
///
/// # Thread Safety
/// - All methods take `&self`; drivers serialize access to their port internally
#[async_trait]
pub trait Movable: Send + Sync {
    /// Move to an absolute position.
    async fn move_abs(&self, position: i64) -> Result<()>;

    /// Move by `distance` from the current position.
    async fn move_rel(&self, distance: i64) -> Result<()>;

    /// Current position.
    async fn position(&self) -> Result<i64>;

    /// Wait until the device reports motion complete.
    async fn wait_settled(&self) -> Result<()>;

    /// Halt motion.
    ///
    /// The default reports that stopping is unsupported.
    async fn stop(&self) -> Result<()> {
        anyhow::bail!("Stop not supported by this device")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct Slider {
        at: AtomicI64,
    }

    #[async_trait]
    impl Movable for Slider {
        async fn move_abs(&self, position: i64) -> Result<()> {
            self.at.store(position, Ordering::SeqCst);
            Ok(())
        }

        async fn move_rel(&self, distance: i64) -> Result<()> {
            self.at.fetch_add(distance, Ordering::SeqCst);
            Ok(())
        }

        async fn position(&self) -> Result<i64> {
            Ok(self.at.load(Ordering::SeqCst))
        }

        async fn wait_settled(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn default_stop_is_unsupported() {
        let slider = Slider { at: AtomicI64::new(0) };
        slider.move_abs(10).await.unwrap();
        slider.move_rel(-3).await.unwrap();
        assert_eq!(slider.position().await.unwrap(), 7);
        assert!(slider.stop().await.is_err());
    }
}
