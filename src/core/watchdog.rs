//! Per-exchange watchdog
//!
//! The protocol has no in-band "response complete" marker, so the only way to
//! detect a malformed or absent response is a deadline on each exchange. The
//! watchdog is a single-shot deadline owned by the sequencer: armed right
//! after a command is sent, disarmed on match, checked from the poll loop.
//! Expiry is fatal to the whole run.
//!
//! Built on [`tokio::time::Instant`] so tests can drive it with the paused
//! tokio clock. Checking expiry on the poll tick instead of spawning a timer
//! task keeps every transition on one logical thread of control; the tick is
//! short relative to the window, which is all correctness requires.

use std::time::Duration;
use tokio::time::Instant;

use super::sequencer::DriverError;

/// Default watchdog window per exchange.
pub const DEFAULT_WATCHDOG: Duration = Duration::from_millis(2000);

/// Single-shot deadline enforcing the maximum wait per exchange.
#[derive(Debug, Default)]
pub struct Watchdog {
    deadline: Option<Instant>,
}

impl Watchdog {
    /// Create an idle watchdog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the deadline. Arming an already-armed watchdog is a usage error:
    /// the caller must disarm first, and the sequencer's state machine never
    /// does otherwise.
    pub fn arm(&mut self, window: Duration) -> Result<(), DriverError> {
        if self.deadline.is_some() {
            return Err(DriverError::WatchdogAlreadyArmed);
        }
        self.deadline = Some(Instant::now() + window);
        Ok(())
    }

    /// Cancel the pending deadline. No-op when idle, so it is safe to call
    /// on every terminal transition.
    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    /// True while a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// True once the armed deadline has passed. Never true while idle.
    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_arm_expire() {
        let mut wd = Watchdog::new();
        assert!(!wd.is_armed());
        assert!(!wd.expired());

        wd.arm(Duration::from_millis(2000)).unwrap();
        assert!(wd.is_armed());
        assert!(!wd.expired());

        tokio::time::advance(Duration::from_millis(1999)).await;
        assert!(!wd.expired());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(wd.expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_cancels() {
        let mut wd = Watchdog::new();
        wd.arm(Duration::from_millis(100)).unwrap();
        wd.disarm();
        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(!wd.expired());

        // Disarming while idle is a no-op.
        wd.disarm();
        assert!(!wd.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_arm_is_rejected() {
        let mut wd = Watchdog::new();
        wd.arm(Duration::from_millis(100)).unwrap();
        assert!(matches!(
            wd.arm(Duration::from_millis(100)),
            Err(DriverError::WatchdogAlreadyArmed)
        ));

        // Rearming after a disarm is fine.
        wd.disarm();
        wd.arm(Duration::from_millis(100)).unwrap();
    }
}
