use std::{
    thread,
    time::{Duration, Instant},
};

use log::debug;

use crate::{DeviceBridge, DevicePhase, PhaseDetector};

/// Time source used while waiting for re-enumeration
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitResult {
    Reached { polls: u32, elapsed: Duration },
    TimedOut { polls: u32, elapsed: Duration },
}

impl WaitResult {
    pub fn is_reached(&self) -> bool {
        matches!(self, WaitResult::Reached { .. })
    }

    pub fn polls(&self) -> u32 {
        match self {
            WaitResult::Reached { polls, .. }
            | WaitResult::TimedOut { polls, .. } => *polls,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            WaitResult::Reached { elapsed, .. }
            | WaitResult::TimedOut { elapsed, .. } => *elapsed,
        }
    }
}

/// Bounded polling for a device coming back under a new identity
///
/// After `continue` the device drops off the bus and re-appears, so
/// [DevicePhase::Absent] and [DevicePhase::Unknown] observations in between
/// are expected and ignored.
pub struct ReenumerationWaiter<'a, B, C> {
    detector: &'a PhaseDetector<B>,
    clock: &'a C,
}

impl<'a, B: DeviceBridge, C: Clock> ReenumerationWaiter<'a, B, C> {
    pub fn new(detector: &'a PhaseDetector<B>, clock: &'a C) -> Self {
        ReenumerationWaiter { detector, clock }
    }

    /// Poll every `poll_interval` until `target` is detected or `timeout`
    /// has elapsed
    ///
    /// A timeout is a regular result, not an error. With a zero
    /// `poll_interval` the poll count is bounded by the bridge latency
    /// only.
    pub fn wait_for(
        &self,
        target: DevicePhase,
        timeout: Duration,
        poll_interval: Duration,
    ) -> WaitResult {
        let start = self.clock.now();
        let mut polls: u32 = 0;
        loop {
            let elapsed = self.clock.now().duration_since(start);
            if elapsed >= timeout {
                debug!("Gave up waiting for {target} after {polls} polls");
                return WaitResult::TimedOut { polls, elapsed };
            }

            polls += 1;
            let phase = self.detector.detect();
            debug!("Poll {polls}: device phase {phase}");
            if phase == target {
                return WaitResult::Reached {
                    polls,
                    elapsed: self.clock.now().duration_since(start),
                };
            }

            self.clock.sleep(poll_interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DevicePhase::*;
    use crate::testing::{FakeBridge, FakeClock};

    fn wait(
        phases: &[DevicePhase],
        timeout: Duration,
        interval: Duration,
    ) -> (WaitResult, usize, FakeClock) {
        let bridge = FakeBridge::with_phases(phases);
        let clock = FakeClock::new();
        let detector = PhaseDetector::new(&bridge, Default::default());
        let result = ReenumerationWaiter::new(&detector, &clock)
            .wait_for(StagedBoot, timeout, interval);
        (result, bridge.list_calls(), clock)
    }

    #[test]
    fn test_reached_after_transient_absence() {
        let (result, calls, clock) = wait(
            &[Absent, Unknown, Absent, StagedBoot],
            Duration::from_secs(10),
            Duration::from_millis(500),
        );
        assert_eq!(
            result,
            WaitResult::Reached {
                polls: 4,
                elapsed: Duration::from_millis(1500),
            }
        );
        assert_eq!(calls, 4);
        assert_eq!(clock.sleeps(), 3);
    }

    #[test]
    fn test_reached_immediately() {
        let (result, calls, clock) = wait(
            &[StagedBoot],
            Duration::from_secs(10),
            Duration::from_millis(500),
        );
        assert_eq!(result.polls(), 1);
        assert_eq!(result.elapsed(), Duration::ZERO);
        assert_eq!(calls, 1);
        assert_eq!(clock.sleeps(), 0);
    }

    #[test]
    fn test_timeout_poll_bound() {
        let (result, calls, _) = wait(
            &[Absent],
            Duration::from_secs(10),
            Duration::from_millis(500),
        );
        assert_eq!(
            result,
            WaitResult::TimedOut {
                polls: 20,
                elapsed: Duration::from_secs(10),
            }
        );
        assert_eq!(calls, 20);

        // ceil(1000 / 300) = 4
        let (result, calls, _) = wait(
            &[Dfu],
            Duration::from_secs(1),
            Duration::from_millis(300),
        );
        assert!(!result.is_reached());
        assert_eq!(result.polls(), 4);
        assert_eq!(calls, 4);
    }

    #[test]
    fn test_zero_timeout() {
        let (result, calls, _) =
            wait(&[StagedBoot], Duration::ZERO, Duration::from_millis(500));
        assert_eq!(
            result,
            WaitResult::TimedOut {
                polls: 0,
                elapsed: Duration::ZERO,
            }
        );
        assert_eq!(calls, 0);
    }
}
