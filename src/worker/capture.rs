//! Frame capture policy.

use std::time::{Duration, Instant};

/// Controls when the worker puts frames on the result channel.
///
/// A frame is always captured after every command that changed the visible
/// scene. The heartbeat additionally re-captures at a fixed interval while a
/// point set is loaded, so a stalled controller still converges to the
/// current scene state.
#[derive(Clone, Debug)]
pub struct CapturePolicy {
    pub heartbeat: Option<Duration>,
}

impl Default for CapturePolicy {
    fn default() -> Self {
        CapturePolicy {
            heartbeat: Some(Duration::from_secs(1)),
        }
    }
}

impl CapturePolicy {
    /// Only capture after mutating commands, never on a timer.
    /// Makes the number of emitted frames deterministic.
    pub fn after_mutation_only() -> Self {
        CapturePolicy { heartbeat: None }
    }
}

/// Tracks the heartbeat deadline of a [CapturePolicy].
pub(crate) struct CaptureClock {
    policy: CapturePolicy,
    last_capture: Instant,
}

impl CaptureClock {
    pub fn new(policy: CapturePolicy) -> Self {
        CaptureClock {
            policy,
            last_capture: Instant::now(),
        }
    }

    /// How long the worker may block waiting for commands before the next
    /// heartbeat is due.
    pub fn idle_timeout(&self) -> Duration {
        match self.policy.heartbeat {
            Some(interval) => interval.saturating_sub(self.last_capture.elapsed()),
            None => Duration::from_millis(100),
        }
    }

    pub fn heartbeat_due(&self) -> bool {
        matches!(
            self.policy.heartbeat,
            Some(interval) if self.last_capture.elapsed() >= interval
        )
    }

    pub fn mark_captured(&mut self) {
        self.last_capture = Instant::now();
    }

    /// Pushes the deadline out by one interval without a capture. Must be
    /// called whenever a due heartbeat is not acted on, otherwise
    /// [Self::idle_timeout] stays at zero and the worker loop spins.
    pub fn skip_heartbeat(&mut self) {
        self.last_capture = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_heartbeat_is_never_due() {
        let clock = CaptureClock::new(CapturePolicy::after_mutation_only());
        assert!(!clock.heartbeat_due());
    }

    #[test]
    fn test_skipped_heartbeat_resets_the_deadline() {
        let mut clock = CaptureClock::new(CapturePolicy {
            heartbeat: Some(Duration::from_millis(10)),
        });
        std::thread::sleep(Duration::from_millis(20));
        assert!(clock.heartbeat_due());
        assert_eq!(clock.idle_timeout(), Duration::ZERO);
        clock.skip_heartbeat();
        // the next wait blocks for a full interval again
        assert!(!clock.heartbeat_due());
        assert!(clock.idle_timeout() > Duration::ZERO);
    }

    #[test]
    fn test_heartbeat_becomes_due() {
        let mut clock = CaptureClock::new(CapturePolicy {
            heartbeat: Some(Duration::ZERO),
        });
        assert!(clock.heartbeat_due());
        clock.mark_captured();
        assert!(clock.idle_timeout() <= Duration::ZERO + Duration::from_millis(1));
    }
}
