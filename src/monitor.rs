//! Sustained-threshold monitor.
//!
//! A reusable debounce primitive shared by the field unit and the
//! control center: a single over-threshold sample never raises an
//! alert, only `duration` consecutive violations do.
//!
//! Fire policy: the monitor fires on the exact call where the counter
//! reaches `duration`, then stays silent while the condition persists.
//! It re-arms only after an under-threshold sample resets the counter.

/// Counts consecutive over-threshold observations and fires once the
/// configured duration is reached.
#[derive(Debug, Clone)]
pub struct SustainedThresholdMonitor {
    threshold: f64,
    /// Consecutive samples required before firing.
    duration: u32,
    /// Consecutive over-threshold samples seen so far.
    count: u32,
}

impl SustainedThresholdMonitor {
    pub fn new(threshold: f64, duration: u32) -> Self {
        debug_assert!(duration > 0, "a zero-duration monitor would never fire");
        Self {
            threshold,
            duration,
            count: 0,
        }
    }

    /// Feed one sample.  Returns `true` exactly when this sample is the
    /// `duration`-th consecutive one above the threshold.
    pub fn observe(&mut self, value: f64) -> bool {
        if value > self.threshold {
            self.count = self.count.saturating_add(1);
            self.count == self.duration
        } else {
            self.count = 0;
            false
        }
    }

    /// Consecutive over-threshold samples accumulated so far.
    pub fn count(&self) -> u32 {
        self.count
    }
}
