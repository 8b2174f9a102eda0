//! Change-of-value edge detection.
//!
//! A tracker remembers the last value that was reported and raises a
//! `changed` flag when the live value moves away from it. The flag is only
//! cleared by whoever sends the COV notification.

/// Prior value plus the pending-notification flag of one object.
#[derive(Debug, Clone, PartialEq)]
pub struct CovTracker<T> {
    prior: T,
    changed: bool,
}

impl<T: Clone + PartialEq> CovTracker<T> {
    pub fn new(initial: T) -> Self {
        Self {
            prior: initial,
            changed: false,
        }
    }

    /// Equality detection for binary and multi-state values.
    pub fn detect(&mut self, value: &T) -> bool {
        if *value == self.prior {
            return false;
        }
        self.prior = value.clone();
        self.changed = true;
        true
    }

    /// Records a status-flag change, which bypasses any deadband.
    pub fn mark(&mut self) {
        self.changed = true;
    }

    pub fn prior(&self) -> &T {
        &self.prior
    }

    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn clear(&mut self) {
        self.changed = false;
    }
}

impl CovTracker<f32> {
    /// Deadband detection: changes smaller than `increment` are absorbed
    /// without touching the prior value.
    pub fn detect_with_increment(&mut self, value: f32, increment: f32) -> bool {
        if (value - self.prior).abs() < increment {
            return false;
        }
        if value == self.prior {
            return false;
        }
        self.prior = value;
        self.changed = true;
        true
    }
}
