//! Clock adapters.
//!
//! - `SystemClock` - wall-clock UTC
//! - `FixedClock` - settable time for tests and `--at` overrides

use std::sync::{PoisonError, RwLock};

use crate::domain::foundation::Timestamp;
use crate::ports::Clock;

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    at: RwLock<Timestamp>,
}

impl FixedClock {
    pub fn new(at: Timestamp) -> Self {
        Self { at: RwLock::new(at) }
    }

    pub fn set(&self, at: Timestamp) {
        *self.at.write().unwrap_or_else(PoisonError::into_inner) = at;
    }

    pub fn advance_days(&self, days: i64) {
        let mut at = self.at.write().unwrap_or_else(PoisonError::into_inner);
        *at = at.add_days(days);
    }

    pub fn advance_hours(&self, hours: i64) {
        let mut at = self.at.write().unwrap_or_else(PoisonError::into_inner);
        *at = at.add_hours(hours);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.at.read().unwrap_or_else(PoisonError::into_inner)
    }
}
