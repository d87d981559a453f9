//! Clock port.
//!
//! Every lifecycle decision is a function of `now`. Jobs and handlers read it
//! from a `Clock` once per run so a whole sweep sees the same instant.

use crate::domain::foundation::Timestamp;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}
