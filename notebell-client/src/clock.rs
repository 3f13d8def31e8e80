//! Time source for reminder scans.

use chrono::Local;
use notebell_core::Timestamp;

pub trait Clock: Send + Sync {
    /// Current local wall-clock time.
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Local::now().naive_local()
    }
}
