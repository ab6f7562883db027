use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Source of "now" for everything that stamps timestamps or resolves
/// relative dates. Injected instead of reading ambient global time so the
/// import lifecycle and baseline resolution are deterministic under test.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used by the running service
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed clock for tests
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

/// Shared clock handle
pub type SharedClock = Arc<dyn Clock>;
