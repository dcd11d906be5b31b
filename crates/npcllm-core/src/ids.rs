//! Response identifiers.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Prefix of every response identifier.
pub const RESPONSE_ID_PREFIX: &str = "local-";

/// Issues `local-<unix millis>` identifiers that strictly increase within a
/// process, even when several requests complete in the same millisecond.
#[derive(Debug, Default)]
pub struct ResponseIdGenerator {
    last: AtomicI64,
}

impl ResponseIdGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    /// Issue the next identifier.
    pub fn next_id(&self) -> String {
        format!("{RESPONSE_ID_PREFIX}{}", self.next_millis())
    }

    /// Issue the next timestamp: the current time, or one past the last
    /// issued value if the clock has not moved beyond it.
    pub fn next_millis(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(actual) => prev = actual,
            }
        }
    }
}
