//! Time source for transaction timestamps

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Supplies Unix seconds for new transactions
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Manually driven clock for deterministic tests and replays
#[derive(Debug, Default)]
pub struct FixedClock {
    seconds: AtomicI64,
}

impl FixedClock {
    pub fn new(seconds: i64) -> Self {
        Self {
            seconds: AtomicI64::new(seconds),
        }
    }

    pub fn set(&self, seconds: i64) {
        self.seconds.store(seconds, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.seconds.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.seconds.load(Ordering::SeqCst)
    }
}
