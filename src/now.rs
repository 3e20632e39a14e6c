#[cfg(test)]
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Seconds added on top of the wall clock. Only tests move it, to expire
/// tokens without sleeping.
#[cfg(test)]
static SKEW: AtomicU64 = AtomicU64::new(0);

/// Unix timestamp in seconds, used for token issue and expiry times.
pub fn current_timestamp() -> u64 {
    let now = Utc::now().timestamp().max(0) as u64;
    #[cfg(test)]
    let now = now + SKEW.load(Ordering::SeqCst);
    now
}

#[cfg(test)]
pub fn advance_mock_time(seconds: u64) {
    SKEW.fetch_add(seconds, Ordering::SeqCst);
}
