//! Bound shared by every `wait_*` primitive.

use std::time::Duration;

/// Longest an SDK waiter may run before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub max_wait: Duration,
}

impl Default for WaitPolicy {
    /// 40 attempts at the waiters' 15s base delay.
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(15 * 40),
        }
    }
}

impl WaitPolicy {
    pub fn new(max_wait: Duration) -> Self {
        Self { max_wait }
    }
}
