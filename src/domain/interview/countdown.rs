//! Per-question countdown value object

/// Countdown toward a per-question time limit.
/// Advanced exactly once per second of recording; expiry lands
/// exactly at the limit, never before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    limit_secs: u32,
    elapsed_secs: u32,
}

impl Countdown {
    /// Create a countdown for the given limit in seconds
    pub const fn new(limit_secs: u32) -> Self {
        Self {
            limit_secs,
            elapsed_secs: 0,
        }
    }

    /// Advance by one second. Returns true when this tick reached
    /// the limit. Ticks past the limit saturate and return false.
    pub fn tick(&mut self) -> bool {
        if self.elapsed_secs >= self.limit_secs {
            return false;
        }
        self.elapsed_secs += 1;
        self.elapsed_secs == self.limit_secs
    }

    /// Seconds elapsed so far
    pub const fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    /// Seconds remaining until the limit
    pub const fn remaining_secs(&self) -> u32 {
        self.limit_secs - self.elapsed_secs
    }

    /// The configured limit in seconds
    pub const fn limit_secs(&self) -> u32 {
        self.limit_secs
    }

    /// Whether the limit has been reached
    pub const fn expired(&self) -> bool {
        self.elapsed_secs >= self.limit_secs
    }
}
