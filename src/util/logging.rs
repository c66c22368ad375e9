//! # Throttled Logging Utilities
//!
//! A noisy serial line can produce a corrupted teleinfo line every few hundred
//! milliseconds. These helpers keep such diagnostics readable: a windowed rate
//! limiter and a bounded hex dump of the offending bytes.
//!
//! ## Usage
//!
//! ```rust
//! use teleinfo_rs::util::logging::{LogThrottle, log_line_hex};
//!
//! let mut throttle = LogThrottle::new(10_000, 5); // 5 messages per 10 s
//! if throttle.allow() {
//!     log_line_hex("Discarded line", b"IINST 003 X");
//! }
//! ```

use std::time::Instant;

/// Throttling structure for rate-limiting log messages
#[derive(Debug)]
pub struct LogThrottle {
    /// Time window for throttling (in milliseconds)
    window_ms: u64,
    /// Maximum messages allowed per window
    cap: u32,
    /// Current message count in window
    count: u32,
    /// Messages refused since the last window reset
    suppressed: u32,
    /// Start time of current window
    t0: Instant,
}

impl LogThrottle {
    /// Create new throttle with time window and message cap
    ///
    /// # Arguments
    /// * `window_ms` - Time window in milliseconds
    /// * `cap` - Maximum messages allowed per window
    pub fn new(window_ms: u64, cap: u32) -> Self {
        Self {
            window_ms,
            cap,
            count: 0,
            suppressed: 0,
            t0: Instant::now(),
        }
    }

    /// Check if logging is allowed (resets counter after window expires)
    ///
    /// Returns `true` if the message should be logged, `false` if it
    /// should be throttled.
    pub fn allow(&mut self) -> bool {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(self.t0).as_millis() as u64;

        if elapsed_ms > self.window_ms {
            if self.suppressed > 0 {
                log::debug!("{} log messages suppressed", self.suppressed);
            }
            self.t0 = now;
            self.count = 0;
            self.suppressed = 0;
        }

        self.count += 1;
        if self.count <= self.cap {
            true
        } else {
            self.suppressed += 1;
            false
        }
    }

    /// Get current throttle statistics
    pub fn stats(&self) -> ThrottleStats {
        ThrottleStats {
            window_ms: self.window_ms,
            cap: self.cap,
            count: self.count,
            suppressed: self.suppressed,
            window_remaining_ms: self
                .window_ms
                .saturating_sub(self.t0.elapsed().as_millis() as u64),
        }
    }

    /// Reset the throttle (start new window immediately)
    pub fn reset(&mut self) {
        self.t0 = Instant::now();
        self.count = 0;
        self.suppressed = 0;
    }
}

/// Statistics about a log throttle instance
#[derive(Debug, Clone, Copy)]
pub struct ThrottleStats {
    pub window_ms: u64,
    pub cap: u32,
    pub count: u32,
    pub suppressed: u32,
    pub window_remaining_ms: u64,
}

/// Log line data in hex format for debugging
///
/// Teleinfo lines are short, but a desynchronized stream can accumulate
/// long garbage words, so the dump is capped.
pub fn log_line_hex(prefix: &str, data: &[u8]) {
    const MAX_LOG_BYTES: usize = 64;

    let display_data = &data[..data.len().min(MAX_LOG_BYTES)];
    let hex_str = crate::util::hex::format_hex_compact(display_data);
    let suffix = if data.len() > MAX_LOG_BYTES {
        format!(" ... ({} bytes total)", data.len())
    } else {
        String::new()
    };

    log::debug!(
        target: "teleinfo::frame",
        "{prefix}: {hex_str} [{}]{suffix}",
        crate::util::hex::escape_ascii(display_data)
    );
}

/// Log a warning with throttling
#[macro_export]
macro_rules! log_warn_throttled {
    ($throttle:expr, $($arg:tt)*) => {
        if $throttle.allow() {
            log::warn!($($arg)*);
        }
    };
}
