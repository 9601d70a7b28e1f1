//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Milliseconds elapsed on a monotonic clock since `origin`
///
/// Frame times handed to the auto-scroll controller use this.
pub fn millis_since(origin: std::time::Instant) -> f64 {
    origin.elapsed().as_secs_f64() * 1000.0
}
