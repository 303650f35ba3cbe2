//! Time utilities for sshpool
//!
//! Channel uptime is measured on the monotonic clock; creation timestamps
//! reported to callers use the wall clock.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Get the current Unix timestamp in seconds.
///
/// Returns 0 if the system time is before the Unix epoch.
pub fn current_time_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Whole seconds elapsed since a monotonic instant.
pub fn elapsed_secs(since: Instant) -> u64 {
    since.elapsed().as_secs()
}

/// Format a second count in human-readable form
///
/// # Examples
/// ```
/// use sshpool_core::time::format_uptime;
///
/// assert_eq!(format_uptime(59), "59s");
/// assert_eq!(format_uptime(3725), "1h 2m");
/// ```
pub fn format_uptime(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}
