use std::fmt::Write;

/// Shown in place of a clock while the duration is unknown.
pub const UNKNOWN_CLOCK: &str = "--:--";

/// Formats a playback position as `m:ss`, e.g. `3:07` or `61:40`.
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() {
        seconds.max(0.0).floor() as u64
    } else {
        0
    };

    let mut out = String::with_capacity(5);
    let _ = write!(&mut out, "{}:{:02}", total / 60, total % 60);
    out
}

/// Formats elapsed and total time joined by `separator`, falling back to
/// placeholders until a duration is known.
pub fn format_time_range(position: f64, duration: f64, separator: &str) -> String {
    if duration > 0.1 {
        format!(
            "{}{separator}{}",
            format_clock(position),
            format_clock(duration)
        )
    } else {
        format!("{UNKNOWN_CLOCK}{separator}{UNKNOWN_CLOCK}")
    }
}
