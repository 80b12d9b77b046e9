//! Human-readable playback position formatting
//!
//! Positions and durations are carried as milliseconds; listeners see
//! `M:SS` below an hour and `H:MM:SS` above it.

/// Format a millisecond position as `M:SS` or `H:MM:SS`
///
/// Negative values (unknown duration sentinel) render as `--:--`.
///
/// # Examples
///
/// ```
/// use castaway_common::human_time::format_position_ms;
///
/// assert_eq!(format_position_ms(0), "0:00");
/// assert_eq!(format_position_ms(4_200), "0:04");
/// assert_eq!(format_position_ms(125_000), "2:05");
/// assert_eq!(format_position_ms(3_661_000), "1:01:01");
/// assert_eq!(format_position_ms(-1), "--:--");
/// ```
pub fn format_position_ms(ms: i64) -> String {
    if ms < 0 {
        return "--:--".to_string();
    }

    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

/// Listening progress as a percentage in `[0, 100]`
///
/// Returns 0 when the duration is not positive.
pub fn progress_percent(position_ms: i64, duration_ms: i64) -> f64 {
    if duration_ms <= 0 {
        return 0.0;
    }
    let pct = position_ms as f64 * 100.0 / duration_ms as f64;
    pct.clamp(0.0, 100.0)
}
