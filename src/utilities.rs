//! Internal utility functions.
//!
//! Timestamp/frame-number conversion and text helpers shared by the planner,
//! the prober, and the decoder.

/// Maximum number of characters of decoder output kept in an error.
pub(crate) const DIAGNOSTICS_LIMIT: usize = 2000;

/// Tolerance, in frames, for timestamps that sit on a frame boundary.
const FRAME_EPSILON: f64 = 1e-6;

/// Convert seconds to a frame number using the video's frame rate.
pub(crate) fn timestamp_to_frame_number(seconds: f64, frames_per_second: f64) -> u64 {
    (seconds * frames_per_second + FRAME_EPSILON).floor().max(0.0) as u64
}

/// Estimate the number of frames from duration and frame rate.
pub(crate) fn estimate_frame_count(duration_seconds: f64, frames_per_second: f64) -> u64 {
    if !(duration_seconds.is_finite() && frames_per_second.is_finite()) {
        return 0;
    }
    (duration_seconds * frames_per_second).round().max(0.0) as u64
}

/// Parse an ffprobe rational such as `30000/1001` or `25`.
///
/// A zero denominator (ffprobe prints `0/0` for unknown rates) yields `0.0`.
pub(crate) fn parse_rational(value: &str) -> Option<f64> {
    match value.split_once('/') {
        Some((numerator, denominator)) => {
            let numerator: f64 = numerator.trim().parse().ok()?;
            let denominator: f64 = denominator.trim().parse().ok()?;
            if denominator == 0.0 {
                Some(0.0)
            } else {
                Some(numerator / denominator)
            }
        }
        None => value.trim().parse().ok(),
    }
}

/// Number of decimal digits needed to print `value`.
pub(crate) fn decimal_width(value: usize) -> usize {
    value.max(1).ilog10() as usize + 1
}

/// Keep the last `limit` characters of decoder output.
///
/// Decoders print their fatal error last, so the tail is the useful part.
pub(crate) fn truncate_diagnostics(text: &str, limit: usize) -> String {
    let trimmed = text.trim();
    let count = trimmed.chars().count();
    if count <= limit {
        return trimmed.to_string();
    }
    let tail: String = trimmed.chars().skip(count - limit).collect();
    format!("...{tail}")
}
