//! Pairwise overlap scoring between an upstream task and its dependent.

use crate::core::task::Task;

/// Upstream progress below which overlapping is never considered.
pub const OVERLAP_PROGRESS_THRESHOLD: f64 = 0.7;

const GAIN_WEIGHT: f64 = 5.0;
const SWITCH_WEIGHT: f64 = 1.0;

/// How worthwhile it is to start `downstream` before `upstream` finishes.
///
/// `(remaining upstream time × upstream stability × 5) − downstream switch cost`.
/// A positive score means the time gained outweighs the context switch.
/// Returns `None` while the upstream task is below 70% progress.
pub fn overlap_score(upstream: &Task, downstream: &Task) -> Option<f64> {
    if upstream.progress < OVERLAP_PROGRESS_THRESHOLD {
        return None;
    }

    let time_gain = upstream.expected_duration * (1.0 - upstream.progress);
    let stability = 1.0 - upstream.volatility;
    Some(time_gain * stability * GAIN_WEIGHT - f64::from(downstream.switch_cost) * SWITCH_WEIGHT)
}
