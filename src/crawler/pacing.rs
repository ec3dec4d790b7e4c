//! Randomized pauses and pointer offsets
//!
//! Pacing is purely cooperative: the worker sleeps for a random interval
//! between actions. Nothing enforces a global rate.

use crate::config::seconds;
use rand::Rng;
use std::time::Duration;

/// Draws a random duration in `[min_secs, max_secs]`
///
/// Bounds are clamped like configured seconds, so negative, NaN or huge
/// values never panic. Inverted bounds collapse to the lower bound.
pub fn jitter(min_secs: f64, max_secs: f64) -> Duration {
    let low = seconds(min_secs);
    let high = seconds(max_secs);
    if high <= low {
        return low;
    }
    rand::thread_rng().gen_range(low..=high)
}

/// Sleeps for a random interval in `[min_secs, max_secs]`
pub async fn pause(min_secs: f64, max_secs: f64) {
    let delay = jitter(min_secs, max_secs);
    if delay.is_zero() {
        return;
    }
    tracing::trace!("Pausing for {:.2}s", delay.as_secs_f64());
    tokio::time::sleep(delay).await;
}

/// Random pointer offset with both axes drawn from `[low, high]`
pub fn pointer_offset(low: i32, high: i32) -> (i32, i32) {
    let mut rng = rand::thread_rng();
    if high <= low {
        return (low, low);
    }
    (rng.gen_range(low..=high), rng.gen_range(low..=high))
}
