//! Economic activity index shown on the alerts page.

use crate::types::ActivityPoint;
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const TREND_WINDOW: usize = 5;

const START_VALUE: f64 = 50.0;
const FLOOR: f64 = 20.0;
const MAX_STEP: f64 = 2.5;

/// Longest series produced; larger requests are clamped to it.
pub const MAX_SERIES_DAYS: usize = 3650;

/// Trailing simple moving average. Entry `i` is the mean of the `window`
/// values ending at `i`, or `None` while fewer than `window` values exist.
pub fn simple_moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, value) in values.iter().enumerate() {
        sum += value;
        if i >= window {
            sum -= values[i - window];
        }
        out.push(if i + 1 >= window {
            Some(sum / window as f64)
        } else {
            None
        });
    }
    out
}

/// One point per day for `days` days ending at `end_date`.
///
/// The underlying walk starts at 50 and moves by a uniform step in
/// [-2.5, 2.5) per day; reported values never go below 20. The same seed
/// always yields the same series. `days` is capped at [`MAX_SERIES_DAYS`].
pub fn simulated_activity_series(
    days: usize,
    seed: u64,
    end_date: NaiveDate,
) -> Vec<ActivityPoint> {
    let days = days.min(MAX_SERIES_DAYS);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut walk = START_VALUE;

    let values: Vec<f64> = (0..days)
        .map(|_| {
            walk += rng.gen_range(-MAX_STEP..MAX_STEP);
            walk.max(FLOOR)
        })
        .collect();
    let trend = simple_moving_average(&values, TREND_WINDOW);

    values
        .into_iter()
        .zip(trend)
        .enumerate()
        .map(|(i, (value, trend))| ActivityPoint {
            date: end_date - Duration::days((days - 1 - i) as i64),
            value,
            trend,
        })
        .collect()
}
