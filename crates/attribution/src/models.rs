//! Attribution model library — six pure functions mapping an ordered
//! touchpoint list to a credit-percentage distribution over touchpoint ids.
//!
//! Every function expects touchpoints sorted ascending by timestamp and
//! returns a map covering every touchpoint. Credits sum to 100 for any
//! non-empty input; an empty input yields an empty map.

use std::collections::HashMap;

use dealtrace_core::types::Touchpoint;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Credit percentages (0-100) keyed by touchpoint id.
pub type CreditMap = HashMap<Uuid, f64>;

/// Allowed deviation from 100 when summing a distribution (floating
/// rounding across divisions).
pub const SUM_TOLERANCE: f64 = 0.01;

/// Fallback half-life when the configured value is unusable.
const DEFAULT_HALF_LIFE_DAYS: f64 = 7.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// The six supported attribution models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModelKind {
    FirstTouch,
    LastTouch,
    Linear,
    TimeDecay,
    UShaped,
    WShaped,
}

impl ModelKind {
    /// Models carried in summary rollup rows. First/last-touch are
    /// detail-mode only.
    pub const SUMMARY_MODELS: [ModelKind; 4] = [
        ModelKind::Linear,
        ModelKind::TimeDecay,
        ModelKind::UShaped,
        ModelKind::WShaped,
    ];

    pub fn is_aggregatable(self) -> bool {
        Self::SUMMARY_MODELS.contains(&self)
    }
}

/// 100% to the earliest touchpoint.
pub fn first_touch(touchpoints: &[Touchpoint]) -> CreditMap {
    if touchpoints.is_empty() {
        return CreditMap::new();
    }
    winner_takes_all(touchpoints, 0)
}

/// 100% to the most recent touchpoint.
pub fn last_touch(touchpoints: &[Touchpoint]) -> CreditMap {
    if touchpoints.is_empty() {
        return CreditMap::new();
    }
    winner_takes_all(touchpoints, touchpoints.len() - 1)
}

/// Equal credit to every touchpoint. The floating remainder of `100/n` is
/// folded into the last touchpoint so the total is exactly 100.
pub fn linear(touchpoints: &[Touchpoint]) -> CreditMap {
    let n = touchpoints.len();
    if n == 0 {
        return CreditMap::new();
    }
    let share = 100.0 / n as f64;
    let mut credits: CreditMap = touchpoints.iter().map(|t| (t.id, share)).collect();
    credits.insert(touchpoints[n - 1].id, 100.0 - share * (n as f64 - 1.0));
    credits
}

/// Credit grows geometrically with recency: weight halves for every
/// `half_life_days` of age relative to the most recent touchpoint, then
/// weights are normalized onto the 100-point budget.
pub fn time_decay(touchpoints: &[Touchpoint], half_life_days: f64) -> CreditMap {
    let n = touchpoints.len();
    if n == 0 {
        return CreditMap::new();
    }
    if n == 1 {
        return winner_takes_all(touchpoints, 0);
    }

    let half_life = if half_life_days.is_finite() && half_life_days > 0.0 {
        half_life_days
    } else {
        DEFAULT_HALF_LIFE_DAYS
    };

    let most_recent = touchpoints[n - 1].timestamp;
    let weights: Vec<f64> = touchpoints
        .iter()
        .map(|t| {
            let age_days = (most_recent - t.timestamp).num_seconds() as f64 / SECONDS_PER_DAY;
            2f64.powf(-age_days / half_life)
        })
        .collect();
    let total: f64 = weights.iter().sum();

    touchpoints
        .iter()
        .zip(weights)
        .map(|(t, w)| (t.id, 100.0 * w / total))
        .collect()
}

/// Position-based: 40% to the first and last touchpoints, the remaining 20%
/// split equally across the middle. Two touchpoints split 50/50.
pub fn u_shaped(touchpoints: &[Touchpoint]) -> CreditMap {
    let n = touchpoints.len();
    match n {
        0 => CreditMap::new(),
        1 => winner_takes_all(touchpoints, 0),
        2 => touchpoints.iter().map(|t| (t.id, 50.0)).collect(),
        _ => {
            let middle_share = 20.0 / (n - 2) as f64;
            touchpoints
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    let credit = if i == 0 || i == n - 1 { 40.0 } else { middle_share };
                    (t.id, credit)
                })
                .collect()
        }
    }
}

/// Three key positions (first, the milestone nearest the midpoint index,
/// last) take 30% each; the remaining 10% is split across everything else.
/// With exactly three touchpoints there is nothing else, and the 10 folds
/// back into the keys equally.
pub fn w_shaped(touchpoints: &[Touchpoint]) -> CreditMap {
    let n = touchpoints.len();
    match n {
        0 => CreditMap::new(),
        1 => winner_takes_all(touchpoints, 0),
        2 => touchpoints.iter().map(|t| (t.id, 50.0)).collect(),
        _ => {
            let milestone = (n - 1) / 2;
            let others = n - 3;
            let key_share = if others == 0 { 100.0 / 3.0 } else { 30.0 };
            let other_share = if others == 0 { 0.0 } else { 10.0 / others as f64 };
            touchpoints
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    let credit = if i == 0 || i == milestone || i == n - 1 {
                        key_share
                    } else {
                        other_share
                    };
                    (t.id, credit)
                })
                .collect()
        }
    }
}

/// Run one model by kind.
pub fn run_model(kind: ModelKind, touchpoints: &[Touchpoint], half_life_days: f64) -> CreditMap {
    match kind {
        ModelKind::FirstTouch => first_touch(touchpoints),
        ModelKind::LastTouch => last_touch(touchpoints),
        ModelKind::Linear => linear(touchpoints),
        ModelKind::TimeDecay => time_decay(touchpoints, half_life_days),
        ModelKind::UShaped => u_shaped(touchpoints),
        ModelKind::WShaped => w_shaped(touchpoints),
    }
}

/// Sum of every credit in a distribution.
pub fn distribution_total(credits: &CreditMap) -> f64 {
    credits.values().sum()
}

/// The sum-to-100 invariant: non-empty distributions total 100 within
/// `SUM_TOLERANCE`; empty ones are vacuously fine.
pub fn sums_to_100(credits: &CreditMap) -> bool {
    credits.is_empty() || (distribution_total(credits) - 100.0).abs() <= SUM_TOLERANCE
}

/// Scale a violating distribution back onto the 100-point budget. A
/// violation indicates a model-library bug; callers log it and recover
/// rather than failing the request.
pub fn renormalize(credits: &mut CreditMap) {
    let total = distribution_total(credits);
    if total > 0.0 {
        let scale = 100.0 / total;
        for credit in credits.values_mut() {
            *credit *= scale;
        }
    }
}

fn winner_takes_all(touchpoints: &[Touchpoint], winner: usize) -> CreditMap {
    touchpoints
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id, if i == winner { 100.0 } else { 0.0 }))
        .collect()
}
