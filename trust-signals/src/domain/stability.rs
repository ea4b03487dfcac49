// This file is part of validator-transparency.
// Copyright (C) 2025 Validator Transparency Contributors
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// You may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Explainable 0-100 stability score of a validator, blending the live observation with the
//! locally tracked history.

use crate::domain::{History, Observation, ObservationStatus};
use itertools::Itertools;
use serde::Serialize;

const LIVE_DELINQUENT_PENALTY: f64 = 40.0;
const DELINQUENT_RATE_WEIGHT: f64 = 40.0;

const COMMISSION_CHANGE_PENALTY: f64 = 5.0;
const MAX_COMMISSION_PENALTY: f64 = 20.0;

const UPTIME_TARGET: f64 = 95.0;
const UPTIME_WATCH: f64 = 90.0;
const UPTIME_PENALTY_FACTOR: f64 = 1.5;
const MAX_UPTIME_PENALTY: f64 = 20.0;

const APY_TOLERANCE: f64 = 1.0;
const APY_PENALTY_FACTOR: f64 = 5.0;
const MAX_APY_PENALTY: f64 = 15.0;
const APY_ALIGNED: f64 = 0.75;
const APY_CLOSE: f64 = 1.5;

const NO_POOL_PENALTY: f64 = 10.0;

/// Categorical rating derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StabilityLabel {
    Strong,
    Good,
    Watch,
    Risk,
}

impl StabilityLabel {
    pub fn from_score(score: u8) -> Self {
        match score {
            85.. => Self::Strong,
            70.. => Self::Good,
            50.. => Self::Watch,
            _ => Self::Risk,
        }
    }
}

/// One signal explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pill {
    pub ok: bool,
    pub text: String,
}

impl Pill {
    fn new(ok: bool, text: impl Into<String>) -> Self {
        Self {
            ok,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StabilityResult {
    pub score: u8,
    pub label: StabilityLabel,
    pub tracking: String,

    /// In order: delinquency, commission, APY agreement, voting, stake pools.
    pub pills: Vec<Pill>,
}

/// Evaluate the stability of a validator. Pure and infallible: missing or non-finite inputs
/// skip their penalty and produce an "unavailable" pill.
pub fn evaluate(live: &Observation, history: &History, pool_count: Option<u32>) -> StabilityResult {
    let n = history.len();
    let delinquent_count = history
        .iter()
        .filter(|snapshot| snapshot.status != ObservationStatus::Healthy)
        .count();
    let delinquent_rate = if n == 0 {
        0.0
    } else {
        delinquent_count as f64 / n as f64
    };
    let commission_changes = commission_changes(history);
    let uptime = finite(live.uptime_proxy);
    let apy_diff = finite(live.apy_source_a)
        .zip(finite(live.apy_source_b))
        .map(|(a, b)| (a - b).abs());

    let mut score = 100.0;
    if live.status == ObservationStatus::Delinquent {
        score -= LIVE_DELINQUENT_PENALTY;
    }
    score -= delinquent_rate * DELINQUENT_RATE_WEIGHT;
    score -= capped(
        commission_changes as f64 * COMMISSION_CHANGE_PENALTY,
        MAX_COMMISSION_PENALTY,
    );
    if let Some(uptime) = uptime.filter(|&uptime| uptime < UPTIME_TARGET) {
        score -= capped(
            (UPTIME_TARGET - uptime) * UPTIME_PENALTY_FACTOR,
            MAX_UPTIME_PENALTY,
        );
    }
    if let Some(apy_diff) = apy_diff.filter(|&apy_diff| apy_diff > APY_TOLERANCE) {
        score -= capped(
            (apy_diff - APY_TOLERANCE) * APY_PENALTY_FACTOR,
            MAX_APY_PENALTY,
        );
    }
    if pool_count.unwrap_or_default() == 0 {
        score -= NO_POOL_PENALTY;
    }

    let score = score.clamp(0.0, 100.0).round() as u8;

    let pills = vec![
        delinquency_pill(live.status, n, delinquent_count),
        commission_pill(n, commission_changes),
        apy_pill(apy_diff),
        voting_pill(uptime),
        pool_pill(pool_count),
    ];

    StabilityResult {
        score,
        label: StabilityLabel::from_score(score),
        tracking: tracking(history),
        pills,
    }
}

/// Number of adjacent snapshot pairs with both commissions defined and different.
pub fn commission_changes(history: &History) -> usize {
    history
        .iter()
        .tuple_windows()
        .filter(|(previous, current)| {
            matches!(
                (previous.commission, current.commission),
                (Some(previous), Some(current)) if previous != current
            )
        })
        .count()
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|value| value.is_finite())
}

fn capped(penalty: f64, max: f64) -> f64 {
    penalty.clamp(0.0, max)
}

fn tracking(history: &History) -> String {
    match (history.first(), history.last()) {
        (Some(oldest), Some(newest)) if history.len() >= 2 => {
            let elapsed = newest.timestamp - oldest.timestamp;
            let duration = match elapsed.num_days() {
                0 => plural(elapsed.num_hours().max(0) as usize, "hour"),
                days => plural(days.max(0) as usize, "day"),
            };

            format!(
                "Tracked for {duration} ({} stored)",
                plural(history.len(), "snapshot")
            )
        }

        _ => "Fresh: tracking starts with this visit".to_owned(),
    }
}

fn delinquency_pill(status: ObservationStatus, n: usize, delinquent_count: usize) -> Pill {
    if n >= 2 {
        if delinquent_count == 0 {
            Pill::new(true, format!("No delinquency across {n} snapshots"))
        } else {
            Pill::new(
                false,
                format!("Unhealthy in {delinquent_count} of {n} snapshots"),
            )
        }
    } else if status == ObservationStatus::Healthy {
        Pill::new(true, "Currently healthy")
    } else {
        Pill::new(false, format!("Currently {status}"))
    }
}

fn commission_pill(n: usize, commission_changes: usize) -> Pill {
    if n < 2 {
        Pill::new(false, "Commission history: insufficient data yet")
    } else if commission_changes == 0 {
        Pill::new(true, format!("Commission stable across {n} snapshots"))
    } else {
        Pill::new(
            false,
            format!("Commission changed {}", plural(commission_changes, "time")),
        )
    }
}

fn apy_pill(apy_diff: Option<f64>) -> Pill {
    match apy_diff {
        Some(apy_diff) if apy_diff <= APY_ALIGNED => Pill::new(
            true,
            format!("APY sources aligned ({apy_diff:.2} pp apart)"),
        ),
        Some(apy_diff) if apy_diff <= APY_CLOSE => {
            Pill::new(true, format!("APY sources close ({apy_diff:.2} pp apart)"))
        }
        Some(apy_diff) => Pill::new(
            false,
            format!("APY source disagreement ({apy_diff:.2} pp apart)"),
        ),
        None => Pill::new(false, "APY comparison unavailable"),
    }
}

fn voting_pill(uptime: Option<f64>) -> Pill {
    match uptime {
        Some(uptime) if uptime >= UPTIME_TARGET => {
            Pill::new(true, format!("Consistent voting ({uptime:.2}%)"))
        }
        Some(uptime) if uptime >= UPTIME_WATCH => {
            Pill::new(false, format!("Minor voting gaps ({uptime:.2}%)"))
        }
        Some(uptime) => Pill::new(false, format!("Inconsistent voting ({uptime:.2}%)")),
        None => Pill::new(false, "Voting data unavailable"),
    }
}

fn pool_pill(pool_count: Option<u32>) -> Pill {
    match pool_count {
        Some(pool_count) if pool_count > 0 => Pill::new(
            true,
            format!("Delegated by {}", plural(pool_count as usize, "stake pool")),
        ),
        _ => Pill::new(false, "No stake pool presence"),
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
