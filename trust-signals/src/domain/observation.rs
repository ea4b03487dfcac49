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

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Health status of a validator at the time of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObservationStatus {
    Healthy,

    Delinquent,

    NotFound,

    Error,
}

impl fmt::Display for ObservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ObservationStatus::Healthy => write!(f, "healthy"),
            ObservationStatus::Delinquent => write!(f, "delinquent"),
            ObservationStatus::NotFound => write!(f, "not found"),
            ObservationStatus::Error => write!(f, "error"),
        }
    }
}

/// One point-in-time measurement of a validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    pub status: ObservationStatus,

    /// Commission in percent.
    pub commission: Option<u8>,

    /// Relative vote-credit performance in percent, see [uptime_proxy].
    pub uptime_proxy: Option<f64>,

    /// APY in percent as reported by Stakewiz.
    pub apy_source_a: Option<f64>,

    /// APY in percent as reported by Trillium.
    pub apy_source_b: Option<f64>,

    /// Number of distinct stake pools delegating to the validator.
    pub pool_count: Option<u32>,
}

impl Observation {
    /// An observation without any signals besides the status.
    pub fn bare(timestamp: DateTime<Utc>, status: ObservationStatus) -> Self {
        Self {
            timestamp,
            status,
            commission: None,
            uptime_proxy: None,
            apy_source_a: None,
            apy_source_b: None,
            pool_count: None,
        }
    }
}

/// A vote account as listed by the `getVoteAccounts` RPC method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteAccountInfo {
    pub vote_pubkey: String,

    #[serde(default)]
    pub node_pubkey: Option<String>,

    #[serde(default)]
    pub commission: Option<u8>,

    #[serde(default)]
    pub epoch_credits: Vec<EpochCredits>,

    #[serde(default)]
    pub activated_stake: Option<u64>,

    #[serde(default)]
    pub last_vote: Option<u64>,

    #[serde(default)]
    pub root_slot: Option<u64>,
}

/// Vote credits of one epoch: `[epoch, credits, previous_credits]`, credits being cumulative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochCredits(pub u64, pub u64, pub u64);

impl EpochCredits {
    pub fn epoch(&self) -> u64 {
        self.0
    }

    pub fn credits(&self) -> u64 {
        self.1
    }
}

/// Result of looking up a vote account via RPC.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteAccountLookup {
    pub info: VoteAccountInfo,
    pub delinquent: bool,
}

impl VoteAccountLookup {
    pub fn status(&self) -> ObservationStatus {
        if self.delinquent {
            ObservationStatus::Delinquent
        } else {
            ObservationStatus::Healthy
        }
    }
}

/// Vote-credit based "uptime" proxy in percent with two decimals.
///
/// Takes the credit deltas of the last `window` epochs and normalizes each by the largest one
/// (at least 1), so the result is relative to the validator's own recent best rather than to
/// an absolute expected maximum. Returns `None` without at least two epochs of credits or for
/// an empty window.
pub fn uptime_proxy(epoch_credits: &[EpochCredits], window: usize) -> Option<f64> {
    if window == 0 || epoch_credits.len() < 2 {
        return None;
    }

    let recent = &epoch_credits[epoch_credits.len().saturating_sub(window + 1)..];
    let deltas = recent
        .iter()
        .tuple_windows()
        .map(|(previous, current)| current.credits().saturating_sub(previous.credits()))
        .collect::<Vec<_>>();

    let max_delta = deltas.iter().copied().max().unwrap_or_default().max(1) as f64;
    let average = deltas
        .iter()
        .map(|&delta| delta as f64 / max_delta)
        .sum::<f64>()
        / deltas.len() as f64;

    Some((average * 10_000.0).round() / 100.0)
}
