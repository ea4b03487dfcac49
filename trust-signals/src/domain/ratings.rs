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

use crate::domain::VoteAccount;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Outcome of fetching from one external source. Serializes as the record, `null` if not
/// found, or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome<T> {
    Found(T),
    NotFound,
    Failed(String),
}

impl<T> SourceOutcome<T> {
    pub fn found(&self) -> Option<&T> {
        match self {
            SourceOutcome::Found(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> Serialize for SourceOutcome<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            error: &'a str,
        }

        match self {
            SourceOutcome::Found(value) => value.serialize(serializer),
            SourceOutcome::NotFound => serializer.serialize_none(),
            SourceOutcome::Failed(error) => ErrorBody { error }.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakewizRecord {
    pub rank: Option<f64>,
    pub is_jito: bool,
    pub apy_estimate: Option<f64>,
    pub staking_apy: Option<f64>,
    pub jito_apy: Option<f64>,
    pub total_apy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrilliumRecord {
    pub average_delegator_total_apy: Option<f64>,
    pub total_overall_apy: Option<f64>,
    pub average_delegator_inflation_apy: Option<f64>,
    pub average_delegator_mev_apy: Option<f64>,
    pub average_total_inflation_apy: Option<f64>,
    pub average_total_mev_apy: Option<f64>,
    pub total_from_stake_pools: Option<f64>,
    pub total_not_from_stake_pools: Option<f64>,
    pub identity_pubkey: Option<String>,
    pub vote_account_pubkey: Option<String>,
}

impl TrilliumRecord {
    /// Total APY for delegators, falling back to the overall APY.
    pub fn apy(&self) -> Option<f64> {
        self.average_delegator_total_apy.or(self.total_overall_apy)
    }
}

/// Trillium record together with the stake pools delegating to the validator.
#[derive(Debug, Clone, PartialEq)]
pub struct TrilliumRating {
    pub record: TrilliumRecord,

    /// `None` if Trillium does not list stake pools for the validator.
    pub stake_pools: Option<Vec<StakePool>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakePool {
    pub name: String,

    /// Delegated stake in SOL.
    pub sol: f64,
}

/// Aggregated APY figures and stake-pool presence of a validator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ratings {
    pub vote: VoteAccount,
    pub sources: RatingSources,
    pub pools: Pools,
    pub derived: Derived,
    pub meta: Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSources {
    pub stakewiz: SourceOutcome<StakewizRecord>,
    pub trillium: SourceOutcome<TrilliumRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Pools {
    pub total_from_stake_pools: Option<f64>,
    pub total_not_from_stake_pools: Option<f64>,
    pub stake_pools: Option<Vec<StakePool>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Derived {
    pub apy_values: Vec<f64>,
    pub apy_median: Option<f64>,
    pub apy_min: Option<f64>,
    pub apy_max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meta {
    pub updated_at: DateTime<Utc>,
}

impl Ratings {
    /// Merge the settled outcomes of all rating sources.
    pub fn aggregate(
        vote: VoteAccount,
        stakewiz: SourceOutcome<StakewizRecord>,
        trillium: SourceOutcome<TrilliumRating>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let stakewiz_apy = stakewiz.found().and_then(|record| record.total_apy);

        let (trillium, pools) = match trillium {
            SourceOutcome::Found(TrilliumRating {
                record,
                stake_pools,
            }) => {
                let pools = Pools {
                    total_from_stake_pools: record.total_from_stake_pools,
                    total_not_from_stake_pools: record.total_not_from_stake_pools,
                    stake_pools,
                };
                (SourceOutcome::Found(record), pools)
            }
            SourceOutcome::NotFound => (SourceOutcome::NotFound, Pools::default()),
            SourceOutcome::Failed(error) => (SourceOutcome::Failed(error), Pools::default()),
        };
        let trillium_apy = trillium.found().and_then(TrilliumRecord::apy);

        let apy_values = [stakewiz_apy, trillium_apy]
            .into_iter()
            .flatten()
            .filter(|apy| apy.is_finite())
            .collect::<Vec<_>>();
        let derived = Derived {
            apy_median: median(&apy_values),
            apy_min: apy_values.iter().copied().reduce(f64::min),
            apy_max: apy_values.iter().copied().reduce(f64::max),
            apy_values,
        };

        Self {
            vote,
            sources: RatingSources { stakewiz, trillium },
            pools,
            derived,
            meta: Meta { updated_at },
        }
    }

    pub fn stakewiz_apy(&self) -> Option<f64> {
        self.sources
            .stakewiz
            .found()
            .and_then(|record| record.total_apy)
    }

    pub fn trillium_apy(&self) -> Option<f64> {
        self.sources.trillium.found().and_then(TrilliumRecord::apy)
    }

    /// Number of stake pools delegating to the validator, if known.
    pub fn pool_count(&self) -> Option<u32> {
        self.pools
            .stake_pools
            .as_ref()
            .map(|stake_pools| stake_pools.len() as u32)
    }
}

/// Median of the finite values; the mean of the two middle values for an even count, `None`
/// for no values.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut values = values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .collect::<Vec<_>>();
    if values.is_empty() {
        return None;
    }

    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}
