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

use crate::{
    domain::{Aliases, StakePool, TrilliumRating, TrilliumRecord, VoteAccount, to_number},
    infra::sources::{HttpSources, SourceError},
};
use serde_json::Value;

impl HttpSources {
    pub(super) async fn get_trillium(
        &self,
        vote: &VoteAccount,
    ) -> Result<Option<TrilliumRating>, SourceError> {
        let url = self.config.trillium_url.as_str();
        let rows = self.json::<Value>(self.client.get(url), url).await?;

        let Value::Array(rows) = rows else {
            return Err(SourceError::UnexpectedResponse(
                url.to_owned(),
                "expected an array of validators".to_owned(),
            ));
        };

        Ok(trillium_rating(&rows, vote, &self.config.aliases))
    }
}

fn trillium_rating(
    rows: &[Value],
    vote: &VoteAccount,
    aliases: &Aliases,
) -> Option<TrilliumRating> {
    let row = rows.iter().find(|row| {
        aliases
            .trillium_vote_account
            .string(row)
            .is_some_and(|key| key == **vote)
    })?;

    let number = |name: &str| row.get(name).and_then(to_number);

    let record = TrilliumRecord {
        average_delegator_total_apy: aliases.trillium_delegator_total_apy.number(row),
        total_overall_apy: aliases.trillium_overall_total_apy.number(row),
        average_delegator_inflation_apy: number("average_delegator_inflation_apy"),
        average_delegator_mev_apy: number("average_delegator_mev_apy"),
        average_total_inflation_apy: number("average_total_inflation_apy"),
        average_total_mev_apy: number("average_total_mev_apy"),
        total_from_stake_pools: number("total_from_stake_pools"),
        total_not_from_stake_pools: number("total_not_from_stake_pools"),
        identity_pubkey: aliases.trillium_identity.string(row),
        vote_account_pubkey: aliases.trillium_vote_account.string(row),
    };

    Some(TrilliumRating {
        record,
        stake_pools: row.get("stake_pools").and_then(stake_pools),
    })
}

/// Convert the `{"<pool>": <sol>}` object into a list sorted by stake descending, dropping
/// entries without numeric stake.
fn stake_pools(stake_pools: &Value) -> Option<Vec<StakePool>> {
    let stake_pools = stake_pools.as_object()?;

    let mut stake_pools = stake_pools
        .iter()
        .filter_map(|(name, sol)| {
            to_number(sol).map(|sol| StakePool {
                name: name.to_owned(),
                sol,
            })
        })
        .collect::<Vec<_>>();
    stake_pools.sort_by(|a, b| b.sol.total_cmp(&a.sol));

    Some(stake_pools)
}
