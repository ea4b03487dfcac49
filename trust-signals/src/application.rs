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

use crate::domain::{
    History, HistoryConfig, HistoryStore, JitoStatus, Observation, ObservationStatus, Ratings,
    SourceOutcome, Sources, Sparkline, StabilityResult, ValidatorConfig, ValidatorSelection,
    VoteAccount, VoteAccountInfo, VoteAccountLookup, evaluate, uptime_proxy,
};
use chrono::{DateTime, Utc};
use futures::join;
use log::{debug, info, warn};
use metrics::{Counter, counter, gauge};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use transparency_common::domain::KeyValueStore;
use url::Url;

const SPARKLINE_WIDTH: f64 = 300.0;
const SPARKLINE_HEIGHT: f64 = 60.0;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub validator: ValidatorConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    /// Number of recent epochs for the uptime proxy.
    #[serde(default = "uptime_window_default")]
    pub uptime_window: usize,

    /// Public URL of the dashboard, base for share links.
    #[serde(default)]
    pub public_url: Option<Url>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            validator: ValidatorConfig::default(),
            history: HistoryConfig::default(),
            uptime_window: uptime_window_default(),
            public_url: None,
        }
    }
}

/// Everything shown on the dashboard for one validator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub validator: ValidatorView,
    pub observation: Observation,
    pub account: Option<VoteAccountInfo>,
    pub jito: JitoStatus,
    pub ratings: Ratings,
    pub stability: StabilityResult,
    pub commission: Option<Sparkline>,
    pub share_url: Option<Url>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorView {
    #[serde(flatten)]
    pub selection: ValidatorSelection,
    pub label: String,
    pub node_pubkey: Option<String>,
}

/// Runs evaluation cycles against the configured sources and history store.
#[derive(Debug, Clone)]
pub struct Monitor<S, K> {
    config: Config,
    sources: S,
    history: HistoryStore<K>,
    failures: SourceFailures,
}

#[derive(Debug, Clone)]
struct SourceFailures {
    rpc: Counter,
    jito: Counter,
    stakewiz: Counter,
    trillium: Counter,
}

impl Default for SourceFailures {
    fn default() -> Self {
        Self {
            rpc: counter!("transparency_source_failures", "source" => "rpc"),
            jito: counter!("transparency_source_failures", "source" => "jito"),
            stakewiz: counter!("transparency_source_failures", "source" => "stakewiz"),
            trillium: counter!("transparency_source_failures", "source" => "trillium"),
        }
    }
}

impl<S, K> Monitor<S, K>
where
    S: Sources,
    K: KeyValueStore,
{
    pub fn new(config: Config, sources: S, store: K) -> Self {
        let history = HistoryStore::new(store, config.history.clone());

        Self {
            config,
            sources,
            history,
            failures: SourceFailures::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Look up the vote account via RPC, passing through errors.
    pub async fn vote_account(
        &self,
        vote: &VoteAccount,
    ) -> Result<Option<VoteAccountLookup>, S::Error> {
        self.sources.vote_account(vote).await.inspect_err(|error| {
            self.failures.rpc.increment(1);
            warn!(vote:%, error:%; "cannot look up vote account");
        })
    }

    /// Jito membership, degraded to [JitoStatus::proxy_error] if the Jito list is unavailable.
    pub async fn jito(&self, vote: &VoteAccount) -> JitoStatus {
        match self.sources.jito(vote).await {
            Ok(status) => status,

            Err(error) => {
                self.failures.jito.increment(1);
                warn!(vote:%, error:%; "cannot check Jito membership");
                JitoStatus::proxy_error()
            }
        }
    }

    /// Fetch all rating sources concurrently and aggregate whatever they deliver.
    pub async fn ratings(&self, vote: &VoteAccount) -> Ratings {
        self.ratings_at(vote, Utc::now()).await
    }

    async fn ratings_at(&self, vote: &VoteAccount, now: DateTime<Utc>) -> Ratings {
        let (stakewiz, trillium) = join!(self.sources.stakewiz(vote), self.sources.trillium(vote));

        let stakewiz = outcome(stakewiz, &self.failures.stakewiz, vote, "stakewiz");
        let trillium = outcome(trillium, &self.failures.trillium, vote, "trillium");

        Ratings::aggregate(vote.clone(), stakewiz, trillium, now)
    }

    /// Run one evaluation cycle: fetch live data, record a snapshot if due and score the
    /// validator.
    pub async fn dashboard(&self, selection: ValidatorSelection) -> Dashboard {
        self.dashboard_at(selection, Utc::now()).await
    }

    pub async fn dashboard_at(
        &self,
        selection: ValidatorSelection,
        now: DateTime<Utc>,
    ) -> Dashboard {
        let vote = &selection.vote;

        let (lookup, jito, ratings) = join!(
            self.vote_account(vote),
            self.jito(vote),
            self.ratings_at(vote, now)
        );

        let (status, account) = match lookup {
            Ok(Some(lookup)) => (lookup.status(), Some(lookup.info)),
            Ok(None) => (ObservationStatus::NotFound, None),
            Err(_) => (ObservationStatus::Error, None),
        };
        let observation = Observation {
            timestamp: now,
            status,
            commission: account.as_ref().and_then(|account| account.commission),
            uptime_proxy: account.as_ref().and_then(|account| {
                uptime_proxy(&account.epoch_credits, self.config.uptime_window)
            }),
            apy_source_a: ratings.stakewiz_apy(),
            apy_source_b: ratings.trillium_apy(),
            pool_count: ratings.pool_count(),
        };

        // Unknown vote accounts are scored but neither recorded nor exported.
        let history = if observation.status == ObservationStatus::NotFound {
            self.history.load(vote).await
        } else {
            self.history.append_if_due(vote, observation.clone()).await
        };
        let stability = evaluate(&observation, &history, observation.pool_count);
        if observation.status != ObservationStatus::NotFound {
            gauge!("transparency_stability_score", "vote" => vote.to_string())
                .set(stability.score as f64);
        }
        info!(
            vote:%,
            status:% = observation.status,
            score = stability.score,
            snapshots = history.len();
            "validator evaluated"
        );

        let node_pubkey = account
            .as_ref()
            .and_then(|account| account.node_pubkey.clone());
        let share_url = self
            .config
            .public_url
            .as_ref()
            .map(|base| selection.share_url(base));
        let validator = ValidatorView {
            label: selection.label(node_pubkey.as_deref()),
            node_pubkey,
            selection,
        };

        Dashboard {
            validator,
            observation,
            account,
            jito,
            ratings,
            stability,
            commission: commission_sparkline(&history),
            share_url,
            updated_at: now,
        }
    }
}

/// Sparkline over the stored commission values.
fn commission_sparkline(history: &History) -> Option<Sparkline> {
    let values = history
        .iter()
        .filter_map(|snapshot| snapshot.commission)
        .map(f64::from)
        .collect::<Vec<_>>();
    debug!(len = values.len(); "commission series");

    Sparkline::new(values, SPARKLINE_WIDTH, SPARKLINE_HEIGHT)
}

fn outcome<T, E>(
    result: Result<Option<T>, E>,
    failures: &Counter,
    vote: &VoteAccount,
    source: &str,
) -> SourceOutcome<T>
where
    E: StdError,
{
    match result {
        Ok(Some(value)) => SourceOutcome::Found(value),
        Ok(None) => SourceOutcome::NotFound,
        Err(error) => {
            failures.increment(1);
            warn!(vote:%, source, error:%; "cannot fetch rating");
            SourceOutcome::Failed(error.to_string())
        }
    }
}

fn uptime_window_default() -> usize {
    5
}
