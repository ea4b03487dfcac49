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

use crate::domain::{Observation, VoteAccount};
use derive_more::{Deref, From};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use transparency_common::domain::KeyValueStore;

const KEY_PREFIX: &str = "stability-history:";

/// Configuration for the [HistoryStore].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Minimum time between two stored snapshots.
    #[serde(with = "humantime_serde")]
    pub min_interval: Duration,

    /// Maximum number of stored snapshots; the oldest are evicted first.
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(30 * 60),
            capacity: 120,
        }
    }
}

/// Ordered sequence of snapshots for one validator, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Deref, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(Vec<Observation>);

impl History {
    /// Whether the given snapshot is more than `min_interval` younger than the newest stored one.
    pub fn is_due(&self, snapshot: &Observation, min_interval: Duration) -> bool {
        match self.0.last() {
            Some(last) => (snapshot.timestamp - last.timestamp)
                .to_std()
                .is_ok_and(|elapsed| elapsed > min_interval),

            None => true,
        }
    }

    fn push_capped(&mut self, snapshot: Observation, capacity: usize) {
        self.0.push(snapshot);
        let excess = self.0.len().saturating_sub(capacity.max(1));
        self.0.drain(..excess);
    }
}

/// Rolling, rate-limited snapshot history per validator on top of a [KeyValueStore].
///
/// Reading never fails: missing or malformed data yields an empty history. Writing is best
/// effort: failing to persist is logged and the in-memory result is returned regardless.
/// Concurrent writers for the same validator are not coordinated, the last one wins.
#[derive(Debug, Clone)]
pub struct HistoryStore<S> {
    store: S,
    config: HistoryConfig,
}

impl<S> HistoryStore<S>
where
    S: KeyValueStore,
{
    pub fn new(store: S, config: HistoryConfig) -> Self {
        Self { store, config }
    }

    pub async fn load(&self, vote: &VoteAccount) -> History {
        let key = key(vote);

        match self.store.get(&key).await {
            Ok(Some(value)) => serde_json::from_str(&value).unwrap_or_else(|error| {
                warn!(vote:%, error:%; "malformed history treated as empty");
                History::default()
            }),

            Ok(None) => History::default(),

            Err(error) => {
                warn!(vote:%, error:%; "cannot load history, treated as empty");
                History::default()
            }
        }
    }

    /// Append the given snapshot if due, see [History::is_due], and return the resulting history.
    pub async fn append_if_due(&self, vote: &VoteAccount, snapshot: Observation) -> History {
        let HistoryConfig {
            min_interval,
            capacity,
        } = self.config;

        let mut history = self.load(vote).await;
        if !history.is_due(&snapshot, min_interval) {
            debug!(vote:%, len = history.len(); "snapshot not yet due");
            return history;
        }

        history.push_capped(snapshot, capacity);

        match serde_json::to_string(&history) {
            Ok(value) => {
                if let Err(error) = self.store.set(&key(vote), &value).await {
                    warn!(vote:%, error:%; "cannot persist history");
                }
            }

            Err(error) => warn!(vote:%, error:%; "cannot serialize history"),
        }

        debug!(vote:%, len = history.len(); "snapshot appended");
        history
    }
}

fn key(vote: &VoteAccount) -> String {
    format!("{KEY_PREFIX}{vote}")
}
