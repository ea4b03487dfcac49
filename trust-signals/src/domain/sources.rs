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

use crate::domain::{StakewizRecord, TrilliumRating, VoteAccount, VoteAccountLookup};
use serde::Serialize;
use std::error::Error as StdError;

/// External data sources about a validator.
///
/// "Not found" is a regular outcome, errors are reserved for unavailable sources.
#[trait_variant::make(Send)]
pub trait Sources
where
    Self: Clone + Send + Sync + 'static,
{
    type Error: StdError + Send + Sync + 'static;

    /// Look up the vote account via RPC.
    async fn vote_account(
        &self,
        vote: &VoteAccount,
    ) -> Result<Option<VoteAccountLookup>, Self::Error>;

    /// Check whether the validator is part of the Jito validator set.
    async fn jito(&self, vote: &VoteAccount) -> Result<JitoStatus, Self::Error>;

    async fn stakewiz(&self, vote: &VoteAccount) -> Result<Option<StakewizRecord>, Self::Error>;

    async fn trillium(&self, vote: &VoteAccount) -> Result<Option<TrilliumRating>, Self::Error>;
}

/// Jito membership of a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JitoStatus {
    pub jito: bool,

    /// The matching vote account as listed by Jito.
    pub matched: Option<String>,

    /// Number of validators in the Jito list.
    pub count: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JitoStatus {
    /// Degraded status used when the Jito list cannot be fetched.
    pub fn proxy_error() -> Self {
        Self {
            jito: false,
            matched: None,
            count: 0,
            error: Some("proxy_error".to_owned()),
        }
    }
}
