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
    domain::{VoteAccount, VoteAccountInfo, VoteAccountLookup},
    infra::sources::{HttpSources, SourceError},
};
use log::{debug, warn};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;

/// Response of the `getVoteAccounts` JSON-RPC method.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<VoteAccounts>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct VoteAccounts {
    #[serde(default)]
    current: Vec<VoteAccountInfo>,

    #[serde(default)]
    delinquent: Vec<VoteAccountInfo>,
}

impl VoteAccounts {
    fn find(self, vote: &VoteAccount) -> Option<VoteAccountLookup> {
        let VoteAccounts {
            current,
            delinquent,
        } = self;

        current
            .into_iter()
            .map(|info| (info, false))
            .chain(delinquent.into_iter().map(|info| (info, true)))
            .find(|(info, _)| info.vote_pubkey == **vote)
            .map(|(info, delinquent)| VoteAccountLookup { info, delinquent })
    }
}

impl HttpSources {
    /// Try the RPC endpoints in order until one answers; a well-formed answer without the vote
    /// account ends the search with `None`.
    pub(super) async fn get_vote_account(
        &self,
        vote: &VoteAccount,
    ) -> Result<Option<VoteAccountLookup>, SourceError> {
        let rpc_urls = &self.config.rpc_urls;

        for (index, rpc_url) in rpc_urls.iter().enumerate() {
            match self.vote_accounts(rpc_url.expose_secret()).await {
                Ok(vote_accounts) => {
                    let lookup = vote_accounts.find(vote);
                    debug!(
                        vote:%,
                        endpoint = index,
                        found = lookup.is_some();
                        "vote account looked up"
                    );
                    return Ok(lookup);
                }

                // URLs may contain API keys.
                Err(error) => warn!(endpoint = index, error:%; "RPC endpoint failed"),
            }
        }

        Err(SourceError::AllRpcFailed(rpc_urls.len()))
    }

    async fn vote_accounts(&self, rpc_url: &str) -> Result<VoteAccounts, SourceError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getVoteAccounts",
            "params": [{ "commitment": "finalized" }]
        });

        let request = self.client.post(rpc_url).json(&request);
        let response = self.json::<RpcResponse>(request, "RPC endpoint").await?;

        match response {
            RpcResponse {
                result: Some(vote_accounts),
                ..
            } => Ok(vote_accounts),

            RpcResponse {
                error: Some(error),
                ..
            } => Err(SourceError::UnexpectedResponse(
                "RPC endpoint".to_owned(),
                error.to_string(),
            )),

            _ => Ok(VoteAccounts::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::{EpochCredits, ObservationStatus, VoteAccount},
        infra::sources::{
            SourceError,
            tests::{config, sources},
        },
    };
    use assert_matches::assert_matches;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    const VOTE: &str = "3QPGLackJy5LKctYYoPGmA4P8ncyE197jdxr1zP2ho8K";

    fn vote_accounts() -> serde_json::Value {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "current": [
                    {
                        "votePubkey": "Other1111111111111111111111111111111111111",
                        "nodePubkey": "Node1111111111111111111111111111111111111",
                        "commission": 10,
                        "epochCredits": [],
                        "activatedStake": 1,
                        "epochVoteAccount": true,
                        "lastVote": 1,
                        "rootSlot": 1
                    }
                ],
                "delinquent": [
                    {
                        "votePubkey": VOTE,
                        "nodePubkey": "5pPRHniefFjkiaArbGX3Y8NUysJmQ9tMZg3FrFGwHzSm",
                        "commission": 5,
                        "epochCredits": [[700, 1000, 500], [701, 1500, 1000]],
                        "activatedStake": 42000000000u64,
                        "epochVoteAccount": true,
                        "lastVote": 300000000u64,
                        "rootSlot": 299999968u64
                    }
                ]
            }
        })
    }

    #[tokio::test]
    async fn test_get_vote_account() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let rpc = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/rpc")
                    .json_body_partial(r#"{ "method": "getVoteAccounts" }"#);
                then.status(200).json_body(vote_accounts());
            })
            .await;

        let vote = VOTE.parse::<VoteAccount>()?;
        let lookup = sources(config(&server)).get_vote_account(&vote).await?;

        rpc.assert_async().await;
        let lookup = lookup.expect("vote account is found");
        assert_eq!(lookup.status(), ObservationStatus::Delinquent);
        assert_eq!(lookup.info.commission, Some(5));
        assert_eq!(
            lookup.info.epoch_credits,
            vec![EpochCredits(700, 1000, 500), EpochCredits(701, 1500, 1000)]
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_get_vote_account_fallback() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let failing = server
            .mock_async(|when, then| {
                when.method(POST).path("/failing");
                then.status(503);
            })
            .await;
        let rpc = server
            .mock_async(|when, then| {
                when.method(POST).path("/rpc");
                then.status(200).json_body(vote_accounts());
            })
            .await;
        let unused = server
            .mock_async(|when, then| {
                when.method(POST).path("/unused");
                then.status(200).json_body(vote_accounts());
            })
            .await;

        let mut config = config(&server);
        config.rpc_urls = vec![
            server.url("/failing").into(),
            server.url("/rpc").into(),
            server.url("/unused").into(),
        ];

        let vote = "Unknown1111111111111111111111111111111111".parse::<VoteAccount>()?;
        let lookup = sources(config).get_vote_account(&vote).await?;

        assert_eq!(lookup, None);
        failing.assert_async().await;
        rpc.assert_async().await;
        assert_eq!(unused.hits_async().await, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_vote_account_all_failed() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/rpc");
                then.status(200)
                    .json_body(json!({ "jsonrpc": "2.0", "id": 1, "error": { "code": -32005 } }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/garbage");
                then.status(200).body("<html>");
            })
            .await;

        let mut config = config(&server);
        config.rpc_urls = vec![server.url("/rpc").into(), server.url("/garbage").into()];

        let vote = VOTE.parse::<VoteAccount>()?;
        let result = sources(config).get_vote_account(&vote).await;
        assert_matches!(result, Err(SourceError::AllRpcFailed(2)));

        Ok(())
    }
}
