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

//! [Sources] implementation on top of the public HTTP APIs of Solana RPC nodes, Jito, Stakewiz
//! and Trillium.

mod jito;
mod rpc;
mod stakewiz;
mod trillium;

use crate::domain::{
    Aliases, JitoStatus, Sources, StakewizRecord, TrilliumRating, VoteAccount, VoteAccountLookup,
};
use log::debug;
use reqwest::{Client, RequestBuilder, StatusCode, header::ACCEPT};
use secrecy::SecretString;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Solana RPC endpoints in priority order; they may embed API keys.
    pub rpc_urls: Vec<SecretString>,

    pub jito_url: Url,

    /// Base URL, the vote account is appended as `validator/<vote>`.
    pub stakewiz_url: Url,

    pub trillium_url: Url,

    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default)]
    pub aliases: Aliases,
}

/// HTTP based [Sources] implementation.
#[derive(Debug, Clone)]
pub struct HttpSources {
    client: Client,
    config: Config,
}

impl HttpSources {
    pub fn new(config: Config) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(SourceError::Client)?;

        Ok(Self { client, config })
    }

    /// Send the request and decode the JSON response body; `url` is only used for errors.
    async fn json<T>(&self, request: RequestBuilder, url: &str) -> Result<T, SourceError>
    where
        T: DeserializeOwned,
    {
        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| request_error(url, error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(url.to_owned(), status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|error| request_error(url, error))?;
        debug!(url, len = body.len(); "response received");

        serde_json::from_slice(&body)
            .map_err(|error| SourceError::Decode(url.to_owned(), error))
    }
}

impl Sources for HttpSources {
    type Error = SourceError;

    async fn vote_account(
        &self,
        vote: &VoteAccount,
    ) -> Result<Option<VoteAccountLookup>, Self::Error> {
        self.get_vote_account(vote).await
    }

    async fn jito(&self, vote: &VoteAccount) -> Result<JitoStatus, Self::Error> {
        self.get_jito_status(vote).await
    }

    async fn stakewiz(&self, vote: &VoteAccount) -> Result<Option<StakewizRecord>, Self::Error> {
        self.get_stakewiz(vote).await
    }

    async fn trillium(&self, vote: &VoteAccount) -> Result<Option<TrilliumRating>, Self::Error> {
        self.get_trillium(vote).await
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot create HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("cannot request {0}")]
    Request(String, #[source] reqwest::Error),

    #[error("request to {0} timed out")]
    Timeout(String),

    #[error("request to {0} failed with status {1}")]
    Status(String, StatusCode),

    #[error("cannot decode response from {0}")]
    Decode(String, #[source] serde_json::Error),

    #[error("unexpected response from {0}: {1}")]
    UnexpectedResponse(String, String),

    #[error("all {0} RPC endpoints failed")]
    AllRpcFailed(usize),
}

fn request_error(url: &str, error: reqwest::Error) -> SourceError {
    if error.is_timeout() {
        SourceError::Timeout(url.to_owned())
    } else {
        SourceError::Request(url.to_owned(), error)
    }
}
