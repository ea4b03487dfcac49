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
    domain::{FieldAliases, JitoStatus, VoteAccount},
    infra::sources::{HttpSources, SourceError},
};
use serde_json::Value;

impl HttpSources {
    pub(super) async fn get_jito_status(
        &self,
        vote: &VoteAccount,
    ) -> Result<JitoStatus, SourceError> {
        let url = self.config.jito_url.as_str();
        let validators = self.json::<Value>(self.client.get(url), url).await?;

        jito_status(&validators, vote, &self.config.aliases.jito_vote_account).ok_or_else(|| {
            SourceError::UnexpectedResponse(url.to_owned(), "no validator list".to_owned())
        })
    }
}

/// The validator list is either a bare array or wrapped as `{"validators": [...]}`. An object
/// without a `validators` array counts as an empty list.
fn jito_status(
    validators: &Value,
    vote: &VoteAccount,
    aliases: &FieldAliases,
) -> Option<JitoStatus> {
    let validators = match validators {
        Value::Array(validators) => validators.as_slice(),
        Value::Object(object) => object
            .get("validators")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => return None,
    };

    let matched = validators
        .iter()
        .filter_map(|validator| aliases.string(validator))
        .find(|key| key == &**vote);

    Some(JitoStatus {
        jito: matched.is_some(),
        matched,
        count: validators.len(),
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::{Aliases, JitoStatus, VoteAccount},
        infra::sources::{
            SourceError,
            jito::jito_status,
            tests::{config, sources},
        },
    };
    use assert_matches::assert_matches;
    use httpmock::{Method::GET, MockServer};
    use serde_json::json;

    const VOTE: &str = "3QPGLackJy5LKctYYoPGmA4P8ncyE197jdxr1zP2ho8K";

    #[test]
    fn test_jito_status() -> anyhow::Result<()> {
        let vote = VOTE.parse::<VoteAccount>()?;
        let aliases = Aliases::default().jito_vote_account;

        let validators = json!([
            { "vote_account": "ignored", "running_jito": true },
            { "voteIdentityPubkey": format!(" {VOTE} ") },
        ]);
        assert_eq!(
            jito_status(&validators, &vote, &aliases),
            Some(JitoStatus {
                jito: true,
                matched: Some(VOTE.to_owned()),
                count: 2,
                error: None,
            })
        );

        let validators = json!({ "validators": [{ "vote_identity": "other" }] });
        assert_matches!(
            jito_status(&validators, &vote, &aliases),
            Some(JitoStatus { jito: false, matched: None, count: 1, .. })
        );

        assert_eq!(
            jito_status(&json!({ "data": [] }), &vote, &aliases),
            Some(JitoStatus {
                jito: false,
                matched: None,
                count: 0,
                error: None,
            })
        );
        assert_eq!(jito_status(&json!(null), &vote, &aliases), None);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_jito_status() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let jito = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v1/validators")
                    .header("accept", "application/json");
                then.status(200)
                    .json_body(json!({ "validators": [{ "vote_identity": VOTE }] }));
            })
            .await;

        let vote = VOTE.parse::<VoteAccount>()?;
        let status = sources(config(&server)).get_jito_status(&vote).await?;

        jito.assert_async().await;
        assert!(status.jito);
        assert_eq!(status.count, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_jito_status_unavailable() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/validators");
                then.status(502);
            })
            .await;

        let vote = VOTE.parse::<VoteAccount>()?;
        let result = sources(config(&server)).get_jito_status(&vote).await;
        assert_matches!(result, Err(SourceError::Status(_, status)) if status.as_u16() == 502);

        Ok(())
    }
}
