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
    domain::{Aliases, StakewizRecord, VoteAccount, is_truthy, to_number},
    infra::sources::{HttpSources, SourceError},
};
use serde_json::Value;

impl HttpSources {
    pub(super) async fn get_stakewiz(
        &self,
        vote: &VoteAccount,
    ) -> Result<Option<StakewizRecord>, SourceError> {
        let base = self.config.stakewiz_url.as_str().trim_end_matches('/');
        let url = format!("{base}/validator/{vote}");
        let validator = self.json::<Value>(self.client.get(&url), &url).await?;

        Ok(stakewiz_record(&validator, &self.config.aliases))
    }
}

/// Stakewiz answers unknown validators with a non-object body, e.g. `false`.
fn stakewiz_record(validator: &Value, aliases: &Aliases) -> Option<StakewizRecord> {
    if !validator.is_object() {
        return None;
    }

    let number = |name: &str| validator.get(name).and_then(to_number);

    Some(StakewizRecord {
        rank: number("rank"),
        is_jito: validator.get("is_jito").is_some_and(is_truthy),
        apy_estimate: number("apy_estimate"),
        staking_apy: number("staking_apy"),
        jito_apy: number("jito_apy"),
        total_apy: aliases.stakewiz_total_apy.number(validator),
    })
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::{Aliases, StakewizRecord, VoteAccount},
        infra::sources::{
            SourceError,
            stakewiz::stakewiz_record,
            tests::{config, sources},
        },
    };
    use assert_matches::assert_matches;
    use httpmock::{Method::GET, MockServer};
    use serde_json::json;
    use std::time::Duration;

    const VOTE: &str = "3QPGLackJy5LKctYYoPGmA4P8ncyE197jdxr1zP2ho8K";

    #[test]
    fn test_stakewiz_record() {
        let validator = json!({
            "rank": 42,
            "is_jito": 1,
            "apy_estimate": "7.1",
            "staking_apy": 6.6,
            "jito_apy": null,
            "total_apy": ""
        });

        assert_eq!(
            stakewiz_record(&validator, &Aliases::default()),
            Some(StakewizRecord {
                rank: Some(42.0),
                is_jito: true,
                apy_estimate: Some(7.1),
                staking_apy: Some(6.6),
                jito_apy: None,
                total_apy: None,
            })
        );

        assert_eq!(stakewiz_record(&json!(false), &Aliases::default()), None);
        assert_eq!(stakewiz_record(&json!(null), &Aliases::default()), None);
    }

    #[tokio::test]
    async fn test_get_stakewiz() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let stakewiz = server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/validator/{VOTE}"));
                then.status(200)
                    .json_body(json!({ "rank": 7, "is_jito": true, "total_apy": 7.45 }));
            })
            .await;

        let vote = VOTE.parse::<VoteAccount>()?;
        let record = sources(config(&server)).get_stakewiz(&vote).await?;

        stakewiz.assert_async().await;
        assert_matches!(
            record,
            Some(StakewizRecord { rank: Some(7.0), is_jito: true, total_apy: Some(7.45), .. })
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_get_stakewiz_timeout() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/validator/{VOTE}"));
                then.status(200)
                    .delay(Duration::from_millis(500))
                    .json_body(json!({ "rank": 7 }));
            })
            .await;

        let mut config = config(&server);
        config.timeout = Duration::from_millis(50);

        let vote = VOTE.parse::<VoteAccount>()?;
        let result = sources(config).get_stakewiz(&vote).await;
        assert_matches!(result, Err(SourceError::Timeout(_)));

        Ok(())
    }
}
