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

use crate::domain::{InvalidVoteAccountError, VoteAccount};
use serde::{Deserialize, Serialize};
use url::{Url, form_urlencoded};

const DEFAULT_VOTE_ACCOUNT: &str = "3QPGLackJy5LKctYYoPGmA4P8ncyE197jdxr1zP2ho8K";
const DEFAULT_NAME: &str = "AndrewInUA";

/// The validator shown when no other one is selected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub vote_account: VoteAccount,
    pub name: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            vote_account: VoteAccount(DEFAULT_VOTE_ACCOUNT.to_owned()),
            name: DEFAULT_NAME.to_owned(),
        }
    }
}

/// The validator selected via `vote` and `name` parameters, falling back to the configured one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorSelection {
    pub vote: VoteAccount,
    pub name: String,
    pub vote_from_url: Option<VoteAccount>,
    pub name_from_url: Option<String>,
}

impl ValidatorSelection {
    /// Blank parameters count as absent.
    pub fn from_params(
        vote: Option<&str>,
        name: Option<&str>,
        default: &ValidatorConfig,
    ) -> Result<Self, InvalidVoteAccountError> {
        let vote_from_url = vote
            .map(str::trim)
            .filter(|vote| !vote.is_empty())
            .map(str::parse::<VoteAccount>)
            .transpose()?;
        let name_from_url = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToOwned::to_owned);

        Ok(Self {
            vote: vote_from_url
                .clone()
                .unwrap_or_else(|| default.vote_account.clone()),
            name: name_from_url.clone().unwrap_or_else(|| default.name.clone()),
            vote_from_url,
            name_from_url,
        })
    }

    /// Parameters are taken from the query and, if not present there, from the fragment, which
    /// static hosting keeps client side.
    pub fn from_url(url: &Url, default: &ValidatorConfig) -> Result<Self, InvalidVoteAccountError> {
        let vote = param(url, "vote");
        let name = param(url, "name");
        Self::from_params(vote.as_deref(), name.as_deref(), default)
    }

    /// Display label: the name from the URL, else the node or vote account, shortened.
    pub fn label(&self, node_pubkey: Option<&str>) -> String {
        match (&self.name_from_url, node_pubkey) {
            (Some(name), _) => name.to_owned(),
            (None, Some(node_pubkey)) => format!("node {}", short_key(node_pubkey)),
            (None, None) => format!("vote {}", short_key(&self.vote)),
        }
    }

    /// Shareable link to this selection based on the given page URL. GitHub Pages gets the
    /// parameters as fragment, everything else as query.
    pub fn share_url(&self, base: &Url) -> Url {
        let mut params = form_urlencoded::Serializer::new(String::new());
        params.append_pair("vote", &self.vote);
        if let Some(name) = &self.name_from_url {
            params.append_pair("name", name);
        }
        let params = params.finish();

        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);

        let static_hosting = url
            .host_str()
            .is_some_and(|host| host.contains("github.io"));
        if static_hosting {
            url.set_fragment(Some(&params));
        } else {
            url.set_query(Some(&params));
        }

        url
    }
}

/// Abbreviate keys longer than 12 characters as `abcd…wxyz`.
pub fn short_key(key: &str) -> String {
    let len = key.chars().count();
    if len > 12 {
        let head = key.chars().take(4).collect::<String>();
        let tail = key.chars().skip(len - 4).collect::<String>();
        format!("{head}…{tail}")
    } else {
        key.to_owned()
    }
}

fn param(url: &Url, name: &str) -> Option<String> {
    let from_query = url
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned());

    from_query.or_else(|| {
        url.fragment().and_then(|fragment| {
            form_urlencoded::parse(fragment.as_bytes())
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        })
    })
}

#[cfg(test)]
mod tests {
    use crate::domain::{InvalidVoteAccountError, ValidatorConfig, ValidatorSelection, short_key};
    use assert_matches::assert_matches;
    use url::Url;

    const VOTE: &str = "Fd7btgySsrjuo25CJCj7oE7VPMyezDhnx7pZkj2v69Nk";

    #[test]
    fn test_from_url_query() -> anyhow::Result<()> {
        let url = Url::parse(&format!("https://example.com/?vote={VOTE}&name=My+Validator"))?;
        let selection = ValidatorSelection::from_url(&url, &ValidatorConfig::default())?;

        assert_eq!(&*selection.vote, VOTE);
        assert_eq!(selection.name, "My Validator");
        assert_eq!(selection.vote_from_url.as_deref(), Some(VOTE));
        assert_eq!(selection.name_from_url.as_deref(), Some("My Validator"));

        Ok(())
    }

    #[test]
    fn test_from_url_fragment() -> anyhow::Result<()> {
        let url = Url::parse(&format!("https://someone.github.io/dashboard/#vote={VOTE}"))?;
        let selection = ValidatorSelection::from_url(&url, &ValidatorConfig::default())?;

        assert_eq!(&*selection.vote, VOTE);
        assert_eq!(selection.name, "AndrewInUA");
        assert_eq!(selection.name_from_url, None);

        Ok(())
    }

    #[test]
    fn test_from_url_defaults() -> anyhow::Result<()> {
        let default = ValidatorConfig::default();

        let url = Url::parse("https://example.com/?vote=%20%20&name=")?;
        let selection = ValidatorSelection::from_url(&url, &default)?;
        assert_eq!(selection.vote, default.vote_account);
        assert_eq!(selection.name, default.name);
        assert_eq!(selection.vote_from_url, None);

        let url = Url::parse("https://example.com/?vote=a/b")?;
        assert_matches!(
            ValidatorSelection::from_url(&url, &default),
            Err(InvalidVoteAccountError::InvalidCharacters(_))
        );

        Ok(())
    }

    #[test]
    fn test_label() -> anyhow::Result<()> {
        let default = ValidatorConfig::default();

        let selection = ValidatorSelection::from_params(Some(VOTE), None, &default)?;
        assert_eq!(selection.label(None), "vote Fd7b…69Nk");
        assert_eq!(
            selection.label(Some("5pPRHniefFjkiaArbGX3Y8NUysJmQ9tMZg3FrFGwHzSm")),
            "node 5pPR…HzSm"
        );

        let selection = ValidatorSelection::from_params(Some(VOTE), Some("Mine"), &default)?;
        assert_eq!(selection.label(Some("node")), "Mine");

        Ok(())
    }

    #[test]
    fn test_share_url() -> anyhow::Result<()> {
        let default = ValidatorConfig::default();
        let selection = ValidatorSelection::from_params(Some(VOTE), Some("My Validator"), &default)?;

        let base = Url::parse("https://someone.github.io/dashboard/?vote=old#x")?;
        assert_eq!(
            selection.share_url(&base).as_str(),
            format!("https://someone.github.io/dashboard/#vote={VOTE}&name=My+Validator")
        );

        let base = Url::parse("https://transparency.example.com/")?;
        assert_eq!(
            selection.share_url(&base).as_str(),
            format!("https://transparency.example.com/?vote={VOTE}&name=My+Validator")
        );

        let selection = ValidatorSelection::from_params(None, None, &default)?;
        assert_eq!(
            selection.share_url(&base).as_str(),
            format!(
                "https://transparency.example.com/?vote={}",
                default.vote_account
            )
        );

        Ok(())
    }

    #[test]
    fn test_short_key() {
        assert_eq!(short_key("short"), "short");
        assert_eq!(short_key("exactly12chr"), "exactly12chr");
        assert_eq!(short_key("thirteen13chr"), "thir…3chr");
    }
}
