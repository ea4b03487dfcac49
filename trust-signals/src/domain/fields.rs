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

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered candidate field names for one logical value. External APIs have used different
/// spellings over time; the first candidate yielding a defined value wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldAliases(Vec<String>);

impl FieldAliases {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// The first candidate holding a non-empty string, trimmed.
    pub fn string(&self, object: &Value) -> Option<String> {
        self.names()
            .filter_map(|name| object.get(name))
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(ToOwned::to_owned)
    }

    /// The first candidate holding a finite number, see [to_number].
    pub fn number(&self, object: &Value) -> Option<f64> {
        self.names()
            .filter_map(|name| object.get(name))
            .find_map(to_number)
    }
}

/// All field aliases used when normalizing external payloads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Aliases {
    pub jito_vote_account: FieldAliases,
    pub stakewiz_total_apy: FieldAliases,
    pub trillium_vote_account: FieldAliases,
    pub trillium_identity: FieldAliases,
    pub trillium_delegator_total_apy: FieldAliases,
    pub trillium_overall_total_apy: FieldAliases,
}

impl Default for Aliases {
    fn default() -> Self {
        Self {
            jito_vote_account: FieldAliases::new([
                "vote_identity",
                "voteIdentity",
                "vote_identity_pubkey",
                "voteIdentityPubkey",
                "vote_identity_pubkey_str",
                "voteIdentityPubkeyStr",
                "votePubkey",
            ]),
            stakewiz_total_apy: FieldAliases::new(["total_apy"]),
            trillium_vote_account: FieldAliases::new(["vote_account_pubkey"]),
            trillium_identity: FieldAliases::new(["identity_pubkey", "identity"]),
            trillium_delegator_total_apy: FieldAliases::new([
                "average_delegator_total_apy",
                "delegator_total_apy",
            ]),
            trillium_overall_total_apy: FieldAliases::new([
                "average_total_overall_apy",
                "total_overall_apy",
            ]),
        }
    }
}

/// Coerce a JSON value to a finite number: numbers and numeric strings qualify, everything else
/// (including null and empty strings) is absent rather than zero.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// JSON truthiness: `true`, non-zero numbers and non-empty strings, arrays and objects.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
