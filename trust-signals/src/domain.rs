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

mod fields;
mod history;
mod observation;
mod ratings;
mod selection;
mod sources;
mod sparkline;
mod stability;

pub use fields::*;
pub use history::*;
pub use observation::*;
pub use ratings::*;
pub use selection::*;
pub use sources::*;
pub use sparkline::*;
pub use stability::*;

use derive_more::{Deref, Display, Into};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const MIN_LEN: usize = 32;
const MAX_LEN: usize = 44;

/// Vote account address of a validator, the key for all per-validator data. Must be a base58
/// encoded public key of 32 to 44 characters.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, Deref, Into, Serialize, Deserialize)]
#[deref(forward)]
#[serde(try_from = "String", into = "String")]
pub struct VoteAccount(String);

impl TryFrom<String> for VoteAccount {
    type Error = InvalidVoteAccountError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            Err(InvalidVoteAccountError::Empty)
        } else if trimmed.chars().any(|c| !BASE58_ALPHABET.contains(c)) {
            Err(InvalidVoteAccountError::InvalidCharacters(trimmed.to_owned()))
        } else if !(MIN_LEN..=MAX_LEN).contains(&trimmed.len()) {
            Err(InvalidVoteAccountError::InvalidLength(trimmed.len()))
        } else if trimmed.len() == s.len() {
            Ok(Self(s))
        } else {
            Ok(Self(trimmed.to_owned()))
        }
    }
}

impl FromStr for VoteAccount {
    type Err = InvalidVoteAccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.to_owned().try_into()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidVoteAccountError {
    #[error("vote account must not be empty")]
    Empty,

    #[error("vote account {0} must only contain base58 characters")]
    InvalidCharacters(String),

    #[error("vote account must have 32 to 44 characters, but has {0}")]
    InvalidLength(usize),
}
