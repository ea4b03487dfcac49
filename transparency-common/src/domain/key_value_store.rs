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

#![cfg_attr(coverage_nightly, coverage(off))]

use std::error::Error as StdError;

/// Abstraction for a string key-value store, e.g. backing the per-validator history.
#[trait_variant::make(Send)]
pub trait KeyValueStore
where
    Self: Clone + Send + Sync + 'static,
{
    type Error: StdError + Send + Sync + 'static;

    /// Get the value for the given key, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Set the value for the given key, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;
}
