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

use crate::domain::KeyValueStore;
use parking_lot::RwLock;
use std::{collections::HashMap, convert::Infallible, sync::Arc};

/// In-memory based key-value store implementation.
#[derive(Debug, Default, Clone)]
pub struct InMemKeyValueStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl KeyValueStore for InMemKeyValueStore {
    type Error = Infallible;

    async fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.entries.write().insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
