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
use derive_more::Debug;
use redb::{
    CommitError, Database, DatabaseError, ReadableDatabase, StorageError,
    TableDefinition, TableError, TransactionError,
};
use std::{fs, io, path::Path, sync::Arc};
use thiserror::Error;
use tokio::task::{self, JoinError};

const ENTRIES: TableDefinition<&str, &str> = TableDefinition::new("entries");

/// Embedded database file based key-value store implementation.
#[derive(Debug, Clone)]
pub struct RedbKeyValueStore {
    #[debug(skip)]
    inner: Arc<Database>,
}

impl RedbKeyValueStore {
    /// Open or create the database file at the given path, creating missing parent directories.
    pub fn new(file: impl AsRef<Path>) -> Result<Self, RedbKeyValueStoreError> {
        let file = file.as_ref();
        if let Some(parent) = file.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(RedbKeyValueStoreError::CreateDir)?;
        }

        let inner = Database::create(file)?;

        // Create the table upfront, so that read transactions can always open it.
        let tx = inner.begin_write()?;
        tx.open_table(ENTRIES)?;
        tx.commit()?;

        Ok(Self {
            inner: Arc::new(inner),
        })
    }
}

impl KeyValueStore for RedbKeyValueStore {
    type Error = RedbKeyValueStoreError;

    async fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let inner = self.inner.clone();
        let key = key.to_owned();

        task::spawn_blocking(move || get(&inner, &key)).await?
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        let inner = self.inner.clone();
        let key = key.to_owned();
        let value = value.to_owned();

        // Commits fsync the file, so keep them off the async workers.
        task::spawn_blocking(move || set(&inner, &key, &value)).await?
    }
}

fn get(db: &Database, key: &str) -> Result<Option<String>, RedbKeyValueStoreError> {
    let tx = db.begin_read()?;
    let table = tx.open_table(ENTRIES)?;
    let value = table.get(key)?.map(|value| value.value().to_owned());

    Ok(value)
}

fn set(db: &Database, key: &str, value: &str) -> Result<(), RedbKeyValueStoreError> {
    let tx = db.begin_write()?;
    {
        let mut table = tx.open_table(ENTRIES)?;
        table.insert(key, value)?;
    }
    tx.commit()?;

    Ok(())
}

#[derive(Debug, Error)]
pub enum RedbKeyValueStoreError {
    #[error("cannot create directory for database file")]
    CreateDir(#[source] io::Error),

    #[error("cannot open database file")]
    Database(#[from] DatabaseError),

    #[error("cannot begin transaction")]
    Transaction(#[from] TransactionError),

    #[error("cannot open table")]
    Table(#[from] TableError),

    #[error("cannot access storage")]
    Storage(#[from] StorageError),

    #[error("cannot commit transaction")]
    Commit(#[from] CommitError),

    #[error("cannot join blocking database task")]
    Join(#[from] JoinError),
}
