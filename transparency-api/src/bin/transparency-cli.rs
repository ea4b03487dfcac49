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

use anyhow::Context;
use clap::Parser;
use transparency_api::config::Config;
use transparency_common::{
    config::ConfigExt,
    domain::KeyValueStore,
    infra::kv_store::{self, in_mem::InMemKeyValueStore, redb_file::RedbKeyValueStore},
};
use trust_signals::{
    application::{self, Monitor},
    domain::ValidatorSelection,
    infra::sources::HttpSources,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    Cli::parse().run().await
}

/// Evaluate a validator once and print the dashboard as JSON.
///
/// Sources and history storage are taken from the same configuration as the API, i.e. from
/// `config.yaml` or the file given by `CONFIG_FILE`, overridden by `APP__` variables.
#[derive(Debug, Parser)]
#[command()]
struct Cli {
    /// Vote account of the validator; defaults to the configured validator.
    #[arg(long)]
    vote: Option<String>,

    /// Display name of the validator.
    #[arg(long)]
    name: Option<String>,
}

impl Cli {
    async fn run(self) -> anyhow::Result<()> {
        let Config {
            application_config,
            infra_config,
            telemetry_config: _,
        } = Config::load().context("load configuration")?;

        let selection = ValidatorSelection::from_params(
            self.vote.as_deref(),
            self.name.as_deref(),
            &application_config.validator,
        )
        .context("parse vote account")?;

        let sources =
            HttpSources::new(infra_config.sources_config).context("create HTTP sources")?;

        match infra_config.history_storage_config {
            kv_store::Config::InMem => {
                let store = InMemKeyValueStore::default();
                evaluate(application_config, sources, store, selection).await
            }

            kv_store::Config::Redb { path } => {
                let store = RedbKeyValueStore::new(&path)
                    .with_context(|| format!("open history storage at {}", path.display()))?;
                evaluate(application_config, sources, store, selection).await
            }
        }
    }
}

async fn evaluate<K>(
    config: application::Config,
    sources: HttpSources,
    store: K,
    selection: ValidatorSelection,
) -> anyhow::Result<()>
where
    K: KeyValueStore,
{
    let monitor = Monitor::new(config, sources, store);
    let dashboard = monitor.dashboard(selection).await;

    let dashboard = serde_json::to_string_pretty(&dashboard).context("serialize dashboard")?;
    println!("{dashboard}");

    Ok(())
}
