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
use log::{error, info};
use std::panic;
use tokio::signal::unix::{Signal, SignalKind, signal};
use transparency_api::{application, config::Config, infra, infra::api::AxumApi};
use transparency_common::{
    config::ConfigExt,
    domain::KeyValueStore,
    infra::kv_store::{self, in_mem::InMemKeyValueStore, redb_file::RedbKeyValueStore},
    telemetry,
};
use trust_signals::{application::Monitor, infra::sources::HttpSources};

#[tokio::main]
async fn main() {
    telemetry::init_logging();
    panic::set_hook(Box::new(|panic| error!(panic:%; "process panicked")));

    if let Err(error) = run().await {
        let backtrace = error.backtrace();
        let error = format!("{error:#}");
        error!(error, backtrace:%; "process exited with ERROR");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let sigterm = signal(SignalKind::terminate()).expect("SIGTERM handler can be registered");
    let config = Config::load().context("load configuration")?;
    info!(config:?; "starting");
    let Config {
        application_config,
        infra_config,
        telemetry_config: telemetry::Config { metrics_config },
    } = config;

    telemetry::init_metrics(metrics_config);

    let infra::Config {
        api_config,
        sources_config,
        history_storage_config,
    } = infra_config;

    let sources = HttpSources::new(sources_config).context("create HTTP sources")?;

    match history_storage_config {
        kv_store::Config::InMem => {
            let store = InMemKeyValueStore::default();
            let monitor = Monitor::new(application_config, sources, store);
            serve(api_config, monitor, sigterm).await
        }

        kv_store::Config::Redb { path } => {
            let store = RedbKeyValueStore::new(&path)
                .with_context(|| format!("open history storage at {}", path.display()))?;
            let monitor = Monitor::new(application_config, sources, store);
            serve(api_config, monitor, sigterm).await
        }
    }
}

async fn serve<K>(
    api_config: infra::api::Config,
    monitor: Monitor<HttpSources, K>,
    sigterm: Signal,
) -> anyhow::Result<()>
where
    K: KeyValueStore,
{
    let api = AxumApi::new(api_config, monitor);

    application::run(api, sigterm)
        .await
        .context("run Validator Transparency API application")
}
