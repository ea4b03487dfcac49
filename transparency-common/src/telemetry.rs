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

use log::error;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde::Deserialize;
use std::net::IpAddr;

/// Telemetry configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(rename = "metrics")]
    pub metrics_config: MetricsConfig,
}

/// Metrics configuration; the Prometheus exporter only listens if enabled.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub address: IpAddr,
    pub port: u16,
}

/// Initialize logging to stdout. The level can be set via the `RUST_LOG` environment variable.
pub fn init_logging() {
    logforth::starter_log::stdout().apply();
}

/// Initialize the Prometheus metrics exporter, if enabled. Failing to install the exporter is
/// logged, but not fatal.
pub fn init_metrics(config: MetricsConfig) {
    let MetricsConfig {
        enabled,
        address,
        port,
    } = config;

    if enabled {
        let result = PrometheusBuilder::new()
            .with_http_listener((address, port))
            .install();
        if let Err(error) = result {
            error!(error:%, address:%, port; "cannot install Prometheus metrics exporter");
        }
    }
}
