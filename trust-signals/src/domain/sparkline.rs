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

use serde::Serialize;

const PAD: f64 = 4.0;

/// Geometry and summary of a small line chart over a series of percentages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sparkline {
    pub values: Vec<f64>,
    pub min: f64,
    pub max: f64,
    pub latest: f64,

    /// Polyline points within `width` x `height`, y growing downwards.
    pub points: Vec<Point>,

    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Sparkline {
    /// `None` for an empty series.
    pub fn new(values: Vec<f64>, width: f64, height: f64) -> Option<Self> {
        let latest = *values.last()?;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let range = if max > min { max - min } else { 1.0 };
        let step = if values.len() > 1 {
            (width - 2.0 * PAD) / (values.len() - 1) as f64
        } else {
            0.0
        };
        let points = values
            .iter()
            .enumerate()
            .map(|(i, value)| Point {
                x: PAD + i as f64 * step,
                y: height - PAD - (value - min) / range * (height - 2.0 * PAD),
            })
            .collect();

        let label = format!("Min {min}% • Max {max}% • Latest {latest:.0}%");

        Some(Self {
            values,
            min,
            max,
            latest,
            points,
            label,
        })
    }
}
