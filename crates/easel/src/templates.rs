// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

//! Per-family visual templates for generated chart options.

use crate::classifier::ChartKind;
use crate::error::{ConfigError, ConfigResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const BUILTIN_TEMPLATES: &str = include_str!("../config/echarts_templates.yml");
const CHART_FAMILIES: [ChartKind; 4] = [
    ChartKind::Line,
    ChartKind::Bar,
    ChartKind::Hbar,
    ChartKind::Pie,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomSettings {
    /// Category count above which a slider is attached.
    pub threshold: usize,
    /// Number of categories visible in the initial window.
    pub window: usize,
}
impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            threshold: 10,
            window: 11,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyTemplate {
    pub option: Map<String, Value>,
    #[serde(default)]
    pub series: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_zoom: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct TemplateDocument {
    common: Value,
    #[serde(default)]
    zoom: ZoomSettings,
    #[serde(default)]
    families: BTreeMap<String, Value>,
}

/// Immutable set of templates; builders clone what they modify.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartTemplates {
    common: Map<String, Value>,
    zoom: ZoomSettings,
    families: BTreeMap<ChartKind, FamilyTemplate>,
}
impl ChartTemplates {
    pub fn builtin() -> ConfigResult<Self> {
        Self::from_yaml_string(BUILTIN_TEMPLATES)
    }
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read chart template file: {}",
                path.as_ref().display()
            )
        })?;
        Self::from_yaml_string(&content).with_context(|| {
            format!(
                "Failed to load chart templates from {}",
                path.as_ref().display()
            )
        })
    }
    pub fn from_yaml_string(yaml_content: &str) -> ConfigResult<Self> {
        let document: TemplateDocument = serde_yaml::from_str(yaml_content)?;
        let common = into_mapping(document.common, "common")?;
        if document.zoom.window == 0 {
            return Err(ConfigError::InvalidZoom {
                reason: "window must be at least 1".to_string(),
            });
        }
        let mut raw_families = document.families;
        let mut families = BTreeMap::new();
        for kind in CHART_FAMILIES {
            let section = format!("families.{kind}");
            let raw = raw_families
                .remove(kind.as_str())
                .ok_or_else(|| ConfigError::TemplateShape {
                    section: section.clone(),
                })?;
            let family: FamilyTemplate = serde_json::from_value(raw)
                .map_err(|_| ConfigError::TemplateShape { section })?;
            families.insert(kind, family);
        }
        if let Some(unknown) = raw_families.keys().next() {
            return Err(ConfigError::UnknownChartKind {
                name: unknown.clone(),
            });
        }
        Ok(Self {
            common,
            zoom: document.zoom,
            families,
        })
    }
    pub fn zoom(&self) -> ZoomSettings {
        self.zoom
    }
    pub fn family(&self, kind: ChartKind) -> Option<&FamilyTemplate> {
        self.families.get(&kind)
    }
    /// Series colours in palette order; empty when the template has none.
    pub fn palette(&self) -> Vec<String> {
        self.common
            .get("color")
            .and_then(Value::as_array)
            .map(|colors| {
                colors
                    .iter()
                    .filter_map(|c| c.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
    /// The common template with the family's top-level keys laid over it.
    pub fn base_option(&self, kind: ChartKind) -> Option<Map<String, Value>> {
        let family = self.family(kind)?;
        let mut option = self.common.clone();
        for (key, value) in &family.option {
            option.insert(key.clone(), value.clone());
        }
        Some(option)
    }
}

fn into_mapping(value: Value, section: &str) -> ConfigResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::TemplateShape {
            section: section.to_string(),
        }),
    }
}
