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

//! Chart option synthesis for the line, bar, hbar and pie families.

pub mod axis;
pub mod pie;
pub mod tooltip;

use crate::classifier::ChartKind;
use crate::error::{ConfigError, DataError, DataResult, Result};
use crate::format::FormattedRow;
use crate::model::{Column, ResultSet};
use crate::templates::{ChartTemplates, FamilyTemplate, ZoomSettings};
use serde_json::{json, Map, Value};
use tracing::debug;

/// Resolved columns and formatted rows a builder works from.
#[derive(Debug, Clone)]
pub struct ChartInputs<'a> {
    pub dimension: &'a Column,
    pub measures: Vec<&'a Column>,
    pub rows: &'a [FormattedRow],
}
impl<'a> ChartInputs<'a> {
    pub fn resolve(
        result_set: &'a ResultSet,
        rows: &'a [FormattedRow],
        kind: ChartKind,
    ) -> DataResult<Self> {
        let dimension_id = result_set
            .dim_cols
            .first()
            .ok_or_else(|| DataError::MissingRole {
                role: "dimension".to_string(),
                kind: kind.to_string(),
            })?;
        if result_set.measure_cols.is_empty() {
            return Err(DataError::MissingRole {
                role: "measure".to_string(),
                kind: kind.to_string(),
            });
        }
        let dimension = result_set.require_column(dimension_id)?;
        let measures = result_set
            .measure_cols
            .iter()
            .map(|id| result_set.require_column(id))
            .collect::<DataResult<Vec<_>>>()?;
        Ok(Self {
            dimension,
            measures,
            rows,
        })
    }
    /// Raw dimension value of every row, in row order.
    pub fn categories(&self) -> Vec<Value> {
        let key = self.dimension.key();
        self.rows.iter().map(|row| row.raw_or_null(key)).collect()
    }
    /// Category text used in tooltip headers.
    pub fn category_labels(&self) -> Vec<String> {
        let key = self.dimension.key();
        self.rows
            .iter()
            .map(|row| crate::model::cell_label(row.raw(key)))
            .collect()
    }
}

/// Builds the chart option for one of the chart families.
pub fn build_option(
    kind: ChartKind,
    templates: &ChartTemplates,
    result_set: &ResultSet,
    rows: &[FormattedRow],
) -> Result<Value> {
    let inputs = ChartInputs::resolve(result_set, rows, kind)?;
    let family = templates
        .family(kind)
        .ok_or_else(|| ConfigError::TemplateShape {
            section: format!("families.{kind}"),
        })?;
    let option = match kind {
        ChartKind::Line | ChartKind::Bar | ChartKind::Hbar => {
            axis::build(kind, templates, family, &inputs)
        }
        ChartKind::Pie => pie::build(templates, family, &inputs),
        ChartKind::Table | ChartKind::KpiGroup => {
            return Err(ConfigError::UnknownChartKind {
                name: kind.to_string(),
            }
            .into())
        }
    };
    debug!(
        kind = %kind,
        categories = inputs.rows.len(),
        measures = inputs.measures.len(),
        "built chart option"
    );
    Ok(Value::Object(option))
}

/// The family's series template with a name attached.
pub(crate) fn series_template(family: &FamilyTemplate, name: &str) -> Map<String, Value> {
    let mut series = family.series.clone();
    series.insert("name".to_string(), json!(name));
    series
}

/// Sets `option[section][key]`, creating or replacing a non-object section.
pub(crate) fn set_in(option: &mut Map<String, Value>, section: &str, key: &str, value: Value) {
    let mut inner = match option.remove(section) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    inner.insert(key.to_string(), value);
    option.insert(section.to_string(), Value::Object(inner));
}

/// A one-slider `dataZoom` array showing the last `zoom.window` categories,
/// or `None` at or below the threshold.
pub(crate) fn zoom_window(
    zoom: ZoomSettings,
    slider: Option<&Map<String, Value>>,
    categories: usize,
) -> Option<Value> {
    if categories <= zoom.threshold {
        return None;
    }
    let mut slider = slider?.clone();
    slider.insert(
        "startValue".to_string(),
        json!(categories.saturating_sub(zoom.window)),
    );
    slider.insert("endValue".to_string(), json!(categories - 1));
    Some(Value::Array(vec![Value::Object(slider)]))
}
