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

use super::tooltip::{self, TooltipRow};
use super::{series_template, set_in, ChartInputs};
use crate::classifier::ChartKind;
use crate::format::expression::number_text;
use crate::model::{cell_label, numeric_value};
use crate::templates::{ChartTemplates, FamilyTemplate};
use serde_json::{json, Map, Value};

/// A single series named after the dimension, one slice per row, valued by
/// the first measure.
pub fn build(
    templates: &ChartTemplates,
    family: &FamilyTemplate,
    inputs: &ChartInputs<'_>,
) -> Map<String, Value> {
    let mut option = templates.base_option(ChartKind::Pie).unwrap_or_default();
    let dimension_key = inputs.dimension.key();
    let Some(measure) = inputs.measures.first() else {
        return option;
    };
    let measure_key = measure.key();

    let slices: Vec<Value> = inputs
        .rows
        .iter()
        .map(|row| {
            json!({
                "name": row.raw_or_null(dimension_key),
                "value": row.raw_or_null(measure_key),
                "showValue": row.display(measure_key),
            })
        })
        .collect();
    let mut series = series_template(family, &inputs.dimension.name);
    series.insert("data".to_string(), Value::Array(slices));
    option.insert("series".to_string(), json!([series]));

    let palette = templates.palette();
    let values: Vec<f64> = inputs
        .rows
        .iter()
        .map(|row| row.raw(measure_key).and_then(numeric_value).unwrap_or(0.0))
        .collect();
    let total: f64 = values.iter().sum();
    let fragments: Vec<Value> = inputs
        .rows
        .iter()
        .zip(&values)
        .enumerate()
        .map(|(index, (row, value))| {
            let line = TooltipRow {
                color: tooltip::palette_color(&palette, index),
                series_name: &inputs.dimension.name,
                value: format!(
                    "{} ({}%)",
                    row.display(measure_key),
                    number_text(tooltip::percent_of(*value, total))
                ),
            };
            Value::String(tooltip::fragment(
                &cell_label(row.raw(dimension_key)),
                &[line],
            ))
        })
        .collect();
    set_in(&mut option, "tooltip", "formatterHtml", Value::Array(fragments));
    option
}
