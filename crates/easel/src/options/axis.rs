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
use super::{series_template, set_in, zoom_window, ChartInputs};
use crate::classifier::ChartKind;
use crate::templates::{ChartTemplates, FamilyTemplate};
use serde_json::{json, Map, Value};

/// Line, bar and hbar options: one series per measure over a category axis.
pub fn build(
    kind: ChartKind,
    templates: &ChartTemplates,
    family: &FamilyTemplate,
    inputs: &ChartInputs<'_>,
) -> Map<String, Value> {
    let mut option = templates.base_option(kind).unwrap_or_default();
    let category_axis = match kind {
        ChartKind::Hbar => "yAxis",
        _ => "xAxis",
    };
    set_in(
        &mut option,
        "legend",
        "data",
        json!([{ "name": inputs.dimension.name }]),
    );
    set_in(
        &mut option,
        category_axis,
        "data",
        Value::Array(inputs.categories()),
    );

    let series: Vec<Value> = inputs
        .measures
        .iter()
        .map(|measure| {
            let key = measure.key();
            let mut series = series_template(family, &measure.name);
            if kind == ChartKind::Line {
                series.insert("columnId".to_string(), json!(measure.id));
            }
            let data: Vec<Value> = inputs
                .rows
                .iter()
                .map(|row| json!({ "value": row.raw_or_null(key), "showValue": row.display(key) }))
                .collect();
            series.insert("data".to_string(), Value::Array(data));
            Value::Object(series)
        })
        .collect();
    option.insert("series".to_string(), Value::Array(series));

    set_in(
        &mut option,
        "tooltip",
        "formatterHtml",
        Value::Array(tooltip_fragments(templates, inputs)),
    );
    if let Some(data_zoom) = zoom_window(
        templates.zoom(),
        family.data_zoom.as_ref(),
        inputs.rows.len(),
    ) {
        option.insert("dataZoom".to_string(), data_zoom);
    }
    option
}

/// One fragment per category listing every series' display value.
fn tooltip_fragments(templates: &ChartTemplates, inputs: &ChartInputs<'_>) -> Vec<Value> {
    let palette = templates.palette();
    inputs
        .category_labels()
        .iter()
        .zip(inputs.rows)
        .map(|(label, row)| {
            let lines: Vec<TooltipRow<'_>> = inputs
                .measures
                .iter()
                .enumerate()
                .map(|(index, measure)| TooltipRow {
                    color: tooltip::palette_color(&palette, index),
                    series_name: &measure.name,
                    value: row.display(measure.key()).to_string(),
                })
                .collect();
            Value::String(tooltip::fragment(label, &lines))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ValueFormatter;
    use crate::model::{Column, DataType, ResultSet, Row};

    fn result_set(dim_type: DataType, n: usize) -> ResultSet {
        ResultSet {
            column_list: vec![
                Column::new("d", "Month", dim_type),
                Column::new("m1", "Sales", DataType::Number),
                Column::new("m2", "Cost", DataType::Number),
            ],
            data_list: (0..n)
                .map(|i| {
                    let row: Row = json!({"d": format!("c{i}"), "m1": i * 1000, "m2": null})
                        .as_object()
                        .cloned()
                        .unwrap();
                    row
                })
                .collect(),
            dim_cols: vec!["d".into()],
            measure_cols: vec!["m1".into(), "m2".into()],
            ..Default::default()
        }
    }

    fn build_for(kind: ChartKind, rs: &ResultSet) -> Map<String, Value> {
        let templates = ChartTemplates::builtin().unwrap();
        let rows = ValueFormatter::new().format_rows(&rs.data_list);
        let inputs = ChartInputs::resolve(rs, &rows, kind).unwrap();
        build(kind, &templates, templates.family(kind).unwrap(), &inputs)
    }

    #[test]
    fn line_option_has_series_per_measure() {
        let option = build_for(ChartKind::Line, &result_set(DataType::Date, 3));
        assert_eq!(option["legend"]["data"], json!([{"name": "Month"}]));
        assert_eq!(option["xAxis"]["data"], json!(["c0", "c1", "c2"]));
        let series = option["series"].as_array().unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0]["type"], json!("line"));
        assert_eq!(series[0]["name"], json!("Sales"));
        assert_eq!(series[0]["columnId"], json!("m1"));
        assert_eq!(series[0]["data"][2], json!({"value": 2000, "showValue": "2,000"}));
        assert_eq!(series[1]["data"][0], json!({"value": null, "showValue": "-"}));
        assert!(option.get("dataZoom").is_none());
        // common keys survive the merge
        assert_eq!(option["color"].as_array().unwrap().len(), 11);
        assert_eq!(option["grid"]["bottom"], json!("60"));
    }

    #[test]
    fn bar_series_skip_column_id() {
        let option = build_for(ChartKind::Bar, &result_set(DataType::String, 6));
        let series = &option["series"][0];
        assert_eq!(series["type"], json!("bar"));
        assert_eq!(series["barMaxWidth"], json!(32));
        assert!(series.get("columnId").is_none());
        assert_eq!(option["tooltip"]["axisPointer"]["type"], json!("shadow"));
    }

    #[test]
    fn hbar_puts_categories_on_inverted_y_axis() {
        let option = build_for(ChartKind::Hbar, &result_set(DataType::String, 4));
        assert_eq!(option["yAxis"]["data"], json!(["c0", "c1", "c2", "c3"]));
        assert_eq!(option["yAxis"]["inverse"], json!(true));
        assert_eq!(option["yAxis"]["nameLocation"], json!("start"));
        assert!(option["xAxis"].get("data").is_none());
        assert_eq!(option["grid"]["right"], json!("60"));
        assert_eq!(option["series"][0]["labelLayout"]["hideOverlap"], json!(true));
    }

    #[test]
    fn many_categories_attach_a_slider() {
        let option = build_for(ChartKind::Bar, &result_set(DataType::String, 11));
        let zoom = &option["dataZoom"][0];
        assert_eq!(zoom["startValue"], json!(0));
        assert_eq!(zoom["endValue"], json!(10));
        assert_eq!(zoom["height"], json!(25));
        // every row is still present
        assert_eq!(option["xAxis"]["data"].as_array().unwrap().len(), 11);

        let option = build_for(ChartKind::Hbar, &result_set(DataType::String, 15));
        let zoom = &option["dataZoom"][0];
        assert_eq!(zoom["yAxisIndex"], json!(0));
        assert_eq!(zoom["startValue"], json!(4));
        assert_eq!(zoom["endValue"], json!(14));

        let option = build_for(ChartKind::Line, &result_set(DataType::Date, 10));
        assert!(option.get("dataZoom").is_none());
    }

    #[test]
    fn tooltip_fragment_per_category() {
        let option = build_for(ChartKind::Line, &result_set(DataType::Date, 2));
        let fragments = option["tooltip"]["formatterHtml"].as_array().unwrap();
        assert_eq!(fragments.len(), 2);
        let second = fragments[1].as_str().unwrap();
        assert!(second.starts_with("<div>c1</div>"));
        assert!(second.contains("#4687F7"));
        assert!(second.contains("#48D7F1"));
        assert!(second.contains(">1,000</div>"));
        assert_eq!(option["tooltip"]["trigger"], json!("axis"));
    }

    #[test]
    fn empty_rows_yield_empty_arrays() {
        let option = build_for(ChartKind::Bar, &result_set(DataType::String, 0));
        assert_eq!(option["xAxis"]["data"], json!([]));
        assert_eq!(option["series"][0]["data"], json!([]));
        assert_eq!(option["tooltip"]["formatterHtml"], json!([]));
    }
}
