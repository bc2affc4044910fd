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

pub mod classifier;
pub mod error;
pub mod format;
pub mod model;
pub mod options;
pub mod projection;
pub mod summary;
pub mod templates;

pub use classifier::{classify, switchable_kinds, ChartKind};
pub use error::{
    ConfigError, DataError, EaselError, ErrorReporter, FormatError, Result, ValidationError,
};
pub use format::{FormattedRow, ValueFormatter, DEFAULT_FORMAT_SPEC};
pub use model::{Column, DataType, Filter, ResultSet, Row};
pub use projection::{KpiCard, TableColumn, TableProjection};
pub use summary::{formula_display, QuerySummary};
pub use templates::{ChartTemplates, ZoomSettings};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// What the front end renders: the chosen kind plus its payload, flattened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOutput {
    pub chart_type: ChartKind,
    #[serde(flatten)]
    pub payload: ChartPayload,
}
impl ChartOutput {
    pub fn option(&self) -> Option<&Value> {
        match &self.payload {
            ChartPayload::Rendering { option } => Some(option),
            _ => None,
        }
    }
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartPayload {
    Rendering { option: Value },
    Table(TableProjection),
    Kpi(KpiGroup),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiGroup {
    pub kpi_list: Vec<KpiCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

pub struct ChartEngine {
    templates: ChartTemplates,
    formatter: ValueFormatter,
}
impl ChartEngine {
    pub fn new() -> Result<Self> {
        Ok(Self {
            templates: ChartTemplates::builtin()?,
            formatter: ValueFormatter::new(),
        })
    }
    /// Loads templates from a YAML file and formats values with `format_spec`.
    /// A malformed spec does not fail here; values then display raw.
    pub fn with_config(templates_path: Option<&str>, format_spec: Option<&str>) -> Result<Self> {
        let templates = match templates_path {
            Some(path) => ChartTemplates::from_yaml_file(path).map_err(|e| {
                EaselError::Config(ConfigError::ValidationFailed {
                    reason: format!("Failed to load chart templates: {e:#}"),
                })
            })?,
            None => ChartTemplates::builtin()?,
        };
        let formatter = format_spec.map_or_else(ValueFormatter::new, ValueFormatter::from_spec);
        Ok(Self {
            templates,
            formatter,
        })
    }
    pub fn templates(&self) -> &ChartTemplates {
        &self.templates
    }
    pub fn classify(&self, result_set: &ResultSet) -> Result<ChartKind> {
        Ok(classifier::classify(result_set)?)
    }
    pub fn format_rows(&self, result_set: &ResultSet) -> Vec<FormattedRow> {
        self.formatter.format_rows(&result_set.data_list)
    }
    pub fn switchable_kinds(&self, result_set: &ResultSet) -> Vec<ChartKind> {
        classifier::switchable_kinds(result_set)
    }
    pub fn summarize(&self, result_set: &ResultSet) -> QuerySummary {
        summary::summarize(result_set)
    }
    /// Validates, formats, classifies (unless `kind` is forced) and builds
    /// the payload for the resulting kind.
    pub fn synthesize(&self, result_set: &ResultSet, kind: Option<ChartKind>) -> Result<ChartOutput> {
        result_set.validate()?;
        let rows = self.format_rows(result_set);
        let chart_type = match kind {
            Some(kind) => kind,
            None => self.classify(result_set)?,
        };
        debug!(chart_type = %chart_type, forced = kind.is_some(), rows = rows.len(), "synthesizing");
        let payload = match chart_type {
            ChartKind::Line | ChartKind::Bar | ChartKind::Hbar | ChartKind::Pie => {
                ChartPayload::Rendering {
                    option: options::build_option(chart_type, &self.templates, result_set, &rows)?,
                }
            }
            ChartKind::Table => {
                ChartPayload::Table(projection::project_table(&result_set.column_list, &rows))
            }
            ChartKind::KpiGroup => ChartPayload::Kpi(KpiGroup {
                kpi_list: projection::project_kpis(&result_set.column_list, &rows),
                formula: result_set
                    .overwrite_calc
                    .as_deref()
                    .filter(|calc| !calc.is_empty())
                    .map(|calc| formula_display(calc, &result_set.overwrite_source)),
            }),
        };
        Ok(ChartOutput {
            chart_type,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine() -> ChartEngine {
        ChartEngine::new().unwrap()
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChartEngine>();
    }

    #[test]
    fn output_flattens_payload_next_to_chart_type() {
        let rs: ResultSet = serde_json::from_value(json!({
            "columnList": [{"guid": "a", "name": "Revenue", "dataType": "NUMBER"}],
            "dataList": [{"a": 1200}],
            "overwriteCalc": "${a*2}",
            "overwriteSource": {"a": "Revenue"}
        }))
        .unwrap();
        let output = engine().synthesize(&rs, None).unwrap();
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(
            value,
            json!({
                "chartType": "kpiGroup",
                "kpiList": [{"label": "Revenue", "value": 1200, "showValue": "1,200"}],
                "formula": " Revenue *2"
            })
        );
        assert!(output.option().is_none());
        assert!(output.to_json(true).unwrap().contains("\n"));
    }

    #[test]
    fn forced_kind_overrides_classifier() {
        let rs: ResultSet = serde_json::from_value(json!({
            "columnList": [
                {"guid": "d", "name": "Month", "dataType": "DATE"},
                {"guid": "m", "name": "Sales", "dataType": "NUMBER"}
            ],
            "dataList": [{"d": "2024-01", "m": 1}, {"d": "2024-02", "m": 2}],
            "dimCols": ["d"],
            "measureCols": ["m"]
        }))
        .unwrap();
        let engine = engine();
        assert_eq!(engine.synthesize(&rs, None).unwrap().chart_type, ChartKind::Line);
        let table = engine.synthesize(&rs, Some(ChartKind::Table)).unwrap();
        assert_eq!(table.chart_type, ChartKind::Table);
        let pie = engine.synthesize(&rs, Some(ChartKind::Pie)).unwrap();
        assert_eq!(pie.option().unwrap()["series"][0]["data"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn structural_errors_fail_fast() {
        let rs = ResultSet {
            dim_cols: vec!["missing".into()],
            measure_cols: vec!["m".into()],
            ..Default::default()
        };
        let err = engine().synthesize(&rs, None).unwrap_err();
        assert!(matches!(
            err,
            EaselError::Validation(ValidationError::MissingColumn { .. })
        ));
    }

    #[test]
    fn forcing_a_chart_without_dimension_is_a_data_error() {
        let rs = ResultSet {
            column_list: vec![Column::new("m", "Sales", DataType::Number)],
            data_list: vec![json!({"m": 1}).as_object().cloned().unwrap()],
            measure_cols: vec!["m".into()],
            ..Default::default()
        };
        let err = engine().synthesize(&rs, Some(ChartKind::Bar)).unwrap_err();
        assert!(matches!(err, EaselError::Data(DataError::MissingRole { .. })));
    }
}
