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

//! Result-set model as delivered by the query layer.

use crate::error::{DataError, DataResult, ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

/// One data row: column id -> raw cell value. A missing key is "undefined".
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    Date,
    Number,
    String,
    Other(String),
}
impl DataType {
    pub fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date)
    }
}
impl From<String> for DataType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "DATE" => DataType::Date,
            "NUMBER" => DataType::Number,
            "STRING" => DataType::String,
            _ => DataType::Other(value),
        }
    }
}
impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        match value {
            DataType::Date => "DATE".to_string(),
            DataType::Number => "NUMBER".to_string(),
            DataType::String => "STRING".to_string(),
            DataType::Other(other) => other,
        }
    }
}
impl Default for DataType {
    fn default() -> Self {
        DataType::String
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    #[serde(rename = "guid", alias = "id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub data_type: DataType,
    /// Non-null when the column carries a meaningful ranking.
    #[serde(default)]
    pub order: Option<f64>,
    /// Legacy identifier kept by older query results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<String>,
}
impl Column {
    pub fn new(id: &str, name: &str, data_type: DataType) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            data_type,
            order: None,
            col: None,
        }
    }
    /// Key used to address this column in a row: the id, or the legacy
    /// `col` field when the id is empty.
    pub fn key(&self) -> &str {
        if self.id.is_empty() {
            self.col.as_deref().unwrap_or_default()
        } else {
            &self.id
        }
    }
    pub fn matches(&self, reference: &str) -> bool {
        self.id == reference || self.col.as_deref() == Some(reference)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub opt_name: String,
    #[serde(default)]
    pub val: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_filters: Vec<Filter>,
}
impl Filter {
    pub fn is_or_group(&self) -> bool {
        self.operator.as_deref() == Some("OR")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    #[serde(default)]
    pub column_list: Vec<Column>,
    #[serde(default)]
    pub data_list: Vec<Row>,
    #[serde(default)]
    pub dim_cols: Vec<String>,
    #[serde(default)]
    pub measure_cols: Vec<String>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite_calc: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overwrite_source: BTreeMap<String, String>,
}
impl ResultSet {
    pub fn from_json_str(json: &str) -> DataResult<Self> {
        serde_json::from_str(json).map_err(|e| DataError::Parsing(e.to_string()))
    }
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> DataResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|source| {
            DataError::ResultSetFile {
                path: path.as_ref().display().to_string(),
                source,
            }
        })?;
        Self::from_json_str(&content)
    }
    pub fn column(&self, reference: &str) -> Option<&Column> {
        self.column_list.iter().find(|c| c.matches(reference))
    }
    pub fn require_column(&self, reference: &str) -> DataResult<&Column> {
        self.column(reference)
            .ok_or_else(|| DataError::ColumnNotFound {
                column: reference.to_string(),
            })
    }
    pub fn row_count(&self) -> usize {
        self.data_list.len()
    }
    /// True when the result has the single-dimension shape every chart
    /// family needs.
    pub fn has_chart_shape(&self) -> bool {
        self.dim_cols.len() == 1 && !self.measure_cols.is_empty() && self.data_list.len() > 1
    }
    pub fn has_computed_metric(&self) -> bool {
        self.overwrite_calc
            .as_deref()
            .is_some_and(|calc| !calc.is_empty())
    }
    pub fn validate(&self) -> ValidationResult<()> {
        for (role, ids) in [("Dimension", &self.dim_cols), ("Measure", &self.measure_cols)] {
            if let Some(missing) = ids.iter().find(|id| self.column(id).is_none()) {
                return Err(ValidationError::MissingColumn {
                    column: missing.clone(),
                    role: role.to_string(),
                });
            }
        }
        let dims: HashSet<&str> = self.dim_cols.iter().map(String::as_str).collect();
        if let Some(both) = self.measure_cols.iter().find(|m| dims.contains(m.as_str())) {
            return Err(ValidationError::DuplicateRole {
                column: both.clone(),
            });
        }
        Ok(())
    }
}

/// Numeric value of a cell the way the query layer means it: JSON numbers,
/// and strings whose trimmed text is a finite number.
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

/// Text used when a raw cell is placed on an axis or in a tooltip header.
pub fn cell_label(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
