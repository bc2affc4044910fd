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

//! Table and KPI projections for results that are not drawn as charts.

use crate::format::{FormattedRow, EMPTY_DISPLAY};
use crate::model::{Column, Row};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const ROW_KEY: &str = "key";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    pub title: String,
    pub data_index: String,
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableProjection {
    pub column_list: Vec<TableColumn>,
    pub data_list: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiCard {
    pub label: String,
    pub value: Value,
    pub show_value: String,
}

/// Column headers keyed by column id, and the raw rows stamped with their
/// zero-based index under `key`.
pub fn project_table(columns: &[Column], rows: &[FormattedRow]) -> TableProjection {
    let column_list = columns
        .iter()
        .map(|column| {
            let key = column.key().to_string();
            TableColumn {
                title: column.name.clone(),
                data_index: key.clone(),
                key,
            }
        })
        .collect();
    let data_list = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let mut raw = row.raw.clone();
            raw.insert(ROW_KEY.to_string(), json!(index));
            raw
        })
        .collect();
    TableProjection {
        column_list,
        data_list,
    }
}

/// One card per column, read from the first row only.
pub fn project_kpis(columns: &[Column], rows: &[FormattedRow]) -> Vec<KpiCard> {
    let first = rows.first();
    columns
        .iter()
        .map(|column| {
            let key = column.key();
            KpiCard {
                label: column.name.clone(),
                value: first.map_or(Value::Null, |row| row.raw_or_null(key)),
                show_value: first
                    .map_or(EMPTY_DISPLAY, |row| row.display(key))
                    .to_string(),
            }
        })
        .collect()
}
