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

use crate::error::{ConfigError, DataResult};
use crate::model::{numeric_value, ResultSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Line,
    Bar,
    Hbar,
    Pie,
    Table,
    KpiGroup,
}
impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::Line,
        ChartKind::Bar,
        ChartKind::Hbar,
        ChartKind::Pie,
        ChartKind::Table,
        ChartKind::KpiGroup,
    ];
    /// Kinds offered to the user when the result has the chart shape.
    pub const SWITCHABLE: [ChartKind; 5] = [
        ChartKind::Line,
        ChartKind::Bar,
        ChartKind::Hbar,
        ChartKind::Pie,
        ChartKind::Table,
    ];
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Hbar => "hbar",
            ChartKind::Pie => "pie",
            ChartKind::Table => "table",
            ChartKind::KpiGroup => "kpiGroup",
        }
    }
}
impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for ChartKind {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownChartKind {
                name: s.to_string(),
            })
    }
}

mod thresholds {
    pub const PIE_MAX_ROWS: usize = 6;
    pub const KPI_MAX_COLUMNS: usize = 8;
}

/// Picks the visualization for a result set. Rules are tried in order and
/// the first match wins.
pub fn classify(result_set: &ResultSet) -> DataResult<ChartKind> {
    let kind = if result_set.has_chart_shape() {
        classify_chart(result_set)?
    } else if result_set.has_computed_metric() {
        ChartKind::KpiGroup
    } else if is_metric_snapshot(result_set) {
        ChartKind::KpiGroup
    } else {
        ChartKind::Table
    };
    debug!(
        kind = %kind,
        rows = result_set.row_count(),
        dims = result_set.dim_cols.len(),
        measures = result_set.measure_cols.len(),
        "classified result set"
    );
    Ok(kind)
}

fn classify_chart(result_set: &ResultSet) -> DataResult<ChartKind> {
    let dimension = result_set.require_column(&result_set.dim_cols[0])?;
    if dimension.data_type.is_temporal() {
        return Ok(ChartKind::Line);
    }
    let first_measure = result_set.require_column(&result_set.measure_cols[0])?;
    if first_measure.order.is_some() {
        return Ok(ChartKind::Hbar);
    }
    if result_set.row_count() < thresholds::PIE_MAX_ROWS {
        Ok(ChartKind::Pie)
    } else {
        Ok(ChartKind::Bar)
    }
}

/// One row, at most eight columns, and every column value is numeric. A
/// JSON `null` is accepted (it renders as `-` on the card), a missing key is
/// not.
fn is_metric_snapshot(result_set: &ResultSet) -> bool {
    let [row] = result_set.data_list.as_slice() else {
        return false;
    };
    let columns = &result_set.column_list;
    !columns.is_empty()
        && columns.len() <= thresholds::KPI_MAX_COLUMNS
        && columns.iter().all(|column| match row.get(column.key()) {
            Some(Value::Null) => true,
            Some(value) => numeric_value(value).is_some(),
            None => false,
        })
}

/// Kinds the user may switch between; empty when only one view makes sense.
pub fn switchable_kinds(result_set: &ResultSet) -> Vec<ChartKind> {
    if result_set.has_chart_shape() {
        ChartKind::SWITCHABLE.to_vec()
    } else {
        Vec::new()
    }
}
