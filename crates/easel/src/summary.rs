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

//! Human-readable description of the query behind a result set.

use crate::model::{Filter, ResultSet};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static FORMULA_WRAPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$\{|\}$").expect("formula wrapper pattern is valid"));

const OR_JOINER: &str = " or ";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySummary {
    pub dimensions: Vec<String>,
    pub measures: Vec<String>,
    pub filters: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

pub fn summarize(result_set: &ResultSet) -> QuerySummary {
    let names = |ids: &[String]| -> Vec<String> {
        ids.iter()
            .map(|id| {
                result_set
                    .column(id)
                    .map_or_else(|| id.clone(), |column| column.name.clone())
            })
            .collect()
    };
    QuerySummary {
        dimensions: names(&result_set.dim_cols),
        measures: names(&result_set.measure_cols),
        filters: result_set.filters.iter().map(filter_display).collect(),
        formula: result_set
            .overwrite_calc
            .as_deref()
            .filter(|calc| !calc.is_empty())
            .map(|calc| formula_display(calc, &result_set.overwrite_source)),
    }
}

/// `${a}/${b}` with `{a: Sales, b: Orders}` reads ` Sales / Orders `.
pub fn formula_display(calc: &str, source: &BTreeMap<String, String>) -> String {
    let mut display = FORMULA_WRAPPER.replace_all(calc, "").into_owned();
    for (key, label) in source {
        if key.is_empty() {
            continue;
        }
        display = display.replace(key.as_str(), &format!(" {label} "));
    }
    display
}

/// `name(optName value)`; an OR group lists its members.
pub fn filter_display(filter: &Filter) -> String {
    if filter.is_or_group() && !filter.sub_filters.is_empty() {
        return filter
            .sub_filters
            .iter()
            .map(filter_display)
            .collect::<Vec<_>>()
            .join(OR_JOINER);
    }
    let value = filter.val.as_deref().unwrap_or_default().trim_matches('%');
    format!("{}({}{})", filter.name, filter.opt_name, value)
}
