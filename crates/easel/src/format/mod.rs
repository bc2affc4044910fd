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

pub mod config;
pub mod expression;

pub use config::{FormatOptions, FormatSpec, DEFAULT_FORMAT_SPEC};
pub use expression::{Evaluated, FormatExpression};

use crate::error::{FormatError, FormatResult};
use crate::model::{numeric_value, Row};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

pub const EMPTY_DISPLAY: &str = "-";
/// Suffix of display twins written by older producers; such keys are not data.
const LEGACY_TWIN_SUFFIX: &str = "_format";

/// A raw row plus its display projection. The raw row is never modified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedRow {
    pub raw: Row,
    pub display: BTreeMap<String, String>,
}
impl FormattedRow {
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }
    pub fn raw_or_null(&self, key: &str) -> Value {
        self.raw.get(key).cloned().unwrap_or(Value::Null)
    }
    pub fn display(&self, key: &str) -> &str {
        self.display.get(key).map_or(EMPTY_DISPLAY, String::as_str)
    }
}

#[derive(Debug)]
enum FormatPlan {
    Single(FormatExpression),
    Levelled(Vec<FormatExpression>),
}

/// Turns raw cell values into display strings.
///
/// A malformed format spec does not fail construction through
/// [`ValueFormatter::from_spec`]: the formatter then shows every numeric
/// value as its raw text and logs why.
#[derive(Debug)]
pub struct ValueFormatter {
    options: FormatOptions,
    plan: FormatResult<FormatPlan>,
}
impl ValueFormatter {
    pub fn new() -> Self {
        Self::from_spec(DEFAULT_FORMAT_SPEC)
    }
    pub fn from_spec(spec: &str) -> Self {
        match Self::try_from_spec(spec) {
            Ok(formatter) => formatter,
            Err(err) => {
                warn!(error = %err, spec, "invalid format spec, numeric values will show raw");
                let options = FormatSpec::parse(spec).map(|s| s.options).unwrap_or_default();
                Self {
                    options,
                    plan: Err(err),
                }
            }
        }
    }
    pub fn try_from_spec(spec: &str) -> FormatResult<Self> {
        let parsed = FormatSpec::parse(spec)?;
        let plan = if parsed.options.is_levelled() {
            let levels = parsed
                .level_expressions()?
                .iter()
                .map(|source| FormatExpression::compile(source))
                .collect::<FormatResult<Vec<_>>>()?;
            FormatPlan::Levelled(levels)
        } else {
            FormatPlan::Single(FormatExpression::compile(&parsed.expression)?)
        };
        Ok(Self {
            options: parsed.options,
            plan: Ok(plan),
        })
    }
    /// Display text for one cell; `None` is a missing key.
    pub fn format(&self, value: Option<&Value>) -> String {
        let Some(value) = value else {
            return EMPTY_DISPLAY.to_string();
        };
        match value {
            Value::Null => EMPTY_DISPLAY.to_string(),
            Value::Number(n) => match n.as_f64() {
                Some(f) => self.format_number(f, &n.to_string()),
                None => n.to_string(),
            },
            Value::String(s) => match numeric_value(value) {
                Some(f) => self.format_number(f, s.trim()),
                None => s.clone(),
            },
            other => other.to_string(),
        }
    }
    pub fn format_number(&self, value: f64, raw_text: &str) -> String {
        match self.evaluate(value, raw_text) {
            Ok(text) if self.options.strips_zeros() => trim_fraction_zeros(&text),
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, value = raw_text, "format expression failed, showing raw value");
                if self.options.strips_zeros() {
                    trim_fraction_zeros(raw_text)
                } else {
                    raw_text.to_string()
                }
            }
        }
    }
    pub fn format_row(&self, row: &Row) -> FormattedRow {
        let display = row
            .iter()
            .filter(|(key, _)| !key.ends_with(LEGACY_TWIN_SUFFIX))
            .map(|(key, value)| (key.clone(), self.format(Some(value))))
            .collect();
        FormattedRow {
            raw: row.clone(),
            display,
        }
    }
    pub fn format_rows(&self, rows: &[Row]) -> Vec<FormattedRow> {
        rows.iter().map(|row| self.format_row(row)).collect()
    }
    fn evaluate(&self, value: f64, raw_text: &str) -> FormatResult<String> {
        let plan = self.plan.as_ref().map_err(Clone::clone)?;
        let compiled = match plan {
            FormatPlan::Single(single) => single,
            FormatPlan::Levelled(levels) => {
                let level = config::level_index(&self.options.number_levels, value);
                levels.get(level).ok_or(FormatError::MissingLevel {
                    level,
                    available: levels.len(),
                })?
            }
        };
        if self.options.scale_decimals {
            let decimals = config::fraction_digits(raw_text);
            if decimals > 0 {
                let factor = 10f64.powi(i32::try_from(decimals).unwrap_or(i32::MAX));
                if let Evaluated::Number(scaled) = compiled.evaluate(value * factor)? {
                    return Ok(expression::number_text(scaled / factor));
                }
            }
        }
        Ok(compiled.evaluate(value)?.into_text())
    }
}
impl Default for ValueFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Drops trailing zeros of the fraction's leading digit run and re-appends
/// the fraction's unit characters (`"12.50k"` -> `"12.5k"`, `"3.00"` -> `"3"`).
pub fn trim_fraction_zeros(text: &str) -> String {
    let Some((integer, fraction)) = text.split_once('.') else {
        return text.to_string();
    };
    if fraction.is_empty() {
        return text.to_string();
    }
    let digits: String = fraction.chars().take_while(char::is_ascii_digit).collect();
    let unit: String = fraction
        .chars()
        .filter(|c| !c.is_ascii_digit() && !c.is_whitespace())
        .collect();
    let kept = digits.trim_end_matches('0');
    if kept.is_empty() {
        format!("{integer}{unit}")
    } else {
        format!("{integer}.{kept}{unit}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn nulls_and_missing_values_render_as_dash() {
        let f = ValueFormatter::new();
        assert_eq!(f.format(None), "-");
        assert_eq!(f.format(Some(&Value::Null)), "-");
    }

    #[test]
    fn non_numeric_text_passes_through() {
        let f = ValueFormatter::new();
        assert_eq!(f.format(Some(&json!("2024-01"))), "2024-01");
        assert_eq!(f.format(Some(&json!("-"))), "-");
        assert_eq!(f.format(Some(&json!(true))), "true");
    }

    #[test]
    fn default_format_groups_and_trims() {
        let f = ValueFormatter::new();
        assert_eq!(f.format(Some(&json!(1234.5))), "1,234.5");
        assert_eq!(f.format(Some(&json!(10))), "10");
        assert_eq!(f.format(Some(&json!(1234567))), "1,234,567");
        assert_eq!(f.format(Some(&json!(0.126))), "0.13");
        assert_eq!(f.format(Some(&json!("42.10"))), "42.1");
        assert_eq!(f.format(Some(&json!(-9876.543))), "-9,876.54");
    }

    #[test]
    fn default_format_matches_half_up_rounding_for_negatives() {
        let f = ValueFormatter::new();
        assert_eq!(f.format(Some(&json!(-1.125))), "-1.12");
        assert_eq!(f.format(Some(&json!(1.125))), "1.13");
        assert_eq!(f.format(Some(&json!(-0.001))), "0");
        assert_eq!(f.format(Some(&json!(-0.004))), "0");
        assert_eq!(f.format(Some(&json!(-0.006))), "-0.01");
    }

    #[test]
    fn fill_zero_keeps_trailing_zeros() {
        let f = ValueFormatter::from_spec(r#"{"fillZero":true}|fixed(v, 2)"#);
        assert_eq!(f.format(Some(&json!(3))), "3.00");
        let f = ValueFormatter::from_spec("fixed(v, 2)");
        assert_eq!(f.format(Some(&json!(3))), "3.00");
    }

    #[test]
    fn trailing_unit_survives_zero_trimming() {
        let f = ValueFormatter::from_spec(r#"{"fillZero":false}|suffix(v, 1000, "k", 2)"#);
        assert_eq!(f.format(Some(&json!(12500))), "12.5k");
        assert_eq!(f.format(Some(&json!(12000))), "12k");
        let f = ValueFormatter::from_spec(r#"{"fillZero":false}|percent(v, 2)"#);
        assert_eq!(f.format(Some(&json!(0.5))), "50%");
    }

    #[test]
    fn magnitude_levels_pick_expression_by_digit_count() {
        let f = ValueFormatter::from_spec(
            r#"{"numberLevelType":1,"numberLevels":[4,7],"fillZero":false}|["fixed(v, 0)", "suffix(v, 1000000, \"M\", 1)"]"#,
        );
        assert_eq!(f.format(Some(&json!(12000))), "12000");
        assert_eq!(f.format(Some(&json!(1234))), "1234");
        assert_eq!(f.format(Some(&json!(2500000))), "2.5M");
        assert_eq!(f.format(Some(&json!(12))), "12");
    }

    #[test]
    fn missing_level_falls_back_to_raw() {
        let f = ValueFormatter::from_spec(
            r#"{"numberLevelType":1,"numberLevels":[1,4]}|["fixed(v, 1)"]"#,
        );
        assert_eq!(f.format(Some(&json!(5))), "5.0");
        assert_eq!(f.format(Some(&json!(12345))), "12345");
    }

    #[test]
    fn malformed_specs_fall_back_to_raw_text() {
        let f = ValueFormatter::from_spec("{not json|fixed(v, 2)");
        assert_eq!(f.format(Some(&json!(1.5))), "1.5");
        let f = ValueFormatter::from_spec("fixed(v,");
        assert_eq!(f.format(Some(&json!(7))), "7");
        assert!(ValueFormatter::try_from_spec("fixed(v,").is_err());
        let f = ValueFormatter::from_spec("suffix(v, 0, \"k\", 1)");
        assert_eq!(f.format(Some(&json!(" 7.25 "))), "7.25");
    }

    #[test]
    fn raw_fallback_still_strips_zeros_when_asked() {
        let f = ValueFormatter::from_spec(r#"{"fillZero":false}|suffix(v, 0, "k", 1)"#);
        assert_eq!(f.format(Some(&json!("42.10"))), "42.1");
        assert_eq!(f.format(Some(&json!("7.00"))), "7");
        let f = ValueFormatter::from_spec(r#"{"fillZero":true}|suffix(v, 0, "k", 1)"#);
        assert_eq!(f.format(Some(&json!("42.10"))), "42.10");
    }

    #[test]
    fn decimal_scaling_is_opt_in() {
        let f = ValueFormatter::from_spec(r#"{"scaleDecimals":true}|v * 3"#);
        assert_eq!(f.format(Some(&json!(0.1))), "0.3");
        let f = ValueFormatter::from_spec("v * 3");
        assert_eq!(f.format(Some(&json!(0.1))), "0.30000000000000004");
        let f = ValueFormatter::from_spec(r#"{"scaleDecimals":true}|fixed(v, 1)"#);
        assert_eq!(f.format(Some(&json!(0.26))), "0.3");
    }

    #[test]
    fn trim_fraction_zeros_cases() {
        assert_eq!(trim_fraction_zeros("1,234.50"), "1,234.5");
        assert_eq!(trim_fraction_zeros("3.00"), "3");
        assert_eq!(trim_fraction_zeros("12.30 k"), "12.3k");
        assert_eq!(trim_fraction_zeros("12."), "12.");
        assert_eq!(trim_fraction_zeros("12"), "12");
        assert_eq!(trim_fraction_zeros("0.05%"), "0.05%");
    }

    #[test]
    fn format_row_skips_legacy_twins_and_keeps_raw() {
        let f = ValueFormatter::new();
        let raw = row(json!({"d": "2024-01", "m": 1500, "m_format": "stale", "n": null}));
        let formatted = f.format_row(&raw);
        assert_eq!(formatted.raw, raw);
        assert_eq!(formatted.display("m"), "1,500");
        assert_eq!(formatted.display("d"), "2024-01");
        assert_eq!(formatted.display("n"), "-");
        assert_eq!(formatted.display("absent"), "-");
        assert!(!formatted.display.contains_key("m_format"));
    }

    #[test]
    fn formatting_twice_is_idempotent() {
        let f = ValueFormatter::new();
        let rows = vec![row(json!({"a": 1.005, "b": "x"})), row(json!({"a": 99999}))];
        let once = f.format_rows(&rows);
        let again: Vec<_> = once.iter().map(|r| f.format_row(&r.raw)).collect();
        assert_eq!(once, again);
    }
}
