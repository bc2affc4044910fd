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

use crate::error::{FormatError, FormatResult};
use serde::{Deserialize, Serialize};

/// Two decimals rounded half up, thousand separators, trailing zeros
/// dropped.
pub const DEFAULT_FORMAT_SPEC: &str = r#"{"type":"number","digits":2,"numberLevelType":0,"numberLevels":[],"fillZero":false,"thousandflag":true}|thousands(fixed(floor(v * 100 + 0.5) / 100, 2))"#;

const SPEC_SEPARATOR: char = '|';

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormatOptions {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digits: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thousandflag: Option<bool>,
    /// 1 selects one expression per magnitude level.
    pub number_level_type: u8,
    pub number_levels: Vec<u32>,
    /// Only an explicit `false` strips trailing fraction zeros.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_zero: Option<bool>,
    pub scale_decimals: bool,
}
impl FormatOptions {
    pub fn is_levelled(&self) -> bool {
        self.number_level_type == 1
    }
    pub fn strips_zeros(&self) -> bool {
        self.fill_zero == Some(false)
    }
}

/// A parsed `"<options json>|<expression>"` format spec.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatSpec {
    pub options: FormatOptions,
    pub expression: String,
}
impl FormatSpec {
    pub fn parse(spec: &str) -> FormatResult<Self> {
        let trimmed = spec.trim();
        let (blob, expression) = match trimmed.split_once(SPEC_SEPARATOR) {
            Some((blob, expression)) if trimmed.starts_with('{') => (blob, expression),
            _ => ("{}", trimmed),
        };
        let options: FormatOptions =
            serde_json::from_str(blob).map_err(|e| FormatError::InvalidOptions {
                blob: blob.to_string(),
                reason: e.to_string(),
            })?;
        if options.is_levelled() && options.number_levels.windows(2).any(|w| w[0] > w[1]) {
            return Err(FormatError::UnsortedNumberLevels {
                levels: options.number_levels.clone(),
            });
        }
        Ok(Self {
            options,
            expression: expression.trim().to_string(),
        })
    }
    /// Expression sources in level order; a single entry unless levelled.
    pub fn level_expressions(&self) -> FormatResult<Vec<String>> {
        if !self.options.is_levelled() {
            return Ok(vec![self.expression.clone()]);
        }
        let levels: Vec<String> =
            serde_json::from_str(&self.expression).map_err(|e| FormatError::InvalidLevels {
                reason: e.to_string(),
            })?;
        if levels.is_empty() {
            return Err(FormatError::InvalidLevels {
                reason: "expression array is empty".to_string(),
            });
        }
        Ok(levels)
    }
}
impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            options: FormatOptions {
                kind: Some("number".to_string()),
                digits: Some(2),
                thousandflag: Some(true),
                number_level_type: 0,
                number_levels: Vec::new(),
                fill_zero: Some(false),
                scale_decimals: false,
            },
            expression: "thousands(fixed(floor(v * 100 + 0.5) / 100, 2))".to_string(),
        }
    }
}

/// Number of digits before the decimal point of `abs(value)`.
pub fn integer_digits(value: f64) -> usize {
    let magnitude = value.abs().trunc();
    if magnitude < 1.0 {
        return 1;
    }
    format!("{magnitude:.0}").len()
}

/// Index of the last threshold satisfying `digits + 1 > threshold`, or 0.
pub fn level_index(levels: &[u32], value: f64) -> usize {
    let digits = integer_digits(value);
    levels
        .iter()
        .rposition(|&threshold| digits + 1 > threshold as usize)
        .unwrap_or(0)
}

/// Count of digits after the decimal point in the textual form of a value.
pub fn fraction_digits(raw_text: &str) -> usize {
    raw_text
        .split_once('.')
        .map_or(0, |(_, fraction)| {
            fraction.chars().take_while(char::is_ascii_digit).count()
        })
}
