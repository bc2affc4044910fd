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

use thiserror::Error;
#[derive(Error, Debug)]
pub enum EaselError {
    #[error("Value formatting error: {0}")]
    Format(#[from] FormatError),
    #[error("Result set error: {0}")]
    Data(#[from] DataError),
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Serialisation error: {0}")]
    Serialisation(#[from] SerialisationError),
}
/// Failures inside the value formatter. These never escape
/// [`crate::format::ValueFormatter::format`]; they are logged and the raw
/// value is shown instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("Failed to parse format options '{blob}': {reason}")]
    InvalidOptions { blob: String, reason: String },
    #[error("Failed to parse per-level expressions: {reason}")]
    InvalidLevels { reason: String },
    #[error("numberLevels must be sorted ascending, got {levels:?}")]
    UnsortedNumberLevels { levels: Vec<u32> },
    #[error("No expression configured for magnitude level {level} ({available} available)")]
    MissingLevel { level: usize, available: usize },
    #[error("Format expression is {len} characters long, limit is {limit}")]
    ExpressionTooLong { len: usize, limit: usize },
    #[error("Failed to compile format expression '{expression}': {reason}")]
    Compile { expression: String, reason: String },
    #[error("Failed to evaluate format expression '{expression}': {reason}")]
    Evaluation { expression: String, reason: String },
    #[error("Format expression '{expression}' produced an unsupported {kind} value")]
    UnsupportedResult { expression: String, kind: String },
}
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Column '{column}' not found in result set")]
    ColumnNotFound { column: String },
    #[error("Result set declares no {role} column, cannot draw a {kind} chart")]
    MissingRole { role: String, kind: String },
    #[error("Parsing error: {0}")]
    Parsing(String),
    #[error("Failed to read result set file '{path}': {source}")]
    ResultSetFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{role} column '{column}' does not exist in the column list")]
    MissingColumn { column: String, role: String },
    #[error("Column '{column}' is declared both as a dimension and as a measure")]
    DuplicateRole { column: String },
}
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse template YAML: {source}")]
    TemplateParse {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("Template section '{section}' must be a mapping")]
    TemplateShape { section: String },
    #[error("Invalid zoom settings: {reason}")]
    InvalidZoom { reason: String },
    #[error("Unknown chart kind '{name}'")]
    UnknownChartKind { name: String },
    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },
}
#[derive(Error, Debug)]
pub enum SerialisationError {
    #[error("JSON serialisation failed: {source}")]
    JsonSerialisationError {
        #[from]
        source: serde_json::Error,
    },
}
pub type Result<T> = std::result::Result<T, EaselError>;
pub type FormatResult<T> = std::result::Result<T, FormatError>;
pub type DataResult<T> = std::result::Result<T, DataError>;
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
impl From<anyhow::Error> for EaselError {
    fn from(err: anyhow::Error) -> Self {
        EaselError::Config(ConfigError::ValidationFailed {
            reason: format!("{err:#}"),
        })
    }
}
impl From<serde_json::Error> for EaselError {
    fn from(err: serde_json::Error) -> Self {
        EaselError::Serialisation(SerialisationError::JsonSerialisationError { source: err })
    }
}
impl EaselError {
    pub fn category(&self) -> &'static str {
        match self {
            EaselError::Format(_) => "Format",
            EaselError::Data(_) => "Data",
            EaselError::Validation(_) => "Validation",
            EaselError::Config(_) => "Configuration",
            EaselError::Serialisation(_) => "Serialisation",
        }
    }
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            EaselError::Data(DataError::ColumnNotFound { .. })
            | EaselError::Validation(ValidationError::MissingColumn { .. }) => vec![
                "Check that every dimCols/measureCols id has a matching columnList guid".to_string(),
                "Regenerate the result set from the query layer".to_string(),
            ],
            EaselError::Validation(ValidationError::DuplicateRole { .. }) => vec![
                "A column can be a dimension or a measure, not both".to_string(),
            ],
            EaselError::Format(_) => vec![
                "Check the format spec: '<options json>|<expression>'".to_string(),
                "numberLevels must be ascending when numberLevelType is 1".to_string(),
            ],
            EaselError::Config(ConfigError::UnknownChartKind { .. }) => vec![
                "Valid kinds: line, bar, hbar, pie, table, kpiGroup".to_string(),
            ],
            EaselError::Config(_) => vec![
                "Verify the template YAML has common, zoom and per-family sections".to_string(),
            ],
            _ => vec!["Check the error message for specific guidance".to_string()],
        }
    }
}
pub mod utils {
    use super::*;
    pub fn error_severity(error: &EaselError) -> ErrorSeverity {
        match error {
            EaselError::Format(_) => ErrorSeverity::Warning,
            EaselError::Data(_) | EaselError::Validation(_) => ErrorSeverity::Error,
            EaselError::Config(_) => ErrorSeverity::Critical,
            EaselError::Serialisation(_) => ErrorSeverity::Error,
        }
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Warning,
    Error,
    Critical,
}
impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Warning => "WARNING",
            ErrorSeverity::Error => "ERROR",
            ErrorSeverity::Critical => "CRITICAL",
        }
    }
    pub fn color_code(&self) -> &'static str {
        match self {
            ErrorSeverity::Warning => "\x1b[33m",
            ErrorSeverity::Error => "\x1b[31m",
            ErrorSeverity::Critical => "\x1b[35m",
        }
    }
}
pub struct ErrorReporter {
    pub show_suggestions: bool,
    pub colored_output: bool,
}
impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            show_suggestions: true,
            colored_output: true,
        }
    }
    pub fn plain() -> Self {
        Self {
            show_suggestions: true,
            colored_output: false,
        }
    }
    pub fn report(&self, error: &EaselError) -> String {
        let severity = utils::error_severity(error);
        let mut output = String::new();
        if self.colored_output {
            output.push_str(severity.color_code());
        }
        output.push_str(&format!(
            "[{}] {}: {}\n",
            severity.as_str(),
            error.category(),
            error
        ));
        if self.colored_output {
            output.push_str("\x1b[0m");
        }
        if self.show_suggestions {
            let suggestions = error.suggestions();
            if !suggestions.is_empty() {
                output.push_str("\nSuggestions:\n");
                for suggestion in suggestions {
                    output.push_str(&format!("  • {suggestion}\n"));
                }
            }
        }
        output
    }
}
impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
