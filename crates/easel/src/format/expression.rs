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

//! Sandboxed numeric format expressions.
//!
//! Expressions are `evalexpr` source over the single variable `v`. Besides
//! evalexpr's arithmetic and builtins (`round`, `floor`, `math::abs`, ...)
//! the sandbox registers a closed set of formatting helpers:
//!
//! * `fixed(x, d)` - `x` with exactly `d` decimals
//! * `thousands(x)` - comma-grouped integer part of `x` (number or text)
//! * `percent(x, d)` - `x * 100` with `d` decimals and a `%` suffix
//! * `suffix(x, divisor, unit, d)` - `x / divisor` with `d` decimals and `unit`
//!
//! There is no host access and no looping construct, so evaluation time is
//! bounded by the expression length, which is capped.

use crate::error::{FormatError, FormatResult};
use evalexpr::{
    build_operator_tree, ContextWithMutableFunctions, ContextWithMutableVariables,
    DefaultNumericTypes, EvalexprError, Function, HashMapContext, Node, Value,
};

pub const MAX_EXPRESSION_LEN: usize = 4096;
const MAX_DECIMALS: f64 = 20.0;
const VALUE_VARIABLE: &str = "v";

/// Result of evaluating a format expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    Number(f64),
    Text(String),
}
impl Evaluated {
    pub fn into_text(self) -> String {
        match self {
            Evaluated::Number(n) => number_text(n),
            Evaluated::Text(t) => t,
        }
    }
}

#[derive(Debug)]
pub struct FormatExpression {
    source: String,
    node: Node,
}
impl FormatExpression {
    pub fn compile(source: &str) -> FormatResult<Self> {
        if source.len() > MAX_EXPRESSION_LEN {
            return Err(FormatError::ExpressionTooLong {
                len: source.len(),
                limit: MAX_EXPRESSION_LEN,
            });
        }
        let node: Node = build_operator_tree(source).map_err(|e| FormatError::Compile {
            expression: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            node,
        })
    }
    pub fn evaluate(&self, v: f64) -> FormatResult<Evaluated> {
        let context = sandbox(v).map_err(|e| self.evaluation_error(&e))?;
        let value = self
            .node
            .eval_with_context(&context)
            .map_err(|e| self.evaluation_error(&e))?;
        match value {
            Value::Float(f) => Ok(Evaluated::Number(f)),
            Value::Int(i) => Ok(Evaluated::Number(i as f64)),
            Value::String(s) => Ok(Evaluated::Text(s)),
            Value::Boolean(b) => Ok(Evaluated::Text(b.to_string())),
            other => Err(FormatError::UnsupportedResult {
                expression: self.source.clone(),
                kind: format!("{other:?}"),
            }),
        }
    }
    fn evaluation_error(&self, err: &EvalexprError) -> FormatError {
        FormatError::Evaluation {
            expression: self.source.clone(),
            reason: err.to_string(),
        }
    }
}

fn sandbox(v: f64) -> Result<HashMapContext, EvalexprError> {
    let mut context = HashMapContext::new();
    context.set_value(VALUE_VARIABLE.to_string(), Value::Float(v))?;
    context.set_function("fixed".to_string(), fixed())?;
    context.set_function("thousands".to_string(), thousands())?;
    context.set_function("percent".to_string(), percent())?;
    context.set_function("suffix".to_string(), suffix())?;
    Ok(context)
}

fn fixed() -> Function<DefaultNumericTypes> {
    Function::new(|argument: &Value| {
        let args = argument.as_fixed_len_tuple(2)?;
        let x = number_arg(&args[0])?;
        let decimals = decimals_arg(&args[1])?;
        // -0 prints unsigned
        let x = if x == 0.0 { 0.0 } else { x };
        Ok(Value::String(format!("{x:.decimals$}")))
    })
}

fn thousands() -> Function<DefaultNumericTypes> {
    Function::new(|argument: &Value| {
        let text = match argument {
            Value::String(s) => s.clone(),
            other => number_text(number_arg(other)?),
        };
        Ok(Value::String(group_thousands(&text)))
    })
}

fn percent() -> Function<DefaultNumericTypes> {
    Function::new(|argument: &Value| {
        let args = argument.as_fixed_len_tuple(2)?;
        let x = number_arg(&args[0])? * 100.0;
        let decimals = decimals_arg(&args[1])?;
        Ok(Value::String(format!("{x:.decimals$}%")))
    })
}

fn suffix() -> Function<DefaultNumericTypes> {
    Function::new(|argument: &Value| {
        let args = argument.as_fixed_len_tuple(4)?;
        let x = number_arg(&args[0])?;
        let divisor = number_arg(&args[1])?;
        if divisor == 0.0 {
            return Err(EvalexprError::CustomMessage(
                "suffix divisor must not be zero".to_string(),
            ));
        }
        let unit = match &args[2] {
            Value::String(s) => s.clone(),
            other => {
                return Err(EvalexprError::CustomMessage(format!(
                    "suffix unit must be a string, got {other:?}"
                )))
            }
        };
        let decimals = decimals_arg(&args[3])?;
        Ok(Value::String(format!("{:.decimals$}{unit}", x / divisor)))
    })
}

fn number_arg(value: &Value) -> Result<f64, EvalexprError> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Int(i) => Ok(*i as f64),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            EvalexprError::CustomMessage(format!("expected a number, got '{s}'"))
        }),
        other => Err(EvalexprError::CustomMessage(format!(
            "expected a number, got {other:?}"
        ))),
    }
}

fn decimals_arg(value: &Value) -> Result<usize, EvalexprError> {
    let decimals = number_arg(value)?;
    if !(0.0..=MAX_DECIMALS).contains(&decimals) || decimals.fract() != 0.0 {
        return Err(EvalexprError::CustomMessage(format!(
            "decimal count must be an integer between 0 and {MAX_DECIMALS}, got {decimals}"
        )));
    }
    Ok(decimals as usize)
}

/// Shortest text for a float, without a trailing `.0` on integral values.
pub fn number_text(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    format!("{n}")
}

/// Inserts `,` every three digits of the leading integer run, keeping any
/// sign and everything after the integer part untouched.
pub fn group_thousands(text: &str) -> String {
    let (sign, rest) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    let (integer, tail) = rest.split_at(int_len);
    let mut grouped = String::with_capacity(text.len() + int_len / 3);
    grouped.push_str(sign);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (int_len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped.push_str(tail);
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str, v: f64) -> Evaluated {
        FormatExpression::compile(source).unwrap().evaluate(v).unwrap()
    }

    #[test]
    fn group_thousands_handles_sign_and_fraction() {
        assert_eq!(group_thousands("1234567.891"), "1,234,567.891");
        assert_eq!(group_thousands("-1234"), "-1,234");
        assert_eq!(group_thousands("123"), "123");
        assert_eq!(group_thousands("1000k"), "1,000k");
        assert_eq!(group_thousands(""), "");
    }

    #[test]
    fn number_text_matches_display_conventions() {
        assert_eq!(number_text(10.0), "10");
        assert_eq!(number_text(-0.0), "0");
        assert_eq!(number_text(1.25), "1.25");
        assert_eq!(number_text(f64::INFINITY), "Infinity");
    }

    #[test]
    fn default_expression_rounds_and_groups() {
        let source = "thousands(fixed(floor(v * 100 + 0.5) / 100, 2))";
        assert_eq!(eval(source, 1234.5), Evaluated::Text("1,234.50".into()));
        assert_eq!(eval(source, 10.0), Evaluated::Text("10.00".into()));
        assert_eq!(eval(source, 0.126), Evaluated::Text("0.13".into()));
    }

    #[test]
    fn default_expression_rounds_halves_toward_positive_infinity() {
        let source = "thousands(fixed(floor(v * 100 + 0.5) / 100, 2))";
        assert_eq!(eval(source, 1.125), Evaluated::Text("1.13".into()));
        assert_eq!(eval(source, -1.125), Evaluated::Text("-1.12".into()));
        assert_eq!(eval(source, -0.001), Evaluated::Text("0.00".into()));
    }

    #[test]
    fn fixed_drops_the_sign_of_negative_zero() {
        assert_eq!(eval("fixed(v, 2)", -0.0), Evaluated::Text("0.00".into()));
        assert_eq!(eval("fixed(v * 0, 1)", -3.0), Evaluated::Text("0.0".into()));
        assert_eq!(eval("fixed(v, 2)", -0.001), Evaluated::Text("-0.00".into()));
    }

    #[test]
    fn helpers_cover_percent_and_suffix() {
        assert_eq!(eval("percent(v, 1)", 0.256), Evaluated::Text("25.6%".into()));
        assert_eq!(
            eval("suffix(v, 1000, \"k\", 2)", 12340.0),
            Evaluated::Text("12.34k".into())
        );
        assert_eq!(eval("v * 2", 1.5), Evaluated::Number(3.0));
        assert_eq!(eval("\"~\" + fixed(v, 0)", 7.0), Evaluated::Text("~7".into()));
    }

    #[test]
    fn compile_and_runtime_failures_are_typed() {
        assert!(matches!(
            FormatExpression::compile("fixed(v,"),
            Err(FormatError::Compile { .. })
        ));
        let expr = FormatExpression::compile("suffix(v, 0, \"k\", 1)").unwrap();
        assert!(matches!(expr.evaluate(1.0), Err(FormatError::Evaluation { .. })));
        let expr = FormatExpression::compile("undefined_fn(v)").unwrap();
        assert!(matches!(expr.evaluate(1.0), Err(FormatError::Evaluation { .. })));
    }

    #[test]
    fn oversized_expressions_are_rejected_before_compiling() {
        let long = "v+".repeat(MAX_EXPRESSION_LEN) + "v";
        assert!(matches!(
            FormatExpression::compile(&long),
            Err(FormatError::ExpressionTooLong { .. })
        ));
    }
}
