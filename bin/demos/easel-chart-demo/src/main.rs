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

mod args;

use anyhow::Result;
use args::Args;
use clap::Parser;
use easel::{ChartEngine, EaselError, ErrorReporter, ResultSet};
use serde_json::json;
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            match err.downcast_ref::<EaselError>() {
                Some(easel_err) => {
                    let reporter = if std::io::stderr().is_terminal() {
                        ErrorReporter::new()
                    } else {
                        ErrorReporter::plain()
                    };
                    eprint!("{}", reporter.report(easel_err));
                }
                None => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<String> {
    let engine = ChartEngine::with_config(args.templates.as_deref(), args.format.as_deref())?;
    let result_set = ResultSet::from_json_file(&args.input).map_err(EaselError::from)?;
    info!(
        input = %args.input,
        columns = result_set.column_list.len(),
        rows = result_set.row_count(),
        "loaded result set"
    );

    let output = engine.synthesize(&result_set, args.kind)?;
    info!(chart_type = %output.chart_type, "synthesized chart");
    if !args.summary {
        return Ok(output.to_json(args.pretty)?);
    }

    let report = json!({
        "chart": output,
        "summary": engine.summarize(&result_set),
        "switchableKinds": engine.switchable_kinds(&result_set),
    });
    let text = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    Ok(text)
}
