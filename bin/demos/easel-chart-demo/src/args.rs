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

use clap::Parser;
use easel::ChartKind;

#[derive(Parser, Debug)]
#[command(
    name = "easel-chart-demo",
    version,
    about = "Pick a visualization for a query result and print its chart configuration"
)]
pub struct Args {
    #[arg(long = "input", help = "Path to the result set JSON")]
    pub input: String,
    #[arg(
        long = "kind",
        help = "Force a kind instead of classifying: line, bar, hbar, pie, table, kpiGroup"
    )]
    pub kind: Option<ChartKind>,
    #[arg(long = "templates", help = "Chart template YAML overriding the built-in one")]
    pub templates: Option<String>,
    #[arg(
        long = "format",
        help = "Value format spec '<options json>|<expression>' (default: two decimals, grouped)"
    )]
    pub format: Option<String>,
    #[arg(
        long = "summary",
        default_value_t = false,
        help = "Also print the query summary and the kinds the user could switch to"
    )]
    pub summary: bool,
    #[arg(long = "pretty", default_value_t = false, help = "Pretty-print the JSON output")]
    pub pretty: bool,
}
