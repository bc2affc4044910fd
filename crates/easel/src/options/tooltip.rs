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

//! Pre-rendered tooltip HTML. Every interpolated value is escaped.

const FALLBACK_COLOR: &str = "#898E99";

/// One coloured line inside a tooltip.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipRow<'a> {
    pub color: &'a str,
    pub series_name: &'a str,
    pub value: String,
}

pub fn fragment(header: &str, rows: &[TooltipRow<'_>]) -> String {
    let mut html = format!("<div>{}</div>", html_escape(header));
    for row in rows {
        html.push_str(&format!(
            concat!(
                "<div style=\"display: flex; font-size: 12px; margin-top: 3px;align-items: center;gap: 10px\">",
                "<div style=\"width: 10px; height: 10px; border-radius: 50%; background-color: {};\"></div>",
                "<div style=\"color: #6a6a6a\">{}</div>",
                "<div style=\"color: #181818; flex: 1; text-align: end;\">{}</div>",
                "</div>"
            ),
            html_escape(row.color),
            html_escape(row.series_name),
            html_escape(&row.value),
        ));
    }
    html
}

/// Palette colour for the n-th series or slice, cycling.
pub fn palette_color(palette: &[String], index: usize) -> &str {
    if palette.is_empty() {
        return FALLBACK_COLOR;
    }
    &palette[index % palette.len()]
}

/// Share of `value` in `total` as a percentage with two decimals; 0 when
/// the total is 0.
pub fn percent_of(value: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    (value / total * 10_000.0).round() / 100.0
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_has_header_and_one_line_per_row() {
        let html = fragment(
            "2024-01",
            &[
                TooltipRow {
                    color: "#4687F7",
                    series_name: "Sales",
                    value: "1,500".into(),
                },
                TooltipRow {
                    color: "#48D7F1",
                    series_name: "Cost",
                    value: "-".into(),
                },
            ],
        );
        assert!(html.starts_with("<div>2024-01</div><div style=\"display: flex;"));
        assert_eq!(html.matches("border-radius: 50%").count(), 2);
        assert!(html.contains("background-color: #48D7F1;"));
        assert!(html.contains("<div style=\"color: #6a6a6a\">Sales</div>"));
        assert!(html.contains("text-align: end;\">1,500</div>"));
    }

    #[test]
    fn interpolated_text_is_escaped() {
        let html = fragment(
            "<b>A&B</b>",
            &[TooltipRow {
                color: "red",
                series_name: "it's \"x\"",
                value: "<1".into(),
            }],
        );
        assert!(html.starts_with("<div>&lt;b&gt;A&amp;B&lt;/b&gt;</div>"));
        assert!(html.contains("it&#39;s &quot;x&quot;"));
        assert!(html.contains("&lt;1"));
    }

    #[test]
    fn palette_cycles() {
        let palette = vec!["a".to_string(), "b".to_string()];
        assert_eq!(palette_color(&palette, 0), "a");
        assert_eq!(palette_color(&palette, 3), "b");
        assert_eq!(palette_color(&[], 3), FALLBACK_COLOR);
    }

    #[test]
    fn percent_rounds_to_two_decimals() {
        assert_eq!(percent_of(1.0, 3.0), 33.33);
        assert_eq!(percent_of(2.0, 3.0), 66.67);
        assert_eq!(percent_of(5.0, 0.0), 0.0);
        assert_eq!(percent_of(1.0, 4.0), 25.0);
    }
}
