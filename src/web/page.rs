//! HTML rendering of the dashboard page.
//!
//! The page is a plain GET form: checkboxes for the years, a select for the
//! comparison view, and the charts/tables computed for that selection.

use std::fmt::Write;

use crate::domain::{ComparisonKind, PriceSeries};
use crate::outliers::OutlierReport;
use crate::report::{YearSummary, yearly_summary};
use crate::viz::{
    CHART_SIZE, ChartSpec, EMPTY_SELECTION_MESSAGE, annual_stats_chart, comparison_chart, render_svg, volatility_chart,
};

/// What the user asked to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub years: Vec<i32>,
    pub view: ComparisonKind,
}

impl Selection {
    /// Interpret `year=..&view=..&submitted=1` pairs.
    ///
    /// Without `submitted` and without any `year` the page shows every
    /// available year (first visit). Once the form was submitted, an empty
    /// year list is kept empty. Unknown years and views are ignored.
    pub fn from_query(params: &[(String, String)], available: &[i32]) -> Self {
        let mut years = Vec::new();
        let mut view = ComparisonKind::default();
        let mut submitted = false;
        let mut saw_year = false;

        for (key, value) in params {
            match key.as_str() {
                "year" => {
                    saw_year = true;
                    match value.trim().parse::<i32>() {
                        Ok(y) if available.contains(&y) => years.push(y),
                        _ => tracing::debug!(value = %value, "ignoring unknown year"),
                    }
                }
                "view" => match ComparisonKind::from_key(value.trim()) {
                    Some(kind) => view = kind,
                    None => tracing::debug!(value = %value, "ignoring unknown view"),
                },
                "submitted" => submitted = value == "1",
                _ => {}
            }
        }

        if !submitted && !saw_year {
            years = available.to_vec();
        }
        years.sort_unstable();
        years.dedup();
        Self { years, view }
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Inline SVG, or an error note if this one chart fails to render.
fn chart_block(spec: &ChartSpec) -> String {
    match render_svg(spec, CHART_SIZE) {
        Ok(svg) => format!("<div class=\"chart\">{svg}</div>\n"),
        Err(err) => {
            tracing::warn!(chart = %spec.title, error = %err, "chart rendering failed");
            format!(
                "<div class=\"chart chart-error\">Chart unavailable: {}</div>\n",
                escape(err.message())
            )
        }
    }
}

fn controls(selection: &Selection, available: &[i32]) -> String {
    let mut out = String::from("<form method=\"get\" action=\"/\">\n<fieldset><legend>Select Years to Compare</legend>\n");
    for year in available {
        let checked = if selection.years.contains(year) { " checked" } else { "" };
        let _ = writeln!(
            out,
            "<label><input type=\"checkbox\" name=\"year\" value=\"{year}\"{checked}> {year}</label>"
        );
    }
    out.push_str("</fieldset>\n<label>Comparison Type <select name=\"view\">\n");
    for kind in ComparisonKind::ALL {
        let selected = if kind == selection.view { " selected" } else { "" };
        let _ = writeln!(out, "<option value=\"{}\"{selected}>{}</option>", kind.key(), escape(kind.label()));
    }
    out.push_str("</select></label>\n<input type=\"hidden\" name=\"submitted\" value=\"1\">\n");
    out.push_str("<button type=\"submit\">Update</button>\n</form>\n");
    out
}

fn summary_table(rows: &[YearSummary]) -> String {
    let mut out = String::from(
        "<table class=\"summary\">\n<tr><th>Year</th><th>Days</th><th>Mean</th><th>Median</th><th>Std</th><th>Min</th><th>Max</th><th>YoY Change</th></tr>\n",
    );
    for r in rows {
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>${:.2}</td><td>${:.2}</td><td>{}</td><td>${:.2}</td><td>${:.2}</td><td>{}</td></tr>",
            r.year,
            r.days,
            r.mean,
            r.median,
            r.std.map(|s| format!("${s:.2}")).unwrap_or_else(|| "-".to_string()),
            r.min,
            r.max,
            r.yoy_change_pct.map(|v| format!("{v:+.2}%")).unwrap_or_else(|| "-".to_string()),
        );
    }
    out.push_str("</table>\n");
    out
}

fn outlier_table(report: &OutlierReport, years: &[i32]) -> String {
    use chrono::Datelike;

    let rows: Vec<_> = report.outliers().filter(|f| years.contains(&f.date.year())).collect();
    let cfg = &report.config;
    let mut out = format!(
        "<p>{} (k={}), context {:?}: {} outlier(s) in the selected years.</p>\n",
        cfg.method.display_name(),
        cfg.effective_multiplier(),
        cfg.granularity,
        rows.len()
    );
    if rows.is_empty() {
        return out;
    }
    out.push_str("<table class=\"outliers\">\n<tr><th>Date</th><th>Price</th><th>Context</th><th>Score</th></tr>\n");
    for f in rows {
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td>${:.2}</td><td>{}</td><td>{}</td></tr>",
            f.date,
            f.price,
            f.context,
            f.score.map(|s| format!("{s:.2}")).unwrap_or_else(|| "-".to_string())
        );
    }
    out.push_str("</table>\n");
    out
}

const STYLE: &str = "body{font-family:sans-serif;margin:24px;color:#222}\
.chart{margin:16px 0}.chart-error{color:#b00;padding:12px;border:1px solid #b00}\
table{border-collapse:collapse;margin:12px 0}td,th{border:1px solid #ccc;padding:4px 10px;text-align:right}\
fieldset label{margin-right:12px}.empty{color:#666;font-style:italic}";

/// Full dashboard page for `selection`.
pub fn render_page(series: &PriceSeries, available: &[i32], outliers: &OutlierReport, selection: &Selection) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Hotel Price Year-over-Year Comparison</title><style>{STYLE}</style></head><body>\n<h1>Hotel Price Year-over-Year Comparison</h1>\n"
    );
    out.push_str(&controls(selection, available));

    if selection.years.is_empty() {
        let _ = writeln!(out, "<p class=\"empty\">{EMPTY_SELECTION_MESSAGE}</p>");
        out.push_str(&chart_block(&ChartSpec::placeholder(selection.view.label(), EMPTY_SELECTION_MESSAGE)));
        out.push_str("</body></html>\n");
        return out;
    }

    let selected = series.filter_years(&selection.years);
    out.push_str(&chart_block(&comparison_chart(selection.view, &selected, Some(outliers))));
    out.push_str("<h2>Yearly Summary</h2>\n");
    out.push_str(&summary_table(&yearly_summary(&selected)));
    out.push_str(&chart_block(&annual_stats_chart(&selected)));
    out.push_str(&chart_block(&volatility_chart(&selected)));
    out.push_str("<h2>Detected Outliers</h2>\n");
    out.push_str(&outlier_table(outliers, &selection.years));
    out.push_str("</body></html>\n");
    out
}
