//! Formatted terminal output for the batch binaries.

use crate::domain::PriceSeries;
use crate::forecast::Forecast;
use crate::io::ingest::IngestedSeries;
use crate::outliers::OutlierReport;
use crate::report::summary::YearSummary;

/// Dataset header shared by both batch reports.
pub fn format_dataset_summary(ingested: &IngestedSeries) -> String {
    let series = &ingested.series;
    let mut out = String::new();
    out.push_str(&format!(
        "Rows: read={} used={} dropped={}\n",
        ingested.rows_read,
        series.len(),
        ingested.row_errors.len()
    ));
    if let (Some(first), Some(last)) = (series.first_date(), series.last_date()) {
        out.push_str(&format!("Dates: {first} .. {last}\n"));
    }
    let years: Vec<String> = series.years().iter().map(|y| y.to_string()).collect();
    out.push_str(&format!("Years: {}\n", years.join(", ")));
    if !ingested.aux_columns.is_empty() {
        out.push_str(&format!("Auxiliary columns: {}\n", ingested.aux_columns.join(", ")));
    }
    out
}

/// Outlier detection settings, per-context bounds with flags, and the flagged rows.
pub fn format_outlier_report(report: &OutlierReport, series: &PriceSeries) -> String {
    let cfg = &report.config;
    let mut out = String::new();

    out.push_str("=== Outlier detection ===\n");
    out.push_str(&format!(
        "Method: {} (k={}) | context: {:?} | min points: {}\n",
        cfg.method.display_name(),
        cfg.effective_multiplier(),
        cfg.granularity,
        cfg.min_context_points
    ));
    let skipped = report.contexts.iter().filter(|c| !c.evaluated).count();
    out.push_str(&format!(
        "Contexts: {} evaluated, {} too small | records: {} | outliers: {}\n\n",
        report.contexts.len() - skipped,
        skipped,
        series.len(),
        report.outlier_count()
    ));

    let flagged_contexts: Vec<_> = report.contexts.iter().filter(|c| c.flagged > 0).collect();
    if !flagged_contexts.is_empty() {
        out.push_str(
            format!(
                "{:<10} {:>5} {:>10} {:>10} {:>10} {:>10} {:>7}",
                "context", "n", "center", "spread", "lower", "upper", "flags"
            )
            .trim_end(),
        );
        out.push('\n');
        out.push_str(&format!(
            "{:-<10} {:-<5} {:-<10} {:-<10} {:-<10} {:-<10} {:-<7}\n",
            "", "", "", "", "", "", ""
        ));
        for c in flagged_contexts {
            out.push_str(&format!(
                "{:<10} {:>5} {:>10} {:>10} {:>10} {:>10} {:>7}\n",
                c.key.to_string(),
                c.n,
                fmt_opt(c.center),
                fmt_opt(c.spread),
                fmt_opt(c.lower),
                fmt_opt(c.upper),
                c.flagged
            ));
        }
        out.push('\n');
    }

    out.push_str("Flagged records:\n");
    if report.outlier_count() == 0 {
        out.push_str("  (none)\n");
        return out;
    }
    out.push_str(&format!("{:<12} {:>10} {:>8} {:<10}\n", "date", "price", "score", "context"));
    out.push_str(&format!("{:-<12} {:-<10} {:-<8} {:-<10}\n", "", "", "", ""));
    for f in report.outliers() {
        out.push_str(&format!(
            "{:<12} {:>10.2} {:>8} {:<10}\n",
            f.date.to_string(),
            f.price,
            f.score.map(|s| format!("{s:.2}")).unwrap_or_else(|| "-".to_string()),
            f.context.to_string()
        ));
    }
    out
}

/// Chosen model, diagnostics of every candidate, and the predicted days.
pub fn format_forecast_summary(forecast: &Forecast) -> String {
    let selection = &forecast.selection;
    let mut out = String::new();

    out.push_str("=== Forecast ===\n");
    out.push_str(&format!(
        "History: {} .. {} | horizon: {} days\n",
        forecast.origin, forecast.last_observed, forecast.horizon_days
    ));

    out.push_str("\nModel diagnostics:\n");
    for fit in &selection.fits {
        let chosen = if fit.model == selection.best.model { "*" } else { " " };
        out.push_str(&format!(
            "{chosen} {:<32} SSE={:.3} RMSE={:.3} BIC={:.3}\n",
            fit.model.display_name(),
            fit.quality.sse,
            fit.quality.rmse,
            fit.quality.bic
        ));
    }
    for (model, reason) in &selection.skipped {
        out.push_str(&format!("  (skipped {}) {reason}\n", model.display_name()));
    }

    out.push_str("\nPredictions:\n");
    out.push_str(&format!("{:<12} {:>14}\n", "date", "predicted_price"));
    out.push_str(&format!("{:-<12} {:-<14}\n", "", ""));
    for rec in &forecast.records {
        out.push_str(&format!("{:<12} {:>14.2}\n", rec.date.to_string(), rec.predicted_price));
    }
    out
}

/// Plain-text version of the dashboard's summary table.
pub fn format_year_table(rows: &[YearSummary]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<6} {:>5} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}\n",
        "year", "days", "mean", "median", "std", "min", "max", "yoy%"
    ));
    for r in rows {
        out.push_str(&format!(
            "{:<6} {:>5} {:>9.2} {:>9.2} {:>9} {:>9.2} {:>9.2} {:>9}\n",
            r.year,
            r.days,
            r.mean,
            r.median,
            fmt_opt(r.std),
            r.min,
            r.max,
            r.yoy_change_pct.map(|v| format!("{v:.2}%")).unwrap_or_else(|| "-".to_string()),
        ));
    }
    out
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::{OutlierConfig, PriceRecord};
    use crate::outliers::detect_outliers;
    use crate::report::summary::yearly_summary;

    fn series_with_spike() -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2014, 6, 1).unwrap();
        let records = start
            .iter_days()
            .take(30)
            .enumerate()
            .map(|(i, d)| PriceRecord::new(d, if i == 12 { 900.0 } else { 100.0 + (i % 3) as f64 }))
            .collect();
        PriceSeries::from_records(records).unwrap()
    }

    #[test]
    fn outlier_report_lists_flagged_dates() {
        let series = series_with_spike();
        let report = detect_outliers(&series, &OutlierConfig::default());
        let text = format_outlier_report(&report, &series);
        assert!(text.contains("outliers: 1"));
        assert!(text.contains("2014-06-13"));
        assert!(text.contains("2014-06"));
    }

    #[test]
    fn outlier_report_without_flags() {
        let series = PriceSeries::from_records(vec![PriceRecord::new(
            NaiveDate::from_ymd_opt(2014, 1, 1).unwrap(),
            1.0,
        )])
        .unwrap();
        let report = detect_outliers(&series, &OutlierConfig::default());
        assert!(format_outlier_report(&report, &series).contains("(none)"));
    }

    #[test]
    fn year_table_has_one_line_per_year() {
        let table = format_year_table(&yearly_summary(&series_with_spike()));
        assert_eq!(table.lines().count(), 2);
        assert!(table.contains("2014"));
    }
}
