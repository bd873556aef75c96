//! End-to-end checks of the batch pipeline on CSV files.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use hotel_prices::app::pipeline::{load, run_forecast, run_outliers};
use hotel_prices::config::Settings;
use hotel_prices::data::{SampleConfig, generate_series, to_csv};
use hotel_prices::domain::{LoadConfig, OutlierConfig, RowPolicy};
use hotel_prices::io::{ParseError, load_price_series, write_forecast_csv};
use hotel_prices::outliers::detect_outliers;

fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn settings_for(path: PathBuf) -> Settings {
    let mut settings = Settings::default();
    settings.data.path = path;
    settings
}

#[test]
fn single_spike_in_three_seasonal_years_is_the_only_outlier() {
    let spike_day = 500;
    let series = generate_series(&SampleConfig {
        start: NaiveDate::from_ymd_opt(2012, 1, 1).unwrap(),
        days: 3 * 365,
        spikes: vec![(spike_day, 1000.0)],
        ..SampleConfig::default()
    })
    .unwrap();
    let spike_date = series.records()[spike_day].date;

    let report = detect_outliers(&series, &OutlierConfig::default());
    let flagged: Vec<NaiveDate> = report.outliers().map(|f| f.date).collect();
    assert_eq!(flagged, vec![spike_date]);

    // Same input, same answer.
    assert_eq!(detect_outliers(&series, &OutlierConfig::default()), report);
}

#[test]
fn outlier_pipeline_from_csv() {
    let dir = tempfile::tempdir().unwrap();
    let series = generate_series(&SampleConfig {
        days: 2 * 365,
        noise_std: 0.5,
        spikes: vec![(100, 900.0)],
        ..SampleConfig::default()
    })
    .unwrap();
    let path = write_csv(dir.path(), "prices.csv", &to_csv(&series));

    let run = run_outliers(&settings_for(path)).unwrap();
    assert_eq!(run.ingest.series.len(), 2 * 365);
    assert!(run.report.is_outlier(NaiveDate::from_ymd_opt(2012, 4, 10).unwrap()));
}

#[test]
fn invalid_date_fails_unless_rows_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        dir.path(),
        "bad.csv",
        "date,price\n2014-01-01,100\nnot-a-date,101\n2014-01-03,102\n",
    );

    let err = load_price_series(&path, &LoadConfig::default()).unwrap_err();
    assert!(matches!(err, ParseError::InvalidDate { line: 3, .. }), "{err:?}");

    let app_err = load(&settings_for(path.clone())).unwrap_err();
    assert_eq!(app_err.exit_code(), 2);

    let lenient = LoadConfig {
        row_policy: RowPolicy::Drop,
        ..LoadConfig::default()
    };
    let ingested = load_price_series(&path, &lenient).unwrap();
    assert_eq!(ingested.series.len(), 2);
    assert_eq!(ingested.row_errors.len(), 1);
    assert_eq!(ingested.row_errors[0].line, 3);
}

#[test]
fn loader_sorts_and_keeps_auxiliary_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        dir.path(),
        "unsorted.csv",
        "\u{feff}Date,Price,Occupancy\n2015-03-02,120.5,0.81\n2015-03-01,118,0.79\n2014-12-31,99.9,\n",
    );
    let ingested = load_price_series(&path, &LoadConfig::default()).unwrap();
    let dates: Vec<NaiveDate> = ingested.series.records().iter().map(|r| r.date).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(dates, sorted);
    assert_eq!(ingested.aux_columns, vec!["occupancy".to_string()]);
    assert_eq!(ingested.series.records()[1].aux_f64("occupancy"), Some(0.79));
}

#[test]
fn missing_file_is_an_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load(&settings_for(dir.path().join("nope.csv"))).unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn february_2022_forecast_written_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let series = generate_series(&SampleConfig {
        trend_per_year: 3.0,
        noise_std: 1.0,
        ..SampleConfig::default()
    })
    .unwrap();
    let input = write_csv(dir.path(), "history.csv", &to_csv(&series));
    let output = dir.path().join("forecast_feb_2022.csv");

    let mut settings = settings_for(input);
    settings.forecast.output = output.clone();
    let run = run_forecast(&settings).unwrap();
    write_forecast_csv(&settings.forecast.output, &run.forecast.records).unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("date,predicted_price"));
    let rows: Vec<(NaiveDate, f64)> = lines
        .map(|l| {
            let (d, p) = l.split_once(',').unwrap();
            (NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap(), p.parse().unwrap())
        })
        .collect();

    assert_eq!(rows.len(), 28);
    let first = NaiveDate::from_ymd_opt(2022, 2, 1).unwrap();
    for (i, (date, price)) in rows.iter().enumerate() {
        assert_eq!(*date, first + chrono::Duration::days(i as i64));
        assert!(price.is_finite());
    }
}

#[test]
fn short_history_cannot_be_forecast() {
    let dir = tempfile::tempdir().unwrap();
    let series = generate_series(&SampleConfig {
        days: 300,
        ..SampleConfig::default()
    })
    .unwrap();
    let input = write_csv(dir.path(), "short.csv", &to_csv(&series));
    let err = run_forecast(&settings_for(input)).unwrap_err();
    assert_eq!(err.exit_code(), 3);
}
