//! Chart data preparation.
//!
//! Everything here is pure data: series are aligned, aggregated and turned into
//! a `ChartSpec`. Drawing lives in `viz::svg`, so these builders can be tested
//! without rendering.

use std::collections::BTreeMap;

use chrono::Datelike;

use crate::domain::{ALIGNED_DAYS, ComparisonKind, PriceSeries, aligned_position, month_abbr};
use crate::outliers::OutlierReport;
use crate::report::{monthly_stats, quarterly_stats, weekly_stats, yearly_summary, yearly_volatility};

/// Shown instead of a chart when no year is selected.
pub const EMPTY_SELECTION_MESSAGE: &str = "Please select at least one year";

/// Prices keyed by aligned position, then by year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearAlignedView {
    columns: BTreeMap<u16, BTreeMap<i32, f64>>,
}

impl YearAlignedView {
    /// Align the records of `years` on the shared annual axis.
    pub fn build(series: &PriceSeries, years: &[i32]) -> Self {
        let mut columns: BTreeMap<u16, BTreeMap<i32, f64>> = BTreeMap::new();
        for rec in series.records() {
            let year = rec.date.year();
            if years.contains(&year) {
                columns
                    .entry(aligned_position(rec.date))
                    .or_default()
                    .insert(year, rec.price);
            }
        }
        Self { columns }
    }

    /// Years with at least one aligned value, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.columns.values().flat_map(|m| m.keys().copied()).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// `(position, price)` pairs of one year in axis order.
    pub fn trace(&self, year: i32) -> Vec<(u16, f64)> {
        self.columns
            .iter()
            .filter_map(|(&pos, by_year)| by_year.get(&year).map(|&p| (pos, p)))
            .collect()
    }
}

/// How a trace is drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceKind {
    Line,
    LineMarkers,
    /// Vertical bars centered on each x with the given width.
    Bars { width: f64 },
    Markers,
}

/// One named series of a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub name: String,
    pub color: usize,
    pub kind: TraceKind,
    pub points: Vec<(f64, f64)>,
    /// Symmetric error half-widths, one per point.
    pub errors: Option<Vec<f64>>,
    /// Shaded `(x, low, high)` range drawn behind the trace.
    pub band: Option<Vec<(f64, f64, f64)>>,
    /// Plotted against the secondary (right) y axis.
    pub secondary: bool,
}

impl Trace {
    pub fn new(name: impl Into<String>, color: usize, kind: TraceKind, points: Vec<(f64, f64)>) -> Self {
        Self {
            name: name.into(),
            color,
            kind,
            points,
            errors: None,
            band: None,
            secondary: false,
        }
    }
}

/// Tick labelling of the x axis.
#[derive(Debug, Clone, PartialEq)]
pub enum XAxis {
    Numeric,
    /// Aligned day-of-year positions labelled as "Mon DD".
    DayOfYear,
    /// Integer categories; only listed positions get a label.
    Categories(Vec<(f64, String)>),
}

/// Render-ready description of one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Label of the secondary axis; present when any trace is secondary.
    pub y2_label: Option<String>,
    pub x_axis: XAxis,
    /// Fixed x range; computed from the data when `None`.
    pub x_range: Option<(f64, f64)>,
    pub traces: Vec<Trace>,
    /// Text drawn instead of the plot when there is nothing to show.
    pub message: Option<String>,
}

impl ChartSpec {
    fn new(title: &str, x_label: &str, y_label: &str) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            y2_label: None,
            x_axis: XAxis::Numeric,
            x_range: None,
            traces: Vec::new(),
            message: None,
        }
    }

    /// A chart with no data and a centered message.
    pub fn placeholder(title: &str, message: &str) -> Self {
        let mut spec = Self::new(title, "", "");
        spec.message = Some(message.to_string());
        spec
    }

    pub fn has_data(&self) -> bool {
        self.traces.iter().any(|t| !t.points.is_empty())
    }

    fn finish(mut self) -> Self {
        if !self.has_data() && self.message.is_none() {
            self.message = Some("No data for the selected years".to_string());
        }
        self
    }
}

/// Main comparison chart for the selected years.
///
/// `series` must already be restricted to the selected years. Years without
/// data simply produce no trace.
pub fn comparison_chart(kind: ComparisonKind, series: &PriceSeries, outliers: Option<&OutlierReport>) -> ChartSpec {
    match kind {
        ComparisonKind::Overlay => overlay_chart(series, outliers),
        ComparisonKind::Monthly => monthly_chart(series),
        ComparisonKind::Quarterly => quarterly_chart(series),
        ComparisonKind::Weekly => weekly_chart(series),
    }
}

/// One line per year over the aligned day-of-year axis; outliers are marked.
pub fn overlay_chart(series: &PriceSeries, outliers: Option<&OutlierReport>) -> ChartSpec {
    let mut spec = ChartSpec::new(
        "Year-over-Year Price Comparison (Overlay by Day of Year)",
        "Day of Year (month/day aligned, Feb 29 = 60)",
        "Price ($)",
    );
    spec.x_axis = XAxis::DayOfYear;
    spec.x_range = Some((1.0, ALIGNED_DAYS as f64));

    let years = series.years();
    let view = YearAlignedView::build(series, &years);
    for (i, year) in view.years().into_iter().enumerate() {
        let points = view
            .trace(year)
            .into_iter()
            .map(|(pos, price)| (pos as f64, price))
            .collect();
        spec.traces.push(Trace::new(year.to_string(), i, TraceKind::Line, points));
    }

    if let Some(report) = outliers {
        let marks: Vec<(f64, f64)> = report
            .outliers()
            .filter(|f| years.contains(&f.date.year()))
            .map(|f| (aligned_position(f.date) as f64, f.price))
            .collect();
        if !marks.is_empty() {
            spec.traces.push(Trace::new("Outliers", OUTLIER_COLOR, TraceKind::Markers, marks));
        }
    }

    spec.finish()
}

/// Palette slot reserved for outlier markers.
pub const OUTLIER_COLOR: usize = usize::MAX;

/// Monthly mean per year with ± one standard deviation.
pub fn monthly_chart(series: &PriceSeries) -> ChartSpec {
    let mut spec = ChartSpec::new("Monthly Average Price Comparison", "Month", "Average Price ($)");
    spec.x_axis = XAxis::Categories((1..=12).map(|m| (m as f64, month_abbr(m).to_string())).collect());
    spec.x_range = Some((0.5, 12.5));

    let stats = monthly_stats(series);
    for (i, year) in series.years().into_iter().enumerate() {
        let rows: Vec<_> = stats.iter().filter(|s| s.year == year).collect();
        let mut trace = Trace::new(
            year.to_string(),
            i,
            TraceKind::LineMarkers,
            rows.iter().map(|s| (s.period as f64, s.mean)).collect(),
        );
        trace.errors = Some(rows.iter().map(|s| s.std.unwrap_or(0.0)).collect());
        spec.traces.push(trace);
    }
    spec.finish()
}

/// Quarterly mean per year with the min/max range shaded.
pub fn quarterly_chart(series: &PriceSeries) -> ChartSpec {
    let mut spec = ChartSpec::new(
        "Quarterly Price Comparison (Average with Min/Max Range)",
        "Quarter",
        "Price ($)",
    );
    spec.x_axis = XAxis::Categories((1..=4).map(|q| (q as f64, format!("Q{q}"))).collect());
    spec.x_range = Some((0.75, 4.25));

    let stats = quarterly_stats(series);
    for (i, year) in series.years().into_iter().enumerate() {
        let rows: Vec<_> = stats.iter().filter(|s| s.year == year).collect();
        let mut trace = Trace::new(
            format!("{year} Avg"),
            i,
            TraceKind::LineMarkers,
            rows.iter().map(|s| (s.period as f64, s.mean)).collect(),
        );
        trace.band = Some(rows.iter().map(|s| (s.period as f64, s.min, s.max)).collect());
        spec.traces.push(trace);
    }
    spec.finish()
}

/// Mean price per ISO week, one line per year.
pub fn weekly_chart(series: &PriceSeries) -> ChartSpec {
    let mut spec = ChartSpec::new("Weekly Average Price Patterns", "Week of Year", "Average Price ($)");
    spec.x_range = Some((1.0, 53.0));

    let stats = weekly_stats(series);
    for (i, year) in series.years().into_iter().enumerate() {
        // Early-January days of ISO week 52/53 are drawn at that week.
        let points = stats
            .iter()
            .filter(|s| s.year == year)
            .map(|s| (s.period as f64, s.mean))
            .collect();
        spec.traces.push(Trace::new(year.to_string(), i, TraceKind::Line, points));
    }
    spec.finish()
}

fn year_axis(years: &[i32]) -> XAxis {
    XAxis::Categories(years.iter().map(|y| (*y as f64, y.to_string())).collect())
}

fn year_range(years: &[i32]) -> Option<(f64, f64)> {
    Some((*years.first()? as f64 - 0.5, *years.last()? as f64 + 0.5))
}

/// Grouped bars of the annual mean and median.
pub fn annual_stats_chart(series: &PriceSeries) -> ChartSpec {
    let mut spec = ChartSpec::new("Annual Price Statistics Comparison", "Year", "Price ($)");
    let rows = yearly_summary(series);
    let years: Vec<i32> = rows.iter().map(|r| r.year).collect();
    spec.x_axis = year_axis(&years);
    spec.x_range = year_range(&years);

    let width = 0.35;
    spec.traces.push(Trace::new(
        "Mean",
        MEAN_COLOR,
        TraceKind::Bars { width },
        rows.iter().map(|r| (r.year as f64 - width / 2.0, r.mean)).collect(),
    ));
    spec.traces.push(Trace::new(
        "Median",
        MEDIAN_COLOR,
        TraceKind::Bars { width },
        rows.iter().map(|r| (r.year as f64 + width / 2.0, r.median)).collect(),
    ));
    spec.finish()
}

/// Palette slots for the secondary charts.
pub const MEAN_COLOR: usize = 1;
pub const MEDIAN_COLOR: usize = 2;
pub const STD_COLOR: usize = 4;
pub const RANGE_COLOR: usize = 0;

/// Standard deviation bars with the range (% of mean) on a secondary axis.
pub fn volatility_chart(series: &PriceSeries) -> ChartSpec {
    let mut spec = ChartSpec::new("Price Volatility Comparison", "Year", "Standard Deviation ($)");
    spec.y2_label = Some("Range as % of Mean".to_string());
    let rows = yearly_volatility(series);
    let years: Vec<i32> = rows.iter().map(|r| r.year).collect();
    spec.x_axis = year_axis(&years);
    spec.x_range = year_range(&years);

    spec.traces.push(Trace::new(
        "Standard Deviation",
        STD_COLOR,
        TraceKind::Bars { width: 0.6 },
        rows.iter().filter_map(|r| Some((r.year as f64, r.std?))).collect(),
    ));
    let mut range = Trace::new(
        "Range as % of Mean",
        RANGE_COLOR,
        TraceKind::LineMarkers,
        rows.iter().filter_map(|r| Some((r.year as f64, r.range_pct?))).collect(),
    );
    range.secondary = true;
    spec.traces.push(range);
    spec.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OutlierConfig, PriceRecord};
    use crate::outliers::detect_outliers;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn two_years() -> PriceSeries {
        let mut records = Vec::new();
        for year in [2015, 2016] {
            for day in d(year, 1, 1).iter_days().take_while(|x| x.year() == year) {
                records.push(PriceRecord::new(day, 100.0 + day.ordinal() as f64 + (year - 2015) as f64 * 1000.0));
            }
        }
        PriceSeries::from_records(records).unwrap()
    }

    #[test]
    fn aligned_view_lines_up_month_day() {
        let series = two_years();
        let view = YearAlignedView::build(&series, &[2015, 2016]);
        assert_eq!(view.years(), vec![2015, 2016]);

        // Mar 1 is ordinal 60 in 2015 and 61 in 2016 but shares position 61.
        let at = |pos: u16, year: i32| view.trace(year).into_iter().find(|&(p, _)| p == pos).map(|(_, v)| v);
        let pos = aligned_position(d(2015, 3, 1));
        assert_eq!(at(pos, 2015), Some(160.0));
        assert_eq!(at(pos, 2016), Some(1161.0));
        // Feb 29 only exists in 2016.
        assert_eq!(at(60, 2015), None);
        assert_eq!(at(60, 2016), Some(1160.0));
        assert_eq!(view.trace(2015).len(), 365);
        assert_eq!(view.trace(2016).len(), 366);
    }

    #[test]
    fn aligned_view_respects_year_selection() {
        let view = YearAlignedView::build(&two_years(), &[2016]);
        assert_eq!(view.years(), vec![2016]);
        assert_eq!(view.trace(2016).len(), 366);
        assert!(view.trace(2015).is_empty());
    }

    #[test]
    fn overlay_marks_outliers() {
        let mut records: Vec<PriceRecord> = two_years().records().to_vec();
        for r in records.iter_mut() {
            r.price = 100.0 + (r.date.day() % 2) as f64;
        }
        records[40].price = 999.0;
        let series = PriceSeries::from_records(records).unwrap();
        let report = detect_outliers(&series, &OutlierConfig::default());

        let spec = overlay_chart(&series, Some(&report));
        assert_eq!(spec.traces.len(), 3);
        let marks = spec.traces.last().unwrap();
        assert_eq!(marks.name, "Outliers");
        assert_eq!(marks.points, vec![(41.0, 999.0)]);
        assert!(spec.message.is_none());
    }

    #[test]
    fn empty_series_gets_message() {
        let spec = overlay_chart(&PriceSeries::default(), None);
        assert!(!spec.has_data());
        assert!(spec.message.is_some());

        let placeholder = ChartSpec::placeholder("t", EMPTY_SELECTION_MESSAGE);
        assert_eq!(placeholder.message.as_deref(), Some(EMPTY_SELECTION_MESSAGE));
    }

    #[test]
    fn monthly_and_quarterly_shapes() {
        let series = two_years();
        let monthly = monthly_chart(&series);
        assert_eq!(monthly.traces.len(), 2);
        assert_eq!(monthly.traces[0].points.len(), 12);
        assert_eq!(monthly.traces[0].errors.as_ref().unwrap().len(), 12);

        let quarterly = quarterly_chart(&series);
        assert_eq!(quarterly.traces[1].points.len(), 4);
        let band = quarterly.traces[1].band.as_ref().unwrap();
        assert!(band.iter().all(|&(_, lo, hi)| lo <= hi));
    }

    #[test]
    fn secondary_charts() {
        let series = two_years();
        let stats = annual_stats_chart(&series);
        assert_eq!(stats.traces.len(), 2);
        assert_eq!(stats.x_range, Some((2014.5, 2016.5)));

        let vol = volatility_chart(&series);
        assert!(vol.traces[1].secondary);
        assert_eq!(vol.y2_label.as_deref(), Some("Range as % of Mean"));
    }

    #[test]
    fn comparison_dispatch() {
        let series = two_years();
        for kind in ComparisonKind::ALL {
            let spec = comparison_chart(kind, &series, None);
            assert!(spec.has_data(), "{kind:?}");
        }
    }
}
