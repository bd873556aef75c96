//! Plotters SVG rendering of `ChartSpec`s.
//!
//! All series and bounds come from `viz::views`; this module only draws. The
//! output is a standalone `<svg>` document that the dashboard inlines.

use std::ops::DerefMut;

use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::domain::position_label;
use crate::error::AppError;
use crate::viz::views::{ChartSpec, OUTLIER_COLOR, Trace, TraceKind, XAxis};

/// Default chart size in pixels.
pub const CHART_SIZE: (u32, u32) = (960, 480);

/// Qualitative palette (ColorBrewer Set1 without the yellow).
const PALETTE: [RGBColor; 8] = [
    RGBColor(228, 26, 28),
    RGBColor(55, 126, 184),
    RGBColor(77, 175, 74),
    RGBColor(152, 78, 163),
    RGBColor(255, 127, 0),
    RGBColor(166, 86, 40),
    RGBColor(247, 129, 191),
    RGBColor(153, 153, 153),
];

fn color(slot: usize) -> RGBColor {
    if slot == OUTLIER_COLOR {
        return BLACK;
    }
    PALETTE[slot % PALETTE.len()]
}

/// Render `spec` to an SVG document.
pub fn render_svg(spec: &ChartSpec, size: (u32, u32)) -> Result<String, AppError> {
    let mut buf = String::new();
    draw_chart(spec, size, &mut buf)
        .map_err(|e| AppError::new(4, format!("Failed to render chart '{}': {e}", spec.title)))?;
    Ok(buf)
}

type DrawResult = Result<(), Box<dyn std::error::Error>>;

fn draw_chart(spec: &ChartSpec, size: (u32, u32), buf: &mut String) -> DrawResult {
    let root = SVGBackend::with_string(buf, size).into_drawing_area();
    root.fill(&WHITE)?;

    if !spec.has_data() {
        let message = spec.message.as_deref().unwrap_or("No data");
        draw_message(&root, &spec.title, message, size)?;
        root.present()?;
        return Ok(());
    }

    let Some(bounds) = Bounds::from_spec(spec) else {
        draw_message(&root, &spec.title, "No finite values to plot", size)?;
        root.present()?;
        return Ok(());
    };

    let x_labels = match &spec.x_axis {
        XAxis::Categories(ticks) => ticks.len().max(2),
        XAxis::Numeric | XAxis::DayOfYear => 12,
    };
    let fmt_x = |v: &f64| format_x(&spec.x_axis, *v);

    let mut builder = ChartBuilder::on(&root);
    builder
        .caption(&spec.title, ("sans-serif", 20))
        .margin(12)
        .x_label_area_size(48)
        .y_label_area_size(64);
    if spec.y2_label.is_some() {
        builder.right_y_label_area_size(64);
    }
    let (x0, x1) = bounds.x;
    let (y0, y1) = bounds.y;
    let chart = builder.build_cartesian_2d(x0..x1, y0..y1)?;

    match (&spec.y2_label, bounds.y2) {
        (Some(y2_label), Some((s0, s1))) => {
            let mut chart = chart.set_secondary_coord(x0..x1, s0..s1);
            chart
                .configure_mesh()
                .x_desc(&spec.x_label)
                .y_desc(&spec.y_label)
                .x_labels(x_labels)
                .x_label_formatter(&fmt_x)
                .y_label_formatter(&|v| format!("{v:.0}"))
                .draw()?;
            chart
                .configure_secondary_axes()
                .y_desc(y2_label)
                .y_label_formatter(&|v| format!("{v:.1}"))
                .draw()?;

            for trace in spec.traces.iter().filter(|t| !t.secondary) {
                draw_trace(chart.deref_mut(), trace)?;
            }
            for trace in spec.traces.iter().filter(|t| t.secondary) {
                let c = color(trace.color);
                chart
                    .draw_secondary_series(LineSeries::new(trace.points.iter().copied(), c.stroke_width(2)))?
                    .label(trace.name.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], c.stroke_width(2)));
                chart.draw_secondary_series(trace.points.iter().map(|&p| Circle::new(p, 4, c.filled())))?;
            }
            draw_legend(chart.deref_mut())?;
        }
        _ => {
            let mut chart = chart;
            chart
                .configure_mesh()
                .x_desc(&spec.x_label)
                .y_desc(&spec.y_label)
                .x_labels(x_labels)
                .x_label_formatter(&fmt_x)
                .y_label_formatter(&|v| format!("{v:.0}"))
                .draw()?;
            for trace in &spec.traces {
                draw_trace(&mut chart, trace)?;
            }
            draw_legend(&mut chart)?;
        }
    }

    root.present()?;
    Ok(())
}

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn draw_trace<'a, DB: DrawingBackend + 'a>(
    chart: &mut Chart<'a, DB>,
    trace: &Trace,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let c = color(trace.color);

    if let Some(band) = &trace.band {
        // Upper edge left to right, then lower edge back.
        let mut outline: Vec<(f64, f64)> = band.iter().map(|&(x, _, hi)| (x, hi)).collect();
        outline.extend(band.iter().rev().map(|&(x, lo, _)| (x, lo)));
        if outline.len() >= 3 {
            chart.draw_series(std::iter::once(Polygon::new(outline, c.mix(0.15).filled())))?;
        }
    }

    if let Some(errors) = &trace.errors {
        chart.draw_series(
            trace
                .points
                .iter()
                .zip(errors)
                .filter(|&(_, e)| *e > 0.0)
                .map(|(&(x, y), &e)| PathElement::new(vec![(x, y - e), (x, y + e)], c.stroke_width(1))),
        )?;
    }

    let anno = match &trace.kind {
        TraceKind::Line => chart.draw_series(LineSeries::new(trace.points.iter().copied(), c.stroke_width(2)))?,
        TraceKind::LineMarkers => {
            chart.draw_series(trace.points.iter().map(|&p| Circle::new(p, 4, c.filled())))?;
            chart.draw_series(LineSeries::new(trace.points.iter().copied(), c.stroke_width(2)))?
        }
        TraceKind::Markers => chart.draw_series(trace.points.iter().map(|&p| Cross::new(p, 5, c.stroke_width(2))))?,
        TraceKind::Bars { width } => {
            let half = width / 2.0;
            chart.draw_series(
                trace
                    .points
                    .iter()
                    .map(|&(x, y)| Rectangle::new([(x - half, 0.0), (x + half, y)], c.mix(0.8).filled())),
            )?
        }
    };
    anno.label(trace.name.as_str())
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], c.stroke_width(3)));
    Ok(())
}

fn draw_legend<'a, DB: DrawingBackend + 'a>(chart: &mut Chart<'a, DB>) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .draw()
}

fn draw_message<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    message: &str,
    size: (u32, u32),
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let center = Pos::new(HPos::Center, VPos::Center);
    let (w, h) = (size.0 as i32, size.1 as i32);
    if !title.is_empty() {
        root.draw(&Text::new(title, (w / 2, 24), TextStyle::from(("sans-serif", 20).into_font()).pos(center)))?;
    }
    root.draw(&Text::new(
        message,
        (w / 2, h / 2),
        ("sans-serif", 18).into_font().color(&RGBColor(90, 90, 90)).pos(center),
    ))
}

fn format_x(axis: &XAxis, v: f64) -> String {
    match axis {
        XAxis::Numeric => format!("{v:.0}"),
        XAxis::DayOfYear => {
            let pos = v.round();
            if (1.0..=366.0).contains(&pos) {
                position_label(pos as u16).unwrap_or_default()
            } else {
                String::new()
            }
        }
        XAxis::Categories(ticks) => ticks
            .iter()
            .find(|(x, _)| (x - v).abs() < 1e-6)
            .map(|(_, label)| label.clone())
            .unwrap_or_default(),
    }
}

/// Plot ranges derived from the data.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    x: (f64, f64),
    y: (f64, f64),
    y2: Option<(f64, f64)>,
}

impl Bounds {
    fn from_spec(spec: &ChartSpec) -> Option<Self> {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        let mut y2s = Vec::new();

        for trace in &spec.traces {
            let target = if trace.secondary { &mut y2s } else { &mut ys };
            let half = match trace.kind {
                TraceKind::Bars { width } => {
                    target.push(0.0);
                    width / 2.0
                }
                _ => 0.0,
            };
            for (i, &(x, y)) in trace.points.iter().enumerate() {
                xs.push(x - half);
                xs.push(x + half);
                let e = trace.errors.as_ref().and_then(|e| e.get(i)).copied().unwrap_or(0.0);
                target.push(y - e);
                target.push(y + e);
            }
            if let Some(band) = &trace.band {
                for &(_, lo, hi) in band {
                    target.push(lo);
                    target.push(hi);
                }
            }
        }

        let x = match spec.x_range {
            Some(r) => r,
            None => padded(finite_extent(&xs)?, 0.02),
        };
        let y = padded(finite_extent(&ys)?, 0.08);
        let y2 = finite_extent(&y2s).map(|r| padded(r, 0.08));
        Some(Self { x, y, y2 })
    }
}

fn finite_extent(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Widen `(lo, hi)` by `frac` of its span; a degenerate range gets ±1.
fn padded((lo, hi): (f64, f64), frac: f64) -> (f64, f64) {
    let span = hi - lo;
    if span <= f64::EPSILON * lo.abs().max(1.0) {
        return (lo - 1.0, hi + 1.0);
    }
    // Bars start at zero; keep the axis there instead of dipping below.
    let lo = if lo == 0.0 { 0.0 } else { lo - span * frac };
    (lo, hi + span * frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PriceRecord, PriceSeries};
    use crate::viz::views::{ChartSpec, annual_stats_chart, monthly_chart, overlay_chart, quarterly_chart, volatility_chart};
    use chrono::{Datelike, NaiveDate};

    fn series() -> PriceSeries {
        let mut records = Vec::new();
        for year in [2014, 2015] {
            let start = NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
            for day in start.iter_days().take_while(|d| d.year() == year) {
                records.push(PriceRecord::new(day, 150.0 + (day.ordinal() % 30) as f64));
            }
        }
        PriceSeries::from_records(records).unwrap()
    }

    #[test]
    fn renders_line_chart() {
        let svg = render_svg(&overlay_chart(&series(), None), CHART_SIZE).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Year-over-Year Price Comparison"));
        assert!(svg.contains("2014"));
        assert!(svg.contains("polyline"));
    }

    #[test]
    fn renders_bars_bands_and_secondary_axis() {
        let s = series();
        for spec in [monthly_chart(&s), quarterly_chart(&s), annual_stats_chart(&s), volatility_chart(&s)] {
            let svg = render_svg(&spec, CHART_SIZE).unwrap();
            assert!(svg.contains("<svg"), "{}", spec.title);
        }
        let svg = render_svg(&volatility_chart(&s), CHART_SIZE).unwrap();
        assert!(svg.contains("Range as % of Mean"));
        assert!(svg.contains("<rect"));
    }

    #[test]
    fn renders_placeholder_message() {
        let spec = ChartSpec::placeholder("Overlay", "Please select at least one year");
        let svg = render_svg(&spec, (400, 300)).unwrap();
        assert!(svg.contains("Please select at least one year"));
    }

    #[test]
    fn axis_label_formatting() {
        assert_eq!(format_x(&XAxis::DayOfYear, 60.0), "Feb 29");
        assert_eq!(format_x(&XAxis::DayOfYear, 0.0), "");
        let cats = XAxis::Categories(vec![(1.0, "Q1".to_string())]);
        assert_eq!(format_x(&cats, 1.0), "Q1");
        assert_eq!(format_x(&cats, 1.5), "");
    }

    #[test]
    fn padding_handles_flat_and_zero_based_ranges() {
        assert_eq!(padded((5.0, 5.0), 0.1), (4.0, 6.0));
        assert_eq!(padded((0.0, 10.0), 0.1), (0.0, 11.0));
        let (lo, hi) = padded((10.0, 20.0), 0.1);
        assert!((lo - 9.0).abs() < 1e-12 && (hi - 21.0).abs() < 1e-12);
    }
}
