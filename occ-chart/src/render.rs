use crate::{
    style::{ChartLabels, ChartStyle, GRID_COLOR, SERIES_COLOR},
    ChartError, Result,
};
use chrono::{DateTime, NaiveDateTime, TimeDelta};
use log::{debug, warn};
use occ_utils::{
    dates::format_day_label,
    ticks::{day_boundaries, hour_marks, MINOR_TICK_HOURS},
};
use plotters::coord::{combinators::BindKeyPoints, Shift};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters_backend::DrawingErrorKind;
use std::path::{Path, PathBuf};

/// Share of the data span added on each side of the x axis.
const X_MARGIN: f64 = 0.05;

/// Labelled y ticks; the y axis carries no minor ticks.
const Y_MAJOR: [f64; 6] = [0.0, 20.0, 40.0, 60.0, 80.0, 100.0];

/// Output file of a station chart: `{out_dir}/{station}_{suffix}.png`
pub fn chart_path(out_dir: &Path, station: &str, suffix: &str) -> PathBuf {
    out_dir.join(format!("{station}_{suffix}.png"))
}

/// Seconds since the epoch, the x coordinate of a timestamp.
fn to_axis(timestamp: &NaiveDateTime) -> f64 {
    timestamp.and_utc().timestamp() as f64
}

fn from_axis(x: f64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(x.round() as i64, 0).map(|dt| dt.naive_utc())
}

/// Visible time window: the data span plus a margin, never empty.
fn time_window(first: NaiveDateTime, last: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let span = last - first;
    if span <= TimeDelta::zero() {
        return (first - TimeDelta::hours(1), last + TimeDelta::hours(1));
    }
    let margin = TimeDelta::seconds((span.num_seconds() as f64 * X_MARGIN).round() as i64);
    (first - margin, last + margin)
}

/// Consecutive finite points; NaN percentages split the line.
fn finite_runs(timestamps: &[NaiveDateTime], percentages: &[f64]) -> Vec<Vec<(f64, f64)>> {
    let mut runs: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    for (timestamp, pct) in timestamps.iter().zip(percentages.iter()) {
        if pct.is_finite() {
            current.push((to_axis(timestamp), *pct));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Positions of the dashed gridlines: vertical lines at day boundaries and
/// at the minor hours, horizontal lines at the major y ticks only.
fn gridlines(start: NaiveDateTime, end: NaiveDateTime) -> (Vec<f64>, Vec<f64>) {
    let vertical = day_boundaries(start, end)
        .iter()
        .chain(hour_marks(start, end, &MINOR_TICK_HOURS).iter())
        .map(to_axis)
        .collect();
    (vertical, Y_MAJOR.to_vec())
}

fn is_font_error<E: std::error::Error + Send + Sync>(err: &DrawingAreaErrorKind<E>) -> bool {
    matches!(
        err,
        DrawingAreaErrorKind::BackendError(DrawingErrorKind::FontError(_))
    )
}

/// Render one station's fill series to a PNG at `path`.
///
/// When no usable font is available the chart is drawn again without any
/// text so the file still gets written.
pub fn render_station_chart(
    path: &Path,
    station: &str,
    timestamps: &[NaiveDateTime],
    percentages: &[f64],
    labels: &ChartLabels,
    style: &ChartStyle,
) -> Result<PathBuf> {
    if timestamps.len() != percentages.len() {
        return Err(ChartError::Misaligned {
            station: station.to_string(),
            timestamps: timestamps.len(),
            percentages: percentages.len(),
        });
    }
    let (Some(first), Some(last)) = (timestamps.first(), timestamps.last()) else {
        return Err(ChartError::NoData(station.to_string()));
    };
    let window = time_window(*first, *last);
    let chart = StationChart {
        title: labels.title_for(station),
        labels,
        style,
        window,
        runs: finite_runs(timestamps, percentages),
    };

    let draw_error = |err: &dyn std::fmt::Display| ChartError::Draw {
        path: path.to_path_buf(),
        message: err.to_string(),
    };
    match chart.draw_png(path, true) {
        Ok(()) => {}
        Err(err) if is_font_error(&err) => {
            warn!("No usable font for {}, drawing without text: {}", station, err);
            chart.draw_png(path, false).map_err(|e| draw_error(&e))?;
        }
        Err(err) => return Err(draw_error(&err)),
    }
    debug!("Wrote {}", path.display());
    Ok(path.to_path_buf())
}

struct StationChart<'a> {
    title: String,
    labels: &'a ChartLabels,
    style: &'a ChartStyle,
    window: (NaiveDateTime, NaiveDateTime),
    runs: Vec<Vec<(f64, f64)>>,
}

impl StationChart<'_> {
    fn draw_png(
        &self,
        path: &Path,
        with_text: bool,
    ) -> std::result::Result<(), DrawingAreaErrorKind<<BitMapBackend<'static> as DrawingBackend>::ErrorType>>
    {
        let root = BitMapBackend::new(path, self.style.pixel_size()).into_drawing_area();
        self.draw(root, with_text)
    }

    fn draw<DB>(
        &self,
        root: DrawingArea<DB, Shift>,
        with_text: bool,
    ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let style = self.style;
        let (start, end) = self.window;
        let (x_min, x_max) = (to_axis(&start), to_axis(&end));
        let day_ticks: Vec<f64> = day_boundaries(start, end).iter().map(to_axis).collect();
        let (vertical, horizontal) = gridlines(start, end);

        root.fill(&WHITE)?;

        let font_px = style.px(style.font_pt);
        let mut builder = ChartBuilder::on(&root);
        builder.margin(font_px as u32);
        if with_text {
            builder
                .caption(&self.title, style.title_font())
                .x_label_area_size((font_px * 3.0) as u32)
                .y_label_area_size((font_px * 4.0) as u32);
        }
        let mut chart = builder.build_cartesian_2d(
            (x_min..x_max).with_key_points(day_ticks.clone()),
            (0f64..100f64).with_key_points(Y_MAJOR.to_vec()),
        )?;

        let x_formatter = |x: &f64| from_axis(*x).map(|t| format_day_label(&t)).unwrap_or_default();
        let y_formatter = |y: &f64| format!("{y:.0}");
        let mut mesh = chart.configure_mesh();
        mesh.disable_mesh();
        if with_text {
            mesh.x_desc(self.labels.x_label.as_str())
                .y_desc(self.labels.y_label.as_str())
                .x_label_formatter(&x_formatter)
                .y_label_formatter(&y_formatter)
                .label_style(style.font())
                .axis_desc_style(style.font());
        }
        mesh.draw()?;

        let grid_style = GRID_COLOR
            .mix(style.grid_opacity)
            .stroke_width(style.stroke(style.grid_pt));
        let dash = style.stroke(style.grid_pt * 4.0);
        let gap = style.stroke(style.grid_pt * 2.0);
        for x in &vertical {
            chart.draw_series(DashedLineSeries::new(
                vec![(*x, 0.0), (*x, 100.0)],
                dash,
                gap,
                grid_style,
            ))?;
        }
        for y in &horizontal {
            chart.draw_series(DashedLineSeries::new(
                vec![(x_min, *y), (x_max, *y)],
                dash,
                gap,
                grid_style,
            ))?;
        }

        let line_style = SERIES_COLOR.stroke_width(style.stroke(style.line_pt));
        for run in &self.runs {
            chart.draw_series(LineSeries::new(run.iter().copied(), line_style))?;
        }

        root.present()?;
        Ok(())
    }
}
