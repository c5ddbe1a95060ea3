//! Chart descriptions and their SVG rendering.
//!
//! Stages describe what to draw as plain [`Chart`] values; a [`ChartRenderer`]
//! turns them into files. [`SvgChartRenderer`] renders with plotters.

use chrono::{Datelike, NaiveDate};
use plotters::element::Pie;
use plotters::prelude::*;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

/// Named colours used by the stage charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesColor {
    Blue,
    Orange,
    Red,
    SkyBlue,
    LightGreen,
    DodgerBlue,
}

impl SeriesColor {
    fn rgb(self) -> RGBColor {
        match self {
            SeriesColor::Blue => RGBColor(31, 119, 180),
            SeriesColor::Orange => RGBColor(255, 165, 0),
            SeriesColor::Red => RGBColor(214, 39, 40),
            SeriesColor::SkyBlue => RGBColor(135, 206, 235),
            SeriesColor::LightGreen => RGBColor(144, 238, 144),
            SeriesColor::DodgerBlue => RGBColor(30, 144, 255),
        }
    }
}

const PIE_PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// One line of a time-series chart.
#[derive(Debug, Clone, PartialEq)]
pub struct LineData {
    pub label: String,
    pub color: SeriesColor,
    pub points: Vec<(NaiveDate, f64)>,
}

/// One bar of a categorical chart. Bars without a value keep their slot on
/// the axis but draw nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: Option<f64>,
    pub color: SeriesColor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartBody {
    Lines(Vec<LineData>),
    Bars(Vec<Bar>),
    Pie(Vec<Slice>),
}

/// Everything needed to draw one chart artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub body: ChartBody,
}

impl Chart {
    pub fn new(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        body: ChartBody,
    ) -> Self {
        Chart {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            body,
        }
    }

    /// Whether the chart has at least one drawable value.
    pub fn has_data(&self) -> bool {
        match &self.body {
            ChartBody::Lines(lines) => lines.iter().any(|line| !line.points.is_empty()),
            ChartBody::Bars(bars) => bars.iter().any(|bar| bar.value.is_some()),
            ChartBody::Pie(slices) => !slices.is_empty(),
        }
    }
}

/// Errors that can occur while rendering a chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    /// The chart has nothing to draw
    EmptyData { title: String },
    /// The drawing backend failed
    Render { path: PathBuf, message: String },
}

impl fmt::Display for ChartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartError::EmptyData { title } => write!(f, "Chart '{}' has no data to draw", title),
            ChartError::Render { path, message } => {
                write!(f, "Failed to render {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ChartError {}

/// Renders a chart description to a file.
pub trait ChartRenderer {
    fn render(&self, chart: &Chart, path: &Path) -> Result<(), ChartError>;
}

/// plotters-backed renderer producing SVG files.
#[derive(Debug, Clone)]
pub struct SvgChartRenderer {
    /// Canvas size for line and bar charts
    pub size: (u32, u32),
    /// Canvas size for pie charts
    pub pie_size: (u32, u32),
}

impl Default for SvgChartRenderer {
    fn default() -> Self {
        SvgChartRenderer {
            size: (1200, 600),
            pie_size: (900, 900),
        }
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn render(&self, chart: &Chart, path: &Path) -> Result<(), ChartError> {
        if !chart.has_data() {
            return Err(ChartError::EmptyData {
                title: chart.title.clone(),
            });
        }

        let result = match &chart.body {
            ChartBody::Lines(lines) => self.draw_lines(chart, lines, path),
            ChartBody::Bars(bars) => self.draw_bars(chart, bars, path),
            ChartBody::Pie(slices) => self.draw_pie(chart, slices, path),
        };

        result.map_err(|err| ChartError::Render {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }
}

impl SvgChartRenderer {
    fn draw_lines(&self, chart: &Chart, lines: &[LineData], path: &Path) -> Result<(), Box<dyn Error>> {
        let coords: Vec<(f64, f64)> = lines
            .iter()
            .flat_map(|line| line.points.iter())
            .map(|(date, value)| (day_coord(*date), *value))
            .collect();
        let (x_min, x_max) = padded_bounds(coords.iter().map(|(x, _)| *x), 0.0);
        let (y_min, y_max) = padded_bounds(coords.iter().map(|(_, y)| *y), 0.05);

        let root = SVGBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        ctx.configure_mesh()
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_str())
            .x_label_formatter(&|x| format_day_coord(*x))
            .draw()?;

        for line in lines {
            let color = line.color.rgb();
            let points: Vec<(f64, f64)> = line
                .points
                .iter()
                .map(|(date, value)| (day_coord(*date), *value))
                .collect();
            ctx.draw_series(LineSeries::new(points, color.stroke_width(2)))?
                .label(line.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        }

        ctx.configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }

    fn draw_bars(&self, chart: &Chart, bars: &[Bar], path: &Path) -> Result<(), Box<dyn Error>> {
        let labels: Vec<String> = bars.iter().map(|bar| bar.label.clone()).collect();
        let slots = bars.len() as u32;
        let (y_min, y_max) = padded_bounds(
            bars.iter().filter_map(|bar| bar.value).chain(std::iter::once(0.0)),
            0.1,
        );

        let root = SVGBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d((0u32..slots).into_segmented(), y_min.min(0.0)..y_max)?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .x_labels(bars.len() + 1)
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_str())
            .x_label_formatter(&|segment| match segment {
                SegmentValue::Exact(index) | SegmentValue::CenterOf(index) => {
                    labels.get(*index as usize).cloned().unwrap_or_default()
                }
                SegmentValue::Last => String::new(),
            })
            .draw()?;

        for (index, bar) in bars.iter().enumerate() {
            if let Some(value) = bar.value {
                ctx.draw_series(
                    Histogram::vertical(&ctx)
                        .style(bar.color.rgb().filled())
                        .margin(10)
                        .data(std::iter::once((index as u32, value))),
                )?;
            }
        }

        root.present()?;
        Ok(())
    }

    fn draw_pie(&self, chart: &Chart, slices: &[Slice], path: &Path) -> Result<(), Box<dyn Error>> {
        let root = SVGBackend::new(path, self.pie_size).into_drawing_area();
        root.fill(&WHITE)?;
        let area = root.titled(&chart.title, ("sans-serif", 28))?;

        let (width, height) = area.dim_in_pixel();
        let center = (width as i32 / 2, height as i32 / 2);
        let radius = f64::from(width.min(height)) * 0.35;

        let sizes: Vec<f64> = slices.iter().map(|slice| slice.value).collect();
        let labels: Vec<String> = slices.iter().map(|slice| slice.label.clone()).collect();
        let colors: Vec<RGBColor> = (0..slices.len())
            .map(|index| PIE_PALETTE[index % PIE_PALETTE.len()])
            .collect();

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(140.0);
        pie.label_style(("sans-serif", 16.0).into_font().color(&BLACK));
        pie.percentages(("sans-serif", 14.0).into_font().color(&WHITE));
        area.draw(&pie)?;

        root.present()?;
        Ok(())
    }
}

fn day_coord(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

fn format_day_coord(coord: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(coord.round() as i32)
        .map(|date| date.format("%Y-%m").to_string())
        .unwrap_or_default()
}

/// Min/max of `values` widened by `pad` of the span; a zero span is widened by one.
fn padded_bounds<I: IntoIterator<Item = f64>>(values: I, pad: f64) -> (f64, f64) {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let span = max - min;
    if span == 0.0 {
        return (min - 1.0, max + 1.0);
    }
    (min - span * pad, max + span * pad)
}
