use std::path::{Path, PathBuf};

use log::info;
use plotters::coord::Shift;
use plotters::data::Quartiles;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::element::Boxplot;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::{Deserialize, Serialize};

use super::Reporter;
use crate::error::PipelineError;
use crate::stats::ImplementationReport;

const FONT: &str = "sans-serif";

const PALETTE: [RGBColor; 5] = [
    RGBColor(0x32, 0x73, 0xdc),
    RGBColor(0x48, 0xc7, 0x74),
    RGBColor(0xff, 0xdd, 0x57),
    RGBColor(0xf1, 0x46, 0x68),
    RGBColor(0x9b, 0x59, 0xb6),
];

/// Colors follow category order so an implementation keeps its color on every chart.
fn series_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

fn render_err<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> PipelineError {
    PipelineError::Render(err.to_string())
}

/// The images written by [`ChartReporter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    ResponseTime,
    RequestCount,
    DataTransfer,
    Stability,
    Distribution,
    Overview,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::ResponseTime,
        ChartKind::RequestCount,
        ChartKind::DataTransfer,
        ChartKind::Stability,
        ChartKind::Distribution,
        ChartKind::Overview,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ChartKind::ResponseTime => "response_time.png",
            ChartKind::RequestCount => "request_count.png",
            ChartKind::DataTransfer => "data_transfer.png",
            ChartKind::Stability => "stability.png",
            ChartKind::Distribution => "distribution.png",
            ChartKind::Overview => "overview.png",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::ResponseTime => "Create alert: mean response time (lower is better)",
            ChartKind::RequestCount => "Create alert: HTTP requests per action",
            ChartKind::DataTransfer => "Create alert: data transfer per action",
            ChartKind::Stability => "Create alert: response time across trials",
            ChartKind::Distribution => "Create alert: response time distribution",
            ChartKind::Overview => "Alert create action: implementation comparison",
        }
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    /// Whether to also compose all charts into one overview image.
    pub overview: bool,
    pub overview_width: u32,
    pub overview_height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 640,
            overview: true,
            overview_width: 1600,
            overview_height: 1200,
        }
    }
}

/// One bar with its annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    /// Half-height of the error bar, if any.
    pub error: Option<f64>,
    pub annotation: String,
}

/// Data for one bar chart, bars in category order.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub title: &'static str,
    pub y_desc: &'static str,
    pub bars: Vec<Bar>,
}

impl BarSeries {
    /// Mean response time with one standard deviation either side.
    pub fn response_time(results: &[ImplementationReport]) -> Self {
        let bars = results
            .iter()
            .map(|r| Bar {
                label: r.summary.implementation.label().to_string(),
                value: r.summary.mean_ms,
                error: Some(r.summary.std_dev_ms),
                annotation: format!("{:.2} ms", r.summary.mean_ms),
            })
            .collect();
        Self {
            title: ChartKind::ResponseTime.title(),
            y_desc: "Mean response time (ms)",
            bars,
        }
    }

    pub fn request_count(results: &[ImplementationReport]) -> Self {
        let bars = results
            .iter()
            .map(|r| Bar {
                label: r.summary.implementation.label().to_string(),
                value: r.summary.request_count as f64,
                error: None,
                annotation: r.summary.request_count.to_string(),
            })
            .collect();
        Self {
            title: ChartKind::RequestCount.title(),
            y_desc: "HTTP requests",
            bars,
        }
    }

    pub fn data_transfer(results: &[ImplementationReport]) -> Self {
        let bars = results
            .iter()
            .map(|r| {
                let kb = r.summary.bytes_transferred as f64 / 1024.0;
                Bar {
                    label: r.summary.implementation.label().to_string(),
                    value: kb,
                    error: None,
                    annotation: format!("{:.1} KB", kb),
                }
            })
            .collect();
        Self {
            title: ChartKind::DataTransfer.title(),
            y_desc: "Data transfer (KB)",
            bars,
        }
    }

    /// Top of the y axis, leaving room for annotations above the tallest bar.
    pub fn y_max(&self) -> f64 {
        let tallest = self
            .bars
            .iter()
            .map(|bar| bar.value + bar.error.unwrap_or(0.0))
            .fold(0.0, f64::max);
        if tallest > 0.0 {
            tallest * 1.2
        } else {
            1.0
        }
    }
}

/// Quartiles of one implementation's response times.
#[derive(Debug, Clone)]
pub struct DistributionBox {
    pub label: String,
    pub quartiles: Quartiles,
    /// Raw trial times, drawn as points over the box.
    pub times: Vec<f64>,
}

/// Box plot data, boxes in category order.
#[derive(Debug, Clone)]
pub struct DistributionSeries {
    pub boxes: Vec<DistributionBox>,
}

impl DistributionSeries {
    pub fn new(results: &[ImplementationReport]) -> Self {
        let boxes = results
            .iter()
            .filter(|r| !r.trials.is_empty())
            .map(|r| {
                let times: Vec<f64> = r.trials.iter().map(|t| t.response_time_ms).collect();
                DistributionBox {
                    label: r.summary.implementation.label().to_string(),
                    quartiles: Quartiles::new(&times),
                    times,
                }
            })
            .collect();
        Self { boxes }
    }

    /// Top of the y axis: above both the upper whiskers and the slowest trial.
    pub fn y_max(&self) -> f32 {
        let top = self
            .boxes
            .iter()
            .flat_map(|b| {
                let upper_fence = b.quartiles.values()[4];
                b.times.iter().map(|t| *t as f32).chain(std::iter::once(upper_fence))
            })
            .fold(0.0f32, f32::max);
        if top > 0.0 {
            top * 1.15
        } else {
            1.0
        }
    }
}

fn draw_bar_chart<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    series: &BarSeries,
) -> Result<(), PipelineError> {
    let count = series.bars.len() as u32;

    let mut chart = ChartBuilder::on(area)
        .caption(series.title, (FONT, 24))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d((0u32..count).into_segmented(), 0f64..series.y_max())
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc(series.y_desc)
        .x_labels(series.bars.len())
        .x_label_formatter(&|x| match x {
            SegmentValue::CenterOf(i) => series
                .bars
                .get(*i as usize)
                .map(|bar| bar.label.clone())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(series.bars.iter().enumerate().map(|(i, bar)| {
            let i = i as u32;
            let mut rect = Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0.0),
                    (SegmentValue::Exact(i + 1), bar.value),
                ],
                series_color(i as usize).filled(),
            );
            rect.set_margin(0, 0, 14, 14);
            rect
        }))
        .map_err(render_err)?;

    chart
        .draw_series(series.bars.iter().enumerate().filter_map(|(i, bar)| {
            bar.error.map(|err| {
                ErrorBar::new_vertical(
                    SegmentValue::CenterOf(i as u32),
                    (bar.value - err).max(0.0),
                    bar.value,
                    bar.value + err,
                    BLACK.stroke_width(2),
                    12,
                )
            })
        }))
        .map_err(render_err)?;

    let annotation_style = TextStyle::from((FONT, 16).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom));
    chart
        .draw_series(series.bars.iter().enumerate().map(|(i, bar)| {
            let top = bar.value + bar.error.unwrap_or(0.0);
            Text::new(
                bar.annotation.clone(),
                (SegmentValue::CenterOf(i as u32), top),
                annotation_style.clone(),
            )
        }))
        .map_err(render_err)?;

    Ok(())
}

fn draw_stability_chart<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    results: &[ImplementationReport],
) -> Result<(), PipelineError> {
    let last_trial = results
        .iter()
        .flat_map(|r| r.trials.iter().map(|t| t.trial_index))
        .max()
        .unwrap_or(1);
    let slowest = results
        .iter()
        .flat_map(|r| r.trials.iter().map(|t| t.response_time_ms))
        .fold(0.0, f64::max);
    let y_max = if slowest > 0.0 { slowest * 1.15 } else { 1.0 };

    let mut chart = ChartBuilder::on(area)
        .caption(ChartKind::Stability.title(), (FONT, 24))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0u32..last_trial + 1, 0f64..y_max)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("Trial")
        .y_desc("Response time (ms)")
        .draw()
        .map_err(render_err)?;

    for (i, result) in results.iter().enumerate() {
        let color = series_color(i);
        let points: Vec<(u32, f64)> = result
            .trials
            .iter()
            .map(|t| (t.trial_index, t.response_time_ms))
            .collect();

        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
            .map_err(render_err)?
            .label(result.summary.implementation.label())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

        chart
            .draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))
            .map_err(render_err)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;

    Ok(())
}

fn draw_distribution_chart<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    series: &DistributionSeries,
) -> Result<(), PipelineError> {
    let count = series.boxes.len() as u32;

    let mut chart = ChartBuilder::on(area)
        .caption(ChartKind::Distribution.title(), (FONT, 24))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d((0u32..count).into_segmented(), 0f32..series.y_max())
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc("Response time (ms)")
        .x_labels(series.boxes.len())
        .x_label_formatter(&|x| match x {
            SegmentValue::CenterOf(i) => series
                .boxes
                .get(*i as usize)
                .map(|b| b.label.clone())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(series.boxes.iter().enumerate().map(|(i, b)| {
            Boxplot::new_vertical(SegmentValue::CenterOf(i as u32), &b.quartiles)
                .width(40)
                .whisker_width(0.5)
                .style(series_color(i).stroke_width(2))
        }))
        .map_err(render_err)?;

    for (i, b) in series.boxes.iter().enumerate() {
        let color = series_color(i);
        chart
            .draw_series(b.times.iter().map(|t| {
                Circle::new(
                    (SegmentValue::CenterOf(i as u32), *t as f32),
                    3,
                    color.mix(0.6).filled(),
                )
            }))
            .map_err(render_err)?;
    }

    Ok(())
}

/// Renders comparison charts as PNG files into a directory.
#[derive(Debug, Clone)]
pub struct ChartReporter {
    output_dir: PathBuf,
    options: ChartOptions,
}

impl ChartReporter {
    pub fn new(output_dir: impl Into<PathBuf>, options: ChartOptions) -> Self {
        Self {
            output_dir: output_dir.into(),
            options,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Paths this reporter writes, in rendering order.
    pub fn chart_paths(&self) -> Vec<PathBuf> {
        self.kinds()
            .map(|kind| self.output_dir.join(kind.file_name()))
            .collect()
    }

    fn kinds(&self) -> impl Iterator<Item = ChartKind> + '_ {
        ChartKind::ALL
            .into_iter()
            .filter(|kind| *kind != ChartKind::Overview || self.options.overview)
    }

    fn render<F>(&self, kind: ChartKind, size: (u32, u32), draw: F) -> Result<PathBuf, PipelineError>
    where
        F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<(), PipelineError>,
    {
        let path = self.output_dir.join(kind.file_name());
        let root = BitMapBackend::new(&path, size).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        draw(&root)?;
        root.present().map_err(render_err)?;
        drop(root);

        info!("Saved {}", path.display());
        Ok(path)
    }

    /// Render every chart and return the written paths.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Io`] if the output directory cannot be created
    /// and [`PipelineError::Render`] if drawing or encoding fails.
    pub fn render_all(&self, results: &[ImplementationReport]) -> Result<Vec<PathBuf>, PipelineError> {
        std::fs::create_dir_all(&self.output_dir)?;

        let response_time = BarSeries::response_time(results);
        let request_count = BarSeries::request_count(results);
        let data_transfer = BarSeries::data_transfer(results);
        let distribution = DistributionSeries::new(results);
        let size = (self.options.width, self.options.height);

        let mut written = vec![
            self.render(ChartKind::ResponseTime, size, |area| {
                draw_bar_chart(area, &response_time)
            })?,
            self.render(ChartKind::RequestCount, size, |area| {
                draw_bar_chart(area, &request_count)
            })?,
            self.render(ChartKind::DataTransfer, size, |area| {
                draw_bar_chart(area, &data_transfer)
            })?,
            self.render(ChartKind::Stability, size, |area| {
                draw_stability_chart(area, results)
            })?,
            self.render(ChartKind::Distribution, size, |area| {
                draw_distribution_chart(area, &distribution)
            })?,
        ];

        if self.options.overview {
            let size = (self.options.overview_width, self.options.overview_height);
            written.push(self.render(ChartKind::Overview, size, |area| {
                let titled = area
                    .titled(ChartKind::Overview.title(), (FONT, 32))
                    .map_err(render_err)?;
                // Two rows of three; the last cell stays blank.
                let panels = titled.split_evenly((2, 3));
                draw_bar_chart(&panels[0], &response_time)?;
                draw_bar_chart(&panels[1], &request_count)?;
                draw_bar_chart(&panels[2], &data_transfer)?;
                draw_stability_chart(&panels[3], results)?;
                draw_distribution_chart(&panels[4], &distribution)
            })?);
        }

        Ok(written)
    }
}

impl Reporter for ChartReporter {
    fn report(&self, results: &[ImplementationReport]) -> Result<(), PipelineError> {
        self.render_all(results).map(|_| ())
    }
}
