//! Play-count charts.
//!
//! A sample history is split into pages of [`POINTS_PER_CHART`] points, at
//! most [`MAX_CHARTS`] of them, and each page is drawn to a PNG in the temp
//! directory. The file lives exactly as long as its [`ChartImage`].

use chrono::{Duration, NaiveDate};
use plotters::coord::combinators::BindKeyPoints;
use plotters::prelude::*;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::plays::parse_plays;
use crate::types::Sample;
use crate::{Result, VkStatsError};

pub const MAX_CHARTS: usize = 10;
pub const POINTS_PER_CHART: usize = 10;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 500;
const TICK_EVERY_DAYS: i32 = 5;
const DASHES: usize = 40;
const DROP_LINE: RGBColor = RGBColor(160, 160, 160);

/// One plotted observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub plays: u64,
}

/// The points of one chart image; `index` is zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPage {
    pub index: usize,
    pub points: Vec<ChartPoint>,
}

/// A rendered chart on disk. The file is deleted when this is dropped.
#[derive(Debug)]
pub struct ChartImage {
    file: NamedTempFile,
}

impl ChartImage {
    /// Reserve a new, uniquely named PNG file in the temp directory.
    pub fn create() -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix("chart-")
            .suffix(".png")
            .rand_bytes(12)
            .tempfile()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Split a sample history into chart pages.
///
/// Rows whose date does not start with `YYYY-MM-DD` are dropped. Only the
/// most recent `MAX_CHARTS * POINTS_PER_CHART` points are kept.
pub fn plan_chart_pages(samples: &[Sample]) -> Result<Vec<ChartPage>> {
    let points: Vec<ChartPoint> = samples
        .iter()
        .filter_map(|sample| {
            let date = sample
                .date
                .get(..10)
                .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok());
            match date {
                Some(date) => Some(ChartPoint {
                    date,
                    plays: parse_plays(&sample.counts),
                }),
                None => {
                    log::warn!(
                        "Dropping sample of album {} with bad date {:?}",
                        sample.album_id,
                        sample.date
                    );
                    None
                }
            }
        })
        .collect();

    if points.len() < 2 {
        return Err(VkStatsError::InsufficientData {
            samples: points.len(),
        });
    }

    let limit = MAX_CHARTS * POINTS_PER_CHART;
    let recent = &points[points.len().saturating_sub(limit)..];

    Ok(recent
        .chunks(POINTS_PER_CHART)
        .take(MAX_CHARTS)
        .enumerate()
        .map(|(index, chunk)| ChartPage {
            index,
            points: chunk.to_vec(),
        })
        .collect())
}

/// Draws a chart page to an image file.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait ChartRenderer: Send + Sync {
    fn render(&self, page: &ChartPage) -> Result<ChartImage>;
}

/// Plan and render every chart page of a history.
pub fn render_charts(renderer: &dyn ChartRenderer, samples: &[Sample]) -> Result<Vec<ChartImage>> {
    let pages = plan_chart_pages(samples)?;
    log::debug!("Rendering {} charts from {} samples", pages.len(), samples.len());
    pages.iter().map(|page| renderer.render(page)).collect()
}

/// PNG line charts drawn with plotters.
#[derive(Debug, Clone, Default)]
pub struct PlottersRenderer;

impl PlottersRenderer {
    pub fn new() -> Self {
        Self
    }

    fn draw(&self, page: &ChartPage, path: &Path) -> std::result::Result<(), String> {
        let first = page.points.first().ok_or("empty chart page")?.date;
        let offset = |date: NaiveDate| (date - first).num_days() as i32;

        let span = page.points.iter().map(|p| offset(p.date)).max().unwrap_or(0);
        let max_plays = page.points.iter().map(|p| p.plays).max().unwrap_or(0) as f64;
        let y_max = max_plays * 1.1 + 1.0;
        let key_points: Vec<i32> = (0..=span).step_by(TICK_EVERY_DAYS as usize).collect();

        let coords: Vec<(i32, f64)> = page
            .points
            .iter()
            .map(|p| (offset(p.date), p.plays as f64))
            .collect();

        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("Listens over time, chart {}", page.index + 1), ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d((0..span + 1).with_key_points(key_points), 0f64..y_max)
            .map_err(|e| e.to_string())?;

        let date_label = |day: &i32| {
            (first + Duration::days(i64::from(*day)))
                .format("%d %b")
                .to_string()
        };
        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Listens")
            .x_label_formatter(&date_label)
            .y_label_formatter(&|v| format!("{v:.0}"))
            .draw()
            .map_err(|e| e.to_string())?;

        let dash = y_max / DASHES as f64;
        for &(x, y) in &coords {
            let segments = (0..DASHES)
                .step_by(2)
                .map(|i| i as f64 * dash)
                .take_while(|start| *start < y)
                .map(|start| PathElement::new(vec![(x, start), (x, (start + dash).min(y))], &DROP_LINE));
            chart.draw_series(segments).map_err(|e| e.to_string())?;
        }

        chart
            .draw_series(LineSeries::new(coords.clone(), BLUE.stroke_width(2)))
            .map_err(|e| e.to_string())?
            .label("Listens")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

        chart
            .draw_series(coords.iter().map(|&(x, y)| {
                EmptyElement::at((x, y))
                    + Circle::new((0, 0), 4, BLUE.filled())
                    + Text::new(format!("{}", y as u64), (-10, -20), ("sans-serif", 14).into_font())
            }))
            .map_err(|e| e.to_string())?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(|e| e.to_string())?;

        root.present().map_err(|e| e.to_string())?;
        Ok(())
    }
}

impl ChartRenderer for PlottersRenderer {
    fn render(&self, page: &ChartPage) -> Result<ChartImage> {
        let image = ChartImage::create()?;
        self.draw(page, image.path()).map_err(VkStatsError::Chart)?;
        log::debug!("Chart {} written to {}", page.index + 1, image.path().display());
        Ok(image)
    }
}
