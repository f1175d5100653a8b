//! PNG charts for a [`TrafficSummary`].
//!
//! Text (captions, axis labels) needs a TrueType font registered through
//! [`register_font`]. Without one the charts are still drawn, just without text.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font as register_plotters_font};
use tracing::{debug, info, warn};

use crate::analyzers::types::{HOURS_PER_DAY, TrafficSummary};

pub const HOURLY_CHART: &str = "traffic_by_hour.png";
pub const DAY_TYPE_CHART: &str = "traffic_weekday_vs_weekend.png";
pub const RAIN_CHART: &str = "traffic_rain_impact.png";
pub const SNOW_CHART: &str = "traffic_snow_impact.png";

const SIZE: (u32, u32) = (800, 600);
const FONT: &str = "sans-serif";
const Y_DESC: &str = "Average Traffic Volume";

/// Fonts tried when none is configured.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Loads a TrueType font for chart text. Tries `preferred` first, then a
/// list of common system locations. Returns whether a font was registered.
pub fn register_font(preferred: Option<&Path>) -> bool {
    let registered = preferred
        .into_iter()
        .map(Path::to_path_buf)
        .chain(FONT_CANDIDATES.iter().map(PathBuf::from))
        .any(|path| register_font_file(&path));

    if !registered {
        warn!("No TrueType font found, charts will be drawn without text");
    }
    registered
}

/// Registers the font at `path`. Returns false if it cannot be read or parsed.
pub fn register_font_file(path: &Path) -> bool {
    let Ok(bytes) = std::fs::read(path) else {
        return false;
    };
    // plotters keeps registered fonts for the life of the process
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    match register_plotters_font(FONT, FontStyle::Normal, bytes) {
        Ok(()) => {
            debug!(font = %path.display(), "Chart font registered");
            true
        }
        Err(_) => {
            warn!(font = %path.display(), "Not a usable font");
            false
        }
    }
}

/// Paths of the four charts under `dir`.
pub fn chart_paths(dir: &Path) -> [PathBuf; 4] {
    [HOURLY_CHART, DAY_TYPE_CHART, RAIN_CHART, SNOW_CHART].map(|name| dir.join(name))
}

/// Writes all four charts into `dir`, returning their paths.
#[tracing::instrument(skip(summary, dir), fields(dir = %dir.display()))]
pub fn render_all(summary: &TrafficSummary, dir: &Path, with_text: bool) -> Result<[PathBuf; 4]> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    let [hourly_path, day_path, rain_path, snow_path] = chart_paths(dir);

    render_hourly(&hourly_path, &summary.hourly.averages(), with_text)?;
    render_bars(
        &day_path,
        &BarChart {
            title: "Traffic Volume: Weekdays vs. Weekends",
            x_desc: "Day Type",
            labels: ["Weekdays", "Weekends"],
            values: [
                summary.day_type.weekday.average(),
                summary.day_type.weekend.average(),
            ],
        },
        with_text,
    )?;
    render_bars(
        &rain_path,
        &BarChart {
            title: "Impact of Rain on Traffic",
            x_desc: "Condition",
            labels: ["Rainy Days", "Dry Days"],
            values: [summary.rain.wet.average(), summary.rain.dry.average()],
        },
        with_text,
    )?;
    render_bars(
        &snow_path,
        &BarChart {
            title: "Impact of Snow on Traffic",
            x_desc: "Condition",
            labels: ["Snowy Days", "Non-Snowy Days"],
            values: [summary.snow.wet.average(), summary.snow.dry.average()],
        },
        with_text,
    )?;

    info!("Charts written");
    Ok([hourly_path, day_path, rain_path, snow_path])
}

/// Y-axis range covering zero and every value, never empty.
fn value_range(values: &[f64]) -> std::ops::Range<f64> {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let low = finite.clone().fold(0.0_f64, f64::min);
    let high = finite.fold(0.0_f64, f64::max);
    if high - low <= 0.0 {
        return low..low + 1.0;
    }
    let pad = (high - low) * 0.1;
    (if low < 0.0 { low - pad } else { low })..high + pad
}

/// Line chart of average volume per hour.
pub fn render_hourly(path: &Path, averages: &[f64; HOURS_PER_DAY], with_text: bool) -> Result<()> {
    let root = BitMapBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut builder = ChartBuilder::on(&root);
    builder.margin(20);
    if with_text {
        builder
            .caption("Traffic Volume by Hour", (FONT, 28))
            .x_label_area_size(45)
            .y_label_area_size(70);
    }
    let mut chart =
        builder.build_cartesian_2d(0u32..(HOURS_PER_DAY as u32 - 1), value_range(averages))?;

    if with_text {
        chart
            .configure_mesh()
            .x_labels(HOURS_PER_DAY)
            .x_desc("Hour of the Day")
            .y_desc(Y_DESC)
            .draw()?;
    }

    let points = || (0u32..).zip(averages.iter().copied());
    chart.draw_series(LineSeries::new(points(), &BLUE))?;
    chart.draw_series(points().map(|p| Circle::new(p, 4, BLUE.filled())))?;

    root.present().with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), "Hourly chart saved");
    Ok(())
}

/// A two-bar comparison chart.
pub struct BarChart {
    pub title: &'static str,
    pub x_desc: &'static str,
    pub labels: [&'static str; 2],
    pub values: [f64; 2],
}

pub fn render_bars(path: &Path, bars: &BarChart, with_text: bool) -> Result<()> {
    let root = BitMapBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut builder = ChartBuilder::on(&root);
    builder.margin(20);
    if with_text {
        builder
            .caption(bars.title, (FONT, 28))
            .x_label_area_size(45)
            .y_label_area_size(70);
    }
    let mut chart = builder.build_cartesian_2d(
        (0u32..bars.labels.len() as u32).into_segmented(),
        value_range(&bars.values),
    )?;

    if with_text {
        let label = |v: &SegmentValue<u32>| match v {
            SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => bars
                .labels
                .get(*i as usize)
                .map(|s| s.to_string())
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&label)
            .x_desc(bars.x_desc)
            .y_desc(Y_DESC)
            .draw()?;
    }

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BLUE.filled())
            .margin(60)
            .data((0u32..).zip(bars.values.iter().copied())),
    )?;

    root.present().with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), title = bars.title, "Bar chart saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::summarize;
    use crate::parser::{Ingested, Record};

    #[test]
    fn test_value_range_all_zero() {
        assert_eq!(value_range(&[0.0, 0.0]), 0.0..1.0);
    }

    #[test]
    fn test_value_range_covers_values() {
        let range = value_range(&[100.0, 250.0]);
        assert_eq!(range.start, 0.0);
        assert!(range.end > 250.0);

        let range = value_range(&[-50.0, 10.0]);
        assert!(range.start < -50.0);
        assert!(range.end > 10.0);
    }

    #[test]
    fn test_register_font_file_rejects_non_font() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a_font.ttf");
        std::fs::write(&path, b"date_time,traffic_volume\n").unwrap();

        assert!(!register_font_file(&path));
        assert!(!register_font_file(&dir.path().join("missing.ttf")));
    }

    #[test]
    fn test_chart_paths() {
        let paths = chart_paths(Path::new("out"));
        assert_eq!(paths[0], Path::new("out").join("traffic_by_hour.png"));
        assert_eq!(paths[3], Path::new("out").join("traffic_snow_impact.png"));
    }

    #[test]
    fn test_render_all_without_text() {
        let dir = tempfile::tempdir().unwrap();
        let ingested = Ingested {
            records: vec![Record {
                timestamp: "2023-01-02 08:00:00".to_string(),
                traffic_volume: 1200,
                rainfall: 0.3,
                snowfall: 0.0,
            }],
            rows_read: 1,
            ..Default::default()
        };
        let summary = summarize("test.csv", ingested);

        let paths = render_all(&summary, dir.path(), false).unwrap();
        for path in &paths {
            let bytes = std::fs::read(path).unwrap();
            assert!(bytes.starts_with(b"\x89PNG"), "{} is not a PNG", path.display());
        }
    }
}
