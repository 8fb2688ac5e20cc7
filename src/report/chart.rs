//! Trend chart
//!
//! Draws every counted measurement of a period with plotters into an RGB
//! buffer and encodes it as PNG for embedding.

use std::io::Cursor;

use chrono::{DateTime, Duration, FixedOffset};
use image::{DynamicImage, ImageFormat, RgbImage};
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;

use super::ReportError;
use crate::engine::{PressureDiagnosis, PressureSample, Severity};

/// Pixel size of a rendered chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSize {
    pub width: u32,
    pub height: u32,
}

/// One chart across a landscape page
pub const LARGE: ChartSize = ChartSize { width: 1000, height: 400 };
/// Two charts stacked on a landscape page
pub const SMALL: ChartSize = ChartSize { width: 1000, height: 280 };

const SYSTOLIC_COLOR: RGBColor = RGBColor(192, 0, 0);
const DIASTOLIC_COLOR: RGBColor = RGBColor(0, 112, 192);

fn chart_error<E: std::fmt::Display>(e: E) -> ReportError {
    ReportError::Chart(e.to_string())
}

/// Lower bound of the first hypertension category, if the table has one
fn alert_threshold(bounds: Option<(Option<i32>, Option<i32>)>) -> Option<f64> {
    bounds.and_then(|(lower, _)| lower).map(f64::from)
}

/// Systolic and diastolic over time as PNG bytes
pub fn trend_chart_png(
    series: &[(DateTime<FixedOffset>, PressureSample)],
    diagnosis: &PressureDiagnosis,
    size: ChartSize,
) -> Result<Vec<u8>, ReportError> {
    let Some((origin, _)) = series.first() else {
        return Err(ReportError::Chart("No data to chart".to_string()));
    };
    let origin = *origin;
    let days_since = |t: &DateTime<FixedOffset>| (*t - origin).num_minutes() as f64 / 1440.0;

    let x_max = series.last().map(|(t, _)| days_since(t)).unwrap_or(0.0).max(1.0);

    let systolic_alert = alert_threshold(diagnosis.systolic_table().bounds_of(Severity::High1));
    let diastolic_alert = alert_threshold(diagnosis.diastolic_table().bounds_of(Severity::High1));

    let lowest = series.iter().map(|(_, s)| s.diastolic()).min().unwrap_or(60) as f64;
    let highest = series.iter().map(|(_, s)| s.systolic()).max().unwrap_or(160) as f64;
    let y_min = lowest.min(diastolic_alert.unwrap_or(lowest)) - 10.0;
    let y_max = highest.max(systolic_alert.unwrap_or(highest)) + 10.0;

    let mut buffer = vec![0u8; (size.width * size.height * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (size.width, size.height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0f64..x_max, y_min..y_max)
            .map_err(chart_error)?;

        let date_label = |x: &f64| {
            let at = origin + Duration::minutes((x * 1440.0).round() as i64);
            at.format("%m/%d").to_string()
        };

        chart
            .configure_mesh()
            .x_labels(10)
            .x_label_formatter(&date_label)
            .y_desc("mmHg")
            .draw()
            .map_err(chart_error)?;

        for (threshold, color) in [(systolic_alert, SYSTOLIC_COLOR), (diastolic_alert, DIASTOLIC_COLOR)] {
            if let Some(y) = threshold {
                chart
                    .draw_series(std::iter::once(PathElement::new(
                        vec![(0.0, y), (x_max, y)],
                        ShapeStyle::from(&color.mix(0.5)).stroke_width(1),
                    )))
                    .map_err(chart_error)?;
            }
        }

        let systolic_points: Vec<(f64, f64)> = series
            .iter()
            .map(|(t, s)| (days_since(t), s.systolic() as f64))
            .collect();
        let diastolic_points: Vec<(f64, f64)> = series
            .iter()
            .map(|(t, s)| (days_since(t), s.diastolic() as f64))
            .collect();

        chart
            .draw_series(LineSeries::new(systolic_points.clone(), SYSTOLIC_COLOR.stroke_width(2)))
            .map_err(chart_error)?
            .label("Systolic")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], SYSTOLIC_COLOR.stroke_width(2)));
        chart
            .draw_series(systolic_points.iter().map(|p| Circle::new(*p, 3, SYSTOLIC_COLOR.filled())))
            .map_err(chart_error)?;

        chart
            .draw_series(LineSeries::new(diastolic_points.clone(), DIASTOLIC_COLOR.stroke_width(2)))
            .map_err(chart_error)?
            .label("Diastolic")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], DIASTOLIC_COLOR.stroke_width(2)));
        chart
            .draw_series(diastolic_points.iter().map(|p| Circle::new(*p, 3, DIASTOLIC_COLOR.filled())))
            .map_err(chart_error)?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
    }

    let img = RgbImage::from_raw(size.width, size.height, buffer)
        .ok_or_else(|| ReportError::Chart("Chart buffer does not match its size".to_string()))?;

    let mut png_bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(chart_error)?;

    Ok(png_bytes)
}
