//! PDF reports
//!
//! Letter-sized portrait pages for the figures, a landscape page for charts.
//! Text uses the built-in Helvetica faces so no font files are needed.

use std::io::BufWriter;

use chrono::NaiveDate;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rgb,
};

use super::{chart, PeriodReport, ReportContext, ReportError, DISCLAIMER};
use crate::engine::{PeriodBounds, PressureDiagnosis, PressureSample, Severity};
use crate::models::PatientInfo;

const COLOR_TITLE: (u8, u8, u8) = (192, 0, 0);
const COLOR_BLACK: (u8, u8, u8) = (0, 0, 0);
const COLOR_GRAY: (u8, u8, u8) = (128, 128, 128);

const LETTER_WIDTH: f32 = 215.9;
const LETTER_HEIGHT: f32 = 279.4;
const MARGIN_LEFT: f32 = 15.0;
const MARGIN_BOTTOM: f32 = 20.0;
const CHART_DPI: f32 = 120.0;

fn pdf_error<E: std::fmt::Display>(e: E) -> ReportError {
    ReportError::Pdf(e.to_string())
}

fn rgb_to_printpdf(color: (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        color.0 as f32 / 255.0,
        color.1 as f32 / 255.0,
        color.2 as f32 / 255.0,
        None,
    ))
}

fn px_to_mm(px: u32) -> f32 {
    px as f32 / CHART_DPI * 25.4
}

/// Document under construction with a cursor that moves down the page
struct PageWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    bold: IndirectFontRef,
    layer: PdfLayerReference,
    y: f32,
    pages: usize,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self, ReportError> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(LETTER_WIDTH), Mm(LETTER_HEIGHT), "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            font,
            bold,
            layer,
            y: LETTER_HEIGHT - 20.0,
            pages: 1,
        })
    }

    fn add_text(&self, text: &str, x: f32, size: f32, color: (u8, u8, u8)) {
        self.layer.set_fill_color(rgb_to_printpdf(color));
        self.layer.use_text(text, size, Mm(x), Mm(self.y), &self.font);
    }

    fn add_bold(&self, text: &str, x: f32, size: f32, color: (u8, u8, u8)) {
        self.layer.set_fill_color(rgb_to_printpdf(color));
        self.layer.use_text(text, size, Mm(x), Mm(self.y), &self.bold);
    }

    fn add_rule(&self, x2: f32) {
        self.layer.set_outline_color(rgb_to_printpdf(COLOR_GRAY));
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN_LEFT), Mm(self.y)), false),
                (Point::new(Mm(x2), Mm(self.y)), false),
            ],
            is_closed: false,
        });
    }

    fn advance(&mut self, mm: f32) {
        self.y -= mm;
    }

    fn add_page(&mut self, width: f32, height: f32) {
        self.pages += 1;
        let (page, layer) = self.doc.add_page(Mm(width), Mm(height), format!("Page {}", self.pages));
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = height - 20.0;
    }

    /// Continue on a new portrait page when fewer than `needed` mm remain
    fn ensure_space(&mut self, needed: f32) {
        if self.y - needed < MARGIN_BOTTOM {
            self.add_page(LETTER_WIDTH, LETTER_HEIGHT);
        }
    }

    /// Place a PNG with its top edge at the cursor
    fn add_png(&mut self, png: &[u8], size: chart::ChartSize) -> Result<(), ReportError> {
        let height = px_to_mm(size.height);
        let dynamic_image = printpdf::image_crate::load_from_memory(png).map_err(pdf_error)?;
        Image::from_dynamic_image(&dynamic_image).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN_LEFT)),
                translate_y: Some(Mm(self.y - height)),
                dpi: Some(CHART_DPI),
                ..Default::default()
            },
        );
        self.advance(height + 5.0);
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, ReportError> {
        let mut writer = BufWriter::new(Vec::new());
        self.doc.save(&mut writer).map_err(pdf_error)?;
        writer.into_inner().map_err(|e| pdf_error(e.error()))
    }
}

fn write_heading(w: &mut PageWriter, title: &str, patient: Option<&PatientInfo>, created: NaiveDate) {
    w.add_bold(title, MARGIN_LEFT, 18.0, COLOR_TITLE);
    w.advance(10.0);

    if let Some(patient) = patient {
        w.add_text(&format!("Patient: {}", patient.name), MARGIN_LEFT, 11.0, COLOR_BLACK);
        w.add_text(
            &format!("Born: {} (age {})", patient.birthdate, patient.age_on(created)),
            120.0,
            11.0,
            COLOR_BLACK,
        );
        w.advance(6.0);
    }
    w.add_text(&format!("Created: {}", created), MARGIN_LEFT, 11.0, COLOR_BLACK);
    w.advance(8.0);
    w.add_rule(200.0);
    w.advance(8.0);
}

fn write_facts(w: &mut PageWriter, period: &PeriodReport) {
    w.ensure_space(25.0);
    let title = match &period.label {
        Some(label) => format!("{} ({} to {})", label, period.start, period.end),
        None => format!("Period {} to {}", period.start, period.end),
    };
    w.add_bold(&title, MARGIN_LEFT, 12.0, COLOR_BLACK);
    w.advance(7.0);

    w.add_text(&format!("First day: {}", period.first_day), MARGIN_LEFT, 10.0, COLOR_BLACK);
    w.add_text(&format!("Last day: {}", period.last_day), 80.0, 10.0, COLOR_BLACK);
    w.add_text(&format!("Total days: {}", period.total_days), 145.0, 10.0, COLOR_BLACK);
    w.advance(6.0);

    w.add_text(&format!("Measurements: {}", period.measurement_count), MARGIN_LEFT, 10.0, COLOR_BLACK);
    w.add_text(&format!("Ignored: {}", period.ignored_count), 80.0, 10.0, COLOR_BLACK);
    w.add_text(&format!("Days with values: {}", period.day_count), 145.0, 10.0, COLOR_BLACK);
    w.advance(10.0);
}

fn write_estimators(w: &mut PageWriter, period: &PeriodReport) {
    w.ensure_space(30.0);
    let columns = [MARGIN_LEFT, 60.0, 85.0, 110.0, 130.0];
    for (x, header) in columns.iter().zip(["", "Systolic", "Diastolic", "PP", "Assessment"]) {
        w.add_bold(header, *x, 9.0, COLOR_BLACK);
    }
    w.advance(5.5);

    let rows: [(&str, &PressureSample, Severity); 3] = [
        ("Average", &period.summary.average, period.assessment.average),
        (
            "Weighted average",
            &period.summary.weighted_average,
            period.assessment.weighted_average,
        ),
        ("Median", &period.summary.median, period.assessment.median),
    ];
    for (caption, sample, severity) in rows {
        w.add_text(caption, columns[0], 9.0, COLOR_BLACK);
        w.add_text(&sample.systolic().to_string(), columns[1], 9.0, COLOR_BLACK);
        w.add_text(&sample.diastolic().to_string(), columns[2], 9.0, COLOR_BLACK);
        w.add_text(&sample.pulse_pressure().to_string(), columns[3], 9.0, COLOR_BLACK);
        w.add_text(severity.display_name(), columns[4], 9.0, severity.color());
        w.advance(5.0);
    }
    w.advance(5.0);
}

fn write_distribution(w: &mut PageWriter, period: &PeriodReport, diagnosis: &PressureDiagnosis) {
    w.ensure_space(50.0);
    w.add_bold(
        &format!("Distribution of {} measurements", period.distribution.total()),
        MARGIN_LEFT,
        11.0,
        COLOR_BLACK,
    );
    w.advance(6.0);

    let columns = [MARGIN_LEFT, 65.0, 90.0, 105.0, 125.0, 150.0, 165.0];
    let headers = ["", "Systolic", "N", "%", "Diastolic", "N", "%"];
    for (x, header) in columns.iter().zip(headers) {
        w.add_bold(header, *x, 8.0, COLOR_BLACK);
    }
    w.advance(5.0);

    let systolic = diagnosis.systolic_table();
    let diastolic = diagnosis.diastolic_table();
    for (severity, bucket) in period.distribution.rows() {
        let values = [
            severity.display_name().to_string(),
            systolic.caption(severity),
            bucket.systolic_count.to_string(),
            format!("{:.1}", bucket.systolic_percent),
            diastolic.caption(severity),
            bucket.diastolic_count.to_string(),
            format!("{:.1}", bucket.diastolic_percent),
        ];
        for (i, (x, value)) in columns.iter().zip(values.iter()).enumerate() {
            let color = if i == 0 { severity.color() } else { COLOR_BLACK };
            w.add_text(value, *x, 8.0, color);
        }
        w.advance(4.5);
    }
    w.advance(6.0);
}

fn write_daily(w: &mut PageWriter, period: &PeriodReport, diagnosis: &PressureDiagnosis) {
    w.ensure_space(20.0);
    w.add_bold("Daily values", MARGIN_LEFT, 11.0, COLOR_BLACK);
    w.advance(6.0);

    let columns = [MARGIN_LEFT, 40.0, 55.0, 75.0, 95.0, 115.0];
    let headers = ["Date", "Day", "Systolic", "Diastolic", "PP", "Assessment"];
    let write_headers = |w: &PageWriter| {
        for (x, header) in columns.iter().zip(headers) {
            w.add_bold(header, *x, 8.0, COLOR_BLACK);
        }
    };
    write_headers(&*w);
    w.advance(5.0);

    for (date, sample) in period.daily.iter() {
        if w.y - 4.5 < MARGIN_BOTTOM {
            w.add_page(LETTER_WIDTH, LETTER_HEIGHT);
            write_headers(&*w);
            w.advance(5.0);
        }
        let severity = diagnosis.assess(sample);
        w.add_text(&date.to_string(), columns[0], 7.5, COLOR_BLACK);
        w.add_text(&date.format("%a").to_string(), columns[1], 7.5, COLOR_BLACK);
        w.add_text(&sample.systolic().to_string(), columns[2], 7.5, severity.color());
        w.add_text(&sample.diastolic().to_string(), columns[3], 7.5, severity.color());
        w.add_text(&sample.pulse_pressure().to_string(), columns[4], 7.5, COLOR_BLACK);
        w.add_text(severity.display_name(), columns[5], 7.5, severity.color());
        w.advance(4.5);
    }
    w.advance(6.0);
}

fn write_disclaimer(w: &mut PageWriter) {
    w.ensure_space(12.0);
    w.add_rule(200.0);
    w.advance(5.0);
    w.add_text(DISCLAIMER, MARGIN_LEFT, 7.5, COLOR_GRAY);
}

fn write_legend(w: &mut PageWriter, diagnosis: &PressureDiagnosis) {
    w.add_bold("Legend:", MARGIN_LEFT, 9.0, COLOR_BLACK);
    let mut x = 35.0;
    for severity in Severity::ALL {
        let caption = diagnosis.systolic_table().caption(severity);
        w.add_text(&format!("{} {}", severity.display_name(), caption), x, 7.5, severity.color());
        x += 34.0;
    }
    w.advance(6.0);
    w.add_text(
        "Systolic in red, diastolic in blue; faint lines mark the start of hypertension level 1.",
        MARGIN_LEFT,
        8.0,
        COLOR_GRAY,
    );
    w.advance(8.0);
}

/// One period; `chart_png` adds a landscape chart page
pub fn period_pdf(
    patient: Option<&PatientInfo>,
    created: NaiveDate,
    diagnosis: &PressureDiagnosis,
    period: &PeriodReport,
    chart_png: Option<&[u8]>,
) -> Result<Vec<u8>, ReportError> {
    let mut w = PageWriter::new("Blood Pressure Report")?;
    write_heading(&mut w, "Blood Pressure Report", patient, created);
    write_facts(&mut w, period);
    write_estimators(&mut w, period);
    write_distribution(&mut w, period, diagnosis);
    write_daily(&mut w, period, diagnosis);
    write_disclaimer(&mut w);

    if let Some(png) = chart_png {
        w.add_page(LETTER_HEIGHT, LETTER_WIDTH);
        w.add_bold("Blood Pressure Trend", MARGIN_LEFT, 16.0, COLOR_TITLE);
        w.add_text(&format!("{} - {}", period.first_day, period.last_day), 120.0, 11.0, COLOR_BLACK);
        w.advance(10.0);
        w.add_png(png, chart::LARGE)?;
        write_legend(&mut w, diagnosis);
    }

    w.finish()
}

/// Quarters one after another, then a chart page with one chart per
/// quarter that has data
pub fn compare_pdf(
    patient: Option<&PatientInfo>,
    created: NaiveDate,
    diagnosis: &PressureDiagnosis,
    quarters: &[(&PeriodBounds, Option<&PeriodReport>)],
) -> Result<Vec<u8>, ReportError> {
    let mut w = PageWriter::new("Blood Pressure Quarter Comparison")?;
    write_heading(&mut w, "Blood Pressure Quarter Comparison", patient, created);

    for (bounds, period) in quarters {
        match period {
            Some(period) => {
                write_facts(&mut w, period);
                write_estimators(&mut w, period);
                write_distribution(&mut w, period, diagnosis);
            }
            None => {
                w.ensure_space(15.0);
                w.add_bold(
                    &format!("{} ({} to {})", bounds.label, bounds.start, bounds.end),
                    MARGIN_LEFT,
                    12.0,
                    COLOR_BLACK,
                );
                w.advance(7.0);
                w.add_text("No measurements.", MARGIN_LEFT, 10.0, COLOR_GRAY);
                w.advance(10.0);
            }
        }
    }
    write_disclaimer(&mut w);

    w.add_page(LETTER_HEIGHT, LETTER_WIDTH);
    w.add_bold("Blood Pressure Trend by Quarter", MARGIN_LEFT, 16.0, COLOR_TITLE);
    w.advance(8.0);
    for (bounds, period) in quarters {
        let Some(period) = period else { continue };
        let png = chart::trend_chart_png(&period.series, diagnosis, chart::SMALL)?;
        w.add_bold(&bounds.label, MARGIN_LEFT, 10.0, COLOR_BLACK);
        w.advance(2.0);
        w.add_png(&png, chart::SMALL)?;
    }
    write_legend(&mut w, diagnosis);

    w.finish()
}

pub(crate) fn render_period(
    ctx: &ReportContext<'_>,
    period: &PeriodReport,
    chart_png: Option<&[u8]>,
) -> Result<Vec<u8>, ReportError> {
    period_pdf(ctx.patient.as_ref(), ctx.created, ctx.diagnosis, period, chart_png)
}

pub(crate) fn render_compare(
    ctx: &ReportContext<'_>,
    quarters: &[(&PeriodBounds, Option<&PeriodReport>)],
) -> Result<Vec<u8>, ReportError> {
    compare_pdf(ctx.patient.as_ref(), ctx.created, ctx.diagnosis, quarters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::quarter_bounds;
    use crate::models::{Measurement, Pressure};
    use crate::zone::Zone;

    fn period(days: u32) -> PeriodReport {
        let rows: Vec<Measurement> = (1..=days)
            .map(|day| {
                let naive = NaiveDate::from_ymd_opt(2022, 3, day).unwrap().and_hms_opt(8, 0, 0).unwrap();
                Measurement::new(
                    Zone::Utc.localize(naive),
                    Pressure::mmhg(115.0 + day as f64),
                    Pressure::mmhg(75.0 + (day % 7) as f64),
                    false,
                )
            })
            .collect();
        let diagnosis = PressureDiagnosis::standard().unwrap();
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2022, 3, 31).unwrap();
        PeriodReport::assemble(&rows, &diagnosis, start, end, Some("2022-Q1".to_string())).unwrap()
    }

    #[test]
    fn test_period_pdf_with_chart() {
        let diagnosis = PressureDiagnosis::standard().unwrap();
        let report = period(31);
        let png = chart::trend_chart_png(&report.series, &diagnosis, chart::LARGE).unwrap();
        let created = NaiveDate::from_ymd_opt(2022, 4, 2).unwrap();

        let bytes = period_pdf(None, created, &diagnosis, &report, Some(&png)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_compare_pdf_with_empty_quarter() {
        let diagnosis = PressureDiagnosis::standard().unwrap();
        let created = NaiveDate::from_ymd_opt(2022, 4, 2).unwrap();
        let previous = quarter_bounds(created, 1);
        let current = quarter_bounds(created, 0);
        let report = period(10);

        let bytes = compare_pdf(None, created, &diagnosis, &[(&previous, Some(&report)), (&current, None)]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
