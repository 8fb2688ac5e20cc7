//! Reports
//!
//! A report style decides which periods are summarised and how they are laid
//! out; a format decides the file type. Styles are looked up in a
//! [`ReportRegistry`] built once at startup.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::db::{Database, DbError};
use crate::engine::{quarter_bounds, PressureDiagnosis};
use crate::models::PatientInfo;
use crate::zone::Zone;

pub mod chart;
pub mod pdf;
pub mod summary;
pub mod text;

pub use summary::PeriodReport;

/// Shown at the end of every report
pub const DISCLAIMER: &str =
    "These figures are computed from self-measured values. They do not replace an assessment by a physician.";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("No usable measurements between {start} and {end}")]
    NoData { start: NaiveDate, end: NaiveDate },

    #[error("Report style '{style}' cannot be written as {format}")]
    Unsupported { style: ReportStyle, format: ReportFormat },

    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("Cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Chart generation failed: {0}")]
    Chart(String),

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("Text formatting failed")]
    Text(#[from] std::fmt::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStyle {
    /// Key figures of one period
    Simple,
    /// Key figures plus trend chart
    Standard,
    /// Current quarter against the previous one
    Compare,
}

impl ReportStyle {
    pub const ALL: [ReportStyle; 3] = [ReportStyle::Simple, ReportStyle::Standard, ReportStyle::Compare];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStyle::Simple => "simple",
            ReportStyle::Standard => "standard",
            ReportStyle::Compare => "compare",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Some(ReportStyle::Simple),
            "standard" => Some(ReportStyle::Standard),
            "compare" | "quarters" => Some(ReportStyle::Compare),
            _ => None,
        }
    }
}

impl fmt::Display for ReportStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Text,
    Pdf,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Text => "text",
            ReportFormat::Pdf => "pdf",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "pdf" => Some(ReportFormat::Pdf),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs shared by every report style
pub struct ReportContext<'a> {
    pub db: &'a Database,
    pub diagnosis: &'a PressureDiagnosis,
    pub zone: Zone,
    pub patient: Option<PatientInfo>,
    /// Date printed as creation date; also anchors the quarters of the compare style
    pub created: NaiveDate,
    /// Requested range for single-period styles, inclusive
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportContext<'_> {
    fn load_period(&self, start: NaiveDate, end: NaiveDate, label: Option<String>) -> Result<Option<PeriodReport>, ReportError> {
        let conn = self.db.get_conn()?;
        Ok(PeriodReport::load(&conn, self.diagnosis, &self.zone, start, end, label)?)
    }

    fn require_period(&self) -> Result<PeriodReport, ReportError> {
        self.load_period(self.start, self.end, None)?.ok_or(ReportError::NoData {
            start: self.start,
            end: self.end,
        })
    }
}

/// A generated report, not yet written anywhere
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    pub periods: Vec<PeriodReport>,
}

pub trait Report: Send + Sync {
    fn style(&self) -> ReportStyle;

    fn formats(&self) -> &'static [ReportFormat];

    fn render(&self, ctx: &ReportContext<'_>, format: ReportFormat) -> Result<RenderedReport, ReportError>;
}

pub struct SimpleReport;

impl Report for SimpleReport {
    fn style(&self) -> ReportStyle {
        ReportStyle::Simple
    }

    fn formats(&self) -> &'static [ReportFormat] {
        &[ReportFormat::Text, ReportFormat::Pdf]
    }

    fn render(&self, ctx: &ReportContext<'_>, format: ReportFormat) -> Result<RenderedReport, ReportError> {
        let period = ctx.require_period()?;
        let bytes = match format {
            ReportFormat::Text => text::render_period(ctx, &period)?.into_bytes(),
            ReportFormat::Pdf => pdf::render_period(ctx, &period, None)?,
        };
        Ok(RenderedReport {
            bytes,
            periods: vec![period],
        })
    }
}

pub struct StandardReport;

impl Report for StandardReport {
    fn style(&self) -> ReportStyle {
        ReportStyle::Standard
    }

    fn formats(&self) -> &'static [ReportFormat] {
        &[ReportFormat::Pdf]
    }

    fn render(&self, ctx: &ReportContext<'_>, format: ReportFormat) -> Result<RenderedReport, ReportError> {
        if format != ReportFormat::Pdf {
            return Err(ReportError::Unsupported {
                style: self.style(),
                format,
            });
        }
        let period = ctx.require_period()?;
        let png = chart::trend_chart_png(&period.series, ctx.diagnosis, chart::LARGE)?;
        let bytes = pdf::render_period(ctx, &period, Some(&png))?;
        Ok(RenderedReport {
            bytes,
            periods: vec![period],
        })
    }
}

pub struct CompareReport;

impl Report for CompareReport {
    fn style(&self) -> ReportStyle {
        ReportStyle::Compare
    }

    fn formats(&self) -> &'static [ReportFormat] {
        &[ReportFormat::Text, ReportFormat::Pdf]
    }

    fn render(&self, ctx: &ReportContext<'_>, format: ReportFormat) -> Result<RenderedReport, ReportError> {
        let previous_bounds = quarter_bounds(ctx.created, 1);
        let current_bounds = quarter_bounds(ctx.created, 0);
        let previous = ctx.load_period(previous_bounds.start, previous_bounds.end, Some(previous_bounds.label.clone()))?;
        let current = ctx.load_period(current_bounds.start, current_bounds.end, Some(current_bounds.label.clone()))?;

        if previous.is_none() && current.is_none() {
            return Err(ReportError::NoData {
                start: previous_bounds.start,
                end: current_bounds.end,
            });
        }

        let quarters = [(&previous_bounds, previous.as_ref()), (&current_bounds, current.as_ref())];
        let bytes = match format {
            ReportFormat::Text => text::render_compare(ctx, &quarters)?.into_bytes(),
            ReportFormat::Pdf => pdf::render_compare(ctx, &quarters)?,
        };

        Ok(RenderedReport {
            bytes,
            periods: previous.into_iter().chain(current).collect(),
        })
    }
}

/// Where a report went and what it covered
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutcome {
    pub style: ReportStyle,
    pub format: ReportFormat,
    pub path: PathBuf,
    pub bytes_written: usize,
    pub measurement_count: usize,
    pub day_count: usize,
    pub periods: Vec<String>,
}

#[derive(Default)]
pub struct ReportRegistry {
    reports: HashMap<ReportStyle, Box<dyn Report>>,
}

impl ReportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding all built-in styles
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SimpleReport));
        registry.register(Box::new(StandardReport));
        registry.register(Box::new(CompareReport));
        registry
    }

    pub fn register(&mut self, report: Box<dyn Report>) {
        self.reports.insert(report.style(), report);
    }

    pub fn get(&self, style: ReportStyle) -> Option<&dyn Report> {
        self.reports.get(&style).map(|report| report.as_ref())
    }

    pub fn supports(&self, style: ReportStyle, format: ReportFormat) -> bool {
        self.get(style).is_some_and(|report| report.formats().contains(&format))
    }

    /// `(style, formats)` for every registered style, in declaration order
    pub fn catalogue(&self) -> Vec<(ReportStyle, Vec<ReportFormat>)> {
        ReportStyle::ALL
            .iter()
            .filter_map(|style| self.get(*style).map(|r| (*style, r.formats().to_vec())))
            .collect()
    }

    /// Render and write to `destination`, creating parent folders
    pub fn generate(
        &self,
        style: ReportStyle,
        format: ReportFormat,
        ctx: &ReportContext<'_>,
        destination: &Path,
    ) -> Result<ReportOutcome, ReportError> {
        let report = self
            .get(style)
            .filter(|report| report.formats().contains(&format))
            .ok_or(ReportError::Unsupported { style, format })?;

        let rendered = report.render(ctx, format)?;

        let io_error = |source| ReportError::Io {
            path: destination.to_path_buf(),
            source,
        };
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(destination, &rendered.bytes).map_err(io_error)?;

        info!(
            style = %style,
            format = %format,
            path = %destination.display(),
            bytes = rendered.bytes.len(),
            "Report written"
        );

        Ok(ReportOutcome {
            style,
            format,
            path: destination.to_path_buf(),
            bytes_written: rendered.bytes.len(),
            measurement_count: rendered.periods.iter().map(|p| p.measurement_count).sum(),
            day_count: rendered.periods.iter().map(|p| p.day_count).sum(),
            periods: rendered
                .periods
                .iter()
                .map(|p| p.label.clone().unwrap_or_else(|| format!("{} to {}", p.start, p.end)))
                .collect(),
        })
    }
}
