//! bpstats MCP Server Implementation
//!
//! Implements the MCP server with all bpstats tools.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::Settings;
use crate::db::Database;
use crate::engine::{PressureDiagnosis, RangeTableError};
use crate::import::ImporterRegistry;
use crate::models::Measurement;
use crate::report::ReportRegistry;
use crate::tools::measurements;
use crate::tools::patient;
use crate::tools::reports;
use crate::tools::status::{StatusConfig, StatusTracker};

/// bpstats MCP Service
#[derive(Clone)]
pub struct BpstatsService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    settings: Arc<Settings>,
    diagnosis: Arc<PressureDiagnosis>,
    importers: Arc<ImporterRegistry>,
    reports: Arc<ReportRegistry>,
    tool_router: ToolRouter<BpstatsService>,
}

impl BpstatsService {
    /// Build the service with the standard classification tables and the
    /// built-in importers and report styles
    pub fn new(settings: Settings, database: Database) -> Result<Self, RangeTableError> {
        let status_config = StatusConfig {
            time_zone: settings.zone.to_string(),
            import_encoding: settings.encoding.name().to_string(),
            import_origin: settings.importer.origin.clone(),
        };
        Ok(Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(
                settings.database_path.clone(),
                status_config,
            ))),
            database,
            diagnosis: Arc::new(PressureDiagnosis::standard()?),
            importers: Arc::new(ImporterRegistry::with_defaults()),
            reports: Arc::new(ReportRegistry::with_defaults()),
            settings: Arc::new(settings),
            tool_router: Self::tool_router(),
        })
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Measurement Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ImportMeasurementsParams {
    /// Full path to the exported CSV file
    pub file_path: String,
    /// Character set label such as "utf-8" or "latin1"; defaults to the configured encoding
    pub encoding: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddMeasurementParams {
    /// "YYYY-MM-DD HH:MM" in the configured time zone, or RFC 3339
    pub timestamp: String,
    pub systolic: f64,
    pub diastolic: f64,
    /// "mmHg" (default) or "kPa"
    pub unit: Option<String>,
    /// Store the reading but leave it out of all statistics
    #[serde(default)]
    pub ignored: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListMeasurementsParams {
    /// YYYY-MM-DD
    pub start_date: String,
    /// YYYY-MM-DD, inclusive
    pub end_date: String,
    #[serde(default)]
    pub include_ignored: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SummarizePeriodParams {
    /// YYYY-MM-DD
    pub start_date: String,
    /// YYYY-MM-DD, inclusive
    pub end_date: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CompareQuartersParams {
    /// Any date in the newest quarter (YYYY-MM-DD); defaults to today
    pub reference_date: Option<String>,
    /// Number of quarters, newest included
    #[serde(default = "default_quarters")]
    pub quarters: u32,
}

fn default_quarters() -> u32 {
    2
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DumpMeasurementsParams {
    /// Path of the SQL script to write
    pub output_path: String,
}

// ============================================================================
// Report Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GenerateReportParams {
    /// "simple", "standard" or "compare"
    pub style: String,
    /// "text" or "pdf"
    #[serde(default = "default_report_format")]
    pub format: String,
    /// Path of the file to write
    pub output_path: String,
    /// YYYY-MM-DD; defaults to 30 days before end_date
    pub start_date: Option<String>,
    /// YYYY-MM-DD; defaults to today
    pub end_date: Option<String>,
    /// Creation date printed on the report (YYYY-MM-DD); defaults to today
    pub created: Option<String>,
}

fn default_report_format() -> String {
    "pdf".to_string()
}

// ============================================================================
// Patient Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetPatientInfoParams {
    pub name: String,
    /// YYYY-MM-DD
    pub birthdate: String,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl BpstatsService {
    // --- Status ---

    #[tool(description = "Get the current status of the bpstats service including build info, database status, configuration and process information")]
    async fn bpstats_status(&self) -> Result<CallToolResult, McpError> {
        let count = self.database.with_conn(Measurement::count).ok();
        let tracker = self.status_tracker.lock().await;
        json_result(&tracker.get_status(count))
    }

    #[tool(description = "Get instructions for importing readings, reading statistics and writing reports. Call this when unsure how to use the bpstats tools.")]
    fn usage_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::USAGE_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(USAGE_INSTRUCTIONS)]))
    }

    // --- Measurements ---

    #[tool(description = "Import blood pressure readings from a blutdruckdaten.de CSV export. Readings for an instant already stored are replaced.")]
    fn import_measurements(&self, Parameters(p): Parameters<ImportMeasurementsParams>) -> Result<CallToolResult, McpError> {
        let result = measurements::import_measurements(
            &self.database,
            &self.importers,
            &self.settings.importer,
            &self.settings.zone,
            &p.file_path,
            p.encoding.as_deref(),
            self.settings.encoding,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Record a single blood pressure reading")]
    fn add_measurement(&self, Parameters(p): Parameters<AddMeasurementParams>) -> Result<CallToolResult, McpError> {
        let result = measurements::add_measurement(
            &self.database,
            &self.diagnosis,
            &self.settings.zone,
            &p.timestamp,
            p.systolic,
            p.diastolic,
            p.unit.as_deref(),
            p.ignored,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List readings within a date range with their assessment")]
    fn list_measurements(&self, Parameters(p): Parameters<ListMeasurementsParams>) -> Result<CallToolResult, McpError> {
        let result = measurements::list_measurements(
            &self.database,
            &self.diagnosis,
            &self.settings.zone,
            &p.start_date,
            &p.end_date,
            p.include_ignored,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Daily values, average, end-weighted average, median and severity distribution for a date range")]
    fn summarize_period(&self, Parameters(p): Parameters<SummarizePeriodParams>) -> Result<CallToolResult, McpError> {
        let result = measurements::summarize_period(
            &self.database,
            &self.diagnosis,
            &self.settings.zone,
            &p.start_date,
            &p.end_date,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Statistics for the current calendar quarter and the quarters before it")]
    fn compare_quarters(&self, Parameters(p): Parameters<CompareQuartersParams>) -> Result<CallToolResult, McpError> {
        let result = measurements::compare_quarters(
            &self.database,
            &self.diagnosis,
            &self.settings.zone,
            p.reference_date.as_deref(),
            p.quarters,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Write all stored readings as an SQL script of upserts with UTC timestamps")]
    fn dump_measurements(&self, Parameters(p): Parameters<DumpMeasurementsParams>) -> Result<CallToolResult, McpError> {
        let result = measurements::dump_measurements(&self.database, &p.output_path)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Reports ---

    #[tool(description = "Generate a blood pressure report. Styles: simple (text/pdf), standard (pdf with trend chart), compare (current vs previous quarter, text/pdf)")]
    fn generate_report(&self, Parameters(p): Parameters<GenerateReportParams>) -> Result<CallToolResult, McpError> {
        let result = reports::generate_report(
            &self.database,
            &self.reports,
            &self.diagnosis,
            &self.settings.zone,
            &p.style,
            &p.format,
            &p.output_path,
            p.start_date.as_deref(),
            p.end_date.as_deref(),
            p.created.as_deref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List the report styles and the formats each one supports")]
    fn list_report_styles(&self) -> Result<CallToolResult, McpError> {
        json_result(&reports::list_report_styles(&self.reports))
    }

    // --- Patient ---

    #[tool(description = "Set the patient name and birthdate shown in report headers")]
    fn set_patient_info(&self, Parameters(p): Parameters<SetPatientInfoParams>) -> Result<CallToolResult, McpError> {
        let result = patient::set_patient_info(&self.database, &self.settings.zone, &p.name, &p.birthdate)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get the patient shown in report headers")]
    fn get_patient_info(&self) -> Result<CallToolResult, McpError> {
        let result = patient::get_patient_info(&self.database, &self.settings.zone)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(info) => json_result(&info),
            None => Ok(CallToolResult::success(vec![Content::text(
                r#"{"error": "Patient info not set. Call set_patient_info first."}"#,
            )])),
        }
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for BpstatsService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "bpstats".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Blood Pressure Statistics".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Blood Pressure Statistics (bpstats) - import, classify and report blood pressure readings. \
                 Call usage_instructions first when unsure. \
                 Readings: import_measurements, add_measurement, list_measurements, dump_measurements. \
                 Statistics: summarize_period, compare_quarters. \
                 Reports: generate_report, list_report_styles. \
                 Patient: set_patient_info, get_patient_info. \
                 Status: bpstats_status."
                    .into(),
            ),
        }
    }
}
