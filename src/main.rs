//! Blood Pressure Statistics (bpstats)
//!
//! An MCP server for blood pressure import, statistics and reports.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bpstats::build_info::{self, BuildInfo};
use bpstats::config::Settings;
use bpstats::db::{self, Database};
use bpstats::mcp::BpstatsService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging goes to stderr, stdout carries the MCP transport
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("bpstats=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner();

    let settings = Settings::from_env()?;
    info!(
        database = %settings.database_path.display(),
        zone = %settings.zone,
        encoding = settings.encoding.name(),
        origin = %settings.importer.origin,
        "Configuration loaded"
    );

    let database = Database::open(&settings.database_path)?;
    let version = database.with_conn(db::migrations::get_schema_version)?;
    info!(schema_version = version, build = %BuildInfo::current().summary(), "Database ready");

    let service = BpstatsService::new(settings, database)?;

    eprintln!("Starting MCP server on stdio...");
    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}
