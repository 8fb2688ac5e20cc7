//! MCP surface

pub mod server;

pub use server::BpstatsService;
