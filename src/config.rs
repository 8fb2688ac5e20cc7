//! Runtime settings
//!
//! Everything is read from `BPSTATS_*` environment variables with defaults
//! suitable for a local install.

use std::path::PathBuf;

use encoding_rs::Encoding;
use thiserror::Error;

use crate::import::{default_encoding, InputFormat, ImporterKey, DEFAULT_ORIGIN};
use crate::zone::{Zone, ZoneParseError};

pub const ENV_DATABASE_PATH: &str = "BPSTATS_DATABASE_PATH";
pub const ENV_TIMEZONE: &str = "BPSTATS_TIMEZONE";
pub const ENV_IMPORT_ENCODING: &str = "BPSTATS_IMPORT_ENCODING";
pub const ENV_IMPORT_ORIGIN: &str = "BPSTATS_IMPORT_ORIGIN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BPSTATS_TIMEZONE: {0}")]
    Zone(#[from] ZoneParseError),

    #[error("BPSTATS_IMPORT_ENCODING: unknown encoding label '{0}'")]
    Encoding(String),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_path: PathBuf,
    pub zone: Zone,
    pub encoding: &'static Encoding,
    pub importer: ImporterKey,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup(ENV_DATABASE_PATH)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let zone = match lookup(ENV_TIMEZONE) {
            Some(value) => value.parse()?,
            None => Zone::Local,
        };

        let encoding = match lookup(ENV_IMPORT_ENCODING) {
            Some(label) => {
                Encoding::for_label(label.trim().as_bytes()).ok_or(ConfigError::Encoding(label))?
            }
            None => default_encoding(),
        };

        let origin = lookup(ENV_IMPORT_ORIGIN)
            .filter(|o| !o.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ORIGIN.to_string());

        Ok(Self {
            database_path,
            zone,
            encoding,
            importer: ImporterKey::new(InputFormat::Csv, origin),
        })
    }
}

/// `<project>/data/bpstats.db`, where the project root is two levels above
/// `target/{debug,release}` when running from a cargo build tree
pub fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("bpstats.db");
    path
}
