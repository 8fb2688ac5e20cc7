//! Measurement import
//!
//! Importers turn an exported file into measurements. Each importer is keyed
//! by the input format and the application the file came from; the
//! [`ImporterRegistry`] is built once at startup and handed to whoever needs
//! a lookup.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::DbError;
use crate::models::Measurement;
use crate::zone::Zone;

pub mod blutdruckdaten;

pub use blutdruckdaten::BlutdruckdatenCsvImporter;

/// Latin-1, as the exports of the supported source are written
pub fn default_encoding() -> &'static Encoding {
    encoding_rs::WINDOWS_1252
}

pub const DEFAULT_ORIGIN: &str = blutdruckdaten::ORIGIN;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Import file is missing: {0}")]
    FileMissing(PathBuf),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No importer for format {} from '{}'", .0.format, .0.origin)]
    NoImporter(ImporterKey),

    #[error("Unknown character encoding '{0}'")]
    UnknownEncoding(String),

    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Csv,
    Json,
    Xml,
}

impl InputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Csv => "csv",
            InputFormat::Json => "json",
            InputFormat::Xml => "xml",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Some(InputFormat::Csv),
            "json" => Some(InputFormat::Json),
            "xml" => Some(InputFormat::Xml),
            _ => None,
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies an importer: file format plus the application that wrote it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImporterKey {
    pub format: InputFormat,
    pub origin: String,
}

impl ImporterKey {
    pub fn new(format: InputFormat, origin: impl Into<String>) -> Self {
        Self {
            format,
            origin: origin.into(),
        }
    }
}

pub trait DataImporter: Send + Sync {
    fn key(&self) -> ImporterKey;

    /// Read every measurement in `source`. Lines that are not records are
    /// skipped; only failing to read the file is an error. `encoding`
    /// overrides the importer's default.
    fn parse(&self, source: &Path, zone: &Zone, encoding: Option<&'static Encoding>) -> Result<Vec<Measurement>, ImportError>;
}

#[derive(Default)]
pub struct ImporterRegistry {
    importers: HashMap<ImporterKey, Box<dyn DataImporter>>,
}

impl ImporterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every importer this crate ships
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(BlutdruckdatenCsvImporter));
        registry
    }

    /// Add an importer; one registered earlier under the same key is replaced
    pub fn register(&mut self, importer: Box<dyn DataImporter>) {
        self.importers.insert(importer.key(), importer);
    }

    pub fn get(&self, key: &ImporterKey) -> Option<&dyn DataImporter> {
        self.importers.get(key).map(|importer| importer.as_ref())
    }

    pub fn keys(&self) -> Vec<ImporterKey> {
        let mut keys: Vec<ImporterKey> = self.importers.keys().cloned().collect();
        keys.sort_by(|a, b| (a.format.as_str(), &a.origin).cmp(&(b.format.as_str(), &b.origin)));
        keys
    }

    /// Look up the importer for `key` and run it
    pub fn import(
        &self,
        key: &ImporterKey,
        source: &Path,
        zone: &Zone,
        encoding: Option<&'static Encoding>,
    ) -> Result<Vec<Measurement>, ImportError> {
        if !source.exists() {
            return Err(ImportError::FileMissing(source.to_path_buf()));
        }
        let importer = self.get(key).ok_or_else(|| ImportError::NoImporter(key.clone()))?;
        importer.parse(source, zone, encoding)
    }
}

/// Resolve a WHATWG encoding label such as `utf-8` or `latin1`
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding, ImportError> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| ImportError::UnknownEncoding(label.to_string()))
}
