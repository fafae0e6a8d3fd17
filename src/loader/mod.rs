// FAQ spreadsheet loading
// Turns every CSV row into one FaqDocument keyed by the configured column


use csv::{ReaderBuilder, StringRecord, Trim};
use encoding_rs::Encoding;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::SourceConfig;

/// One FAQ row rendered for embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqDocument {
    /// Every column of the row as `header: value` lines
    pub content: String,
    /// Value of the key column, used as the lookup field
    pub source: String,
    /// Zero-based data row number (the header is not counted)
    pub row: usize,
}

/// Broad class of a load failure, used for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFailure {
    Decode,
    Structure,
    Unexpected,
}

impl fmt::Display for LoadFailure {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Decode => "decode",
            Self::Structure => "structure",
            Self::Unexpected => "unexpected",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),

    #[error("{path} is not valid {encoding} text")]
    Decode { path: PathBuf, encoding: String },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Key column '{column}' not found in CSV header {headers:?}")]
    MissingKeyColumn {
        column: String,
        headers: Vec<String>,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} contains no indexable FAQ rows")]
    Empty(PathBuf),
}

impl LoadError {
    #[inline]
    pub fn category(&self) -> LoadFailure {
        match self {
            Self::UnknownEncoding(_) | Self::Decode { .. } => LoadFailure::Decode,
            Self::Csv(_) | Self::MissingKeyColumn { .. } => LoadFailure::Structure,
            Self::Read { .. } | Self::Empty(_) => LoadFailure::Unexpected,
        }
    }
}

/// Documents parsed from a source plus the rows that had to be dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSource {
    pub documents: Vec<FaqDocument>,
    pub skipped_rows: Vec<usize>,
}

pub struct FaqLoader {
    path: PathBuf,
    encoding: String,
    key_column: String,
    delimiter: u8,
}

impl FaqLoader {
    /// Build a loader for `path` using the encoding, key column and delimiter of `source`
    #[inline]
    pub fn new(path: impl Into<PathBuf>, source: &SourceConfig) -> Self {
        Self {
            path: path.into(),
            encoding: source.encoding.clone(),
            key_column: source.key_column.clone(),
            delimiter: source.delimiter_byte().unwrap_or(b','),
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and parse the source, logging any failure with its category before returning it
    #[inline]
    pub fn load(&self) -> Result<LoadedSource, LoadError> {
        match self.try_load() {
            Ok(loaded) => {
                info!(
                    "Loaded {} FAQ documents from {} ({} rows skipped)",
                    loaded.documents.len(),
                    self.path.display(),
                    loaded.skipped_rows.len()
                );
                Ok(loaded)
            }
            Err(e) => {
                let category = e.category();
                error!(%category, "Error loading FAQ source {}: {}", self.path.display(), e);
                Err(e)
            }
        }
    }

    fn try_load(&self) -> Result<LoadedSource, LoadError> {
        let bytes = std::fs::read(&self.path).map_err(|source| LoadError::Read {
            path: self.path.clone(),
            source,
        })?;
        debug!("Read {} bytes from {}", bytes.len(), self.path.display());

        let text = decode(&bytes, &self.encoding, &self.path)?;
        let loaded = parse_documents(&text, &self.key_column, self.delimiter)?;

        if loaded.documents.is_empty() {
            return Err(LoadError::Empty(self.path.clone()));
        }

        Ok(loaded)
    }
}

/// Decode raw bytes with a WHATWG encoding label, rejecting malformed input
#[inline]
pub fn decode(bytes: &[u8], label: &str, path: &Path) -> Result<String, LoadError> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| LoadError::UnknownEncoding(label.to_string()))?;

    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(LoadError::Decode {
            path: path.to_path_buf(),
            encoding: actual.name().to_string(),
        });
    }

    Ok(text.into_owned())
}

/// Parse decoded CSV text into one document per row with a non-empty key
#[inline]
pub fn parse_documents(
    text: &str,
    key_column: &str,
    delimiter: u8,
) -> Result<LoadedSource, LoadError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let key_index = headers
        .iter()
        .position(|h| h == key_column.trim())
        .ok_or_else(|| LoadError::MissingKeyColumn {
            column: key_column.to_string(),
            headers: headers.iter().map(str::to_string).collect(),
        })?;

    let mut documents = Vec::new();
    let mut skipped_rows = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let key = record.get(key_index).unwrap_or_default();

        if key.is_empty() {
            warn!("Skipping row {}: key column '{}' is empty", row, key_column);
            skipped_rows.push(row);
            continue;
        }

        documents.push(FaqDocument {
            content: render_row(&headers, &record),
            source: key.to_string(),
            row,
        });
    }

    Ok(LoadedSource {
        documents,
        skipped_rows,
    })
}

fn render_row(headers: &StringRecord, record: &StringRecord) -> String {
    headers
        .iter()
        .zip(record.iter())
        .map(|(header, value)| format!("{}: {}", header, value))
        .join("\n")
}
