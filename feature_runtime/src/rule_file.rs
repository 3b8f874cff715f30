//! Rule files — the JSON hand-off format for an already-parsed rule table.
//!
//! - `encode_rules`:  RuleTable → JSON string
//! - `decode_rules`:  JSON string → validated RuleTable (strict, no unknown fields)
//! - `export_rules_to_file` / `import_rules_from_file`: file I/O
//!
//! The `flags` list fixes declaration order; flags reached only through
//! rules are appended in order of first appearance.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use feature_resolver::{DerivedRule, ImplicationRule, RuleTable, RuleTableError};

/// Current rule file format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RuleFileError {
    #[error("rule file JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported rule file format_version {found} (expected {})", FORMAT_VERSION)]
    UnsupportedVersion { found: u32 },

    #[error("invalid rule table: {0}")]
    InvalidRules(#[from] RuleTableError),

    #[error("rule file I/O: {0}")]
    Io(#[from] io::Error),
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// On-disk shape of a rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDocument {
    pub format_version: u32,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub implications: Vec<ImplicationRule>,
    #[serde(default)]
    pub derived: Vec<DerivedRule>,
}

impl RuleDocument {
    pub fn from_table(table: &RuleTable) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            flags: table.flags().to_vec(),
            implications: table.implication_rules().to_vec(),
            derived: table.derived_rules().to_vec(),
        }
    }

    /// Validate and build the table.
    pub fn into_table(self) -> Result<RuleTable, RuleFileError> {
        if self.format_version != FORMAT_VERSION {
            return Err(RuleFileError::UnsupportedVersion {
                found: self.format_version,
            });
        }
        let mut builder = RuleTable::builder();
        for flag in self.flags {
            builder = builder.primitive(flag);
        }
        for rule in self.implications {
            builder = builder.implication(rule);
        }
        for rule in self.derived {
            builder = builder.derivation(rule);
        }
        Ok(builder.build()?)
    }
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

pub fn encode_rules(table: &RuleTable) -> Result<String, RuleFileError> {
    Ok(serde_json::to_string_pretty(&RuleDocument::from_table(table))?)
}

pub fn decode_rules(json: &str) -> Result<RuleTable, RuleFileError> {
    let doc: RuleDocument = serde_json::from_str(json)?;
    doc.into_table()
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Write a rule table as JSON, creating parent directories if needed.
pub fn export_rules_to_file(table: &RuleTable, path: &Path) -> Result<(), RuleFileError> {
    let json = encode_rules(table)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json.as_bytes())?;
    Ok(())
}

pub fn import_rules_from_file(path: &Path) -> Result<RuleTable, RuleFileError> {
    let content = fs::read_to_string(path)?;
    let table = decode_rules(&content)?;
    debug!(path = %path.display(), flags = table.len(), "rule file loaded");
    Ok(table)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
