//! Resolution reports — what a build configuration resolved to.
//!
//! A report carries the active feature list plus two SHA-256 hashes: one
//! over the outcome alone, for comparing builds, and one over everything
//! the report states, so a stored report can be checked for tampering.
//! No timestamps in report content.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use feature_resolver::hashing::{
    canonical_outcome, canonical_report, resolution_fingerprint, rules_fingerprint, sha256_hex,
};
use feature_resolver::{project, Diagnostic, Resolution, RuleTable, RESOLVER_VERSION};

/// Report on-disk format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolutionReport {
    /// Resolver version at resolution time.
    pub resolver_version: u32,
    /// Fingerprint of the rule table used.
    pub rules_hash: String,
    /// Flags as requested, in request order.
    pub requested: Vec<String>,
    /// Active flags in declaration order.
    pub features: Vec<String>,
    pub count: usize,
    pub diagnostics: Vec<Diagnostic>,
    /// Resolution fingerprint: features and diagnostics only.
    pub outcome_hash: String,
    /// SHA-256 of the canonical report, covering every field above.
    pub hash: String,
}

impl ResolutionReport {
    pub fn new<S: AsRef<str>>(table: &RuleTable, requested: &[S], resolution: &Resolution) -> Self {
        let list = project(&resolution.features);
        let mut report = Self {
            resolver_version: RESOLVER_VERSION,
            rules_hash: rules_fingerprint(table),
            requested: requested.iter().map(|s| s.as_ref().to_string()).collect(),
            count: list.count,
            features: list.names,
            diagnostics: resolution.diagnostics.clone(),
            outcome_hash: resolution_fingerprint(resolution),
            hash: String::new(),
        };
        report.hash = report_hash(&report);
        report
    }

    fn diagnostic_flags(&self) -> Vec<&str> {
        self.diagnostics.iter().map(|d| d.flag()).collect()
    }
}

fn report_hash(report: &ResolutionReport) -> String {
    let canonical = canonical_report(
        report.resolver_version,
        &report.rules_hash,
        report.requested.as_slice(),
        report.features.as_slice(),
        report.diagnostic_flags().as_slice(),
    );
    sha256_hex(canonical.as_bytes())
}

/// Write a report as pretty JSON, creating parent directories.
pub fn save_report(path: &Path, report: &ResolutionReport) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(report)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(path, content.as_bytes())
}

pub fn load_report(path: &Path) -> io::Result<ResolutionReport> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        io::Error::new(io::ErrorKind::InvalidData, format!("Bad report: {}", e))
    })
}

/// Verify a report's internal consistency: the count matches the list,
/// the outcome hash matches features and diagnostics, and the report hash
/// matches every stated field.
pub fn verify_report(report: &ResolutionReport) -> bool {
    if report.count != report.features.len() {
        return false;
    }
    let outcome = canonical_outcome(
        report.features.as_slice(),
        report.diagnostic_flags().as_slice(),
    );
    sha256_hex(outcome.as_bytes()) == report.outcome_hash && report_hash(report) == report.hash
}

/// True if the report was produced from `table`. Only meaningful for a
/// report that passes [`verify_report`].
pub fn report_matches_rules(report: &ResolutionReport, table: &RuleTable) -> bool {
    report.rules_hash == rules_fingerprint(table)
}
