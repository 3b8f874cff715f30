//! Drift detection — determinism verification and report comparison.

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use feature_resolver::hashing::resolution_fingerprint;
use feature_resolver::{resolve, ResolveError, RuleTable};

use crate::report::ResolutionReport;

#[derive(Debug, Error)]
pub enum DriftError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("DETERMINISM FAILURE: two resolutions produced different hashes.\nRun 1: {first}\nRun 2: {second}")]
    Nondeterministic { first: String, second: String },
}

/// Resolve the same request twice and require identical fingerprints.
/// Returns the fingerprint.
pub fn verify_determinism<I, S>(table: &RuleTable, initial: I) -> Result<String, DriftError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let request: Vec<String> = initial.into_iter().map(|s| s.as_ref().to_string()).collect();
    let first = resolution_fingerprint(&resolve(table, request.as_slice())?);
    let second = resolution_fingerprint(&resolve(table, request.as_slice())?);

    if first != second {
        return Err(DriftError::Nondeterministic { first, second });
    }
    Ok(first)
}

/// Structured comparison of two reports, `a` being the baseline.
pub fn compare(a: &ResolutionReport, b: &ResolutionReport) -> DriftReport {
    let features_a: BTreeSet<&str> = a.features.iter().map(|s| s.as_str()).collect();
    let features_b: BTreeSet<&str> = b.features.iter().map(|s| s.as_str()).collect();

    // Keep each side's declaration order rather than set order.
    let added = b
        .features
        .iter()
        .filter(|f| !features_a.contains(f.as_str()))
        .cloned()
        .collect();
    let removed = a
        .features
        .iter()
        .filter(|f| !features_b.contains(f.as_str()))
        .cloned()
        .collect();

    let diag_a: BTreeSet<&str> = a.diagnostics.iter().map(|d| d.flag()).collect();
    let diag_b: BTreeSet<&str> = b.diagnostics.iter().map(|d| d.flag()).collect();

    DriftReport {
        count_a: a.count as i64,
        count_b: b.count as i64,
        count_delta: b.count as i64 - a.count as i64,
        added_features: added,
        removed_features: removed,
        new_diagnostics: diag_b.difference(&diag_a).map(|s| s.to_string()).collect(),
        cleared_diagnostics: diag_a.difference(&diag_b).map(|s| s.to_string()).collect(),
        same_rules: a.rules_hash == b.rules_hash,
        same_outcome: a.outcome_hash == b.outcome_hash,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    pub count_a: i64,
    pub count_b: i64,
    pub count_delta: i64,
    pub added_features: Vec<String>,
    pub removed_features: Vec<String>,
    pub new_diagnostics: Vec<String>,
    pub cleared_diagnostics: Vec<String>,
    pub same_rules: bool,
    pub same_outcome: bool,
}

impl DriftReport {
    pub fn is_empty(&self) -> bool {
        self.added_features.is_empty()
            && self.removed_features.is_empty()
            && self.new_diagnostics.is_empty()
            && self.cleared_diagnostics.is_empty()
    }
}
