//! Feature Resolver — Canonical Hashing
//!
//! Deterministic canonical serialization + SHA-256 fingerprints.
//! Byte-identical output across platforms and runs.
//!
//! Rules:
//!   - `resolver_version` is always the first field
//!   - Flags and rules in declaration order (never sorted, never hashed-map order)
//!   - UTF-8 JSON, no whitespace

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::engine::Resolution;
use crate::expr::Expr;
use crate::rules::RuleTable;
use crate::RESOLVER_VERSION;

/// SHA-256 of `bytes` as lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

// ---------------------------------------------------------------------------
// Rule tables
// ---------------------------------------------------------------------------

/// Canonical JSON of a rule table.
///
/// Field order: resolver_version, flags, implications, derived
pub fn canonical_rules(table: &RuleTable) -> String {
    let flags: Vec<Value> = table
        .flags()
        .iter()
        .map(|name| {
            let mut m = Map::new();
            m.insert("name".to_string(), Value::String(name.clone()));
            let kind = table.kind(name).map(|k| k.as_str()).unwrap_or("primitive");
            m.insert("kind".to_string(), Value::String(kind.to_string()));
            Value::Object(m)
        })
        .collect();

    let implications: Vec<Value> = table
        .implication_rules()
        .iter()
        .map(|r| {
            Value::Array(vec![
                Value::String(r.antecedent.clone()),
                Value::String(r.consequent.clone()),
            ])
        })
        .collect();

    let derived: Vec<Value> = table
        .derived_rules()
        .iter()
        .map(|r| {
            let mut m = Map::new();
            m.insert("target".to_string(), Value::String(r.target.clone()));
            m.insert("expression".to_string(), expr_value(&r.expression));
            Value::Object(m)
        })
        .collect();

    let mut root = Map::new();
    root.insert("resolver_version".to_string(), Value::from(RESOLVER_VERSION));
    root.insert("flags".to_string(), Value::Array(flags));
    root.insert("implications".to_string(), Value::Array(implications));
    root.insert("derived".to_string(), Value::Array(derived));
    Value::Object(root).to_string()
}

/// Identity of a rule table: SHA-256 of its canonical JSON.
pub fn rules_fingerprint(table: &RuleTable) -> String {
    sha256_hex(canonical_rules(table).as_bytes())
}

fn expr_value(expr: &Expr) -> Value {
    let (tag, inner) = match expr {
        Expr::Flag(name) => ("flag", Value::String(name.clone())),
        Expr::All(items) => ("all", Value::Array(items.iter().map(expr_value).collect())),
        Expr::Any(items) => ("any", Value::Array(items.iter().map(expr_value).collect())),
    };
    let mut m = Map::new();
    m.insert(tag.to_string(), inner);
    Value::Object(m)
}

// ---------------------------------------------------------------------------
// Resolutions
// ---------------------------------------------------------------------------

/// Canonical JSON of a resolution's observable outcome.
///
/// Field order: resolver_version, features, count, diagnostics.
/// The round count is excluded; it varies with the schedule.
pub fn canonical_resolution(resolution: &Resolution) -> String {
    let diagnostics: Vec<&str> = resolution.diagnostics.iter().map(|d| d.flag()).collect();
    canonical_outcome(resolution.active_flags().as_slice(), diagnostics.as_slice())
}

/// Canonical JSON from already-projected parts: active feature names in
/// declaration order and the flags named by diagnostics.
pub fn canonical_outcome<S, D>(features: &[S], diagnostics: &[D]) -> String
where
    S: AsRef<str>,
    D: AsRef<str>,
{
    let feature_values: Vec<Value> = features
        .iter()
        .map(|s| Value::String(s.as_ref().to_string()))
        .collect();
    let diagnostic_values: Vec<Value> = diagnostics
        .iter()
        .map(|d| Value::String(d.as_ref().to_string()))
        .collect();

    let count = feature_values.len();

    let mut root = Map::new();
    root.insert("resolver_version".to_string(), Value::from(RESOLVER_VERSION));
    root.insert("features".to_string(), Value::Array(feature_values));
    root.insert("count".to_string(), Value::from(count));
    root.insert("diagnostics".to_string(), Value::Array(diagnostic_values));
    Value::Object(root).to_string()
}

/// Identity of a resolved configuration.
pub fn resolution_fingerprint(resolution: &Resolution) -> String {
    sha256_hex(canonical_resolution(resolution).as_bytes())
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Canonical JSON of a stored report: which rules, which request, and
/// what came out.
///
/// Field order: resolver_version, rules_hash, requested, features, count,
/// diagnostics.
pub fn canonical_report<R, S, D>(
    resolver_version: u32,
    rules_hash: &str,
    requested: &[R],
    features: &[S],
    diagnostics: &[D],
) -> String
where
    R: AsRef<str>,
    S: AsRef<str>,
    D: AsRef<str>,
{
    let mut root = Map::new();
    root.insert("resolver_version".to_string(), Value::from(resolver_version));
    root.insert("rules_hash".to_string(), Value::String(rules_hash.to_string()));
    root.insert("requested".to_string(), string_array(requested));
    root.insert("features".to_string(), string_array(features));
    root.insert("count".to_string(), Value::from(features.len()));
    root.insert("diagnostics".to_string(), string_array(diagnostics));
    Value::Object(root).to_string()
}

fn string_array<T: AsRef<str>>(items: &[T]) -> Value {
    Value::Array(
        items
            .iter()
            .map(|s| Value::String(s.as_ref().to_string()))
            .collect(),
    )
}
