//! Feature Resolver — Core Domain Types
//!
//! Pure data. No evaluation logic.
//! Flags are plain identifiers; rules reference them by name.

use serde::{Deserialize, Serialize};

use crate::expr::Expr;

// ── Flags ──────────────────────────────────────────────────────────

/// Whether a flag may be chosen by the user or is computed from others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    Primitive,
    Derived,
}

impl FlagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagKind::Primitive => "primitive",
            FlagKind::Derived => "derived",
        }
    }
}

/// A flag name must be a valid preprocessor identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_flag_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

// ── Rules ──────────────────────────────────────────────────────────

/// Directed edge: if `antecedent` is active, `consequent` must be active too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImplicationRule {
    pub antecedent: String,
    pub consequent: String,
}

impl ImplicationRule {
    pub fn new(antecedent: impl Into<String>, consequent: impl Into<String>) -> Self {
        Self {
            antecedent: antecedent.into(),
            consequent: consequent.into(),
        }
    }
}

/// `target` is active whenever `expression` holds over the current set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DerivedRule {
    pub target: String,
    pub expression: Expr,
}

impl DerivedRule {
    pub fn new(target: impl Into<String>, expression: Expr) -> Self {
        Self {
            target: target.into(),
            expression,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_flag_names() {
        assert!(is_valid_flag_name("P3M"));
        assert!(is_valid_flag_name("LB_BOUNDARIES_GPU"));
        assert!(is_valid_flag_name("_PRIVATE"));
        assert!(is_valid_flag_name("lower_case"));
    }

    #[test]
    fn test_invalid_flag_names() {
        assert!(!is_valid_flag_name(""));
        assert!(!is_valid_flag_name("3DP"));
        assert!(!is_valid_flag_name("WITH SPACE"));
        assert!(!is_valid_flag_name("DASH-ED"));
    }

    #[test]
    fn test_flag_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FlagKind::Derived).unwrap();
        assert_eq!(json, "\"derived\"");
    }
}
