//! Feature Resolver — Closure Invariants
//!
//! Checks a resolved set against its rule table. The resolver runs these
//! once the fixpoint is reached; a failure means the schedule or the
//! table is broken, never the user's input.

use thiserror::Error;

use crate::rules::RuleTable;
use crate::state::FeatureSet;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClosureViolation {
    #[error("[INVARIANT:implication_closure] {antecedent} is active but implied {consequent} is not")]
    UnclosedImplication {
        antecedent: String,
        consequent: String,
    },

    #[error("[INVARIANT:derived_closure] {target} is inactive although `{expression}` holds")]
    MissingDerivedFlag { target: String, expression: String },

    #[error("[INVARIANT:derived_closure] {target} is active without `{expression}`, a request or an implication")]
    UnexplainedDerivedFlag { target: String, expression: String },
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Verify implication and derived closure. Returns the first violation.
///
/// `requested` is the caller's initial selection: a derived flag that was
/// requested directly may stay active while its expression is false.
pub fn validate_closure<S: AsRef<str>>(
    table: &RuleTable,
    set: &FeatureSet,
    requested: &[S],
) -> Result<(), ClosureViolation> {
    check_implication_closure(table, set)?;
    check_derived_closure(table, set, requested)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

/// active(A) ⟹ active(B) for every rule A → B.
fn check_implication_closure(table: &RuleTable, set: &FeatureSet) -> Result<(), ClosureViolation> {
    for rule in table.implication_rules() {
        if set.is_active(&rule.antecedent) && !set.is_active(&rule.consequent) {
            return Err(ClosureViolation::UnclosedImplication {
                antecedent: rule.antecedent.clone(),
                consequent: rule.consequent.clone(),
            });
        }
    }
    Ok(())
}

/// Expression true ⟹ target active; target active ⟹ expression true,
/// unless the target was requested or is forced by an active antecedent.
fn check_derived_closure<S: AsRef<str>>(
    table: &RuleTable,
    set: &FeatureSet,
    requested: &[S],
) -> Result<(), ClosureViolation> {
    for rule in table.derived_rules() {
        let holds = rule.expression.evaluate(&|name| set.is_active(name));
        let active = set.is_active(&rule.target);

        if holds && !active {
            return Err(ClosureViolation::MissingDerivedFlag {
                target: rule.target.clone(),
                expression: rule.expression.to_string(),
            });
        }

        if active && !holds {
            let was_requested = requested.iter().any(|r| r.as_ref() == rule.target);
            let is_implied = table.implication_rules().iter().any(|imp| {
                imp.consequent == rule.target && set.is_active(&imp.antecedent)
            });
            if !was_requested && !is_implied {
                return Err(ClosureViolation::UnexplainedDerivedFlag {
                    target: rule.target.clone(),
                    expression: rule.expression.to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;

    fn table() -> RuleTable {
        RuleTable::builder()
            .implies("A", "B")
            .implies("F", "D")
            .derived("D", Expr::all_of(["B", "C"]))
            .build()
            .unwrap()
    }

    fn set_of(t: &RuleTable, names: &[&str]) -> FeatureSet {
        let idx: Vec<usize> = names
            .iter()
            .map(|n| t.universe().index_of(n).unwrap())
            .collect();
        FeatureSet::with_active(t.universe().clone(), &idx)
    }

    const NONE: &[&str] = &[];

    #[test]
    fn test_closed_set_passes() {
        let t = table();
        assert!(validate_closure(&t, &set_of(&t, &["A", "B", "C", "D"]), NONE).is_ok());
        assert!(validate_closure(&t, &set_of(&t, &[]), NONE).is_ok());
    }

    #[test]
    fn test_unclosed_implication() {
        let t = table();
        let err = validate_closure(&t, &set_of(&t, &["A"]), NONE).unwrap_err();
        assert!(matches!(err, ClosureViolation::UnclosedImplication { .. }));
        assert!(err.to_string().contains("implication_closure"));
    }

    #[test]
    fn test_missing_derived() {
        let t = table();
        let err = validate_closure(&t, &set_of(&t, &["B", "C"]), NONE).unwrap_err();
        assert_eq!(
            err,
            ClosureViolation::MissingDerivedFlag {
                target: "D".into(),
                expression: "B and C".into()
            }
        );
    }

    #[test]
    fn test_requested_derived_is_explained() {
        let t = table();
        let set = set_of(&t, &["D"]);
        assert!(validate_closure(&t, &set, NONE).is_err());
        assert!(validate_closure(&t, &set, &["D"]).is_ok());
    }

    #[test]
    fn test_implied_derived_is_explained() {
        let t = table();
        assert!(validate_closure(&t, &set_of(&t, &["F", "D"]), NONE).is_ok());
    }
}
