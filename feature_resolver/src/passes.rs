//! Feature Resolver — Rule Application
//!
//! Every activation happens here. A round is an ordered list of steps,
//! each applying one implication or one derived rule to the set.
//! Steps only ever turn flags on.

use crate::rules::RuleTable;
use crate::state::FeatureSet;

// ---------------------------------------------------------------------------
// Steps and schedules
// ---------------------------------------------------------------------------

/// One rule application, by index into the table's rule lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Index into [`RuleTable::implication_rules`].
    Implication(usize),
    /// Index into [`RuleTable::derived_rules`].
    Derivation(usize),
}

/// Decides the order in which rules are applied within each round.
///
/// A schedule must cover every rule of the table in every round, or the
/// resolver may stop before the set is closed (which the post-fixpoint
/// closure check then reports).
pub trait Schedule {
    fn round(&mut self, table: &RuleTable, round: usize) -> Vec<Step>;

    /// Called after each round with the set as it stands.
    fn observe(&mut self, _round: usize, _set: &FeatureSet) {}
}

/// Implication pass then derivation pass, each in declaration order.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sequential;

impl Schedule for Sequential {
    fn round(&mut self, table: &RuleTable, _round: usize) -> Vec<Step> {
        all_steps(table)
    }
}

/// Every step of a table: implications first, then derivations.
pub fn all_steps(table: &RuleTable) -> Vec<Step> {
    (0..table.implication_rules().len())
        .map(Step::Implication)
        .chain((0..table.derived_rules().len()).map(Step::Derivation))
        .collect()
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Apply a single step. Returns true if a flag was activated.
///
/// A step naming a rule the table does not have changes nothing.
pub fn apply_step(table: &RuleTable, set: &mut FeatureSet, step: Step) -> bool {
    match step {
        Step::Implication(i) => match table.edge(i) {
            Some((from, to)) => set.is_active_idx(from) && set.activate(to),
            None => false,
        },
        Step::Derivation(i) => {
            let (Some(target), Some(rule)) = (table.derived_target(i), table.derived_rules().get(i))
            else {
                return false;
            };
            if set.is_active_idx(target) {
                return false;
            }
            let holds = rule.expression.evaluate(&|name| set.is_active(name));
            holds && set.activate(target)
        }
    }
}

/// Apply a whole round. Returns the number of flags activated.
pub fn apply_round(table: &RuleTable, set: &mut FeatureSet, steps: &[Step]) -> usize {
    steps
        .iter()
        .filter(|&&step| apply_step(table, set, step))
        .count()
}

/// Implication pass alone: every active antecedent forces its consequents.
pub fn implication_pass(table: &RuleTable, set: &mut FeatureSet) -> usize {
    let steps: Vec<Step> = (0..table.implication_rules().len())
        .map(Step::Implication)
        .collect();
    apply_round(table, set, &steps)
}

/// Derivation pass alone: every satisfied expression activates its target.
pub fn derivation_pass(table: &RuleTable, set: &mut FeatureSet) -> usize {
    let steps: Vec<Step> = (0..table.derived_rules().len())
        .map(Step::Derivation)
        .collect();
    apply_round(table, set, &steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;

    fn table() -> RuleTable {
        RuleTable::builder()
            .implies("A", "B")
            .implies("B", "C")
            .derived("D", Expr::all_of(["C", "E"]))
            .build()
            .unwrap()
    }

    fn set_with(table: &RuleTable, names: &[&str]) -> FeatureSet {
        let idx: Vec<usize> = names
            .iter()
            .map(|n| table.universe().index_of(n).unwrap())
            .collect();
        FeatureSet::with_active(table.universe().clone(), &idx)
    }

    #[test]
    fn test_implication_pass_in_order_propagates_chain() {
        let t = table();
        let mut set = set_with(&t, &["A"]);
        assert_eq!(implication_pass(&t, &mut set), 2);
        assert_eq!(set.active_flags(), vec!["A", "B", "C"]);
        assert_eq!(implication_pass(&t, &mut set), 0);
    }

    #[test]
    fn test_derivation_waits_for_all_operands() {
        let t = table();
        let mut set = set_with(&t, &["C"]);
        assert_eq!(derivation_pass(&t, &mut set), 0);
        let mut set = set_with(&t, &["C", "E"]);
        assert_eq!(derivation_pass(&t, &mut set), 1);
        assert!(set.is_active("D"));
    }

    #[test]
    fn test_steps_never_deactivate() {
        let t = table();
        let mut set = set_with(&t, &["D"]);
        assert!(!apply_step(&t, &mut set, Step::Derivation(0)));
        assert!(set.is_active("D"));
    }

    #[test]
    fn test_out_of_range_step_changes_nothing() {
        let t = table();
        let mut set = set_with(&t, &["A", "C", "E"]);
        let before = set.clone();
        assert!(!apply_step(&t, &mut set, Step::Implication(99)));
        assert!(!apply_step(&t, &mut set, Step::Derivation(7)));
        assert_eq!(set, before);
    }

    #[test]
    fn test_sequential_covers_every_rule() {
        let t = table();
        assert_eq!(
            Sequential.round(&t, 0),
            vec![Step::Implication(0), Step::Implication(1), Step::Derivation(0)]
        );
    }
}
