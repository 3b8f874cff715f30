//! Feature Resolver — Rule Table
//!
//! Static registry of implication and derived rules plus the flag
//! universe they span. Built once through [`RuleTableBuilder`], never
//! mutated afterwards, and safe to share across threads.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{is_valid_flag_name, DerivedRule, FlagKind, ImplicationRule};
use crate::error::RuleTableError;
use crate::expr::Expr;
use crate::graph::implication_cycles;

// ---------------------------------------------------------------------------
// Flag universe
// ---------------------------------------------------------------------------

/// Every flag a table knows about, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagUniverse {
    names: Vec<String>,
    kinds: Vec<FlagKind>,
    index: BTreeMap<String, usize>,
}

impl FlagUniverse {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Name at `idx`. Indices come from `index_of` or the table's own
    /// edges, so they are always in range.
    pub(crate) fn name(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    pub(crate) fn kind(&self, idx: usize) -> FlagKind {
        self.kinds[idx]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// Read-only rule registry. All lookups are pure.
#[derive(Debug, Clone)]
pub struct RuleTable {
    universe: Arc<FlagUniverse>,
    implication_rules: Vec<ImplicationRule>,
    derived_rules: Vec<DerivedRule>,
    consequents: BTreeMap<String, Vec<String>>,
    derived_index: BTreeMap<String, usize>,
    edges: Vec<(usize, usize)>,
    derived_targets: Vec<usize>,
}

impl RuleTable {
    pub fn builder() -> RuleTableBuilder {
        RuleTableBuilder::default()
    }

    /// Consequents of `flag` in declaration order. Empty if none.
    pub fn implications(&self, flag: &str) -> &[String] {
        self.consequents
            .get(flag)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn derived_rule(&self, flag: &str) -> Option<&DerivedRule> {
        self.derived_index
            .get(flag)
            .map(|&i| &self.derived_rules[i])
    }

    pub fn is_derived(&self, flag: &str) -> bool {
        self.derived_index.contains_key(flag)
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.universe.index_of(flag).is_some()
    }

    pub fn kind(&self, flag: &str) -> Option<FlagKind> {
        self.universe.index_of(flag).map(|i| self.universe.kind(i))
    }

    /// All flag names in declaration order.
    pub fn flags(&self) -> &[String] {
        self.universe.names()
    }

    pub fn implication_rules(&self) -> &[ImplicationRule] {
        &self.implication_rules
    }

    pub fn derived_rules(&self) -> &[DerivedRule] {
        &self.derived_rules
    }

    /// Number of flags in the universe.
    pub fn len(&self) -> usize {
        self.universe.len()
    }

    pub fn is_empty(&self) -> bool {
        self.universe.is_empty()
    }

    pub fn universe(&self) -> &Arc<FlagUniverse> {
        &self.universe
    }

    /// `(antecedent, consequent)` universe indices of implication rule `i`.
    pub(crate) fn edge(&self, i: usize) -> Option<(usize, usize)> {
        self.edges.get(i).copied()
    }

    /// Universe index of the target of derived rule `i`.
    pub(crate) fn derived_target(&self, i: usize) -> Option<usize> {
        self.derived_targets.get(i).copied()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects declarations and validates them in [`build`](Self::build).
///
/// Flag order is first appearance across all calls: declared primitives,
/// implication endpoints, derived targets, then expression operands.
#[derive(Debug, Default, Clone)]
pub struct RuleTableBuilder {
    order: Vec<String>,
    seen: BTreeSet<String>,
    implication_rules: Vec<ImplicationRule>,
    derived_rules: Vec<DerivedRule>,
}

impl RuleTableBuilder {
    fn note(&mut self, name: &str) {
        if self.seen.insert(name.to_string()) {
            self.order.push(name.to_string());
        }
    }

    /// Declare a flag that may carry no rules at all.
    pub fn primitive(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.note(&name);
        self
    }

    pub fn implies(mut self, antecedent: impl Into<String>, consequent: impl Into<String>) -> Self {
        let rule = ImplicationRule::new(antecedent, consequent);
        self.note(&rule.antecedent);
        self.note(&rule.consequent);
        self.implication_rules.push(rule);
        self
    }

    pub fn derived(mut self, target: impl Into<String>, expression: Expr) -> Self {
        let rule = DerivedRule::new(target, expression);
        self.note(&rule.target);
        for name in rule.expression.flags() {
            self.note(name);
        }
        self.derived_rules.push(rule);
        self
    }

    pub fn implication(self, rule: ImplicationRule) -> Self {
        self.implies(rule.antecedent, rule.consequent)
    }

    pub fn derivation(self, rule: DerivedRule) -> Self {
        self.derived(rule.target, rule.expression)
    }

    /// Validate and freeze the table.
    pub fn build(self) -> Result<RuleTable, RuleTableError> {
        if let Some(bad) = self.order.iter().find(|n| !is_valid_flag_name(n)) {
            return Err(RuleTableError::InvalidFlagName { name: bad.clone() });
        }

        let mut derived_index: BTreeMap<String, usize> = BTreeMap::new();
        for (i, rule) in self.derived_rules.iter().enumerate() {
            if derived_index.insert(rule.target.clone(), i).is_some() {
                return Err(RuleTableError::DuplicateDerivedRule {
                    target: rule.target.clone(),
                });
            }
            if rule.expression.has_empty_node() {
                return Err(RuleTableError::EmptyExpression {
                    target: rule.target.clone(),
                });
            }
            if rule.expression.flags().contains(&rule.target.as_str()) {
                return Err(RuleTableError::SelfReferentialDerivedRule {
                    target: rule.target.clone(),
                });
            }
        }

        let mut index = BTreeMap::new();
        let mut kinds = Vec::with_capacity(self.order.len());
        for (i, name) in self.order.iter().enumerate() {
            index.insert(name.clone(), i);
            kinds.push(if derived_index.contains_key(name) {
                FlagKind::Derived
            } else {
                FlagKind::Primitive
            });
        }

        let mut consequents: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for rule in &self.implication_rules {
            let list = consequents.entry(rule.antecedent.clone()).or_default();
            if !list.contains(&rule.consequent) {
                list.push(rule.consequent.clone());
            }
        }

        // Every name was noted by the builder, so the lookups cannot miss.
        let edges = self
            .implication_rules
            .iter()
            .map(|r| (index[&r.antecedent], index[&r.consequent]))
            .collect();
        let derived_targets = self
            .derived_rules
            .iter()
            .map(|r| index[&r.target])
            .collect();

        let table = RuleTable {
            universe: Arc::new(FlagUniverse {
                names: self.order,
                kinds,
                index,
            }),
            implication_rules: self.implication_rules,
            derived_rules: self.derived_rules,
            consequents,
            derived_index,
            edges,
            derived_targets,
        };

        for cycle in implication_cycles(&table) {
            warn!(cycle = %cycle.join(" -> "), "implication cycle in rule table");
        }
        debug!(
            flags = table.len(),
            implications = table.implication_rules.len(),
            derived = table.derived_rules.len(),
            "rule table built"
        );

        Ok(table)
    }
}
