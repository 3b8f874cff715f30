//! Feature Resolver — Feature Set
//!
//! Activation state over a table's flag universe. Read-only to callers;
//! only the resolver activates flags, and nothing is ever cleared.

use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::rules::FlagUniverse;

/// Flag name → active, iterated in rule-table declaration order.
#[derive(Clone, PartialEq, Eq)]
pub struct FeatureSet {
    universe: Arc<FlagUniverse>,
    active: Vec<bool>,
}

impl FeatureSet {
    /// Fresh set with exactly the given indices active.
    pub(crate) fn with_active(universe: Arc<FlagUniverse>, initial: &[usize]) -> Self {
        let mut active = vec![false; universe.len()];
        for &i in initial {
            active[i] = true;
        }
        Self { universe, active }
    }

    /// Turn a flag on. Returns true if it was previously off.
    pub(crate) fn activate(&mut self, idx: usize) -> bool {
        let was = std::mem::replace(&mut self.active[idx], true);
        !was
    }

    pub(crate) fn is_active_idx(&self, idx: usize) -> bool {
        self.active[idx]
    }

    /// False for names outside the universe.
    pub fn is_active(&self, flag: &str) -> bool {
        self.universe
            .index_of(flag)
            .map(|i| self.active[i])
            .unwrap_or(false)
    }

    /// Active flag names in declaration order.
    pub fn active_flags(&self) -> Vec<&str> {
        self.iter()
            .filter_map(|(name, on)| on.then_some(name))
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|&&on| on).count()
    }

    /// Every flag with its state, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.universe
            .names()
            .iter()
            .map(|n| n.as_str())
            .zip(self.active.iter().copied())
    }

    /// Size of the flag universe, active or not.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// True if every flag active here is also active in `other`.
    pub fn is_subset_of(&self, other: &FeatureSet) -> bool {
        self.iter()
            .filter(|(_, on)| *on)
            .all(|(name, _)| other.is_active(name))
    }
}

impl fmt::Debug for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.active_flags()).finish()
    }
}

impl Serialize for FeatureSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, on) in self.iter() {
            map.serialize_entry(name, &on)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleTable;

    fn universe() -> Arc<FlagUniverse> {
        let t = RuleTable::builder()
            .primitive("C")
            .primitive("A")
            .primitive("B")
            .build()
            .unwrap();
        Arc::clone(t.universe())
    }

    #[test]
    fn test_initial_activation() {
        let set = FeatureSet::with_active(universe(), &[2]);
        assert!(set.is_active("B"));
        assert!(!set.is_active("A"));
        assert!(!set.is_active("MISSING"));
        assert_eq!(set.active_count(), 1);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_activate_reports_change_once() {
        let mut set = FeatureSet::with_active(universe(), &[]);
        assert!(set.activate(1));
        assert!(!set.activate(1));
        assert!(set.is_active_idx(1));
    }

    #[test]
    fn test_declaration_order_not_activation_order() {
        let mut set = FeatureSet::with_active(universe(), &[]);
        set.activate(2);
        set.activate(0);
        assert_eq!(set.active_flags(), vec!["C", "B"]);
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let set = FeatureSet::with_active(universe(), &[1]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"C":false,"A":true,"B":false}"#);
    }

    #[test]
    fn test_subset() {
        let small = FeatureSet::with_active(universe(), &[0]);
        let big = FeatureSet::with_active(universe(), &[0, 1]);
        assert!(small.is_subset_of(&big));
        assert!(!big.is_subset_of(&small));
    }
}
