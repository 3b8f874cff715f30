//! Feature Resolver — Implication Graph Utilities
//!
//! Pure graph analysis over a rule table's implication edges.
//! Traversal order is sorted, so results are deterministic.

use std::collections::{BTreeMap, BTreeSet};

use crate::rules::RuleTable;

// ---------------------------------------------------------------------------
// Cycle detection
// ---------------------------------------------------------------------------

/// Detect cycles among implication edges.
///
/// Cycles are harmless for resolution (activation is monotone, so every
/// flag on the cycle simply ends up active) but usually indicate an
/// authoring mistake. Uses iterative DFS with explicit colour tracking.
pub fn implication_cycles(table: &RuleTable) -> Vec<Vec<String>> {
    let mut adj: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for rule in table.implication_rules() {
        adj.entry(&rule.antecedent).or_default().push(&rule.consequent);
    }
    for list in adj.values_mut() {
        list.sort();
        list.dedup();
    }

    const WHITE: u8 = 0;
    const GREY: u8 = 1;
    const BLACK: u8 = 2;

    let mut colour: BTreeMap<&str, u8> = BTreeMap::new();
    let mut sorted: Vec<&str> = table.flags().iter().map(|s| s.as_str()).collect();
    sorted.sort();
    for &name in &sorted {
        colour.insert(name, WHITE);
    }

    let mut cycles: Vec<Vec<String>> = Vec::new();

    for &start in &sorted {
        if colour.get(start).copied().unwrap_or(WHITE) != WHITE {
            continue;
        }

        let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
        colour.insert(start, GREY);

        while let Some((node, idx)) = stack.last().copied() {
            let neighbours = adj.get(node).map(|v| v.as_slice()).unwrap_or(&[]);

            if idx < neighbours.len() {
                if let Some(top) = stack.last_mut() {
                    top.1 = idx + 1;
                }
                let nbr = neighbours[idx];

                match colour.get(nbr).copied().unwrap_or(WHITE) {
                    GREY => {
                        // Back edge: the cycle is the stack suffix starting at nbr.
                        let pos = stack.iter().position(|(n, _)| *n == nbr).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            stack[pos..].iter().map(|(n, _)| n.to_string()).collect();
                        cycle.push(nbr.to_string());
                        cycles.push(cycle);
                    }
                    WHITE => {
                        colour.insert(nbr, GREY);
                        stack.push((nbr, 0));
                    }
                    _ => {}
                }
            } else {
                colour.insert(node, BLACK);
                stack.pop();
            }
        }
    }

    cycles
}

// ---------------------------------------------------------------------------
// Reachability
// ---------------------------------------------------------------------------

/// Every flag transitively implied by `flag`, in declaration order.
/// Does not include `flag` itself unless it lies on a cycle.
pub fn implied_by(table: &RuleTable, flag: &str) -> Vec<String> {
    let mut reached: BTreeSet<&str> = BTreeSet::new();
    let mut frontier: Vec<&str> = vec![flag];

    while let Some(node) = frontier.pop() {
        for next in table.implications(node) {
            let next = next.as_str();
            if reached.insert(next) {
                frontier.push(next);
            }
        }
    }

    table
        .flags()
        .iter()
        .filter(|name| reached.contains(name.as_str()))
        .cloned()
        .collect()
}
