//! Feature Resolver — Derived Expressions
//!
//! Monotone boolean formulas over flag names. AND and OR only: there is
//! no negation, so an expression that holds keeps holding as more flags
//! become active.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A monotone boolean formula over flags.
///
/// Serialized externally tagged:
/// `{"all": [{"flag": "ELECTROSTATICS"}, {"flag": "FFTW"}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Flag(String),
    All(Vec<Expr>),
    Any(Vec<Expr>),
}

impl Expr {
    pub fn flag(name: impl Into<String>) -> Self {
        Expr::Flag(name.into())
    }

    /// Conjunction of plain flag operands.
    pub fn all_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Expr::All(names.into_iter().map(|n| Expr::Flag(n.into())).collect())
    }

    /// Disjunction of plain flag operands.
    pub fn any_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Expr::Any(names.into_iter().map(|n| Expr::Flag(n.into())).collect())
    }

    /// Evaluate against a flag lookup.
    pub fn evaluate<F>(&self, is_active: &F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        match self {
            Expr::Flag(name) => is_active(name),
            Expr::All(items) => items.iter().all(|e| e.evaluate(is_active)),
            Expr::Any(items) => items.iter().any(|e| e.evaluate(is_active)),
        }
    }

    /// Operand names in order of first appearance, without duplicates.
    pub fn flags(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_flags(&mut out);
        out
    }

    fn collect_flags<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Flag(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::All(items) | Expr::Any(items) => {
                for item in items {
                    item.collect_flags(out);
                }
            }
        }
    }

    /// True if any `All`/`Any` node in the tree has no operands.
    pub fn has_empty_node(&self) -> bool {
        match self {
            Expr::Flag(_) => false,
            Expr::All(items) | Expr::Any(items) => {
                items.is_empty() || items.iter().any(Expr::has_empty_node)
            }
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Flag(name) => f.write_str(name),
            Expr::All(items) | Expr::Any(items) if items.len() == 1 => items[0].fmt_operand(f),
            _ => write!(f, "({})", self),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (items, sep) = match self {
            Expr::Flag(name) => return f.write_str(name),
            Expr::All(items) => (items, " and "),
            Expr::Any(items) => (items, " or "),
        };
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                f.write_str(sep)?;
            }
            item.fmt_operand(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(active: &'a [&'a str]) -> impl Fn(&str) -> bool + 'a {
        move |name| active.contains(&name)
    }

    #[test]
    fn test_all_requires_every_operand() {
        let e = Expr::all_of(["ELECTROSTATICS", "FFTW"]);
        assert!(e.evaluate(&lookup(&["ELECTROSTATICS", "FFTW"])));
        assert!(!e.evaluate(&lookup(&["ELECTROSTATICS"])));
    }

    #[test]
    fn test_any_requires_one_operand() {
        let e = Expr::any_of(["LB", "LB_GPU"]);
        assert!(e.evaluate(&lookup(&["LB_GPU"])));
        assert!(!e.evaluate(&lookup(&["CUDA"])));
    }

    #[test]
    fn test_nested_display() {
        let e = Expr::Any(vec![
            Expr::flag("A"),
            Expr::all_of(["B", "C"]),
        ]);
        assert_eq!(e.to_string(), "A or (B and C)");
        assert_eq!(Expr::all_of(["DIPOLES", "FFTW"]).to_string(), "DIPOLES and FFTW");
    }

    #[test]
    fn test_flags_deduplicated_in_order() {
        let e = Expr::Any(vec![
            Expr::all_of(["B", "A"]),
            Expr::all_of(["A", "C"]),
        ]);
        assert_eq!(e.flags(), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_empty_node_detection() {
        assert!(Expr::All(vec![]).has_empty_node());
        assert!(Expr::Any(vec![Expr::flag("A"), Expr::Any(vec![])]).has_empty_node());
        assert!(!Expr::any_of(["A"]).has_empty_node());
    }

    #[test]
    fn test_serde_shape() {
        let e = Expr::all_of(["ELECTROSTATICS", "FFTW"]);
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(json, r#"{"all":[{"flag":"ELECTROSTATICS"},{"flag":"FFTW"}]}"#);
        let back: Expr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}
