//! Error types for rule-table construction and resolution.

use thiserror::Error;

/// Rejected while building a [`RuleTable`](crate::rules::RuleTable).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleTableError {
    #[error("invalid flag name {name:?}: must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidFlagName { name: String },

    #[error("derived flag {target} has more than one derived rule")]
    DuplicateDerivedRule { target: String },

    #[error("derived rule for {target} contains an empty and/or group")]
    EmptyExpression { target: String },

    #[error("derived rule for {target} refers to its own target")]
    SelfReferentialDerivedRule { target: String },
}

/// Fatal resolution failure. No partial feature set accompanies it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unknown feature flag {flag:?}")]
    UnknownFlag { flag: String },

    #[error("malformed rule table after {rounds} rounds: {reason}")]
    MalformedRuleTable { rounds: usize, reason: String },

    #[error("invalid round budget {max_rounds}: must be at least 1")]
    InvalidRoundBudget { max_rounds: usize },

    #[error("no fixpoint within the configured budget of {budget} rounds; raise max_rounds")]
    RoundBudgetExhausted { budget: usize },
}
