//! Feature Resolver — Engine
//!
//! Top-level orchestrator. Validates the request, delegates rule
//! application to `passes`, runs rounds to a fixpoint, checks closure via
//! `invariants`, then audits the request for manually set derived flags.
//!
//! Stateless between calls: every resolution owns its own set.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::diagnostics::Diagnostic;
use crate::domain::FlagKind;
use crate::error::ResolveError;
use crate::invariants::validate_closure;
use crate::passes::{apply_round, Schedule, Sequential};
use crate::rules::RuleTable;
use crate::state::FeatureSet;

/// Tunables for a resolution run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Round budget. `None` means `max(2 × |flags|, 1)`.
    #[serde(default)]
    pub max_rounds: Option<usize>,
}

impl ResolverConfig {
    pub fn round_budget(&self, table: &RuleTable) -> usize {
        self.max_rounds
            .unwrap_or_else(|| (2 * table.len()).max(1))
    }
}

/// Outcome of a successful resolution. Immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub features: FeatureSet,
    pub diagnostics: Vec<Diagnostic>,
    /// Rounds run, including the final round that changed nothing.
    pub rounds: usize,
}

impl Resolution {
    /// Active flag names in declaration order.
    pub fn active_flags(&self) -> Vec<&str> {
        self.features.active_flags()
    }

    pub fn has_warnings(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Resolves flag requests against one borrowed rule table.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'t> {
    table: &'t RuleTable,
    config: ResolverConfig,
}

impl<'t> Resolver<'t> {
    pub fn new(table: &'t RuleTable) -> Self {
        Self {
            table,
            config: ResolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn table(&self) -> &'t RuleTable {
        self.table
    }

    /// Resolve with the default implication-then-derivation schedule.
    pub fn resolve<I, S>(&self, initial: I) -> Result<Resolution, ResolveError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.resolve_scheduled(initial, &mut Sequential)
    }

    /// Resolve with a caller-supplied rule ordering.
    ///
    ///   1. Reject unknown names (before any rule runs)
    ///   2. Activate exactly the requested flags
    ///   3. Run rounds until one changes nothing, within the round budget
    ///   4. Check closure invariants
    ///   5. Emit a diagnostic per requested derived flag
    pub fn resolve_scheduled<I, S, P>(
        &self,
        initial: I,
        schedule: &mut P,
    ) -> Result<Resolution, ResolveError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        P: Schedule + ?Sized,
    {
        let universe = self.table.universe();

        // -- Request validation --
        let requested: Vec<String> = initial
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        let mut indices = Vec::with_capacity(requested.len());
        for name in &requested {
            match universe.index_of(name) {
                Some(i) => indices.push(i),
                None => {
                    return Err(ResolveError::UnknownFlag { flag: name.clone() });
                }
            }
        }

        if self.config.max_rounds == Some(0) {
            return Err(ResolveError::InvalidRoundBudget { max_rounds: 0 });
        }

        let mut set = FeatureSet::with_active(universe.clone(), &indices);

        // -- Fixpoint --
        let budget = self.config.round_budget(self.table);
        let mut rounds = 0;
        loop {
            if rounds == budget {
                // An explicit budget may simply be too small for a sound table.
                if self.config.max_rounds.is_some() {
                    return Err(ResolveError::RoundBudgetExhausted { budget });
                }
                return Err(ResolveError::MalformedRuleTable {
                    rounds,
                    reason: format!("no fixpoint within a budget of {} rounds", budget),
                });
            }
            rounds += 1;

            let steps = schedule.round(self.table, rounds);
            let changed = apply_round(self.table, &mut set, &steps);
            schedule.observe(rounds, &set);
            debug!(round = rounds, changed, "resolution round");

            if changed == 0 {
                break;
            }
        }

        validate_closure(self.table, &set, requested.as_slice()).map_err(|v| {
            ResolveError::MalformedRuleTable {
                rounds,
                reason: v.to_string(),
            }
        })?;

        // -- Diagnostics (declaration order, one per flag) --
        let mut flagged = vec![false; universe.len()];
        for &i in &indices {
            if universe.kind(i) == FlagKind::Derived {
                flagged[i] = true;
            }
        }
        let diagnostics: Vec<Diagnostic> = flagged
            .iter()
            .enumerate()
            .filter(|&(_, &f)| f)
            .map(|(i, _)| Diagnostic::ManualDerivedFlag {
                flag: universe.name(i).to_string(),
            })
            .collect();
        for d in &diagnostics {
            warn!(flag = d.flag(), "{}", d);
        }

        info!(
            requested = requested.len(),
            active = set.active_count(),
            rounds,
            warnings = diagnostics.len(),
            "feature set resolved"
        );

        Ok(Resolution {
            features: set,
            diagnostics,
            rounds,
        })
    }
}

/// Resolve `initial` against `table` with default settings.
pub fn resolve<I, S>(table: &RuleTable, initial: I) -> Result<Resolution, ResolveError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Resolver::new(table).resolve(initial)
}
