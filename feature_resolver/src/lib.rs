#![forbid(unsafe_code)]

//! Feature Resolver
//!
//! Closes a selection of build feature flags under a static rule table:
//! implications propagate, derived flags are computed from AND/OR
//! expressions, and derived flags requested by hand are reported.
//!
//! ```
//! use feature_resolver::{reference::reference_table, resolve};
//!
//! let table = reference_table();
//! let resolution = resolve(&table, ["ELECTROSTATICS", "FFTW"]).unwrap();
//! assert!(resolution.features.is_active("P3M"));
//! ```

/// Resolver v1. Changes to resolution semantics or canonical output bump this.
pub const RESOLVER_VERSION: u32 = 1;

pub mod diagnostics;
pub mod domain;
pub mod engine;
pub mod error;
pub mod expr;
pub mod graph;
pub mod hashing;
pub mod invariants;
pub mod passes;
pub mod projection;
pub mod reference;
pub mod rules;
pub mod state;

pub use diagnostics::{Diagnostic, Severity};
pub use domain::{DerivedRule, FlagKind, ImplicationRule};
pub use engine::{resolve, Resolution, Resolver, ResolverConfig};
pub use error::{ResolveError, RuleTableError};
pub use expr::Expr;
pub use projection::{project, FeatureList};
pub use rules::{RuleTable, RuleTableBuilder};
pub use state::FeatureSet;
