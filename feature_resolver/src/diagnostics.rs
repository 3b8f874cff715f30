//! Non-fatal findings attached to a successful resolution.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
}

/// A diagnostic produced alongside a resolved feature set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A derived flag was requested directly. It stays active.
    ManualDerivedFlag { flag: String },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::ManualDerivedFlag { .. } => Severity::Warning,
        }
    }

    /// The flag this diagnostic is about.
    pub fn flag(&self) -> &str {
        match self {
            Diagnostic::ManualDerivedFlag { flag } => flag,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ManualDerivedFlag { flag } => write!(
                f,
                "{} is a derived switch and should not be set manually!",
                flag
            ),
        }
    }
}
