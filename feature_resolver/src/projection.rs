//! Output projection: the artifacts a build consumes from a resolved set.

use serde::{Deserialize, Serialize};

use crate::state::FeatureSet;

/// Active feature names in declaration order plus their count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureList {
    pub names: Vec<String>,
    pub count: usize,
}

impl FeatureList {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.names.iter().any(|n| n == flag)
    }
}

impl From<&FeatureSet> for FeatureList {
    fn from(set: &FeatureSet) -> Self {
        project(set)
    }
}

pub fn project(set: &FeatureSet) -> FeatureList {
    let names: Vec<String> = set.active_flags().into_iter().map(String::from).collect();
    FeatureList {
        count: names.len(),
        names,
    }
}
