//! Batch resolution of every profile in a build config.
//!
//! One scoped thread per profile. The rule table is shared by reference;
//! each resolution owns its own feature set, so no locking is needed.

use std::thread;

use tracing::{debug, info};

use feature_resolver::{Resolution, ResolveError, Resolver, RuleTable};

use crate::config::BuildConfig;

/// Outcome for one named profile.
#[derive(Debug)]
pub struct ProfileOutcome {
    pub profile: String,
    pub requested: Vec<String>,
    pub deny_warnings: bool,
    pub result: Result<Resolution, ResolveError>,
}

impl ProfileOutcome {
    /// Fatal error, or warnings while warnings are denied.
    pub fn failed(&self) -> bool {
        match &self.result {
            Ok(r) => self.deny_warnings && r.has_warnings(),
            Err(_) => true,
        }
    }
}

/// Resolve all profiles of `config` against `table`, in profile-name order.
pub fn resolve_all(table: &RuleTable, config: &BuildConfig) -> Vec<ProfileOutcome> {
    let resolver = Resolver::new(table).with_config(config.resolver_config());

    let outcomes: Vec<ProfileOutcome> = thread::scope(|scope| {
        let handles: Vec<_> = config
            .profiles
            .iter()
            .map(|(name, profile)| {
                let deny = config.denies_warnings(name);
                scope.spawn(move || {
                    debug!(profile = %name, "resolving profile");
                    ProfileOutcome {
                        profile: name.clone(),
                        requested: profile.features.clone(),
                        deny_warnings: deny,
                        result: resolver.resolve(profile.features.as_slice()),
                    }
                })
            })
            .collect();

        // BTreeMap iteration order carries through the join order.
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(outcome) => outcome,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    info!(
        profiles = outcomes.len(),
        failed = outcomes.iter().filter(|o| o.failed()).count(),
        "batch resolved"
    );
    outcomes
}
