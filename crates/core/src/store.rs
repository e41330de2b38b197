//! Versioned holder for the rule set served to readers.

use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::rule::RuleSet;

/// A rule set as published, with the version it was published under.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedRuleSet {
    pub version: u64,
    pub fingerprint: String,
    pub rules: RuleSet,
}

/// Holds the current rule set behind a swappable `Arc`.
///
/// Readers take a snapshot with [`RuleSetStore::current`] and keep using it for
/// the whole request; publishing a new rule set never mutates a snapshot that
/// is already handed out.
#[derive(Debug)]
pub struct RuleSetStore {
    current: RwLock<Arc<PublishedRuleSet>>,
}

impl RuleSetStore {
    pub fn new(rules: RuleSet) -> Self {
        let fingerprint = rules.fingerprint();
        Self { current: RwLock::new(Arc::new(PublishedRuleSet { version: 1, fingerprint, rules })) }
    }

    pub fn empty() -> Self {
        Self::new(RuleSet::empty())
    }

    pub fn current(&self) -> Arc<PublishedRuleSet> {
        // The guarded value is a single Arc; a panicking writer cannot leave it half-written.
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replaces the served rule set and returns the new snapshot.
    pub fn publish(&self, rules: RuleSet) -> Arc<PublishedRuleSet> {
        let fingerprint = rules.fingerprint();
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let published =
            Arc::new(PublishedRuleSet { version: guard.version + 1, fingerprint, rules });
        *guard = Arc::clone(&published);
        drop(guard);

        tracing::info!(
            event_name = "rules.store.published",
            version = published.version,
            rules = published.rules.len(),
            fingerprint = %published.fingerprint,
            "rule set published"
        );
        published
    }
}

impl Default for RuleSetStore {
    fn default() -> Self {
        Self::empty()
    }
}
