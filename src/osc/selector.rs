//! Address selectors — predicates deciding which messages a listener receives.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::error::PatternError;
use super::pattern::AddressPattern;

/// Decides whether a message address belongs to a subscription.
pub trait AddressSelector: Send + Sync + fmt::Debug {
    fn matches(&self, address: &str) -> bool;
}

/// Matches one address exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactSelector {
    address: String,
}

impl ExactSelector {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl AddressSelector for ExactSelector {
    fn matches(&self, address: &str) -> bool {
        self.address == address
    }
}

/// Matches addresses against an OSC address pattern (`*`, `?`, `[..]`, `{..}`, `//`).
#[derive(Debug, Clone)]
pub struct PatternSelector {
    pattern: AddressPattern,
    /// Wildcard-free patterns compare as plain strings.
    literal: bool,
}

impl PatternSelector {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let pattern = AddressPattern::compile(pattern)?;
        Ok(Self {
            literal: pattern.is_literal(),
            pattern,
        })
    }

    pub fn pattern(&self) -> &AddressPattern {
        &self.pattern
    }
}

impl AddressSelector for PatternSelector {
    fn matches(&self, address: &str) -> bool {
        if self.literal {
            self.pattern.as_str() == address
        } else {
            self.pattern.matches(address)
        }
    }
}

/// Registry key for a shared selector.
///
/// Equality and hashing follow the identity of the `Arc` allocation, so two
/// selectors built from the same pattern are still distinct keys.
#[derive(Clone)]
pub struct SelectorKey(Arc<dyn AddressSelector>);

impl SelectorKey {
    pub fn new(selector: Arc<dyn AddressSelector>) -> Self {
        Self(selector)
    }

    pub fn selector(&self) -> &Arc<dyn AddressSelector> {
        &self.0
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for SelectorKey {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for SelectorKey {}

impl Hash for SelectorKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for SelectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:p}", self.0, self.addr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn exact_selector() {
        let selector = ExactSelector::new("/play");
        assert!(selector.matches("/play"));
        assert!(!selector.matches("/play/1"));
        assert!(!selector.matches("/pla?"));
        assert_eq!(selector.address(), "/play");
    }

    #[test]
    fn pattern_selector() {
        let selector = PatternSelector::new("/macro/[1-8]").unwrap();
        assert!(selector.matches("/macro/3"));
        assert!(!selector.matches("/macro/9"));
        assert_eq!(selector.pattern().as_str(), "/macro/[1-8]");
    }

    #[test]
    fn literal_pattern_selector_matches_like_exact() {
        let selector = PatternSelector::new("/mixer/ch1/gain").unwrap();
        let exact = ExactSelector::new("/mixer/ch1/gain");
        for address in ["/mixer/ch1/gain", "/mixer/ch1", "/mixer/ch1/gain/", "mixer/ch1/gain"] {
            assert_eq!(selector.matches(address), exact.matches(address), "{address}");
        }
        assert!(selector.matches("/mixer/ch1/gain"));
    }

    #[test]
    fn pattern_selector_rejects_bad_pattern() {
        assert!(PatternSelector::new("macro").is_err());
    }

    #[test]
    fn key_identity_not_structure() {
        let a: Arc<dyn AddressSelector> = Arc::new(ExactSelector::new("/foo"));
        let b: Arc<dyn AddressSelector> = Arc::new(ExactSelector::new("/foo"));

        let mut keys = HashSet::new();
        keys.insert(SelectorKey::new(a.clone()));
        keys.insert(SelectorKey::new(b));
        assert_eq!(keys.len(), 2);

        keys.insert(SelectorKey::new(a));
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn key_debug_names_selector() {
        let key = SelectorKey::new(Arc::new(ExactSelector::new("/foo")));
        assert!(format!("{key:?}").contains("/foo"));
    }
}
