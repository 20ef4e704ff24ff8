use std::collections::HashMap;

use serde::Serialize;

use crate::address::Address;

/// One matched address and, once resolved, its provider text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchEntry {
    pub address: String,
    /// `None` while the lookup is pending; afterwards the ISP name or the
    /// failure message that stands in for it.
    pub provider: Option<String>,
}

/// Addresses that fell inside the network, keyed by their text.
///
/// Keys are unique and keep discovery order. Entries are never removed; the
/// enrichment step fills in each provider exactly once.
#[derive(Default, Debug, Clone)]
pub struct MatchSet {
    entries: Vec<MatchEntry>,
    index: HashMap<String, usize>,
}

impl MatchSet {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an address as pending. Returns false if its text is already present.
    pub fn insert(&mut self, address: &Address) -> bool {
        self.insert_text(address.as_str())
    }

    fn insert_text(&mut self, text: &str) -> bool {
        if self.index.contains_key(text) {
            return false;
        }
        self.index.insert(text.to_string(), self.entries.len());
        self.entries.push(MatchEntry {
            address: text.to_string(),
            provider: None,
        });
        true
    }

    pub fn contains(&self, address: &str) -> bool {
        self.index.contains_key(address)
    }

    /// Provider recorded for `address`, if resolved.
    pub fn provider(&self, address: &str) -> Option<&str> {
        self.index
            .get(address)
            .and_then(|&i| self.entries[i].provider.as_deref())
    }

    /// Record the provider for an existing key. Unknown keys are ignored.
    pub fn resolve(&mut self, address: &str, provider: impl Into<String>) -> bool {
        match self.index.get(address) {
            Some(&i) => {
                self.entries[i].provider = Some(provider.into());
                true
            }
            None => false,
        }
    }

    /// Addresses still waiting for a provider, in discovery order.
    pub fn pending(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.provider.is_none())
            .map(|e| e.address.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a MatchEntry;
    type IntoIter = std::slice::Iter<'a, MatchEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[test]
    fn keeps_discovery_order_and_dedupes() {
        let mut set = MatchSet::new();
        assert!(set.insert(&addr("10.0.0.9")));
        assert!(set.insert(&addr("10.0.0.1")));
        assert!(!set.insert(&addr("10.0.0.9")));
        let order: Vec<&str> = set.iter().map(|e| e.address.as_str()).collect();
        assert_eq!(order, vec!["10.0.0.9", "10.0.0.1"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn entries_start_pending_and_resolve_once_set() {
        let mut set = MatchSet::new();
        set.insert(&addr("10.0.0.1"));
        set.insert(&addr("10.0.0.2"));
        assert_eq!(set.pending(), vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(set.provider("10.0.0.1"), None);

        assert!(set.resolve("10.0.0.1", "Example ISP"));
        assert!(!set.resolve("10.9.9.9", "nobody"));
        assert_eq!(set.provider("10.0.0.1"), Some("Example ISP"));
        assert_eq!(set.pending(), vec!["10.0.0.2"]);
        assert!(!set.contains("10.9.9.9"));
    }
}
