use std::collections::BTreeMap;

/// Literal text replacements applied to page text and hrefs before link extraction
///
/// An empty dictionary is a no-op. Entries are applied in key order, each one to
/// the output of the previous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextSubstitutions {
    entries: Vec<(String, String)>,
}

impl TextSubstitutions {
    pub fn new(map: BTreeMap<String, String>) -> Self {
        Self {
            entries: map.into_iter().filter(|(from, _)| !from.is_empty()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Adds entries from `other`, replacing entries with the same key
    pub fn merge(&mut self, other: TextSubstitutions) {
        let mut map: BTreeMap<String, String> = self.entries.drain(..).collect();
        map.extend(other.entries);
        self.entries = map.into_iter().collect();
    }

    /// Applies every substitution to `text`
    pub fn apply(&self, text: &str) -> String {
        self.entries
            .iter()
            .fold(text.to_string(), |acc, (from, to)| acc.replace(from.as_str(), to))
    }
}
