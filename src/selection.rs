//! The selected (subset, disruption) condition.

use crate::labels::LabelRegistry;

/// Canonical (subset-key, disruption-key) pair. Empty keys mean "nothing".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CellKey {
    pub subset: String,
    pub disruption: String,
}

impl CellKey {
    pub fn new(subset: impl Into<String>, disruption: impl Into<String>) -> Self {
        Self {
            subset: subset.into(),
            disruption: disruption.into(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// True when either half is missing; such a pair never becomes the selection.
    pub fn is_empty(&self) -> bool {
        self.subset.is_empty() || self.disruption.is_empty()
    }
}

/// Session-wide selection state.
///
/// Starts at the first subset and first disruption of the canonical orderings
/// and only moves when a grid click reports a different, non-empty pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    current: CellKey,
}

impl Selection {
    pub fn init(subsets: &LabelRegistry, disruptions: &LabelRegistry) -> Self {
        Self {
            current: CellKey::new(
                subsets.first().unwrap_or_default(),
                disruptions.first().unwrap_or_default(),
            ),
        }
    }

    pub fn current(&self) -> &CellKey {
        &self.current
    }

    pub fn subset(&self) -> &str {
        &self.current.subset
    }

    pub fn disruption(&self) -> &str {
        &self.current.disruption
    }

    pub fn matches(&self, subset: &str, disruption: &str) -> bool {
        self.current.subset == subset && self.current.disruption == disruption
    }

    /// Apply a clicked pair. Returns true when the selection changed and the
    /// plot and grid highlight need to be rebuilt.
    pub fn click_received(&mut self, pair: CellKey) -> bool {
        if pair.is_empty() || pair == self.current {
            return false;
        }
        tracing::info!(
            subset = %pair.subset,
            disruption = %pair.disruption,
            "selection changed"
        );
        self.current = pair;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{DISRUPTIONS, SUBSETS};

    #[test]
    fn init_uses_first_of_each_ordering() {
        let sel = Selection::init(&SUBSETS, &DISRUPTIONS);
        assert_eq!(sel.current(), &CellKey::new("Emotion", "RAW"));
    }

    #[test]
    fn empty_pair_is_ignored() {
        let mut sel = Selection::init(&SUBSETS, &DISRUPTIONS);
        assert!(!sel.click_received(CellKey::empty()));
        assert!(!sel.click_received(CellKey::new("Topics", "")));
        assert!(!sel.click_received(CellKey::new("", "C")));
        assert_eq!(sel.current(), &CellKey::new("Emotion", "RAW"));
    }

    #[test]
    fn repeated_pair_is_a_no_op() {
        let mut sel = Selection::init(&SUBSETS, &DISRUPTIONS);
        assert!(sel.click_received(CellKey::new("Topics", "C")));
        assert!(!sel.click_received(CellKey::new("Topics", "C")));
        assert!(sel.matches("Topics", "C"));
    }

    #[test]
    fn different_pair_is_adopted() {
        let mut sel = Selection::init(&SUBSETS, &DISRUPTIONS);
        assert!(sel.click_received(CellKey::new("Emotion + Topics", "SAP")));
        assert_eq!(sel.subset(), "Emotion + Topics");
        assert_eq!(sel.disruption(), "SAP");
    }
}
