//! Display labels, canonical orderings and show colors.
//!
//! Every categorical key in the data (a subset or a disruption) is an opaque
//! string. A [`LabelRegistry`] maps those keys to a full and an abbreviated
//! display form and fixes their canonical order. The grid and plot use one
//! registry per dimension; the legend uses a second, simpler pair.

/// Display forms of one registered key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelMeta {
    pub key: &'static str,
    pub full: &'static str,
    pub abbr: &'static str,
}

impl LabelMeta {
    const fn new(key: &'static str, full: &'static str, abbr: &'static str) -> Self {
        Self { key, full, abbr }
    }
}

/// Which display form to use for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelStyle {
    #[default]
    Abbr,
    Full,
}

impl LabelStyle {
    pub fn toggled(self) -> Self {
        match self {
            Self::Abbr => Self::Full,
            Self::Full => Self::Abbr,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Abbr => "abbr",
            Self::Full => "full",
        }
    }
}

/// Ordered key → label mapping. Entry order is the canonical ordering.
#[derive(Debug, Clone, Copy)]
pub struct LabelRegistry {
    entries: &'static [LabelMeta],
}

impl LabelRegistry {
    pub const fn new(entries: &'static [LabelMeta]) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &'static [LabelMeta] {
        self.entries
    }

    /// Keys in canonical order.
    pub fn keys(&self) -> Vec<&'static str> {
        self.entries.iter().map(|m| m.key).collect()
    }

    pub fn first(&self) -> Option<&'static str> {
        self.entries.first().map(|m| m.key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.meta(key).is_some()
    }

    /// Position of `key` in the canonical ordering.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|m| m.key == key)
    }

    pub fn meta(&self, key: &str) -> Option<&'static LabelMeta> {
        self.entries.iter().find(|m| m.key == key)
    }

    /// Display label for `key`, or `key` itself when it is not registered.
    pub fn label<'a>(&self, key: &'a str, style: LabelStyle) -> &'a str {
        match self.meta(key) {
            Some(meta) => match style {
                LabelStyle::Full => meta.full,
                LabelStyle::Abbr => meta.abbr,
            },
            None => key,
        }
    }

    pub fn full<'a>(&self, key: &'a str) -> &'a str {
        self.label(key, LabelStyle::Full)
    }

    pub fn abbr<'a>(&self, key: &'a str) -> &'a str {
        self.label(key, LabelStyle::Abbr)
    }

    /// Reverse lookup from an abbreviation to its key.
    pub fn key_for_abbr(&self, abbr: &str) -> Option<&'static str> {
        self.entries.iter().find(|m| m.abbr == abbr).map(|m| m.key)
    }
}

pub const DISRUPTIONS: LabelRegistry = LabelRegistry::new(&[
    LabelMeta::new("RAW", "Raw", "Raw"),
    LabelMeta::new("C", "Clean", "Clean"),
    LabelMeta::new("CS", "Clean + Partial Shuffle", "C+PS"),
    LabelMeta::new("CFS", "Clean + Full Shuffle", "C+FS"),
    LabelMeta::new("SAP", "Shuffle and Preserve", "SAP"),
]);

pub const DISRUPTION_LEGEND: LabelRegistry = LabelRegistry::new(&[
    LabelMeta::new("RAW", "Unedited text", "Raw"),
    LabelMeta::new("C", "Capitalization and punctuation removed", "Clean"),
    LabelMeta::new("CS", "Cleaned and shuffled in 5 word increments", "C+PS"),
    LabelMeta::new("CFS", "Clean and fully reordered", "C+FS"),
    LabelMeta::new(
        "SAP",
        "Reordered but relative capitalization and punctuation are preserved",
        "SAP",
    ),
]);

pub const SUBSETS: LabelRegistry = LabelRegistry::new(&[
    LabelMeta::new("Emotion", "Emotion", "E"),
    LabelMeta::new("Toxicity", "Toxicity", "Tx"),
    LabelMeta::new("Topics", "Topics", "Tp"),
    LabelMeta::new("Emotion + Toxicity", "Emotion + Toxicity", "E+Tx"),
    LabelMeta::new("Emotion + Topics", "Emotion + Topics", "E+Tp"),
    LabelMeta::new("Topics + Toxicity", "Topics + Toxicity", "Tp+Tx"),
    LabelMeta::new(
        "Emotion + Topics + Toxicity",
        "Emotion + Topics + Toxicity",
        "E+Tp+Tx",
    ),
]);

pub const SUBSET_LEGEND: LabelRegistry = LabelRegistry::new(&[
    LabelMeta::new("Emotion", "Emotion", "E"),
    LabelMeta::new("Toxicity", "Toxicity", "Tx"),
    LabelMeta::new("Topics", "Topics", "Tp"),
]);

/// Show name and hex color, in legend order.
pub const SHOW_COLORS: [(&str, &str); 3] = [
    ("South Park", "#fe2b2b"),
    ("Always Sunny", "#0368c9"),
    ("The Office", "#84c8ff"),
];

/// Hex color registered for a show label.
pub fn show_color(show: &str) -> Option<&'static str> {
    SHOW_COLORS
        .iter()
        .find(|(name, _)| *name == show)
        .map(|(_, hex)| *hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_key_falls_back_to_itself() {
        assert_eq!(SUBSETS.label("Sarcasm", LabelStyle::Abbr), "Sarcasm");
        assert_eq!(DISRUPTIONS.full("XYZ"), "XYZ");
        assert_eq!(SUBSET_LEGEND.abbr("Emotion + Toxicity"), "Emotion + Toxicity");
    }

    #[test]
    fn registered_labels() {
        assert_eq!(SUBSETS.abbr("Emotion + Topics + Toxicity"), "E+Tp+Tx");
        assert_eq!(DISRUPTIONS.full("CS"), "Clean + Partial Shuffle");
        assert_eq!(DISRUPTION_LEGEND.full("C"), "Capitalization and punctuation removed");
        assert_eq!(DISRUPTIONS.abbr("CFS"), "C+FS");
    }

    #[test]
    fn canonical_orderings() {
        assert_eq!(DISRUPTIONS.keys(), vec!["RAW", "C", "CS", "CFS", "SAP"]);
        assert_eq!(SUBSETS.first(), Some("Emotion"));
        assert_eq!(SUBSETS.len(), 7);
        assert_eq!(SUBSETS.position("Topics + Toxicity"), Some(5));
    }

    #[test]
    fn legend_ordering_is_subset_of_grid_ordering() {
        for key in SUBSET_LEGEND.keys() {
            assert!(SUBSETS.contains(key));
        }
        for key in DISRUPTION_LEGEND.keys() {
            assert!(DISRUPTIONS.contains(key));
        }
    }

    #[test]
    fn abbreviation_reverse_lookup() {
        assert_eq!(DISRUPTIONS.key_for_abbr("C+PS"), Some("CS"));
        assert_eq!(SUBSETS.key_for_abbr("Tp"), Some("Topics"));
        assert_eq!(SUBSETS.key_for_abbr("nope"), None);
    }

    #[test]
    fn show_colors() {
        assert_eq!(show_color("The Office"), Some("#84c8ff"));
        assert_eq!(show_color("Seinfeld"), None);
    }

    #[test]
    fn label_style_toggle() {
        assert_eq!(LabelStyle::default(), LabelStyle::Abbr);
        assert_eq!(LabelStyle::Abbr.toggled(), LabelStyle::Full);
        assert_eq!(LabelStyle::Full.toggled().as_str(), "abbr");
    }
}
