//! Label filter applied to sub-locations during expansion.

use std::collections::BTreeSet;

/// Which sub-locations to keep, matched on their labels.
///
/// Entries prefixed with `~` are excluded. When any unprefixed entry is
/// given, only those labels are kept. Without entries everything is kept.
///
/// ```
/// use wikirepo_query::SubLocationFilter;
///
/// let only_bavaria = SubLocationFilter::from_entries(["Bavaria"]);
/// assert!(only_bavaria.allows("Bavaria"));
/// assert!(!only_bavaria.allows("Saxony"));
///
/// let not_bavaria = SubLocationFilter::from_entries(["~Bavaria"]);
/// assert!(!not_bavaria.allows("Bavaria"));
/// assert!(not_bavaria.allows("Saxony"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubLocationFilter {
    allowed: Option<BTreeSet<String>>,
    excluded: BTreeSet<String>,
}

impl SubLocationFilter {
    /// Prefix marking an excluded label.
    pub const EXCLUDE_MARKER: char = '~';

    /// Filter keeping every sub-location.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a filter from raw entries.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allowed = BTreeSet::new();
        let mut excluded = BTreeSet::new();
        for entry in entries {
            let raw = entry.as_ref();
            match raw.strip_prefix(Self::EXCLUDE_MARKER) {
                Some(label) => excluded.insert(label.to_owned()),
                None => allowed.insert(raw.to_owned()),
            };
        }
        Self {
            allowed: (!allowed.is_empty()).then_some(allowed),
            excluded,
        }
    }

    /// Whether a sub-location labelled `label` passes.
    #[must_use]
    pub fn allows(&self, label: &str) -> bool {
        !self.excluded.contains(label)
            && self
                .allowed
                .as_ref()
                .is_none_or(|allowed| allowed.contains(label))
    }
}
