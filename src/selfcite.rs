//! Self-citation filtering.
//!
//! Citing papers authored by the profile owner are excluded from external
//! impact statistics. Matching is by bidirectional substring containment
//! against a list of known name variants, which intentionally over-matches
//! short tokens: filtering a borderline name is preferred over counting a
//! self-citation.

/// Known name variants of the profile owner, lowercased.
const SELF_NAMES: &[&str] = &[
    "vineeth sai",
    "vs narajala",
    "vineeth sai narajala",
    "v. s. narajala",
    "narajala, v",
    "narajala, vineeth",
    "v s narajala",
    "vineeth narajala",
    "v narajala",
    "narajala v",
    "narajala vs",
    "vineeth s",
    "v. narajala",
];

/// Matches author names against the profile owner's name variants.
pub struct SelfCitationFilter {
    names: Vec<String>,
}

impl SelfCitationFilter {
    /// Filter over the built-in name-variant list.
    pub fn new() -> Self {
        Self {
            names: SELF_NAMES.iter().map(|n| n.to_string()).collect(),
        }
    }

    /// Filter over a custom name-variant list (entries are lowercased).
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Returns true when `author_name` matches any known variant.
    ///
    /// An empty or whitespace-only name cannot be a self-citation.
    pub fn is_self_citation(&self, author_name: &str) -> bool {
        let author = author_name.to_lowercase();
        let author = author.trim();
        if author.is_empty() {
            return false;
        }
        self.names
            .iter()
            .any(|name| author.contains(name.as_str()) || name.contains(author))
    }
}

impl Default for SelfCitationFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_known_variants_match() {
        let filter = SelfCitationFilter::new();
        for name in SELF_NAMES {
            assert!(filter.is_self_citation(name), "expected match for {name}");
        }
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let filter = SelfCitationFilter::new();
        assert!(filter.is_self_citation("  Vineeth Sai Narajala  "));
        assert!(filter.is_self_citation("NARAJALA, V"));
    }

    #[test]
    fn test_name_embedded_in_longer_string() {
        let filter = SelfCitationFilter::new();
        assert!(filter.is_self_citation("Dr. Vineeth Sai Narajala, PhD"));
    }

    #[test]
    fn test_control_name_does_not_match() {
        let filter = SelfCitationFilter::new();
        assert!(!filter.is_self_citation("Jane Doe"));
        assert!(!filter.is_self_citation("John Smith"));
    }

    #[test]
    fn test_empty_name_is_not_self_citation() {
        let filter = SelfCitationFilter::new();
        assert!(!filter.is_self_citation(""));
        assert!(!filter.is_self_citation("   "));
    }

    #[test]
    fn test_custom_names() {
        let filter = SelfCitationFilter::with_names(["Ada Lovelace"]);
        assert!(filter.is_self_citation("ada lovelace"));
        assert!(!filter.is_self_citation("Vineeth Sai Narajala"));
    }
}
