//! Paper link generation.
//!
//! Citing papers ingested from the CSV/cache sources carry no URL. When no
//! link is known from a live fetch, we synthesize a search link: a direct
//! arXiv abs link when an arXiv ID is embedded in the venue text, a
//! publisher-specific search URL when the venue names a known domain, and a
//! Google Scholar search as the final fallback.

use regex::Regex;
use std::sync::OnceLock;

/// Publisher domain fragments mapped to their search URL templates.
/// `{query}` is replaced with the URL-encoded paper title.
const DOMAIN_SEARCH_URLS: &[(&str, &str)] = &[
    ("arxiv", "https://arxiv.org/search/?query={query}&searchtype=all"),
    ("ieeexplore", "https://ieeexplore.ieee.org/search/searchresult.jsp?queryText={query}"),
    ("dl.acm", "https://dl.acm.org/action/doSearch?AllField={query}"),
    ("springer", "https://link.springer.com/search?query={query}"),
    ("sciencedirect", "https://www.sciencedirect.com/search?qs={query}"),
    ("mdpi", "https://www.mdpi.com/search?q={query}"),
    ("pmc.ncbi", "https://www.ncbi.nlm.nih.gov/pmc/?term={query}"),
    ("openreview", "https://openreview.net/search?term={query}"),
];

fn arxiv_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"arxiv[:\s]*(\d{4}\.\d{4,5})").expect("Static arXiv regex"))
}

/// Generate a link for a paper from its title and venue text.
pub fn generate_paper_link(title: &str, venue: &str) -> String {
    let encoded = urlencoding::encode(title.trim()).into_owned();
    let venue_lower = venue.to_lowercase();

    // An embedded arXiv ID gives a direct link; check before the generic
    // arxiv search-domain entry below shadows it.
    if let Some(caps) = arxiv_id_regex().captures(&venue_lower) {
        if let Some(id) = caps.get(1) {
            return format!("https://arxiv.org/abs/{}", id.as_str());
        }
    }

    for (domain, template) in DOMAIN_SEARCH_URLS {
        if venue_lower.contains(domain) {
            return template.replace("{query}", &encoded);
        }
    }

    format!("https://scholar.google.com/scholar?q={}", encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_domain() {
        let link = generate_paper_link("Paper A", "Proceedings - dl.acm.org");
        assert_eq!(
            link,
            "https://dl.acm.org/action/doSearch?AllField=Paper%20A"
        );
    }

    #[test]
    fn test_arxiv_id_beats_domain_search() {
        let link = generate_paper_link("Paper A", "arXiv:2401.01234 [cs.CR]");
        assert_eq!(link, "https://arxiv.org/abs/2401.01234");
    }

    #[test]
    fn test_arxiv_without_id_uses_search() {
        let link = generate_paper_link("Paper A", "arXiv preprint");
        assert_eq!(
            link,
            "https://arxiv.org/search/?query=Paper%20A&searchtype=all"
        );
    }

    #[test]
    fn test_scholar_fallback() {
        let link = generate_paper_link("A Paper About Things", "Obscure Venue");
        assert_eq!(
            link,
            "https://scholar.google.com/scholar?q=A%20Paper%20About%20Things"
        );
    }
}
