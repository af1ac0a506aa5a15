//! Deduplication and merging of citation records.
//!
//! Every ingestion adapter produces a stream of [`CitationRecord`] rows; this
//! module folds them into one [`CitingPaper`] per distinct normalized title.
//! Accumulating fields (authors, affiliations, cited publications) are
//! insertion-ordered unions. Scalar fields (country, primary affiliation,
//! link) are only replaced while they still hold the `Unknown` sentinel — a
//! later row can fill a gap but never overwrite known data.

use crate::geo;
use crate::links;
use crate::model::{is_unknown, CitationRecord, CitingPaper, UNKNOWN};
use crate::selfcite::SelfCitationFilter;
use crate::venue::{is_prestigious, Tier, VenueClassifier};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Normalized deduplication key for a citing paper title.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// What happened to one folded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldOutcome {
    /// Row contributed to a new or existing paper
    Folded,
    /// Row was authored by the profile owner
    SelfCitation,
    /// Row lacked a citing title or carried a noise country
    Skipped,
}

/// Everything the fold pass produced, handed to aggregation.
#[derive(Debug)]
pub struct FoldSummary {
    /// Deduplicated citing papers, first-sighting order
    pub papers: Vec<CitingPaper>,
    /// Cited publication titles, first-seen order, deduplicated
    pub cited_titles: Vec<String>,
    /// Distinct citing author names across all rows
    pub unique_authors: u32,
    /// Rows dropped by the self-citation filter
    pub self_citations: u32,
    /// Rows dropped for a missing citing title or a noise country
    pub skipped_rows: u32,
}

/// Accumulator that deduplicates citation records by normalized title.
pub struct PaperSet {
    filter: SelfCitationFilter,
    classifier: VenueClassifier,
    index: HashMap<String, usize>,
    papers: Vec<CitingPaper>,
    cited_titles: Vec<String>,
    cited_seen: HashSet<String>,
    authors: HashSet<String>,
    self_citations: u32,
    skipped_rows: u32,
}

impl PaperSet {
    pub fn new(filter: SelfCitationFilter, classifier: VenueClassifier) -> Self {
        Self {
            filter,
            classifier,
            index: HashMap::new(),
            papers: Vec::new(),
            cited_titles: Vec::new(),
            cited_seen: HashSet::new(),
            authors: HashSet::new(),
            self_citations: 0,
            skipped_rows: 0,
        }
    }

    /// Fold one raw record into the set.
    ///
    /// `venue_hint` and `link_hint` carry per-title data recovered from a
    /// previous dataset or a live fetch; they apply on first sighting and
    /// whenever the stored value is still unknown.
    pub fn fold(
        &mut self,
        record: &CitationRecord,
        venue_hint: Option<&str>,
        link_hint: Option<&str>,
    ) -> FoldOutcome {
        // Cited publications are tracked before any filtering: a self-citation
        // still proves the publication exists.
        let cited_title = record.cited_title.trim();
        if !cited_title.is_empty() && self.cited_seen.insert(cited_title.to_lowercase()) {
            self.cited_titles.push(cited_title.to_string());
        }

        if self.filter.is_self_citation(&record.author) {
            self.self_citations += 1;
            return FoldOutcome::SelfCitation;
        }

        let title = record.citing_title.trim();
        if title.is_empty() {
            self.skipped_rows += 1;
            return FoldOutcome::Skipped;
        }

        if geo::is_noise_country(record.country.trim()) {
            debug!(title = title, country = %record.country, "Dropping noise-country row");
            self.skipped_rows += 1;
            return FoldOutcome::Skipped;
        }

        let author = record.author.trim();
        if !author.is_empty() {
            self.authors.insert(author.to_string());
        }

        let affiliation = record.affiliation.trim();
        let country = {
            let c = record.country.trim();
            if c.is_empty() {
                UNKNOWN.to_string()
            } else {
                geo::normalize_country(c)
            }
        };

        let key = normalize_title(title);
        match self.index.get(&key) {
            Some(&i) => {
                merge_into(&mut self.papers[i], record, &country, venue_hint, link_hint);
            }
            None => {
                let paper = self.create(title, author, affiliation, &country, record, venue_hint, link_hint);
                self.index.insert(key, self.papers.len());
                self.papers.push(paper);
            }
        }
        FoldOutcome::Folded
    }

    /// Fold one citing-paper hit from a live search fetch.
    ///
    /// Hits carry a full author list, so the self-citation policy differs
    /// from row folding: the whole hit is dropped when any listed author is
    /// the profile owner.
    #[allow(clippy::too_many_arguments)]
    pub fn fold_hit(
        &mut self,
        title: &str,
        authors: &[String],
        venue: &str,
        affiliation: Option<&str>,
        link: &str,
        citation_count: i64,
        snippet: Option<&str>,
        cited_title: &str,
    ) -> FoldOutcome {
        let cited = cited_title.trim();
        if !cited.is_empty() && self.cited_seen.insert(cited.to_lowercase()) {
            self.cited_titles.push(cited.to_string());
        }

        if authors.iter().any(|a| self.filter.is_self_citation(a)) {
            self.self_citations += 1;
            return FoldOutcome::SelfCitation;
        }

        let title = title.trim();
        if title.is_empty() {
            self.skipped_rows += 1;
            return FoldOutcome::Skipped;
        }

        for author in authors {
            let author = author.trim();
            if !author.is_empty() {
                self.authors.insert(author.to_string());
            }
        }

        let affiliation = affiliation.map(str::trim).filter(|a| !a.is_empty());

        let key = normalize_title(title);
        match self.index.get(&key) {
            Some(&i) => {
                let paper = &mut self.papers[i];
                for author in authors {
                    let author = author.trim();
                    if !author.is_empty() && !paper.authors.iter().any(|a| a == author) {
                        paper.authors.push(author.to_string());
                    }
                }
                if !cited.is_empty() && !paper.cited_publications.iter().any(|c| c == cited) {
                    paper.cited_publications.push(cited.to_string());
                }
                if let Some(aff) = affiliation {
                    if !paper.affiliations.iter().any(|a| a == aff) {
                        paper.affiliations.push(aff.to_string());
                    }
                    if is_unknown(&paper.affiliation) {
                        paper.affiliation = aff.to_string();
                    }
                    if is_prestigious(aff) {
                        paper.is_prestigious = true;
                        if paper.tier == Tier::Other {
                            paper.tier = Tier::Tier2;
                            let score = paper.tier.score();
                            paper.venue_score = score;
                            paper.influence_score = score;
                        }
                    }
                }
                if is_unknown(&paper.venue) && !is_unknown(venue.trim()) {
                    paper.venue = venue.trim().to_string();
                }
                if !link.trim().is_empty()
                    && (paper.link.is_empty()
                        || paper.link.starts_with("https://scholar.google.com/scholar?q="))
                {
                    paper.link = link.trim().to_string();
                }
                if paper.snippet.is_none() {
                    paper.snippet = snippet.map(str::to_string).filter(|s| !s.is_empty());
                }
                paper.citation_count = paper.citation_count.max(citation_count);
            }
            None => {
                let venue = {
                    let v = venue.trim();
                    if v.is_empty() {
                        UNKNOWN
                    } else {
                        v
                    }
                };
                let aff = affiliation.unwrap_or("");
                let blob = classification_blob(venue, title, aff);
                let tier = self.classifier.classify_with_upgrade(&blob, aff);
                let score = tier.score();
                let link = if link.trim().is_empty() {
                    links::generate_paper_link(title, venue)
                } else {
                    link.trim().to_string()
                };
                self.index.insert(key, self.papers.len());
                self.papers.push(CitingPaper {
                    title: title.to_string(),
                    authors: authors
                        .iter()
                        .map(|a| a.trim().to_string())
                        .filter(|a| !a.is_empty())
                        .collect(),
                    venue: venue.to_string(),
                    link,
                    citation_count,
                    snippet: snippet.map(str::to_string).filter(|s| !s.is_empty()),
                    influence_score: score,
                    venue_score: score,
                    citation_score: 0,
                    cited_publication: cited.to_string(),
                    cited_publications: if cited.is_empty() {
                        Vec::new()
                    } else {
                        vec![cited.to_string()]
                    },
                    affiliation: affiliation.map(str::to_string).unwrap_or_else(|| UNKNOWN.to_string()),
                    affiliations: affiliation.map(|a| vec![a.to_string()]).unwrap_or_default(),
                    country: UNKNOWN.to_string(),
                    tier,
                    is_prestigious: is_prestigious(venue) || is_prestigious(aff),
                });
            }
        }
        FoldOutcome::Folded
    }

    #[allow(clippy::too_many_arguments)]
    fn create(
        &self,
        title: &str,
        author: &str,
        affiliation: &str,
        country: &str,
        record: &CitationRecord,
        venue_hint: Option<&str>,
        link_hint: Option<&str>,
    ) -> CitingPaper {
        let venue = venue_hint
            .map(str::trim)
            .filter(|v| !is_unknown(v))
            .unwrap_or(UNKNOWN);

        // Classification uses whatever text is available; with no venue the
        // title/affiliation signal still applies.
        let blob = classification_blob(venue, title, affiliation);
        let tier = self.classifier.classify_with_upgrade(&blob, affiliation);
        let score = tier.score();
        let prestigious = is_prestigious(affiliation) || is_prestigious(venue);

        let link = link_hint
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| links::generate_paper_link(title, venue));

        let cited = record.cited_title.trim();

        CitingPaper {
            title: title.to_string(),
            authors: if author.is_empty() {
                Vec::new()
            } else {
                vec![author.to_string()]
            },
            venue: venue.to_string(),
            link,
            citation_count: 0,
            snippet: None,
            influence_score: score,
            venue_score: score,
            citation_score: 0,
            cited_publication: cited.to_string(),
            cited_publications: if cited.is_empty() {
                Vec::new()
            } else {
                vec![cited.to_string()]
            },
            affiliation: if affiliation.is_empty() {
                UNKNOWN.to_string()
            } else {
                affiliation.to_string()
            },
            affiliations: if affiliation.is_empty() {
                Vec::new()
            } else {
                vec![affiliation.to_string()]
            },
            country: country.to_string(),
            tier,
            is_prestigious: prestigious,
        }
    }

    /// Finish folding and hand the accumulated results to aggregation.
    pub fn finish(self) -> FoldSummary {
        FoldSummary {
            papers: self.papers,
            cited_titles: self.cited_titles,
            unique_authors: self.authors.len() as u32,
            self_citations: self.self_citations,
            skipped_rows: self.skipped_rows,
        }
    }

    /// Papers accumulated so far, in first-sighting order.
    pub fn papers(&self) -> &[CitingPaper] {
        &self.papers
    }
}

fn classification_blob(venue: &str, title: &str, affiliation: &str) -> String {
    let venue = if is_unknown(venue) { "" } else { venue };
    [venue, title, affiliation]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

fn merge_into(
    paper: &mut CitingPaper,
    record: &CitationRecord,
    country: &str,
    venue_hint: Option<&str>,
    link_hint: Option<&str>,
) {
    let author = record.author.trim();
    if !author.is_empty() && !paper.authors.iter().any(|a| a == author) {
        paper.authors.push(author.to_string());
    }

    let affiliation = record.affiliation.trim();
    if !affiliation.is_empty() && !paper.affiliations.iter().any(|a| a == affiliation) {
        paper.affiliations.push(affiliation.to_string());
    }
    if !affiliation.is_empty() && is_unknown(&paper.affiliation) {
        paper.affiliation = affiliation.to_string();
    }

    let cited = record.cited_title.trim();
    if !cited.is_empty() && !paper.cited_publications.iter().any(|c| c == cited) {
        paper.cited_publications.push(cited.to_string());
    }
    if paper.cited_publication.is_empty() && !cited.is_empty() {
        paper.cited_publication = cited.to_string();
    }

    if !is_unknown(country) && is_unknown(&paper.country) {
        paper.country = country.to_string();
    }

    if let Some(venue) = venue_hint.map(str::trim).filter(|v| !is_unknown(v)) {
        if is_unknown(&paper.venue) {
            paper.venue = venue.to_string();
        }
    }
    if let Some(link) = link_hint.map(str::trim).filter(|l| !l.is_empty()) {
        if paper.link.is_empty() || paper.link.starts_with("https://scholar.google.com/scholar?q=") {
            paper.link = link.to_string();
        }
    }

    if is_prestigious(affiliation) || is_prestigious(&paper.venue) {
        paper.is_prestigious = true;
    }

    // The prestigious upgrade stays monotonic across merges: an Other-tier
    // paper gains Tier2 as soon as a prestigious affiliation arrives.
    if paper.tier == Tier::Other && paper.is_prestigious {
        paper.tier = Tier::Tier2;
        let score = paper.tier.score();
        paper.venue_score = score;
        paper.influence_score = score;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(author: &str, citing: &str, cited: &str, affiliation: &str) -> CitationRecord {
        CitationRecord {
            author: author.to_string(),
            citing_title: citing.to_string(),
            cited_title: cited.to_string(),
            affiliation: affiliation.to_string(),
            ..Default::default()
        }
    }

    fn paper_set() -> PaperSet {
        PaperSet::new(
            SelfCitationFilter::new(),
            VenueClassifier::new().expect("compile patterns"),
        )
    }

    #[test]
    fn test_dedup_by_normalized_title() {
        let mut set = paper_set();
        set.fold(&record("A One", "Paper A", "Pub X", ""), None, None);
        set.fold(&record("B Two", "  paper a ", "Pub X", ""), None, None);
        assert_eq!(set.papers().len(), 1);
        assert_eq!(set.papers()[0].authors, vec!["A One", "B Two"]);
    }

    #[test]
    fn test_author_union_is_commutative() {
        let r1 = record("A One", "Paper A", "Pub X", "");
        let r2 = record("B Two", "Paper A", "Pub X", "");

        let mut forward = paper_set();
        forward.fold(&r1, None, None);
        forward.fold(&r2, None, None);

        let mut reverse = paper_set();
        reverse.fold(&r2, None, None);
        reverse.fold(&r1, None, None);

        let f = &forward.papers()[0];
        let r = &reverse.papers()[0];
        assert_eq!(f.authors.len(), 2);
        assert_eq!(r.authors.len(), 2);
        let fs: std::collections::HashSet<_> = f.authors.iter().collect();
        let rs: std::collections::HashSet<_> = r.authors.iter().collect();
        assert_eq!(fs, rs);
    }

    #[test]
    fn test_duplicate_author_not_repeated() {
        let mut set = paper_set();
        set.fold(&record("A One", "Paper A", "Pub X", ""), None, None);
        set.fold(&record("A One", "Paper A", "Pub Y", ""), None, None);
        assert_eq!(set.papers()[0].authors, vec!["A One"]);
        assert_eq!(set.papers()[0].cited_publications, vec!["Pub X", "Pub Y"]);
    }

    #[test]
    fn test_country_never_downgraded_to_unknown() {
        let mut set = paper_set();
        let mut r1 = record("A One", "Paper A", "", "");
        r1.country = "Germany".to_string();
        let r2 = record("B Two", "Paper A", "", "");
        set.fold(&r1, None, None);
        set.fold(&r2, None, None);
        assert_eq!(set.papers()[0].country, "Germany");

        // Reversed arrival: the unknown row first, then the known one
        let mut set = paper_set();
        set.fold(&r2, None, None);
        set.fold(&r1, None, None);
        assert_eq!(set.papers()[0].country, "Germany");
    }

    #[test]
    fn test_affiliation_fills_unknown_primary() {
        let mut set = paper_set();
        set.fold(&record("A One", "Paper A", "", ""), None, None);
        assert_eq!(set.papers()[0].affiliation, UNKNOWN);
        set.fold(&record("B Two", "Paper A", "", "TU Wien"), None, None);
        assert_eq!(set.papers()[0].affiliation, "TU Wien");
        assert_eq!(set.papers()[0].affiliations, vec!["TU Wien"]);
    }

    #[test]
    fn test_self_citation_rows_are_dropped() {
        let mut set = paper_set();
        set.fold(
            &record("Vineeth Sai Narajala", "Paper A", "Pub X", ""),
            None,
            None,
        );
        assert!(set.papers().is_empty());
        let summary = set.finish();
        assert_eq!(summary.self_citations, 1);
        // The cited publication is still recorded
        assert_eq!(summary.cited_titles, vec!["Pub X"]);
    }

    #[test]
    fn test_missing_title_is_skipped() {
        let mut set = paper_set();
        set.fold(&record("A One", "  ", "Pub X", ""), None, None);
        assert!(set.papers().is_empty());
        assert_eq!(set.finish().skipped_rows, 1);
    }

    #[test]
    fn test_prestigious_upgrade_arrives_on_merge() {
        let mut set = paper_set();
        set.fold(&record("A One", "An Unremarkable Title", "", ""), None, None);
        assert_eq!(set.papers()[0].tier, Tier::Other);
        set.fold(
            &record("B Two", "An Unremarkable Title", "", "Stanford University"),
            None,
            None,
        );
        let paper = &set.papers()[0];
        assert_eq!(paper.tier, Tier::Tier2);
        assert_eq!(paper.influence_score, Tier::Tier2.score());
        assert!(paper.is_prestigious);
    }

    #[test]
    fn test_venue_hint_classifies_on_first_sighting() {
        let mut set = paper_set();
        set.fold(
            &record("A One", "Some Findings", "", ""),
            Some("IEEE Access"),
            None,
        );
        let paper = &set.papers()[0];
        assert_eq!(paper.venue, "IEEE Access");
        assert_eq!(paper.tier, Tier::Tier1);
        assert_eq!(paper.influence_score, 50);
    }

    #[test]
    fn test_link_hint_beats_generated_fallback() {
        let mut set = paper_set();
        set.fold(&record("A One", "Paper A", "", ""), None, None);
        assert!(set.papers()[0].link.starts_with("https://scholar.google.com/"));
        set.fold(
            &record("B Two", "Paper A", "", ""),
            None,
            Some("https://example.org/paper-a"),
        );
        assert_eq!(set.papers()[0].link, "https://example.org/paper-a");
    }

    #[test]
    fn test_fold_hit_drops_whole_hit_on_any_self_author() {
        let mut set = paper_set();
        let authors = vec!["Jane Doe".to_string(), "Vineeth Sai Narajala".to_string()];
        let outcome = set.fold_hit(
            "Paper A",
            &authors,
            "IEEE Access",
            None,
            "",
            3,
            None,
            "Pub X",
        );
        assert_eq!(outcome, FoldOutcome::SelfCitation);
        assert!(set.papers().is_empty());
    }

    #[test]
    fn test_fold_hit_dedups_against_folded_rows() {
        let mut set = paper_set();
        set.fold(&record("A One", "Paper A", "Pub X", ""), None, None);
        let authors = vec!["B Two".to_string()];
        set.fold_hit(
            "paper a",
            &authors,
            "IEEE Access",
            Some("Technical University of Munich"),
            "https://example.org/a",
            7,
            Some("snippet"),
            "Pub Y",
        );
        assert_eq!(set.papers().len(), 1);
        let paper = &set.papers()[0];
        assert_eq!(paper.authors, vec!["A One", "B Two"]);
        assert_eq!(paper.venue, "IEEE Access");
        assert_eq!(paper.link, "https://example.org/a");
        assert_eq!(paper.citation_count, 7);
        assert_eq!(paper.cited_publications, vec!["Pub X", "Pub Y"]);
        assert_eq!(paper.affiliation, "Technical University of Munich");
    }

    #[test]
    fn test_unique_author_count() {
        let mut set = paper_set();
        set.fold(&record("A One", "Paper A", "", ""), None, None);
        set.fold(&record("A One", "Paper B", "", ""), None, None);
        set.fold(&record("B Two", "Paper B", "", ""), None, None);
        assert_eq!(set.finish().unique_authors, 2);
    }
}
