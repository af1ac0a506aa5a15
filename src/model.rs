//! Core data model for the citation pipeline.
//!
//! These types mirror the `citations.json` schema consumed by the website's
//! citation dashboard, so all output-facing structs serialize in camelCase.

use crate::venue::Tier;
use serde::{Deserialize, Serialize};

/// Sentinel for missing affiliation/country/venue values.
pub const UNKNOWN: &str = "Unknown";

/// Returns true when a scalar field still holds the missing-value sentinel.
pub fn is_unknown(value: &str) -> bool {
    value.is_empty() || value == UNKNOWN
}

/// One raw row from an ingestion adapter, before deduplication.
///
/// Discarded after being folded into a [`CitingPaper`].
#[derive(Debug, Clone, Default)]
pub struct CitationRecord {
    /// Citing author name (may be empty)
    pub author: String,
    /// Citing paper title, the natural key after normalization
    pub citing_title: String,
    /// Title of the cited publication (may be empty)
    pub cited_title: String,
    /// Raw affiliation text (empty when absent or placeholder)
    pub affiliation: String,
    /// Geocoordinate when the source carries one (CSV latitude/longitude columns)
    pub coordinate: Option<(f64, f64)>,
    /// Country of the citing institution
    pub country: String,
    /// City of the citing institution
    pub city: String,
}

/// A deduplicated external paper citing one of the profile owner's publications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CitingPaper {
    pub title: String,
    /// Insertion-ordered, no duplicates
    pub authors: Vec<String>,
    pub venue: String,
    pub link: String,
    pub citation_count: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub snippet: Option<String>,
    pub influence_score: u32,
    pub venue_score: u32,
    pub citation_score: u32,
    /// First cited publication seen for this paper
    pub cited_publication: String,
    /// All cited publications, deduplicated, insertion order
    pub cited_publications: Vec<String>,
    /// Primary affiliation ("Unknown" until one is known)
    pub affiliation: String,
    /// All affiliations, deduplicated, insertion order
    pub affiliations: Vec<String>,
    pub country: String,
    pub tier: Tier,
    pub is_prestigious: bool,
}

/// One of the profile owner's own publications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    pub year: i32,
    pub venue: String,
    #[serde(default)]
    pub link: String,
    pub citation_count: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cites_id: Option<String>,
}

/// Aggregated map marker: citing papers grouped by a ~11 km coordinate grid cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationBucket {
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    #[serde(default)]
    pub city: String,
    /// Number of contributing records; not bounded by the example-list caps below
    pub count: u32,
    /// Example paper titles, capped at 10
    pub papers: Vec<String>,
    /// Example affiliations, capped at 5
    pub affiliations: Vec<String>,
}

/// `{name, count}` pair used for top-venue and top-country lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NameCount {
    pub name: String,
    pub count: u32,
}

/// Histogram of influence scores over the fixed high/medium/low thresholds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InfluenceDistribution {
    /// influenceScore >= 70
    pub high: u32,
    /// 40 <= influenceScore < 70
    pub medium: u32,
    /// influenceScore < 40
    pub low: u32,
}

/// Citing-paper counts per venue tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TierDistribution {
    pub tier1: u32,
    pub tier2: u32,
    pub other: u32,
    pub preprint: u32,
}

/// Summary statistics over the deduplicated citing papers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CitationStats {
    pub total_citations: u32,
    pub unique_locations: u32,
    pub top_venues: Vec<NameCount>,
    pub influence_distribution: InfluenceDistribution,
    pub tier_distribution: TierDistribution,
    pub top_countries: Vec<NameCount>,
    pub prestigious_count: u32,
    pub unique_authors: u32,
}

/// The emitted `citations.json` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationData {
    /// ISO-8601 UTC timestamp of the run
    pub last_updated: String,
    pub scholar_id: String,
    pub publications: Vec<Publication>,
    pub citing_papers: Vec<CitingPaper>,
    pub locations: Vec<LocationBucket>,
    pub stats: CitationStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_unknown() {
        assert!(is_unknown(""));
        assert!(is_unknown("Unknown"));
        assert!(!is_unknown("Stanford University"));
    }

    #[test]
    fn test_citing_paper_camel_case() {
        let paper = CitingPaper {
            title: "Paper A".to_string(),
            authors: vec!["Jane Doe".to_string()],
            venue: "IEEE Access".to_string(),
            link: String::new(),
            citation_count: 3,
            snippet: None,
            influence_score: 50,
            venue_score: 50,
            citation_score: 0,
            cited_publication: "Paper B".to_string(),
            cited_publications: vec!["Paper B".to_string()],
            affiliation: "Unknown".to_string(),
            affiliations: vec![],
            country: "Unknown".to_string(),
            tier: Tier::Tier1,
            is_prestigious: false,
        };

        let json = serde_json::to_value(&paper).expect("serialize");
        assert_eq!(json["citationCount"], 3);
        assert_eq!(json["influenceScore"], 50);
        assert_eq!(json["citedPublication"], "Paper B");
        assert_eq!(json["isPrestigious"], false);
        assert_eq!(json["tier"], "tier1");
        // snippet is omitted when absent
        assert!(json.get("snippet").is_none());
    }
}
