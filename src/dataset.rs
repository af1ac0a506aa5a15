//! Final dataset assembly and emission.
//!
//! Joins the fold results with publication metadata and location buckets into
//! the `citations.json` document, and writes it atomically: the JSON is
//! serialized to a temp file in the destination directory and renamed over
//! the target, so a partial write never corrupts a previous valid file.

use crate::error::{CitemapError, Result};
use crate::geo;
use crate::merge::{normalize_title, FoldOutcome, FoldSummary, PaperSet};
use crate::model::{CitationData, CitationRecord, CitingPaper, LocationBucket, Publication};
use crate::stats::{aggregate, LocationAggregator};
use chrono::{Datelike, SecondsFormat, Utc};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Per-title venue and link data recovered from a previously emitted dataset.
#[derive(Debug, Default)]
pub struct VenueHints {
    venues: HashMap<String, String>,
    links: HashMap<String, String>,
    publications: Vec<Publication>,
}

impl VenueHints {
    /// Build hints from a prior `citations.json`.
    pub fn from_dataset(data: &CitationData) -> Self {
        let mut venues = HashMap::new();
        let mut links = HashMap::new();
        for paper in &data.citing_papers {
            let key = normalize_title(&paper.title);
            if !crate::model::is_unknown(&paper.venue) {
                venues.insert(key.clone(), paper.venue.clone());
            }
            if !paper.link.is_empty() {
                links.insert(key, paper.link.clone());
            }
        }
        Self {
            venues,
            links,
            publications: data.publications.clone(),
        }
    }

    pub fn venue(&self, title: &str) -> Option<&str> {
        self.venues.get(&normalize_title(title)).map(String::as_str)
    }

    pub fn link(&self, title: &str) -> Option<&str> {
        self.links.get(&normalize_title(title)).map(String::as_str)
    }

    /// Publications carried over from the prior dataset; preferred over
    /// defaults derived from cited titles because they hold real citation
    /// counts.
    pub fn publications(&self) -> &[Publication] {
        &self.publications
    }
}

/// Fold records into the paper set, adding a map marker for every folded row
/// that carries its own coordinate.
pub fn fold_records(
    records: &[CitationRecord],
    hints: &VenueHints,
    set: &mut PaperSet,
    agg: &mut LocationAggregator,
) {
    for record in records {
        let venue_hint = hints.venue(&record.citing_title);
        let link_hint = hints.link(&record.citing_title);
        let outcome = set.fold(record, venue_hint, link_hint);
        if outcome != FoldOutcome::Folded {
            continue;
        }
        if let Some((lat, lng)) = record.coordinate {
            let country = record.country.trim();
            if !country.is_empty() && !geo::is_noise_country(country) {
                agg.add(
                    lat,
                    lng,
                    &geo::normalize_country(country),
                    record.city.trim(),
                    record.citing_title.trim(),
                    record.affiliation.trim(),
                );
            }
        }
    }
}

/// Add map markers resolved from paper affiliations via the static tables.
///
/// Returns the affiliations that did not resolve, paired with their paper
/// title, so the caller can optionally send them to the external geocoder.
pub fn add_affiliation_markers(
    papers: &[CitingPaper],
    agg: &mut LocationAggregator,
) -> Vec<(String, String)> {
    let mut unresolved = Vec::new();
    for paper in papers {
        for affiliation in &paper.affiliations {
            match geo::resolve(affiliation) {
                Some(loc) => {
                    agg.add_paper_once(
                        loc.latitude,
                        loc.longitude,
                        &loc.country,
                        &loc.city,
                        &paper.title,
                        affiliation,
                    );
                }
                None => unresolved.push((paper.title.clone(), affiliation.clone())),
            }
        }
    }
    unresolved
}

/// Default publications derived from cited-title sightings, used when no
/// authoritative publication list is available.
pub fn default_publications(cited_titles: &[String]) -> Vec<Publication> {
    let year = Utc::now().year();
    cited_titles
        .iter()
        .map(|title| Publication {
            title: title.clone(),
            authors: Vec::new(),
            year,
            venue: String::new(),
            link: String::new(),
            citation_count: 0,
            cites_id: None,
        })
        .collect()
}

/// Assemble the final document.
pub fn build_dataset(
    scholar_id: &str,
    summary: FoldSummary,
    publications: Vec<Publication>,
    locations: Vec<LocationBucket>,
) -> CitationData {
    let stats = aggregate(&summary.papers, &locations, summary.unique_authors);

    info!(
        citing_papers = summary.papers.len(),
        self_citations = summary.self_citations,
        skipped_rows = summary.skipped_rows,
        locations = locations.len(),
        "Assembled dataset"
    );

    CitationData {
        last_updated: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        scholar_id: scholar_id.to_string(),
        publications,
        citing_papers: summary.papers,
        locations,
        stats,
    }
}

/// Load a previously emitted dataset.
pub fn load_existing(path: &Path) -> Result<CitationData> {
    if !path.exists() {
        return Err(CitemapError::Config(format!(
            "Existing dataset not found: {}",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Serialize the dataset as indented UTF-8 JSON, atomically.
pub fn write_json_atomic(path: &Path, data: &CitationData) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        std::fs::create_dir_all(parent)?;
    }

    let mut temp = NamedTempFile::new_in(parent.unwrap_or_else(|| Path::new(".")))?;
    temp.write_all(json.as_bytes())?;
    temp.write_all(b"\n")?;
    temp.flush()?;
    temp.persist(path)
        .map_err(|e| CitemapError::Io(e.error))?;

    info!(path = %path.display(), "Wrote citations dataset");
    Ok(())
}
