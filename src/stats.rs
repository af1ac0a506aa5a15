//! Location bucketing and summary statistics.
//!
//! Citing papers are grouped into map buckets by their coordinate rounded to
//! one decimal place (roughly 11 km grid cells), and the deduplicated paper
//! list is reduced to the dashboard's summary stats. Both operations are
//! deterministic given identical input order: ties in the top-N lists are
//! broken by first-encountered order.

use crate::model::{
    is_unknown, CitationStats, CitingPaper, InfluenceDistribution, LocationBucket, NameCount,
    TierDistribution,
};
use crate::venue::Tier;
use std::collections::HashMap;

/// Example paper titles stored per bucket.
const MAX_BUCKET_PAPERS: usize = 10;
/// Example affiliations stored per bucket.
const MAX_BUCKET_AFFILIATIONS: usize = 5;
/// Entries kept in the top-venue and top-country lists.
const TOP_N: usize = 10;

/// influenceScore >= HIGH_THRESHOLD counts as high influence.
const HIGH_THRESHOLD: u32 = 70;
/// influenceScore >= MEDIUM_THRESHOLD (and below high) counts as medium.
const MEDIUM_THRESHOLD: u32 = 40;

/// Grid cell for a coordinate, at one-decimal resolution.
fn grid_key(latitude: f64, longitude: f64) -> (i64, i64) {
    ((latitude * 10.0).round() as i64, (longitude * 10.0).round() as i64)
}

/// Accumulates citing-paper sightings into location buckets.
pub struct LocationAggregator {
    index: HashMap<(i64, i64), usize>,
    buckets: Vec<LocationBucket>,
}

impl LocationAggregator {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            buckets: Vec::new(),
        }
    }

    /// Record one sighting at a coordinate.
    ///
    /// The bucket keeps the coordinate of its first contributing record as
    /// the display center. `count` grows with every call; the example lists
    /// are capped and deduplicated.
    pub fn add(
        &mut self,
        latitude: f64,
        longitude: f64,
        country: &str,
        city: &str,
        paper_title: &str,
        affiliation: &str,
    ) {
        let key = grid_key(latitude, longitude);
        let i = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                self.index.insert(key, self.buckets.len());
                self.buckets.push(LocationBucket {
                    latitude,
                    longitude,
                    country: country.to_string(),
                    city: city.to_string(),
                    count: 0,
                    papers: Vec::new(),
                    affiliations: Vec::new(),
                });
                self.buckets.len() - 1
            }
        };

        let bucket = &mut self.buckets[i];
        bucket.count += 1;
        if !paper_title.is_empty()
            && bucket.papers.len() < MAX_BUCKET_PAPERS
            && !bucket.papers.iter().any(|p| p == paper_title)
        {
            bucket.papers.push(paper_title.to_string());
        }
        if !affiliation.is_empty()
            && bucket.affiliations.len() < MAX_BUCKET_AFFILIATIONS
            && !bucket.affiliations.iter().any(|a| a == affiliation)
        {
            bucket.affiliations.push(affiliation.to_string());
        }
    }

    /// Record a sighting derived from a paper's affiliation, once per paper
    /// per bucket.
    ///
    /// Unlike [`add`](Self::add), which counts every source row, this guards
    /// on the paper title so a paper with several affiliations resolving to
    /// the same cell is counted once there.
    pub fn add_paper_once(
        &mut self,
        latitude: f64,
        longitude: f64,
        country: &str,
        city: &str,
        paper_title: &str,
        affiliation: &str,
    ) {
        let key = grid_key(latitude, longitude);
        if let Some(&i) = self.index.get(&key) {
            if self.buckets[i].papers.iter().any(|p| p == paper_title) {
                return;
            }
        }
        self.add(latitude, longitude, country, city, paper_title, affiliation);
    }

    /// Finish and return buckets sorted by descending count.
    ///
    /// The sort is stable, so buckets with equal counts keep their
    /// first-encountered order.
    pub fn into_sorted(self) -> Vec<LocationBucket> {
        let mut buckets = self.buckets;
        buckets.sort_by(|a, b| b.count.cmp(&a.count));
        buckets
    }
}

impl Default for LocationAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the dashboard summary statistics.
pub fn aggregate(
    papers: &[CitingPaper],
    locations: &[LocationBucket],
    unique_authors: u32,
) -> CitationStats {
    let mut tiers = TierDistribution::default();
    let mut influence = InfluenceDistribution::default();
    let mut prestigious_count = 0;

    let mut venue_counts = CountedNames::new();
    let mut country_counts = CountedNames::new();

    for paper in papers {
        match paper.tier {
            Tier::Tier1 => tiers.tier1 += 1,
            Tier::Tier2 => tiers.tier2 += 1,
            Tier::Other => tiers.other += 1,
            Tier::Preprint => tiers.preprint += 1,
        }

        if paper.influence_score >= HIGH_THRESHOLD {
            influence.high += 1;
        } else if paper.influence_score >= MEDIUM_THRESHOLD {
            influence.medium += 1;
        } else {
            influence.low += 1;
        }

        if paper.is_prestigious {
            prestigious_count += 1;
        }
        if !is_unknown(&paper.venue) {
            venue_counts.bump(&paper.venue);
        }
        if !is_unknown(&paper.country) {
            country_counts.bump(&paper.country);
        }
    }

    CitationStats {
        total_citations: papers.len() as u32,
        unique_locations: locations.len() as u32,
        top_venues: venue_counts.top(TOP_N),
        influence_distribution: influence,
        tier_distribution: tiers,
        top_countries: country_counts.top(TOP_N),
        prestigious_count,
        unique_authors,
    }
}

/// Frequency counter that preserves first-encountered order for tie-breaking.
struct CountedNames {
    index: HashMap<String, usize>,
    counts: Vec<NameCount>,
}

impl CountedNames {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            counts: Vec::new(),
        }
    }

    fn bump(&mut self, name: &str) {
        match self.index.get(name) {
            Some(&i) => self.counts[i].count += 1,
            None => {
                self.index.insert(name.to_string(), self.counts.len());
                self.counts.push(NameCount {
                    name: name.to_string(),
                    count: 1,
                });
            }
        }
    }

    fn top(mut self, n: usize) -> Vec<NameCount> {
        self.counts.sort_by(|a, b| b.count.cmp(&a.count));
        self.counts.truncate(n);
        self.counts
    }
}
