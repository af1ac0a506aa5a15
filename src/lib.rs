//! # citemap
//!
//! Citation dashboard pipeline: builds the `citations.json` document behind a
//! personal website's citation map from CitationMap exports and SerpApi.
//!
//! ## Modules
//!
//! - [`citationmap`] - CitationMap CSV ingestion
//! - [`cache`] - pickled affiliation-cache ingestion
//! - [`serpapi`] - SerpApi Google Scholar client
//! - [`selfcite`] - self-citation filtering
//! - [`venue`] - venue tier classification and scoring
//! - [`merge`] - citing-paper deduplication and merging
//! - [`geo`] - static affiliation-to-coordinate resolution
//! - [`geocode`] - optional Nominatim geocoding with a persistent cache
//! - [`stats`] - location bucketing and summary statistics
//! - [`links`] - paper link generation
//! - [`dataset`] - final assembly and atomic JSON emission
//! - [`error`] - custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use citemap::{citationmap, dataset, merge, selfcite, stats, venue};
//!
//! fn main() -> anyhow::Result<()> {
//!     let records = citationmap::load_records(std::path::Path::new("citation_info.csv"))?;
//!     let mut set = merge::PaperSet::new(
//!         selfcite::SelfCitationFilter::new(),
//!         venue::VenueClassifier::new()?,
//!     );
//!     let mut locations = stats::LocationAggregator::new();
//!     dataset::fold_records(&records, &Default::default(), &mut set, &mut locations);
//!     println!("{} citing papers", set.papers().len());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod citationmap;
pub mod dataset;
pub mod error;
pub mod geo;
pub mod geocode;
pub mod links;
pub mod merge;
pub mod model;
pub mod selfcite;
pub mod serpapi;
pub mod stats;
pub mod venue;

pub use error::{CitemapError, Result};
