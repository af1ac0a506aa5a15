//! citemap - Citation Dashboard Pipeline
//!
//! Builds the `citations.json` document behind a personal website's citation
//! dashboard from CitationMap exports (CSV or pickled affiliation cache) or a
//! live SerpApi Google Scholar fetch.
//!
//! ## Usage
//!
//! ```bash
//! citemap build --source csv --csv citation_info.csv --output citations.json
//! citemap build --source serpapi --scholar-id hIVoKbIAAAAJ
//! ```

use anyhow::{Context, Result};
use citemap::dataset::{self, VenueHints};
use citemap::merge::PaperSet;
use citemap::selfcite::SelfCitationFilter;
use citemap::stats::LocationAggregator;
use citemap::venue::VenueClassifier;
use citemap::{cache, citationmap, geocode, serpapi};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Citation Dashboard Pipeline
#[derive(Parser)]
#[command(name = "citemap")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build citations.json from one of the ingestion sources
    Build {
        /// Ingestion source: csv, cache, or serpapi
        #[arg(long, default_value = "csv", value_parser = ["csv", "cache", "serpapi"])]
        source: String,

        /// CitationMap CSV export (source: csv)
        #[arg(long, default_value = "citation_info.csv")]
        csv: PathBuf,

        /// Pickled affiliation cache (source: cache)
        #[arg(long, default_value = "author_paper_affiliation_tuple_list.pkl")]
        cache: PathBuf,

        /// Previously emitted citations.json to recover venues/links/publications from
        #[arg(long)]
        merge_existing: Option<PathBuf>,

        /// Google Scholar profile ID
        #[arg(long, default_value = "hIVoKbIAAAAJ")]
        scholar_id: String,

        /// SerpApi key (falls back to the SERPAPI_KEY environment variable)
        #[arg(long)]
        api_key: Option<String>,

        /// Citation pages fetched per publication (source: serpapi)
        #[arg(long, default_value = "5")]
        max_pages: usize,

        /// Geocode unresolved affiliations via Nominatim
        #[arg(long)]
        geocode: bool,

        /// Geocode cache file (default: ~/.citemap_geocode_cache.json)
        #[arg(long)]
        geocode_cache: Option<PathBuf>,

        /// Output path
        #[arg(short, long, default_value = "citations.json")]
        output: PathBuf,
    },

    /// Manage the geocode cache
    Geocache {
        #[command(subcommand)]
        action: GeocacheAction,
    },
}

#[derive(Subcommand)]
enum GeocacheAction {
    /// Show the cache file path
    Path,
    /// Delete the cache file
    Clear,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    match cli.command {
        Commands::Build {
            source,
            csv,
            cache,
            merge_existing,
            scholar_id,
            api_key,
            max_pages,
            geocode,
            geocode_cache,
            output,
        } => {
            run_build(BuildOptions {
                source,
                csv,
                cache,
                merge_existing,
                scholar_id,
                api_key,
                max_pages,
                geocode,
                geocode_cache,
                output,
            })
            .await
        }
        Commands::Geocache { action } => handle_geocache(action),
    }
}

// ============================================================================
// Build Pipeline
// ============================================================================

struct BuildOptions {
    source: String,
    csv: PathBuf,
    cache: PathBuf,
    merge_existing: Option<PathBuf>,
    scholar_id: String,
    api_key: Option<String>,
    max_pages: usize,
    geocode: bool,
    geocode_cache: Option<PathBuf>,
    output: PathBuf,
}

async fn run_build(opts: BuildOptions) -> Result<()> {
    // Hints from a prior dataset, when requested
    let hints = match &opts.merge_existing {
        Some(path) => {
            let existing = dataset::load_existing(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            info!(
                venues = existing.citing_papers.len(),
                publications = existing.publications.len(),
                "Loaded prior dataset for merging"
            );
            VenueHints::from_dataset(&existing)
        }
        None => VenueHints::default(),
    };

    let mut set = PaperSet::new(
        SelfCitationFilter::new(),
        VenueClassifier::new().context("Failed to compile venue patterns")?,
    );
    let mut locations = LocationAggregator::new();

    // ===========================================
    // Stage 1: Ingestion
    // ===========================================
    let mut fetched_publications = None;

    match opts.source.as_str() {
        "csv" => {
            println!("--- Stage 1: CitationMap CSV ---");
            let records = citationmap::load_records(&opts.csv)?;
            println!("Loaded {} rows from {}", records.len(), opts.csv.display());
            dataset::fold_records(&records, &hints, &mut set, &mut locations);
        }
        "cache" => {
            println!("--- Stage 1: Affiliation Cache ---");
            let records = cache::load_records(&opts.cache)?;
            println!("Loaded {} tuples from {}", records.len(), opts.cache.display());
            dataset::fold_records(&records, &hints, &mut set, &mut locations);
        }
        "serpapi" => {
            println!("--- Stage 1: SerpApi Fetch ---");
            // Credential check happens before any I/O
            let api_key = opts
                .api_key
                .clone()
                .or_else(|| std::env::var("SERPAPI_KEY").ok())
                .context("SERPAPI_KEY not set and --api-key not provided")?;
            let client = serpapi::SerpApiClient::new(api_key, opts.max_pages)?;

            let publications = client.fetch_publications(&opts.scholar_id).await?;
            println!("Found {} publications", publications.len());

            let all_citing = client.fetch_all_citing(&publications).await;
            for (publication, hits) in publications.iter().zip(all_citing.iter()) {
                for hit in hits {
                    let text = format!("{} {}", hit.venue, hit.snippet.as_deref().unwrap_or(""));
                    let affiliation = serpapi::extract_affiliation(&text);
                    set.fold_hit(
                        &hit.title,
                        &hit.authors,
                        &hit.venue,
                        affiliation.as_deref(),
                        &hit.link,
                        hit.citation_count,
                        hit.snippet.as_deref(),
                        &publication.title,
                    );
                }
            }
            println!(
                "Fetched {} citing papers across {} publications",
                all_citing.iter().map(Vec::len).sum::<usize>(),
                publications.len()
            );
            fetched_publications = Some(publications);
        }
        other => anyhow::bail!("Invalid source: {}", other),
    }

    // ===========================================
    // Stage 2: Location Resolution
    // ===========================================
    println!("\n--- Stage 2: Location Resolution ---");
    let unresolved = dataset::add_affiliation_markers(set.papers(), &mut locations);

    if opts.geocode && !unresolved.is_empty() {
        println!("Geocoding {} unresolved affiliations...", unresolved.len());
        let client = match &opts.geocode_cache {
            Some(path) => geocode::GeocodeClient::with_cache_path(path.clone())?,
            None => geocode::GeocodeClient::new()?,
        };
        for (title, affiliation) in &unresolved {
            if let Some(loc) = client.lookup(affiliation).await {
                locations.add_paper_once(
                    loc.latitude,
                    loc.longitude,
                    &loc.country,
                    &loc.city,
                    title,
                    affiliation,
                );
            }
        }
        if let Err(e) = client.save() {
            warn!(error = %e, "Failed to persist geocode cache");
        }
    } else if !unresolved.is_empty() {
        info!(
            count = unresolved.len(),
            "Affiliations without coordinates (pass --geocode to resolve)"
        );
    }

    // ===========================================
    // Stage 3: Aggregation & Emission
    // ===========================================
    println!("\n--- Stage 3: Aggregation ---");
    let summary = set.finish();

    let publications = match fetched_publications {
        // A live fetch is authoritative: it carries real years, venues, and
        // citation counts.
        Some(publications) => publications,
        None if !hints.publications().is_empty() => hints.publications().to_vec(),
        None => dataset::default_publications(&summary.cited_titles),
    };

    let self_citations = summary.self_citations;
    let skipped_rows = summary.skipped_rows;
    let location_list = locations.into_sorted();
    let data = dataset::build_dataset(&opts.scholar_id, summary, publications, location_list);

    dataset::write_json_atomic(&opts.output, &data)?;

    println!("\nSummary:");
    println!("  Publications: {}", data.publications.len());
    println!("  Citing papers (external): {}", data.citing_papers.len());
    println!("  Self-citations filtered: {}", self_citations);
    println!("  Rows skipped: {}", skipped_rows);
    println!("  Locations: {}", data.locations.len());
    println!("\nVenue tiers:");
    println!("  Tier 1: {}", data.stats.tier_distribution.tier1);
    println!("  Tier 2: {}", data.stats.tier_distribution.tier2);
    println!("  Preprints: {}", data.stats.tier_distribution.preprint);
    println!("  Other: {}", data.stats.tier_distribution.other);
    println!("\n✓ Wrote {}", opts.output.display());
    Ok(())
}

// ============================================================================
// Geocode Cache Management
// ============================================================================

fn handle_geocache(action: GeocacheAction) -> Result<()> {
    let path = geocode::default_path()?;
    match action {
        GeocacheAction::Path => {
            println!("Geocode cache: {}", path.display());
        }
        GeocacheAction::Clear => {
            geocode::clear_cache(&path)?;
            println!("Geocode cache cleared.");
        }
    }
    Ok(())
}
