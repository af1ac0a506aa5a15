//! CitationMap CSV ingestion.
//!
//! Reads the CSV export produced by the CitationMap tool. Columns are
//! header-driven; only `citing paper title` is required per row, everything
//! else degrades to empty. The export reuses the affiliation column for
//! internal category labels on some rows, so those placeholder values are
//! treated as no affiliation at all.

use crate::error::{CitemapError, Result};
use crate::model::CitationRecord;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Placeholder category labels the upstream tool writes into the
/// affiliation column.
const AFFILIATION_PLACEHOLDERS: &[&str] = &[
    "AI_ML",
    "GENAI",
    "Security",
    "No_author_info",
    "No_author_found",
];

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "citing author name", default)]
    author: String,
    #[serde(rename = "citing paper title", default)]
    citing_title: String,
    #[serde(rename = "cited paper title", default)]
    cited_title: String,
    #[serde(default)]
    affiliation: String,
    #[serde(default)]
    latitude: String,
    #[serde(default)]
    longitude: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    city: String,
}

/// Load citation records from a CitationMap CSV file.
pub fn load_records(path: &Path) -> Result<Vec<CitationRecord>> {
    if !path.exists() {
        return Err(CitemapError::Config(format!(
            "CSV file not found: {}",
            path.display()
        )));
    }
    let file = std::fs::File::open(path)?;
    let records = parse_reader(file)?;
    info!(path = %path.display(), rows = records.len(), "Loaded CitationMap CSV");
    Ok(records)
}

/// Parse citation records from any CSV reader.
pub fn parse_reader<R: Read>(reader: R) -> Result<Vec<CitationRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in rdr.deserialize::<CsvRow>() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "Skipping malformed CSV row");
                continue;
            }
        };
        records.push(to_record(row));
    }
    Ok(records)
}

fn to_record(row: CsvRow) -> CitationRecord {
    let affiliation = clean_affiliation(&row.affiliation);
    let coordinate = parse_coordinate(&row.latitude, &row.longitude);
    if coordinate.is_none() && !(row.latitude.is_empty() && row.longitude.is_empty()) {
        debug!(
            title = %row.citing_title,
            lat = %row.latitude,
            lng = %row.longitude,
            "Unparseable coordinate"
        );
    }

    CitationRecord {
        author: row.author.trim().to_string(),
        citing_title: row.citing_title.trim().to_string(),
        cited_title: row.cited_title.trim().to_string(),
        affiliation,
        coordinate,
        country: row.country.trim().to_string(),
        city: row.city.trim().to_string(),
    }
}

fn clean_affiliation(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || AFFILIATION_PLACEHOLDERS.contains(&trimmed) {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// A coordinate requires both fields to parse and be nonzero; the upstream
/// export writes 0/0 for failed geocodes.
fn parse_coordinate(lat: &str, lng: &str) -> Option<(f64, f64)> {
    let lat: f64 = lat.trim().parse().ok()?;
    let lng: f64 = lng.trim().parse().ok()?;
    if lat == 0.0 || lng == 0.0 {
        return None;
    }
    Some((lat, lng))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
citing paper title,citing author name,cited paper title,affiliation,latitude,longitude,country,city
Paper A,Jane Doe,Pub X,Stanford University,37.4275,-122.1697,United States,Stanford
Paper A,John Roe,Pub X,MIT,,,,
Paper B,Vineeth Sai Narajala,Pub Y,,,,United States,
";

    #[test]
    fn test_parse_rows() {
        let records = parse_reader(SAMPLE.as_bytes()).expect("parse");
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].citing_title, "Paper A");
        assert_eq!(records[0].coordinate, Some((37.4275, -122.1697)));
        assert_eq!(records[0].country, "United States");
        assert_eq!(records[1].affiliation, "MIT");
        assert_eq!(records[1].coordinate, None);
    }

    #[test]
    fn test_placeholder_affiliations_blanked() {
        let csv = "\
citing paper title,citing author name,cited paper title,affiliation
Paper A,Jane Doe,Pub X,AI_ML
Paper B,John Roe,Pub X,No_author_found
";
        let records = parse_reader(csv.as_bytes()).expect("parse");
        assert_eq!(records[0].affiliation, "");
        assert_eq!(records[1].affiliation, "");
    }

    #[test]
    fn test_missing_optional_columns() {
        let csv = "\
citing paper title,citing author name,cited paper title,affiliation
Paper A,Jane Doe,Pub X,TU Wien
";
        let records = parse_reader(csv.as_bytes()).expect("parse");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].coordinate, None);
        assert_eq!(records[0].country, "");
    }

    #[test]
    fn test_zero_coordinate_rejected() {
        assert_eq!(parse_coordinate("0", "0"), None);
        assert_eq!(parse_coordinate("12.5", "0"), None);
        assert_eq!(parse_coordinate("not-a-number", "3.2"), None);
        assert_eq!(parse_coordinate("12.5", "3.2"), Some((12.5, 3.2)));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = load_records(Path::new("/nonexistent/citation_info.csv"))
            .expect_err("should fail");
        assert!(matches!(err, CitemapError::Config(_)));
    }
}
