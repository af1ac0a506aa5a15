//! Affiliation cache ingestion.
//!
//! The citation-mapping tool caches its scrape results as a pickled list of
//! `(author, citing_title, cited_title, affiliation)` tuples. The pickle is
//! decoded into a generic value tree and each tuple's first four elements are
//! read as strings; longer tuples are allowed, shorter ones are skipped.

use crate::error::{CitemapError, Result};
use crate::model::CitationRecord;
use serde_pickle::de::DeOptions;
use serde_pickle::value::Value as PickleValue;
use std::path::Path;
use tracing::{info, warn};

/// Load citation records from a pickled affiliation cache file.
pub fn load_records(path: &Path) -> Result<Vec<CitationRecord>> {
    if !path.exists() {
        return Err(CitemapError::Config(format!(
            "Affiliation cache not found: {}",
            path.display()
        )));
    }
    let bytes = std::fs::read(path)?;
    let records = parse_bytes(&bytes)?;
    info!(path = %path.display(), rows = records.len(), "Loaded affiliation cache");
    Ok(records)
}

/// Decode a pickled tuple list into citation records.
pub fn parse_bytes(bytes: &[u8]) -> Result<Vec<CitationRecord>> {
    let value: PickleValue = serde_pickle::from_slice(bytes, DeOptions::default())?;

    let entries = match value {
        PickleValue::List(entries) | PickleValue::Tuple(entries) => entries,
        other => {
            return Err(CitemapError::Validation(format!(
                "Expected a pickled list of tuples, got {:?}",
                kind(&other)
            )));
        }
    };

    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        let fields = match entry {
            PickleValue::List(fields) | PickleValue::Tuple(fields) => fields,
            _ => {
                warn!("Skipping non-tuple cache entry");
                continue;
            }
        };
        if fields.len() < 4 {
            warn!(len = fields.len(), "Skipping short cache tuple");
            continue;
        }

        let mut it = fields.into_iter();
        let author = text(it.next());
        let citing_title = text(it.next());
        let cited_title = text(it.next());
        let affiliation = {
            // The cache writes the literal string "Unknown" for missing
            // affiliations; normalize to absent.
            let aff = text(it.next());
            if aff == "Unknown" {
                String::new()
            } else {
                aff
            }
        };

        records.push(CitationRecord {
            author,
            citing_title,
            cited_title,
            affiliation,
            ..Default::default()
        });
    }

    Ok(records)
}

fn text(value: Option<PickleValue>) -> String {
    match value {
        Some(PickleValue::String(s)) => s.trim().to_string(),
        Some(PickleValue::Bytes(b)) => String::from_utf8_lossy(&b).trim().to_string(),
        Some(PickleValue::None) | None => String::new(),
        Some(other) => format!("{}", DisplayValue(&other)),
    }
}

fn kind(value: &PickleValue) -> &'static str {
    match value {
        PickleValue::None => "None",
        PickleValue::Bool(_) => "bool",
        PickleValue::I64(_) | PickleValue::Int(_) => "int",
        PickleValue::F64(_) => "float",
        PickleValue::Bytes(_) => "bytes",
        PickleValue::String(_) => "str",
        PickleValue::List(_) => "list",
        PickleValue::Tuple(_) => "tuple",
        PickleValue::Set(_) | PickleValue::FrozenSet(_) => "set",
        PickleValue::Dict(_) => "dict",
    }
}

struct DisplayValue<'a>(&'a PickleValue);

impl std::fmt::Display for DisplayValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            PickleValue::Bool(v) => write!(f, "{}", v),
            PickleValue::I64(v) => write!(f, "{}", v),
            PickleValue::Int(v) => write!(f, "{}", v),
            PickleValue::F64(v) => write!(f, "{}", v),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_pickle::ser::SerOptions;

    fn pickled(tuples: &[(&str, &str, &str, &str)]) -> Vec<u8> {
        serde_pickle::to_vec(&tuples.to_vec(), SerOptions::default()).expect("serialize pickle")
    }

    #[test]
    fn test_parse_tuples() {
        let bytes = pickled(&[
            ("Jane Doe", "Paper A", "Pub X", "Stanford University"),
            ("John Roe", "Paper B", "Pub Y", "Unknown"),
        ]);
        let records = parse_bytes(&bytes).expect("parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].author, "Jane Doe");
        assert_eq!(records[0].citing_title, "Paper A");
        assert_eq!(records[0].affiliation, "Stanford University");
        // "Unknown" normalizes to absent
        assert_eq!(records[1].affiliation, "");
    }

    #[test]
    fn test_short_tuples_skipped() {
        let short: Vec<(&str, &str)> = vec![("Jane Doe", "Paper A")];
        let bytes = serde_pickle::to_vec(&short, SerOptions::default()).expect("serialize");
        let records = parse_bytes(&bytes).expect("parse");
        assert!(records.is_empty());
    }

    #[test]
    fn test_non_list_payload_rejected() {
        let bytes = serde_pickle::to_vec(&42i64, SerOptions::default()).expect("serialize");
        assert!(parse_bytes(&bytes).is_err());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = load_records(Path::new("/nonexistent/cache.pkl")).expect_err("should fail");
        assert!(matches!(err, CitemapError::Config(_)));
    }
}
