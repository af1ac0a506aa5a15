//! Best-effort external geocoding via OpenStreetMap Nominatim.
//!
//! Only used behind the `--geocode` flag, as a last resort after the static
//! tables in [`crate::geo`] have missed. Lookups fail soft: a timeout, a
//! service error, or an unparseable response all resolve to None and the run
//! continues. Results (including misses) persist in a JSON cache file so
//! repeat runs do not re-query the service.

use crate::error::{CitemapError, Result};
use crate::geo::ResolvedLocation;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Nominatim search endpoint
const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Nominatim requires an identifying user agent
const USER_AGENT: &str = "citemap/0.1 (personal citation dashboard)";

/// Nominatim usage policy allows at most one request per second
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(1100);

/// Default cache file: `~/.citemap_geocode_cache.json`
fn default_cache_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(".citemap_geocode_cache.json"))
        .ok_or_else(|| CitemapError::Config("Cannot determine home directory".to_string()))
}

/// Cached coordinate entry; None records a confirmed miss.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedLocation {
    lat: f64,
    lng: f64,
    country: String,
    #[serde(default)]
    city: String,
}

/// Nominatim client with a persistent text-to-coordinate cache.
pub struct GeocodeClient {
    client: reqwest::Client,
    cache: Mutex<HashMap<String, Option<CachedLocation>>>,
    cache_path: PathBuf,
    last_request: Mutex<Option<Instant>>,
}

impl GeocodeClient {
    /// Client with the default cache path.
    pub fn new() -> Result<Self> {
        Self::with_cache_path(default_cache_path()?)
    }

    /// Client with a custom cache path.
    pub fn with_cache_path(cache_path: PathBuf) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CitemapError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            cache: Mutex::new(load_cache(&cache_path)),
            cache_path,
            last_request: Mutex::new(None),
        })
    }

    /// Path of the cache file.
    pub fn cache_path(&self) -> &PathBuf {
        &self.cache_path
    }

    /// Geocode an affiliation string.
    ///
    /// Never returns an error: misses, timeouts, and service failures all
    /// yield None.
    pub async fn lookup(&self, affiliation: &str) -> Option<ResolvedLocation> {
        let affiliation = affiliation.trim();
        if affiliation.is_empty() {
            return None;
        }

        {
            let cache = self.cache.lock().ok()?;
            if let Some(cached) = cache.get(affiliation) {
                debug!(affiliation = affiliation, "Geocode cache hit");
                return cached.clone().map(into_resolved);
            }
        }

        self.wait_for_rate_limit().await;
        let result = self.do_request(affiliation).await;

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(affiliation.to_string(), result.clone());
        }

        result.map(into_resolved)
    }

    /// Persist the cache to disk.
    pub fn save(&self) -> Result<()> {
        let cache = self
            .cache
            .lock()
            .map_err(|_| CitemapError::Config("Geocode cache lock poisoned".to_string()))?;
        let content = serde_json::to_string_pretty(&*cache)?;
        std::fs::write(&self.cache_path, content)?;
        info!(entries = cache.len(), path = %self.cache_path.display(), "Saved geocode cache");
        Ok(())
    }

    async fn wait_for_rate_limit(&self) {
        let should_wait = {
            let last = self.last_request.lock().ok();
            last.and_then(|l| *l).map(|t| t.elapsed() < MIN_REQUEST_INTERVAL)
        };

        if should_wait == Some(true) {
            tokio::time::sleep(MIN_REQUEST_INTERVAL).await;
        }

        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(Instant::now());
        }
    }

    async fn do_request(&self, affiliation: &str) -> Option<CachedLocation> {
        let query = clean_affiliation(affiliation);
        debug!(query = %query, "Querying Nominatim");

        let response = self
            .client
            .get(NOMINATIM_URL)
            .query(&[
                ("q", query.as_str()),
                ("format", "json"),
                ("limit", "1"),
                ("addressdetails", "1"),
            ])
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            warn!(
                status = response.status().as_u16(),
                "Nominatim request failed"
            );
            return None;
        }

        let places: Vec<NominatimPlace> = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Failed to parse Nominatim response");
                return None;
            }
        };

        let place = places.into_iter().next()?;
        let lat: f64 = place.lat.parse().ok()?;
        let lng: f64 = place.lon.parse().ok()?;
        let address = place.address.unwrap_or_default();

        Some(CachedLocation {
            lat,
            lng,
            country: address.country.unwrap_or_else(|| "Unknown".to_string()),
            city: address
                .city
                .or(address.town)
                .or(address.village)
                .unwrap_or_default(),
        })
    }
}

fn into_resolved(cached: CachedLocation) -> ResolvedLocation {
    ResolvedLocation {
        latitude: cached.lat,
        longitude: cached.lng,
        country: cached.country,
        city: cached.city,
    }
}

fn load_cache(path: &PathBuf) -> HashMap<String, Option<CachedLocation>> {
    if !path.exists() {
        return HashMap::new();
    }
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(cache) => cache,
            Err(e) => {
                warn!(error = %e, "Failed to parse geocode cache, starting fresh");
                HashMap::new()
            }
        },
        Err(e) => {
            warn!(error = %e, "Failed to read geocode cache");
            HashMap::new()
        }
    }
}

/// Strip characters Nominatim chokes on, keeping word/space/punct basics.
fn clean_affiliation(affiliation: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"[^\w\s,.\-]").expect("Static cleanup regex"));
    re.replace_all(affiliation, "").trim().to_string()
}

/// Remove the cache file.
pub fn clear_cache(path: &PathBuf) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
        info!(path = %path.display(), "Cleared geocode cache");
    }
    Ok(())
}

/// Resolve the default cache path (for the `geocache` CLI subcommand).
pub fn default_path() -> Result<PathBuf> {
    default_cache_path()
}

// === Nominatim Response Types ===

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    #[serde(default)]
    lat: String,
    #[serde(default)]
    lon: String,
    #[serde(default)]
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    town: Option<String>,
    #[serde(default)]
    village: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_clean_affiliation() {
        assert_eq!(
            clean_affiliation("Dept. of CS (Security), Stanford University!"),
            "Dept. of CS Security, Stanford University"
        );
        assert_eq!(clean_affiliation("  TU Wien  "), "TU Wien");
    }

    #[test]
    fn test_cache_round_trip() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("cache.json");

        let client = GeocodeClient::with_cache_path(path.clone()).expect("client");
        {
            let mut cache = client.cache.lock().expect("lock");
            cache.insert(
                "Stanford University".to_string(),
                Some(CachedLocation {
                    lat: 37.4275,
                    lng: -122.1697,
                    country: "United States".to_string(),
                    city: "Stanford".to_string(),
                }),
            );
            cache.insert("Nowhere".to_string(), None);
        }
        client.save().expect("save");

        let reloaded = GeocodeClient::with_cache_path(path).expect("client");
        let cache = reloaded.cache.lock().expect("lock");
        assert_eq!(cache.len(), 2);
        let hit = cache
            .get("Stanford University")
            .and_then(|c| c.clone())
            .expect("cached entry");
        assert_eq!(hit.country, "United States");
        // Confirmed misses are cached too
        assert!(cache.get("Nowhere").expect("entry").is_none());
    }

    #[test]
    fn test_missing_cache_file_starts_empty() {
        let cache = load_cache(&PathBuf::from("/nonexistent/cache.json"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_parse_nominatim_response() {
        let json = r#"[{
            "lat": "52.2043",
            "lon": "0.1218",
            "address": {"country": "United Kingdom", "city": "Cambridge"}
        }]"#;
        let places: Vec<NominatimPlace> = serde_json::from_str(json).expect("parse");
        assert_eq!(places[0].lat, "52.2043");
        assert_eq!(
            places[0].address.as_ref().and_then(|a| a.country.as_deref()),
            Some("United Kingdom")
        );
    }
}
