//! Static affiliation-to-coordinate resolution.
//!
//! Affiliation strings are matched against a hand-maintained institution
//! table, then against a country-centroid table. Both tables are priority
//! lists, not maps: entries are tested top to bottom and the first hit wins.
//! Several keys are substrings of others ("massachusetts institute" vs "mit",
//! "mit" in "Cambridge, MA" vs the UK "cambridge"), so the ordering is part
//! of the contract:
//!
//! 1. multi-word institution keys (most specific) come first,
//! 2. then single-token institution and company keys,
//! 3. then city-level keys,
//! 4. the country table is only consulted after the whole institution table
//!    has missed on every segment and on the full string.

/// A resolved map coordinate with its country and city labels.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    pub city: String,
}

struct GeoEntry {
    key: &'static str,
    lat: f64,
    lng: f64,
    country: &'static str,
    city: &'static str,
}

const fn entry(
    key: &'static str,
    lat: f64,
    lng: f64,
    country: &'static str,
    city: &'static str,
) -> GeoEntry {
    GeoEntry {
        key,
        lat,
        lng,
        country,
        city,
    }
}

/// Institution keyword table, in match priority order (see module docs).
const INSTITUTION_COORDS: &[GeoEntry] = &[
    // Multi-word keys first: these are substr-specific enough to win outright.
    entry("massachusetts institute", 42.3601, -71.0942, "United States", "Cambridge"),
    entry("carnegie mellon", 40.4432, -79.9428, "United States", "Pittsburgh"),
    entry("georgia institute", 33.7756, -84.3963, "United States", "Atlanta"),
    entry("georgia tech", 33.7756, -84.3963, "United States", "Atlanta"),
    entry("virginia tech", 37.2296, -80.4139, "United States", "Blacksburg"),
    entry("ut austin", 30.2849, -97.7341, "United States", "Austin"),
    entry("penn state", 40.7982, -77.8599, "United States", "State College"),
    entry("ohio state", 40.0067, -83.0305, "United States", "Columbus"),
    entry("north carolina", 35.9049, -79.0469, "United States", "Chapel Hill"),
    entry("eth zurich", 47.3769, 8.5417, "Switzerland", "Zurich"),
    entry("tu munich", 48.1497, 11.5679, "Germany", "Munich"),
    entry("rwth aachen", 50.7785, 6.0597, "Germany", "Aachen"),
    entry("tu berlin", 52.5125, 13.3269, "Germany", "Berlin"),
    entry("science and technology of china", 31.8205, 117.2272, "China", "Hefei"),
    entry("shanghai jiao", 31.0284, 121.4374, "China", "Shanghai"),
    entry("xian jiaotong", 34.3416, 108.9398, "China", "Xi'an"),
    entry("chinese academy", 39.9775, 116.3298, "China", "Beijing"),
    entry("chinese university", 22.4196, 114.2068, "Hong Kong", "Hong Kong"),
    entry("hong kong", 22.2830, 114.1370, "Hong Kong", "Hong Kong"),
    entry("sun yat-sen", 23.0967, 113.2847, "China", "Guangzhou"),
    entry("national university of singapore", 1.2966, 103.7764, "Singapore", "Singapore"),
    entry("ntu singapore", 1.3483, 103.6831, "Singapore", "Singapore"),
    entry("seoul national", 37.4596, 126.9520, "South Korea", "Seoul"),
    entry("indian institute", 28.5447, 77.1929, "India", "Delhi"),
    entry("tel aviv", 32.1133, 34.8044, "Israel", "Tel Aviv"),
    entry("ben-gurion", 31.2623, 34.8013, "Israel", "Beer Sheva"),
    entry("ben gurion", 31.2623, 34.8013, "Israel", "Beer Sheva"),
    entry("ege university", 38.4567, 27.2261, "Turkey", "Izmir"),
    entry("san jose", 37.3387, -121.8853, "United States", "San Jose"),
    entry("san francisco", 37.7749, -122.4194, "United States", "San Francisco"),
    // Single-token university and company keys. "mit" is listed before
    // "cambridge" so that "MIT, Cambridge, MA" resolves to the US campus
    // rather than the UK city.
    entry("mit", 42.3601, -71.0942, "United States", "Cambridge"),
    entry("stanford", 37.4275, -122.1697, "United States", "Stanford"),
    entry("berkeley", 37.8719, -122.2585, "United States", "Berkeley"),
    entry("harvard", 42.3770, -71.1167, "United States", "Cambridge"),
    entry("princeton", 40.3431, -74.6551, "United States", "Princeton"),
    entry("cornell", 42.4534, -76.4735, "United States", "Ithaca"),
    entry("purdue", 40.4237, -86.9212, "United States", "West Lafayette"),
    entry("michigan", 42.2780, -83.7382, "United States", "Ann Arbor"),
    entry("uiuc", 40.1020, -88.2272, "United States", "Urbana"),
    entry("illinois", 40.1020, -88.2272, "United States", "Urbana"),
    entry("ucla", 34.0689, -118.4452, "United States", "Los Angeles"),
    entry("usc", 34.0224, -118.2851, "United States", "Los Angeles"),
    entry("unc", 35.9049, -79.0469, "United States", "Chapel Hill"),
    entry("washington", 47.6553, -122.3035, "United States", "Seattle"),
    entry("columbia", 40.8075, -73.9626, "United States", "New York"),
    entry("nyu", 40.7295, -73.9965, "United States", "New York"),
    entry("cisco", 37.4089, -121.9495, "United States", "San Jose"),
    entry("google", 37.4220, -122.0841, "United States", "Mountain View"),
    entry("microsoft", 47.6740, -122.1215, "United States", "Redmond"),
    entry("apple", 37.3349, -122.0090, "United States", "Cupertino"),
    entry("amazon", 47.6062, -122.3321, "United States", "Seattle"),
    entry("meta", 37.4850, -122.1469, "United States", "Menlo Park"),
    entry("facebook", 37.4850, -122.1469, "United States", "Menlo Park"),
    entry("owasp", 40.7128, -74.0060, "United States", "New York"),
    entry("oxford", 51.7548, -1.2544, "United Kingdom", "Oxford"),
    entry("cambridge", 52.2043, 0.1218, "United Kingdom", "Cambridge"),
    entry("imperial", 51.4988, -0.1749, "United Kingdom", "London"),
    entry("ucl", 51.5246, -0.1340, "United Kingdom", "London"),
    entry("edinburgh", 55.9445, -3.1892, "United Kingdom", "Edinburgh"),
    entry("manchester", 53.4668, -2.2339, "United Kingdom", "Manchester"),
    entry("bristol", 51.4584, -2.6030, "United Kingdom", "Bristol"),
    entry("epfl", 46.5197, 6.5668, "Switzerland", "Lausanne"),
    entry("cern", 46.2330, 6.0557, "Switzerland", "Geneva"),
    entry("kit", 49.0094, 8.4108, "Germany", "Karlsruhe"),
    entry("sap", 49.2937, 8.6433, "Germany", "Walldorf"),
    entry("sorbonne", 48.8462, 2.3464, "France", "Paris"),
    entry("inria", 48.8422, 2.2656, "France", "Paris"),
    entry("delft", 52.0116, 4.3571, "Netherlands", "Delft"),
    entry("amsterdam", 52.3556, 4.9556, "Netherlands", "Amsterdam"),
    entry("tsinghua", 40.0015, 116.3264, "China", "Beijing"),
    entry("peking", 39.9869, 116.3059, "China", "Beijing"),
    entry("fudan", 31.2990, 121.5000, "China", "Shanghai"),
    entry("zhejiang", 30.2616, 120.1195, "China", "Hangzhou"),
    entry("nanjing", 32.1194, 118.9589, "China", "Nanjing"),
    entry("ustc", 31.8205, 117.2272, "China", "Hefei"),
    entry("wuhan", 30.5364, 114.3577, "China", "Wuhan"),
    entry("xi'an", 34.3416, 108.9398, "China", "Xi'an"),
    entry("xian", 34.3416, 108.9398, "China", "Xi'an"),
    entry("tokyo", 35.7128, 139.7620, "Japan", "Tokyo"),
    entry("kyoto", 35.0274, 135.7817, "Japan", "Kyoto"),
    entry("kaist", 36.3701, 127.3604, "South Korea", "Daejeon"),
    entry("nus", 1.2966, 103.7764, "Singapore", "Singapore"),
    entry("nanyang", 1.3483, 103.6831, "Singapore", "Singapore"),
    entry("iisc", 13.0219, 77.5671, "India", "Bangalore"),
    entry("iit", 19.1334, 72.9133, "India", "Mumbai"),
    entry("melbourne", -37.7983, 144.9610, "Australia", "Melbourne"),
    entry("sydney", -33.8888, 151.1872, "Australia", "Sydney"),
    entry("unsw", -33.9173, 151.2313, "Australia", "Sydney"),
    entry("anu", -35.2777, 149.1185, "Australia", "Canberra"),
    entry("monash", -37.9105, 145.1363, "Australia", "Melbourne"),
    entry("technion", 32.7775, 35.0217, "Israel", "Haifa"),
    entry("kaust", 22.3097, 39.1036, "Saudi Arabia", "Thuwal"),
    entry("toronto", 43.6629, -79.3957, "Canada", "Toronto"),
    entry("waterloo", 43.4723, -80.5449, "Canada", "Waterloo"),
    entry("mcgill", 45.5049, -73.5772, "Canada", "Montreal"),
    entry("dublin", 53.3498, -6.2603, "Ireland", "Dublin"),
    entry("athens", 37.9838, 23.7275, "Greece", "Athens"),
    entry("kampala", 0.3476, 32.5825, "Uganda", "Kampala"),
    entry("jos", 9.8965, 8.8583, "Nigeria", "Jos"),
    entry("kiev", 50.4501, 30.5234, "Ukraine", "Kyiv"),
];

/// Country-centroid fallback table, only consulted after every institution
/// key has missed.
const COUNTRY_COORDS: &[GeoEntry] = &[
    entry("united states", 39.8283, -98.5795, "United States", ""),
    entry("united kingdom", 55.3781, -3.4360, "United Kingdom", ""),
    entry("south korea", 35.9078, 127.7669, "South Korea", ""),
    entry("usa", 39.8283, -98.5795, "United States", ""),
    entry("india", 20.5937, 78.9629, "India", ""),
    entry("china", 35.8617, 104.1954, "China", ""),
    entry("germany", 51.1657, 10.4515, "Germany", ""),
    entry("france", 46.2276, 2.2137, "France", ""),
    entry("canada", 56.1304, -106.3468, "Canada", ""),
    entry("australia", -25.2744, 133.7751, "Australia", ""),
    entry("japan", 36.2048, 138.2529, "Japan", ""),
    entry("korea", 35.9078, 127.7669, "South Korea", ""),
    entry("brazil", -14.2350, -51.9253, "Brazil", ""),
    entry("russia", 61.5240, 105.3188, "Russia", ""),
    entry("singapore", 1.3521, 103.8198, "Singapore", ""),
    entry("israel", 31.0461, 34.8516, "Israel", ""),
    entry("switzerland", 46.8182, 8.2275, "Switzerland", ""),
    entry("netherlands", 52.1326, 5.2913, "Netherlands", ""),
    entry("spain", 40.4637, -3.7492, "Spain", ""),
    entry("italy", 41.8719, 12.5674, "Italy", ""),
    entry("ireland", 53.3498, -6.2603, "Ireland", ""),
    entry("greece", 37.9838, 23.7275, "Greece", ""),
    entry("uganda", 0.3476, 32.5825, "Uganda", ""),
    entry("nigeria", 6.5244, 3.3792, "Nigeria", ""),
    entry("uk", 55.3781, -3.4360, "United Kingdom", ""),
    entry("us", 39.8283, -98.5795, "United States", ""),
];

/// Countries known to be geocoding noise in the upstream CSV export.
const EXCLUDED_COUNTRIES: &[&str] = &["Papua New Guinea", "Mali"];

/// Returns true for countries on the geocoding-noise exclusion list.
pub fn is_noise_country(country: &str) -> bool {
    EXCLUDED_COUNTRIES.contains(&country)
}

/// Normalize common country-name abbreviations to their display form.
pub fn normalize_country(country: &str) -> String {
    match country.trim() {
        "USA" | "US" => "United States".to_string(),
        "UK" => "United Kingdom".to_string(),
        other => other.to_string(),
    }
}

/// Resolve an affiliation string to a coordinate.
///
/// Each comma/pipe/semicolon-separated segment, then the whole string, is
/// tested against the institution table; the country table is a final
/// fallback. Returns None when nothing matches — the record is still counted
/// elsewhere, it just contributes no map marker.
pub fn resolve(affiliation: &str) -> Option<ResolvedLocation> {
    if affiliation.trim().is_empty() {
        return None;
    }
    let lower = affiliation.to_lowercase();
    let segments: Vec<&str> = lower
        .split(['|', ',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    for table in [INSTITUTION_COORDS, COUNTRY_COORDS] {
        for segment in segments.iter().copied().chain(std::iter::once(lower.as_str())) {
            if let Some(found) = lookup(table, segment) {
                return Some(found);
            }
        }
    }
    None
}

fn lookup(table: &[GeoEntry], text: &str) -> Option<ResolvedLocation> {
    table
        .iter()
        .find(|e| text.contains(e.key))
        .map(|e| ResolvedLocation {
            latitude: e.lat,
            longitude: e.lng,
            country: e.country.to_string(),
            city: e.city.to_string(),
        })
}
