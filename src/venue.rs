//! Venue tier classification and influence scoring.
//!
//! Maps whatever venue/title/affiliation text is available for a citing paper
//! to a coarse credibility tier, and converts the tier to a numeric influence
//! score. Classification degrades gracefully: when the venue string is empty
//! the affiliation/title signal still feeds the same patterns.

use crate::error::{CitemapError, Result};
use regex::RegexSet;
use serde::{Deserialize, Serialize};

/// Venue credibility tier, in descending match priority.
///
/// A paper hosted on a preprint server is a preprint regardless of any
/// peer-reviewed-looking wording elsewhere in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Preprint,
    Tier1,
    Tier2,
    Other,
}

impl Tier {
    /// Fixed tier-to-score mapping.
    ///
    /// Preprints score below `Other`: unverified peer review ranks under an
    /// unrecognized venue.
    pub fn score(self) -> u32 {
        match self {
            Tier::Tier1 => 50,
            Tier::Tier2 => 35,
            Tier::Other => 20,
            Tier::Preprint => 10,
        }
    }
}

/// Preprint servers, institutional repositories, theses, and patents.
const PREPRINT_PATTERNS: &[&str] = &[
    r"\barxiv\b",
    r"\bpreprint\b",
    r"\bssrn\b",
    r"\bbiorxiv\b",
    r"\bmedrxiv\b",
    r"\btechrxiv\b",
    r"\bresearchgate\b",
    r"\bresearchsquare\b",
    r"\bf1000research\b",
    r"preprints\.org",
    r"osf\.io",
    r"\bzenodo\b",
    r"\bdigitalcommons\b",
    r"repository\.lib",
    r"\bproquest\b",
    r"\bgoogle patents\b",
    r"\bus patent\b",
    r"\bthesis\b",
    r"\bdissertation\b",
];

/// Top-tier venues and publishers: IEEE/ACM/USENIX, major security, systems,
/// SE/PL, and AI/ML conferences.
const TIER1_PATTERNS: &[&str] = &[
    r"\bieee\b",
    r"\bacm\b",
    r"dl\.acm\.org",
    r"\busenix\b",
    r"\bndss\b",
    r"\bccs\b",
    r"s&p",
    r"\binfocom\b",
    r"\bsecurity\b",
    r"\boakland\b",
    r"\bcrypto\b",
    r"\beurocrypt\b",
    r"\basiacrypt\b",
    r"\bacsac\b",
    r"\besorics\b",
    r"\bwisec\b",
    r"\bisca\b",
    r"\bmicro\b",
    r"\bhpca\b",
    r"\bsigcomm\b",
    r"\bmobicom\b",
    r"\bmobisys\b",
    r"\bmobiarch\b",
    r"\bnsdi\b",
    r"\bsosp\b",
    r"\bosdi\b",
    r"\beurosys\b",
    r"\bpldi\b",
    r"\bpopl\b",
    r"\bicse\b",
    r"\bfse\b",
    r"\base\b",
    r"\bissta\b",
    r"\bsigmod\b",
    r"\bvldb\b",
    r"\bneurips\b",
    r"\bnips\b",
    r"\bicml\b",
    r"\biclr\b",
    r"\bcvpr\b",
    r"\biccv\b",
    r"\beccv\b",
    r"\baaai\b",
    r"\bijcai\b",
];

/// General peer-reviewed indicators: major publishers, journal/conference
/// phrasing, and regional academic databases.
const TIER2_PATTERNS: &[&str] = &[
    r"\bspringer\b",
    r"\belsevier\b",
    r"\bnature\b",
    r"\bscience\b",
    r"\bplos\b",
    r"\bjstor\b",
    r"\bwiley\b",
    r"taylor & francis",
    r"\bmdpi\b",
    r"\bsensors\b",
    r"\belectronics\b",
    r"\bjournal of\b",
    r"\btransactions on\b",
    r"\binternational journal\b",
    r"\bict express\b",
    r"\bconference on\b",
    r"\bsymposium on\b",
    r"\bworkshop on\b",
    r"\bproceedings\b",
    r"ceur-ws",
    r"\bopenreview\b",
    r"\bpubmed\b",
    r"\bncbi\b",
    r"\bdbpia\b",
    r"\bcyberleninka\b",
    r"\bkics\b",
    r"sbc\.org",
    r"cds\.cern\.ch",
    r"books\.google\.com",
];

/// Institutions whose affiliation upgrades an otherwise-unclassified venue.
const PRESTIGIOUS_INSTITUTIONS: &[&str] = &[
    "stanford",
    "mit",
    "massachusetts institute",
    "berkeley",
    "uc berkeley",
    "carnegie mellon",
    "cmu",
    "harvard",
    "princeton",
    "cornell",
    "georgia tech",
    "purdue",
    "oxford",
    "cambridge",
    "eth zurich",
    "tsinghua",
    "peking",
    "zhejiang",
    "national university of singapore",
    "nus",
    "kaist",
    "google",
    "microsoft",
    "meta",
    "deepmind",
    "amazon",
    "nvidia",
    "openai",
    "anthropic",
    "cisco",
    "yale",
    "columbia",
    "ucla",
    "caltech",
    "nyu",
    "johns hopkins",
    "duke",
    "ben-gurion",
    "ben gurion",
    "technion",
    "tel aviv",
    "tokyo",
    "kyoto",
];

/// Venue tier classifier with patterns compiled once at construction.
pub struct VenueClassifier {
    preprint: RegexSet,
    tier1: RegexSet,
    tier2: RegexSet,
}

impl VenueClassifier {
    /// Compile the tier pattern sets.
    pub fn new() -> Result<Self> {
        Ok(Self {
            preprint: compile(PREPRINT_PATTERNS)?,
            tier1: compile(TIER1_PATTERNS)?,
            tier2: compile(TIER2_PATTERNS)?,
        })
    }

    /// Classify a venue/title/affiliation text blob.
    ///
    /// Tie-break is first matching tier in priority order
    /// preprint > tier1 > tier2 > other; no scoring across multiple matches.
    pub fn classify(&self, text: &str) -> Tier {
        let text = text.to_lowercase();
        if text.is_empty() {
            return Tier::Other;
        }
        if self.preprint.is_match(&text) {
            return Tier::Preprint;
        }
        if self.tier1.is_match(&text) {
            return Tier::Tier1;
        }
        if self.tier2.is_match(&text) {
            return Tier::Tier2;
        }
        Tier::Other
    }

    /// Classify, then apply the prestigious-institution upgrade:
    /// `Other` + a recognized institution in the affiliation or venue text
    /// becomes `Tier2`. The upgrade never downgrades and is idempotent.
    pub fn classify_with_upgrade(&self, text: &str, affiliation: &str) -> Tier {
        let tier = self.classify(text);
        if tier == Tier::Other && (is_prestigious(affiliation) || is_prestigious(text)) {
            return Tier::Tier2;
        }
        tier
    }
}

/// Returns true when the text mentions a recognized prestigious institution.
pub fn is_prestigious(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    PRESTIGIOUS_INSTITUTIONS
        .iter()
        .any(|inst| lower.contains(inst))
}

fn compile(patterns: &[&str]) -> Result<RegexSet> {
    RegexSet::new(patterns)
        .map_err(|e| CitemapError::Config(format!("Invalid venue pattern: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> VenueClassifier {
        VenueClassifier::new().expect("compile patterns")
    }

    #[test]
    fn test_tier_scores() {
        assert_eq!(Tier::Tier1.score(), 50);
        assert_eq!(Tier::Tier2.score(), 35);
        assert_eq!(Tier::Other.score(), 20);
        assert_eq!(Tier::Preprint.score(), 10);
    }

    #[test]
    fn test_basic_classification() {
        let c = classifier();
        assert_eq!(c.classify("IEEE Transactions on Networking"), Tier::Tier1);
        assert_eq!(c.classify("Journal of Applied Sciences"), Tier::Tier2);
        assert_eq!(c.classify("arXiv preprint arXiv:2401.01234"), Tier::Preprint);
        assert_eq!(c.classify("Some Obscure Venue"), Tier::Other);
        assert_eq!(c.classify(""), Tier::Other);
    }

    #[test]
    fn test_preprint_takes_precedence_over_tier1() {
        let c = classifier();
        // A paper hosted on arXiv is a preprint even with IEEE wording present
        assert_eq!(
            c.classify("arXiv preprint, submitted to IEEE INFOCOM"),
            Tier::Preprint
        );
    }

    #[test]
    fn test_tier1_takes_precedence_over_tier2() {
        let c = classifier();
        assert_eq!(
            c.classify("IEEE conference proceedings, Springer"),
            Tier::Tier1
        );
        assert_eq!(c.classify("ACM Transactions on Software Engineering"), Tier::Tier1);
    }

    #[test]
    fn test_word_boundaries() {
        let c = classifier();
        // "pieeer" must not match \bieee\b
        assert_eq!(c.classify("pieeer quarterly"), Tier::Other);
        // standalone acronym does
        assert_eq!(c.classify("Proc. of NDSS 2024"), Tier::Tier1);
    }

    #[test]
    fn test_affiliation_signal_when_venue_empty() {
        let c = classifier();
        // No venue available: the affiliation text alone still classifies
        assert_eq!(c.classify("MIT CSAIL, arXiv mirror"), Tier::Preprint);
    }

    #[test]
    fn test_prestigious_upgrade() {
        let c = classifier();
        assert_eq!(
            c.classify_with_upgrade("Unrecognized Venue", "Stanford University"),
            Tier::Tier2
        );
        // Upgrade never downgrades a stronger classification
        assert_eq!(
            c.classify_with_upgrade("IEEE Access", "Stanford University"),
            Tier::Tier1
        );
        // Idempotent: re-running on the upgraded inputs yields the same tier
        assert_eq!(
            c.classify_with_upgrade("Unrecognized Venue", "Stanford University"),
            c.classify_with_upgrade("Unrecognized Venue", "Stanford University"),
        );
    }

    #[test]
    fn test_is_prestigious() {
        assert!(is_prestigious("Dept. of CS, Carnegie Mellon University"));
        assert!(!is_prestigious("University of Nowhere"));
        assert!(!is_prestigious(""));
    }
}
