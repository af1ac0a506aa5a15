//! SerpApi Google Scholar client.
//!
//! Fetches the profile owner's publication list and, per publication, the
//! paginated list of citing papers. Requests use bounded timeouts and retry
//! with exponential backoff; a page that still fails after the last retry is
//! dropped so the run degrades to partial results instead of aborting.

use crate::error::{CitemapError, Result};
use crate::model::Publication;
use futures::future::join_all;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// SerpApi endpoint
const SERPAPI_URL: &str = "https://serpapi.com/search.json";

/// Politeness delay between citation pages
const PAGE_DELAY: Duration = Duration::from_millis(1500);

/// Citing-paper results per page
const PAGE_SIZE: usize = 10;

/// One citing-paper hit from the citation search.
#[derive(Debug, Clone)]
pub struct CitingHit {
    pub title: String,
    pub authors: Vec<String>,
    /// Publication summary line, used as the venue text
    pub venue: String,
    pub link: String,
    pub citation_count: i64,
    pub snippet: Option<String>,
}

/// SerpApi client with retry, backoff, and bounded concurrency.
pub struct SerpApiClient {
    client: reqwest::Client,
    api_key: String,
    semaphore: Arc<Semaphore>,
    max_retries: u32,
    max_pages: usize,
}

impl SerpApiClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - SerpApi key (from `SERPAPI_KEY` or `--api-key`)
    /// * `max_pages` - citation pages fetched per publication
    pub fn new(api_key: String, max_pages: usize) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(CitemapError::Config(
                "SerpApi key is empty; set SERPAPI_KEY or pass --api-key".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .user_agent("citemap/0.1")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CitemapError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            semaphore: Arc::new(Semaphore::new(3)),
            max_retries: 3,
            max_pages,
        })
    }

    /// Fetch the author's publication list.
    pub async fn fetch_publications(&self, scholar_id: &str) -> Result<Vec<Publication>> {
        info!(scholar_id = scholar_id, "Fetching author publications");

        let response: AuthorResponse = self
            .get_json(&[
                ("engine", "google_scholar_author"),
                ("author_id", scholar_id),
            ])
            .await?;

        if let Some(error) = response.error {
            return Err(CitemapError::Api {
                code: 0,
                message: error,
            });
        }

        let current_year = chrono::Utc::now().format("%Y").to_string();
        let publications = response
            .articles
            .into_iter()
            .map(|a| {
                let cited_by = a.cited_by.unwrap_or_default();
                Publication {
                    title: a.title,
                    authors: split_authors(&a.authors),
                    year: a
                        .year
                        .trim()
                        .parse()
                        .or_else(|_| current_year.parse())
                        .unwrap_or(2024),
                    venue: if a.publication.is_empty() {
                        "Unknown".to_string()
                    } else {
                        a.publication
                    },
                    link: a.link,
                    citation_count: cited_by.value,
                    cites_id: Some(cited_by.cites_id).filter(|id| !id.is_empty()),
                }
            })
            .collect::<Vec<_>>();

        info!(count = publications.len(), "Fetched publications");
        Ok(publications)
    }

    /// Fetch citing papers for every publication, concurrently.
    ///
    /// Publications fetch behind a semaphore but results are returned in
    /// publication order, so downstream folding stays deterministic.
    pub async fn fetch_all_citing(&self, publications: &[Publication]) -> Vec<Vec<CitingHit>> {
        let futures: Vec<_> = publications
            .iter()
            .map(|publication| async move {
                match &publication.cites_id {
                    Some(cites_id) => {
                        let _permit = match self.semaphore.acquire().await {
                            Ok(permit) => permit,
                            Err(_) => return Vec::new(),
                        };
                        self.fetch_citing_papers(cites_id, &publication.title).await
                    }
                    None => {
                        debug!(title = %publication.title, "No cites id, skipping");
                        Vec::new()
                    }
                }
            })
            .collect();

        join_all(futures).await
    }

    /// Fetch the paginated citing-paper list for one publication.
    ///
    /// A failed page ends pagination for this publication; pages already
    /// fetched are kept.
    pub async fn fetch_citing_papers(&self, cites_id: &str, cited_title: &str) -> Vec<CitingHit> {
        // Multiple comma-separated cites ids resolve to the same cluster;
        // the first one is enough.
        let cites_id = cites_id.split(',').next().unwrap_or(cites_id).trim();

        let mut hits = Vec::new();
        for page in 0..self.max_pages {
            let start = (page * PAGE_SIZE).to_string();
            let response: std::result::Result<CiteResponse, CitemapError> = self
                .get_json(&[
                    ("engine", "google_scholar"),
                    ("cites", cites_id),
                    ("start", &start),
                ])
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    warn!(cites_id = cites_id, page = page, error = %e, "Dropping citation page");
                    break;
                }
            };

            if response.organic_results.is_empty() {
                break;
            }

            for result in response.organic_results {
                let info = result.publication_info.unwrap_or_default();
                hits.push(CitingHit {
                    title: result.title,
                    authors: info.authors.into_iter().map(|a| a.name).collect(),
                    venue: if info.summary.is_empty() {
                        "Unknown".to_string()
                    } else {
                        info.summary
                    },
                    link: result.link,
                    citation_count: result
                        .inline_links
                        .and_then(|l| l.cited_by)
                        .map(|c| c.total)
                        .unwrap_or(0),
                    snippet: Some(result.snippet).filter(|s| !s.is_empty()),
                });
            }

            let has_next = response
                .pagination
                .map(|p| p.next.is_some())
                .unwrap_or(false);
            if !has_next {
                break;
            }
            tokio::time::sleep(PAGE_DELAY).await;
        }

        debug!(
            cited = cited_title,
            count = hits.len(),
            "Fetched citing papers"
        );
        hits
    }

    /// GET with retry and exponential backoff plus jitter.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T> {
        let mut backoff = Duration::from_millis(500);
        let mut last_err = CitemapError::Config("No attempts made".to_string());

        for attempt in 0..self.max_retries {
            match self.do_get(params).await {
                Ok(value) => return Ok(value),
                Err(CitemapError::RateLimited(secs)) => {
                    let wait = Duration::from_secs(secs).max(backoff);
                    warn!(
                        attempt = attempt + 1,
                        wait_secs = wait.as_secs(),
                        "Rate limited, waiting"
                    );
                    tokio::time::sleep(wait).await;
                    backoff *= 2;
                    last_err = CitemapError::RateLimited(secs);
                }
                Err(e) => {
                    debug!(attempt = attempt + 1, error = %e, "Request failed");
                    last_err = e;
                    if attempt < self.max_retries - 1 {
                        let jitter = Duration::from_millis(rand::random::<u64>() % 250);
                        tokio::time::sleep(backoff + jitter).await;
                        backoff *= 2;
                    }
                }
            }
        }

        Err(last_err)
    }

    async fn do_get<T: serde::de::DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T> {
        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("api_key", self.api_key.as_str()));

        let response = self.client.get(SERPAPI_URL).query(&query).send().await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CitemapError::RateLimited(5));
        }
        if !response.status().is_success() {
            return Err(CitemapError::Api {
                code: response.status().as_u16() as i32,
                message: format!("SerpApi HTTP error: {}", response.status()),
            });
        }

        Ok(response.json().await?)
    }
}

/// Best-effort institution extraction from a hit's venue summary and snippet.
///
/// SerpApi citation results carry no affiliation field; an institution name
/// mentioned in the summary text is the only signal available.
pub fn extract_affiliation(text: &str) -> Option<String> {
    static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let re = RE.get_or_init(|| {
        regex::Regex::new(
            r"([A-Z][a-z]+(?:\s+(?:of\s+)?[A-Z][a-z]+)*\s+(?:University|Institute|College|Lab)[^,\-]*)",
        )
        .expect("Static affiliation regex")
    });
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn split_authors(authors: &str) -> Vec<String> {
    authors
        .split(',')
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect()
}

// === SerpApi Response Types ===

#[derive(Debug, Deserialize)]
struct AuthorResponse {
    #[serde(default)]
    articles: Vec<AuthorArticle>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthorArticle {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    authors: String,
    #[serde(default)]
    publication: String,
    #[serde(default)]
    year: String,
    #[serde(default)]
    cited_by: Option<ArticleCitedBy>,
}

#[derive(Debug, Default, Deserialize)]
struct ArticleCitedBy {
    #[serde(default)]
    value: i64,
    #[serde(default)]
    cites_id: String,
}

#[derive(Debug, Deserialize)]
struct CiteResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    publication_info: Option<PublicationInfo>,
    #[serde(default)]
    inline_links: Option<InlineLinks>,
}

#[derive(Debug, Default, Deserialize)]
struct PublicationInfo {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    authors: Vec<CiteAuthor>,
}

#[derive(Debug, Deserialize)]
struct CiteAuthor {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct InlineLinks {
    #[serde(default)]
    cited_by: Option<CitedByTotal>,
}

#[derive(Debug, Deserialize)]
struct CitedByTotal {
    #[serde(default)]
    total: i64,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    next: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_rejected() {
        assert!(SerpApiClient::new("  ".to_string(), 5).is_err());
        assert!(SerpApiClient::new("key".to_string(), 5).is_ok());
    }

    #[test]
    fn test_extract_affiliation() {
        assert_eq!(
            extract_affiliation("J Doe - Tsinghua University, Beijing - 2024"),
            Some("Tsinghua University".to_string())
        );
        assert_eq!(extract_affiliation("J Doe - Journal of Things - 2024"), None);
    }

    #[test]
    fn test_split_authors() {
        assert_eq!(
            split_authors("J Doe, R Roe,  V Smith"),
            vec!["J Doe", "R Roe", "V Smith"]
        );
        assert!(split_authors("").is_empty());
    }

    #[test]
    fn test_parse_author_response() {
        let json = r#"{
            "articles": [{
                "title": "Paper X",
                "link": "https://example.org/x",
                "authors": "J Doe, R Roe",
                "publication": "IEEE Access, 2023",
                "year": "2023",
                "cited_by": {"value": 12, "cites_id": "123456"}
            }]
        }"#;
        let parsed: AuthorResponse = serde_json::from_str(json).expect("parse");
        assert_eq!(parsed.articles.len(), 1);
        let article = &parsed.articles[0];
        assert_eq!(article.title, "Paper X");
        assert_eq!(article.cited_by.as_ref().map(|c| c.value), Some(12));
    }

    #[test]
    fn test_parse_cite_response() {
        let json = r#"{
            "organic_results": [{
                "title": "Citing Paper",
                "link": "https://example.org/c",
                "snippet": "uses Paper X for...",
                "publication_info": {
                    "summary": "C Author - Journal of Things, 2024",
                    "authors": [{"name": "C Author"}]
                },
                "inline_links": {"cited_by": {"total": 4}}
            }],
            "pagination": {"next": "https://serpapi.com/..."}
        }"#;
        let parsed: CiteResponse = serde_json::from_str(json).expect("parse");
        assert_eq!(parsed.organic_results.len(), 1);
        let hit = &parsed.organic_results[0];
        assert_eq!(hit.title, "Citing Paper");
        assert_eq!(
            hit.inline_links.as_ref().and_then(|l| l.cited_by.as_ref()).map(|c| c.total),
            Some(4)
        );
        assert!(parsed.pagination.as_ref().and_then(|p| p.next.as_ref()).is_some());
    }

    #[test]
    fn test_missing_fields_default() {
        let json = r#"{"organic_results": [{"title": "Bare"}]}"#;
        let parsed: CiteResponse = serde_json::from_str(json).expect("parse");
        let hit = &parsed.organic_results[0];
        assert!(hit.publication_info.is_none());
        assert!(hit.link.is_empty());
    }
}
