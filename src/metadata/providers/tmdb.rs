//! TMDB (The Movie Database) catalog.
//!
//! Implements [`Catalog`] by querying the TMDB v3 REST API. Movies map to
//! `/search/movie` and `/movie/{id}`, series (for episodes) to `/search/tv`
//! and `/tv/{id}`.
//!
//! HTTP outcomes are folded into the two-way [`CatalogError`] taxonomy:
//! 404 is a terminal `NotFound`; 429, 5xx, other 4xx, connection failures,
//! timeouts and undecodable bodies are `Transient`.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use posterwall_common::MediaKind;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::CatalogConfig;
use crate::metadata::catalog::{Catalog, CatalogCandidate, CatalogDetails, CatalogError};

// ---------------------------------------------------------------------------
// TMDB API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieSearchResult {
    id: u64,
    title: Option<String>,
    release_date: Option<String>,
    popularity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TmdbTvSearchResult {
    id: u64,
    name: Option<String>,
    first_air_date: Option<String>,
    popularity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TmdbDetail {
    #[serde(alias = "name")]
    title: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Catalog implementation
// ---------------------------------------------------------------------------

/// TMDB catalog client.
///
/// # Examples
///
/// ```no_run
/// use posterwall::config::CatalogConfig;
/// use posterwall::metadata::providers::TmdbCatalog;
///
/// let catalog = TmdbCatalog::new(&CatalogConfig {
///     api_key: "your-api-key".into(),
///     ..CatalogConfig::default()
/// })?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct TmdbCatalog {
    client: reqwest::Client,
    api_key: String,
    language: String,
    base_url: String,
    image_base_url: String,
}

impl TmdbCatalog {
    /// Build a client from the `[catalog]` config section.
    pub fn new(config: &CatalogConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout() + Duration::from_secs(1))
            .build()
            .context("failed to build TMDB HTTP client")?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            language: config.language.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns `true` when an API key is configured.
    pub fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Build a full API URL with the API key and language query parameters.
    fn url(&self, path: &str, extra_params: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}{path}?api_key={}&language={}",
            self.base_url,
            urlencoded(&self.api_key),
            urlencoded(&self.language)
        );
        for (key, value) in extra_params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoded(value));
        }
        url
    }

    /// GET `url` and decode the JSON body, classifying every failure.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        let resp = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                CatalogError::transient("TMDB request timed out")
            } else {
                CatalogError::transient(format!("TMDB request failed: {e}"))
            }
        })?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::not_found(format!("TMDB returned 404 for {}", redact(url))));
        }
        if !status.is_success() {
            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!("TMDB returned 429, request will be retried");
            }
            return Err(CatalogError::transient(format!("TMDB returned {status}")));
        }

        resp.json::<T>()
            .await
            .map_err(|e| CatalogError::transient(format!("malformed TMDB response: {e}")))
    }

    /// Convert a TMDB image path fragment to a full URL.
    fn image_url(&self, path: &str) -> String {
        format!("{}{path}", self.image_base_url)
    }
}

/// Minimal percent-encoding for query parameter values.
fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0x0f) as usize]));
            }
        }
    }
    out
}

const HEX: [u8; 16] = *b"0123456789ABCDEF";

/// Strip the query string so API keys never reach the logs.
fn redact(url: &str) -> &str {
    url.split_once('?').map(|(path, _)| path).unwrap_or(url)
}

/// Extract a four-digit year from a date string like `"2023-04-15"`.
fn parse_year(date: Option<&str>) -> Option<u16> {
    date.and_then(|d| d.get(..4)).and_then(|y| y.parse::<u16>().ok())
}

#[async_trait]
impl Catalog for TmdbCatalog {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    async fn search(
        &self,
        kind: MediaKind,
        title: &str,
        year: Option<u16>,
    ) -> Result<Vec<CatalogCandidate>, CatalogError> {
        let year_str = year.map(|y| y.to_string());

        if kind == MediaKind::Episode {
            let mut params = vec![("query", title)];
            if let Some(ref y) = year_str {
                params.push(("first_air_date_year", y.as_str()));
            }
            let url = self.url("/search/tv", &params);
            debug!(url = %redact(&url), %title, "TMDB search TV");

            let body: TmdbSearchResponse<TmdbTvSearchResult> = self.get_json(&url).await?;
            return Ok(body
                .results
                .into_iter()
                .map(|r| CatalogCandidate {
                    title: r.name.unwrap_or_default(),
                    year: parse_year(r.first_air_date.as_deref()),
                    popularity: r.popularity.unwrap_or_default(),
                    external_id: r.id.to_string(),
                })
                .collect());
        }

        let mut params = vec![("query", title)];
        if let Some(ref y) = year_str {
            params.push(("year", y.as_str()));
        }
        let url = self.url("/search/movie", &params);
        debug!(url = %redact(&url), %title, "TMDB search movie");

        let body: TmdbSearchResponse<TmdbMovieSearchResult> = self.get_json(&url).await?;
        Ok(body
            .results
            .into_iter()
            .map(|r| CatalogCandidate {
                title: r.title.unwrap_or_default(),
                year: parse_year(r.release_date.as_deref()),
                popularity: r.popularity.unwrap_or_default(),
                external_id: r.id.to_string(),
            })
            .collect())
    }

    async fn details(
        &self,
        kind: MediaKind,
        external_id: &str,
    ) -> Result<CatalogDetails, CatalogError> {
        let path = match kind {
            MediaKind::Episode => format!("/tv/{}", urlencoded(external_id)),
            MediaKind::Movie | MediaKind::Unknown => format!("/movie/{}", urlencoded(external_id)),
        };
        let url = self.url(&path, &[]);
        debug!(url = %redact(&url), "TMDB get details");

        let detail: TmdbDetail = self.get_json(&url).await?;
        Ok(CatalogDetails {
            title: detail.title.unwrap_or_default(),
            poster_url: detail
                .poster_path
                .filter(|p| !p.is_empty())
                .map(|p| self.image_url(&p)),
            synopsis: detail.overview.filter(|s| !s.is_empty()),
        })
    }
}
