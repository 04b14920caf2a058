use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served under `/static` (placeholder poster lives here)
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Mount point of the media share
    #[serde(default = "default_share_root")]
    pub share_root: PathBuf,

    #[serde(default = "default_movies_subpath")]
    pub movies_subpath: String,

    #[serde(default = "default_tv_subpath")]
    pub tv_subpath: String,

    /// Minutes between periodic scans (0 disables the periodic scan)
    #[serde(default = "default_scan_interval")]
    pub scan_interval_minutes: u64,

    /// Number of concurrent metadata resolution workers
    #[serde(default = "default_resolver_concurrency")]
    pub resolver_concurrency: usize,

    /// Where the library index is persisted (in-memory only when unset)
    #[serde(default)]
    pub index_path: Option<PathBuf>,
}

fn default_share_root() -> PathBuf {
    PathBuf::from("/mnt/media")
}

fn default_movies_subpath() -> String {
    "movies".to_string()
}

fn default_tv_subpath() -> String {
    "tv".to_string()
}

fn default_scan_interval() -> u64 {
    30
}

fn default_resolver_concurrency() -> usize {
    4
}

/// Longest accepted periodic scan interval (one week).
pub const MAX_SCAN_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

impl LibraryConfig {
    pub fn movies_root(&self) -> PathBuf {
        self.share_root.join(&self.movies_subpath)
    }

    pub fn tv_root(&self) -> PathBuf {
        self.share_root.join(&self.tv_subpath)
    }

    /// Periodic scan interval, `None` when disabled. Capped at
    /// [`MAX_SCAN_INTERVAL_MINUTES`].
    pub fn scan_interval(&self) -> Option<Duration> {
        (self.scan_interval_minutes > 0).then(|| {
            let minutes = self.scan_interval_minutes.min(MAX_SCAN_INTERVAL_MINUTES);
            Duration::from_secs(minutes.saturating_mul(60))
        })
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            share_root: default_share_root(),
            movies_subpath: default_movies_subpath(),
            tv_subpath: default_tv_subpath(),
            scan_interval_minutes: default_scan_interval(),
            resolver_concurrency: default_resolver_concurrency(),
            index_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// TMDB API key (v3)
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Prefix joined with TMDB `poster_path` values
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,

    /// Minimum spacing between outbound catalog requests
    #[serde(default = "default_min_request_interval")]
    pub min_request_interval_ms: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Guesses below this confidence are never looked up
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Minimum title similarity for a candidate to be accepted
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_min_request_interval() -> u64 {
    250
}

fn default_request_timeout() -> u64 {
    10
}

fn default_confidence_threshold() -> f64 {
    0.5
}

fn default_similarity_threshold() -> f64 {
    0.6
}

impl CatalogConfig {
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: default_language(),
            base_url: default_base_url(),
            image_base_url: default_image_base_url(),
            min_request_interval_ms: default_min_request_interval(),
            request_timeout_secs: default_request_timeout(),
            confidence_threshold: default_confidence_threshold(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    #[serde(default = "default_factor")]
    pub factor: u32,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_base_delay() -> u64 {
    500
}

fn default_factor() -> u32 {
    2
}

fn default_max_attempts() -> u32 {
    3
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay(),
            factor: default_factor(),
            max_attempts: default_max_attempts(),
        }
    }
}
