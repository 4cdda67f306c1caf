use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Main configuration structure for a harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub harvest: HarvestConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Parsed site base URL; validated on load
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.harvest.base_url)
    }
}

/// What to crawl and how fast
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// Site root, e.g. `https://www.dtcdecode.com`
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Namespace slugs as they appear in the site's URLs (e.g. `Land-Rover`)
    pub namespaces: Vec<String>,

    /// Base delay between requests in seconds; jitter is added on top
    #[serde(default = "default_delay")]
    pub delay: f64,

    /// Optional cap on listing pages crawled per namespace
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<usize>,
}

impl HarvestConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay.max(0.0))
    }
}

/// Transport variant used to fetch pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    /// Plain HTTP client
    #[default]
    Http,
    /// HTTP client presenting a browser-like TLS and header profile
    Stealth,
    /// Headless browser that renders pages
    Browser,
}

/// Transport and identity configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    #[serde(default)]
    pub kind: FetcherKind,

    /// Fixed user agent; disables user-agent rotation
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,

    /// Pre-supplied cookies, `name=value; other=value`
    #[serde(default)]
    pub cookies: Option<String>,

    /// Proxy URL for every request
    #[serde(default)]
    pub proxy: Option<String>,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum attempts per URL
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Run the browser without a window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Ceiling on lazy-load scrolls per page
    #[serde(rename = "max-scrolls", default = "default_max_scrolls")]
    pub max_scrolls: u32,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            kind: FetcherKind::default(),
            user_agent: None,
            cookies: None,
            proxy: None,
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            headless: true,
            max_scrolls: default_max_scrolls(),
        }
    }
}

/// Output format written for every namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Line-delimited JSON plus an aggregate JSON array
    Jsonl,
    /// Wide and long CSV files plus per-code table CSVs
    Csv,
    /// SQLite database
    Sqlite,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving all output files
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    #[serde(default = "default_formats")]
    pub formats: Vec<OutputFormat>,

    /// SQLite database path; defaults to `harvest.db` inside `directory`
    #[serde(rename = "database-path", default)]
    pub database_path: Option<PathBuf>,
}

impl OutputConfig {
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.directory.join("harvest.db"))
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            formats: default_formats(),
            database_path: None,
        }
    }
}

fn default_delay() -> f64 {
    1.4
}

fn default_timeout_secs() -> u64 {
    25
}

fn default_max_attempts() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_max_scrolls() -> u32 {
    8
}

fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_formats() -> Vec<OutputFormat> {
    vec![OutputFormat::Jsonl, OutputFormat::Csv]
}
