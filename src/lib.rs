//! dtc-harvest: a patient harvester of diagnostic trouble code definitions
//!
//! This crate crawls a paginated, bot-defended DTC reference site one
//! manufacturer namespace at a time, turns every detail page into a typed
//! record and streams the records to durable sinks as they are produced.

pub mod codec;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod fetcher;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Failed to start transport session: {0}")]
    Transport(String),

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::HarvestPhase,
        to: state::HarvestPhase,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use codec::{fault_meaning, to_canonical_triplet, CanonicalTriplet, Code};
pub use config::Config;
pub use crawler::{Discovery, Frontier, HarvestOptions, HarvestSummary, Harvester};
pub use extract::{Chunk, Section, TableData};
pub use fetcher::{Fetcher, FetchError};
pub use output::{DetailRecord, ErrorRecord, HarvestRecord, OutputSink};
pub use state::HarvestPhase;
pub use url::normalize_url;
