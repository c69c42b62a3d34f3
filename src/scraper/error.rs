//! Error types for the fetch and parse stages.

use thiserror::Error;

/// Network and HTTP failures from the fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL: {input}: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("Network error: could not reach {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("HTTP {status} when fetching: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to read response body from {url}: {source}")]
    BodyRead { url: String, source: reqwest::Error },
}

/// Structural failures from the listing parser.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("No book entries found at {url} (selector or page structure may have changed).")]
    NoEntries { url: String },

    #[error("Book entry {position} at {url} is missing required field '{field}'.")]
    MissingField {
        field: &'static str,
        /// 1-based position of the entry on its page.
        position: usize,
        url: String,
    },

    #[error("Could not parse listing page: {message}")]
    Selector { message: String },
}

/// Top-level scrape failure: fetch or parse, plus the empty-run case.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("No book records could be extracted (all pages empty or malformed).")]
    NoRecords,
}
