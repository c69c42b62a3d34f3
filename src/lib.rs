//! bookscrape: CLI scraper for book catalogue listings, outputting CSV or JSON.

pub mod cli;
pub mod config;
pub mod model;
pub mod output;
pub mod scraper;

// Re-exports for CLI and consumers.
pub use model::BookRecord;
pub use output::{write_csv, write_json, write_records, OutputFormat, WriteError};
pub use scraper::{
    scrape_books, FetchError, MalformedEntryBehavior, ParseError, PoliteClient,
    PoliteClientBuilder, ScrapeError, ScrapeOptions,
};
