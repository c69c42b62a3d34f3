//! Scrape engine: shared client, listing parser, and the page-walking loop.

mod client;
mod error;

pub mod catalogue;

pub use client::{PoliteClient, PoliteClientBuilder};
pub use error::{FetchError, ParseError, ScrapeError};

use crate::model::BookRecord;
use catalogue::Listing;
use reqwest::Url;

/// How to handle a book entry whose required fields cannot be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedEntryBehavior {
    /// Skip the entry with a warning on stderr (default).
    Skip,
    /// Fail the scrape on the first malformed entry.
    Fail,
}

/// Options for a scrape run. Explicit, passed in per run; never ambient state.
pub struct ScrapeOptions<'a> {
    /// Called after each page with (pages_fetched, records_so_far).
    pub progress: Option<&'a dyn Fn(u32, u32)>,
    /// Stop after this many pages, even if a next link exists.
    pub max_pages: Option<u32>,
    /// Follow the listing's next-page link (default true).
    pub follow_pagination: bool,
    pub malformed: MalformedEntryBehavior,
}

impl Default for ScrapeOptions<'_> {
    fn default() -> Self {
        Self {
            progress: None,
            max_pages: None,
            follow_pagination: true,
            malformed: MalformedEntryBehavior::Skip,
        }
    }
}

/// Scrape a catalogue starting at `url`, following next-page links.
///
/// The first page must fetch and contain entries; a failure there aborts the
/// run. A fetch failure on a later page stops pagination with a warning and
/// keeps what was collected. Malformed entries are handled per
/// [MalformedEntryBehavior].
pub fn scrape_books(
    url: &str,
    client: &mut PoliteClient,
    options: &ScrapeOptions<'_>,
) -> Result<Vec<BookRecord>, ScrapeError> {
    Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        input: url.to_string(),
        reason: e.to_string(),
    })?;

    let mut records: Vec<BookRecord> = Vec::new();
    let mut page_url = url.to_string();
    let mut pages_fetched = 0u32;

    loop {
        let html = match client.fetch_page(&page_url) {
            Ok(body) => body,
            Err(e) if pages_fetched == 0 => return Err(e.into()),
            Err(e) => {
                eprintln!("Page {}: {}. Stopping pagination.", pages_fetched + 1, e);
                break;
            }
        };
        pages_fetched += 1;

        let listing = Listing::parse(&html, Some(&page_url))?;
        if listing.entry_count() == 0 {
            if pages_fetched == 1 {
                return Err(ParseError::NoEntries { url: page_url }.into());
            }
            eprintln!("Page {}: no entries at {}. Stopping.", pages_fetched, page_url);
            break;
        }

        for item in listing.records() {
            match item {
                Ok(record) => records.push(record),
                Err(e) => match options.malformed {
                    MalformedEntryBehavior::Skip => eprintln!("{} Skipped.", e),
                    MalformedEntryBehavior::Fail => return Err(e.into()),
                },
            }
        }

        if let Some(ref p) = options.progress {
            p(pages_fetched, records.len() as u32);
        }

        if !options.follow_pagination {
            break;
        }
        if let Some(max) = options.max_pages {
            if pages_fetched >= max {
                break;
            }
        }
        match listing.next_page() {
            Some(next) => page_url = next,
            None => break,
        }
    }

    if records.is_empty() {
        return Err(ScrapeError::NoRecords);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_skip_malformed_and_follow_pagination() {
        let opts = ScrapeOptions::default();
        assert_eq!(opts.malformed, MalformedEntryBehavior::Skip);
        assert!(opts.follow_pagination);
        assert!(opts.max_pages.is_none());
        assert!(opts.progress.is_none());
    }

    #[test]
    fn invalid_url_errors_before_any_request() -> Result<(), String> {
        let mut client = PoliteClient::new().map_err(|e| e.to_string())?;
        let result = scrape_books("not-a-url", &mut client, &ScrapeOptions::default());
        match result {
            Err(ScrapeError::Fetch(FetchError::InvalidUrl { input, .. }))
                if input == "not-a-url" =>
            {
                Ok(())
            }
            other => Err(format!("expected InvalidUrl, got {:?}", other.err())),
        }
    }

    #[test]
    fn unreachable_url_is_fetch_error() -> Result<(), String> {
        let mut client = PoliteClient::builder()
            .timeout_secs(2)
            .delay_secs(0)
            .build()
            .map_err(|e| e.to_string())?;
        let result = scrape_books("http://127.0.0.1:0/", &mut client, &ScrapeOptions::default());
        match result {
            Err(ScrapeError::Fetch(FetchError::Network { .. })) => Ok(()),
            other => Err(format!("expected Network error, got {:?}", other.err())),
        }
    }
}
