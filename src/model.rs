//! Canonical data model for scraped book listings.
//!
//! The parser produces this shape; both output writers consume it.

use serde::{Deserialize, Serialize};

/// One extracted book entry. Flat and immutable once built.
///
/// `price` and `rating` are kept as the source's text ("£51.77", "4.5") so
/// that output files show exactly what the page showed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    pub price: String,
    pub rating: String,
    /// Source link for the entry, when the listing carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// CSV column order. Fixed so output files stay diffable between runs.
pub const CSV_COLUMNS: [&str; 5] = ["title", "author", "price", "rating", "url"];
