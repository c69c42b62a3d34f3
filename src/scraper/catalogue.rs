//! Catalogue listing parser. One parsed page yields a lazy, one-pass sequence
//! of book records plus the resolved next-page link when the page has one.

use crate::model::BookRecord;
use crate::scraper::error::ParseError;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

/// Parse a CSS selector or return a parse error (avoids panics from Selector::parse).
fn parse_selector(sel: &str) -> Result<Selector, ParseError> {
    Selector::parse(sel).map_err(|e| ParseError::Selector {
        message: format!("invalid selector {:?}: {}", sel, e),
    })
}

/// Map a star-rating class word (as used by the catalogue markup) to a digit.
fn star_rating_value(class: &str) -> Option<&'static str> {
    match class {
        "One" => Some("1"),
        "Two" => Some("2"),
        "Three" => Some("3"),
        "Four" => Some("4"),
        "Five" => Some("5"),
        _ => None,
    }
}

/// Collect an element's text, trimmed, empty mapped to None.
fn text_of(el: ElementRef<'_>) -> Option<String> {
    let text = el.text().collect::<String>().trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

struct Selectors {
    entry: Selector,
    title_link: Selector,
    title_alt: Selector,
    author: Selector,
    price: Selector,
    rating_star: Selector,
    rating_alt: Selector,
    any_link: Selector,
    next_page: Selector,
}

impl Selectors {
    fn new() -> Result<Self, ParseError> {
        Ok(Self {
            entry: parse_selector("article.product_pod, li.book, article.book")?,
            title_link: parse_selector("h3 a")?,
            title_alt: parse_selector(".title")?,
            author: parse_selector(".author")?,
            price: parse_selector(".price_color, .price")?,
            rating_star: parse_selector(".star-rating")?,
            rating_alt: parse_selector(".rating")?,
            any_link: parse_selector("a[href]")?,
            next_page: parse_selector("li.next a")?,
        })
    }
}

/// One parsed catalogue page.
pub struct Listing {
    doc: Html,
    base: Option<Url>,
    url_label: String,
    selectors: Selectors,
}

impl Listing {
    /// Parse listing HTML. `page_url`, when given, is used to resolve relative
    /// entry and pagination links and to label parse errors.
    pub fn parse(html: &str, page_url: Option<&str>) -> Result<Self, ParseError> {
        let base = page_url.and_then(|u| Url::parse(u).ok());
        let url_label = page_url.unwrap_or("<input>").to_string();
        Ok(Self {
            doc: Html::parse_document(html),
            base,
            url_label,
            selectors: Selectors::new()?,
        })
    }

    /// Number of book entry elements on the page.
    pub fn entry_count(&self) -> usize {
        self.doc.select(&self.selectors.entry).count()
    }

    /// Lazy sequence of records: one item per entry element, in document
    /// order. A malformed entry yields Err for that item only.
    pub fn records(&self) -> impl Iterator<Item = Result<BookRecord, ParseError>> + '_ {
        self.doc
            .select(&self.selectors.entry)
            .enumerate()
            .map(move |(i, entry)| self.parse_entry(i + 1, entry))
    }

    /// Resolved URL of the next catalogue page, if the page links one.
    pub fn next_page(&self) -> Option<String> {
        let href = self
            .doc
            .select(&self.selectors.next_page)
            .next()
            .and_then(|a| a.value().attr("href"))?;
        Some(self.resolve(href))
    }

    fn resolve(&self, href: &str) -> String {
        match &self.base {
            Some(base) => base
                .join(href)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        }
    }

    fn parse_entry(&self, position: usize, entry: ElementRef<'_>) -> Result<BookRecord, ParseError> {
        let missing = |field: &'static str| ParseError::MissingField {
            field,
            position,
            url: self.url_label.clone(),
        };

        let title_anchor = entry.select(&self.selectors.title_link).next();
        let title = title_anchor
            .and_then(|a| {
                a.value()
                    .attr("title")
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .or_else(|| text_of(a))
            })
            .or_else(|| {
                entry
                    .select(&self.selectors.title_alt)
                    .next()
                    .and_then(text_of)
            })
            .ok_or_else(|| missing("title"))?;

        let author = entry
            .select(&self.selectors.author)
            .next()
            .and_then(text_of)
            .ok_or_else(|| missing("author"))?;

        let price = entry
            .select(&self.selectors.price)
            .next()
            .and_then(text_of)
            .ok_or_else(|| missing("price"))?;

        let rating = entry
            .select(&self.selectors.rating_star)
            .next()
            .and_then(|el| {
                el.value()
                    .classes()
                    .find_map(star_rating_value)
                    .map(String::from)
            })
            .or_else(|| {
                entry
                    .select(&self.selectors.rating_alt)
                    .next()
                    .and_then(text_of)
            })
            .ok_or_else(|| missing("rating"))?;

        let url = title_anchor
            .or_else(|| entry.select(&self.selectors.any_link).next())
            .and_then(|a| a.value().attr("href"))
            .map(|href| self.resolve(href));

        Ok(BookRecord {
            title,
            author,
            price,
            rating,
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://books.example.com/catalogue/page-1.html";

    fn listing_html(entries: &str, next: Option<&str>) -> String {
        let pager = match next {
            Some(href) => format!(r#"<ul class="pager"><li class="next"><a href="{}">next</a></li></ul>"#, href),
            None => String::new(),
        };
        format!(
            r#"<!DOCTYPE html><html><body><section>{}{}</section></body></html>"#,
            entries, pager
        )
    }

    fn entry_html(title: &str, author: &str, price: &str, rating_class: &str, href: &str) -> String {
        format!(
            r#"<article class="product_pod">
<h3><a href="{href}" title="{title}">{title}</a></h3>
<p class="star-rating {rating_class}"></p>
<p class="author">{author}</p>
<div class="product_price"><p class="price_color">{price}</p></div>
</article>"#
        )
    }

    #[test]
    fn well_formed_page_yields_one_record_per_entry() -> Result<(), ParseError> {
        let html = listing_html(
            &[
                entry_html("A Light in the Attic", "Shel S.", "£51.77", "Three", "a-light_1/index.html"),
                entry_html("Tipping the Velvet", "Sarah W.", "£53.74", "One", "tipping_2/index.html"),
                entry_html("Soumission", "Michel H.", "£50.10", "Five", "soumission_3/index.html"),
            ]
            .join("\n"),
            None,
        );
        let listing = Listing::parse(&html, Some(PAGE_URL))?;
        assert_eq!(listing.entry_count(), 3);
        let records = listing.records().collect::<Result<Vec<_>, _>>()?;
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].title, "A Light in the Attic");
        assert_eq!(records[0].author, "Shel S.");
        assert_eq!(records[0].price, "£51.77");
        assert_eq!(records[0].rating, "3");
        assert_eq!(
            records[0].url.as_deref(),
            Some("https://books.example.com/catalogue/a-light_1/index.html")
        );
        assert_eq!(records[1].rating, "1");
        assert_eq!(records[2].rating, "5");
        Ok(())
    }

    #[test]
    fn example_block_matches_expected_record() -> Result<(), ParseError> {
        let html = listing_html(
            r#"<article class="product_pod">
<h3><a title="Example Book">Example Book</a></h3>
<p class="author">Jane Doe</p>
<p class="price_color">$9.99</p>
<p class="rating">4.5</p>
</article>"#,
            None,
        );
        let listing = Listing::parse(&html, None)?;
        let records = listing.records().collect::<Result<Vec<_>, _>>()?;
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.title, "Example Book");
        assert_eq!(r.author, "Jane Doe");
        assert_eq!(r.price, "$9.99");
        assert_eq!(r.rating, "4.5");
        assert!(r.url.is_none());
        Ok(())
    }

    #[test]
    fn title_falls_back_to_anchor_text() -> Result<(), ParseError> {
        let html = listing_html(
            r#"<article class="product_pod">
<h3><a href="x.html">Untitled Attribute</a></h3>
<p class="author">A.</p>
<p class="price_color">£1.00</p>
<p class="star-rating Two"></p>
</article>"#,
            None,
        );
        let listing = Listing::parse(&html, None)?;
        let records = listing.records().collect::<Result<Vec<_>, _>>()?;
        assert_eq!(records[0].title, "Untitled Attribute");
        Ok(())
    }

    #[test]
    fn missing_author_is_per_entry_error_with_position() -> Result<(), ParseError> {
        let good = entry_html("Good", "Someone", "£2.00", "Four", "good.html");
        let bad = r#"<article class="product_pod">
<h3><a title="Bad">Bad</a></h3>
<p class="price_color">£3.00</p>
<p class="star-rating One"></p>
</article>"#;
        let html = listing_html(&format!("{}\n{}", good, bad), None);
        let listing = Listing::parse(&html, Some(PAGE_URL))?;
        let items: Vec<_> = listing.records().collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        match &items[1] {
            Err(ParseError::MissingField { field, position, .. }) => {
                assert_eq!(*field, "author");
                assert_eq!(*position, 2);
            }
            other => panic!("expected MissingField, got {:?}", other.as_ref().map(|r| &r.title)),
        }
        Ok(())
    }

    #[test]
    fn unknown_star_class_without_fallback_is_missing_rating() -> Result<(), ParseError> {
        let html = listing_html(
            r#"<article class="product_pod">
<h3><a title="T">T</a></h3>
<p class="author">A.</p>
<p class="price_color">£1.00</p>
<p class="star-rating Six"></p>
</article>"#,
            None,
        );
        let listing = Listing::parse(&html, None)?;
        let items: Vec<_> = listing.records().collect();
        assert!(matches!(
            items[0],
            Err(ParseError::MissingField { field: "rating", .. })
        ));
        Ok(())
    }

    #[test]
    fn next_page_link_resolves_against_page_url() -> Result<(), ParseError> {
        let html = listing_html(
            &entry_html("T", "A", "£1.00", "One", "t.html"),
            Some("page-2.html"),
        );
        let listing = Listing::parse(&html, Some(PAGE_URL))?;
        assert_eq!(
            listing.next_page().as_deref(),
            Some("https://books.example.com/catalogue/page-2.html")
        );
        Ok(())
    }

    #[test]
    fn last_page_has_no_next_link() -> Result<(), ParseError> {
        let html = listing_html(&entry_html("T", "A", "£1.00", "One", "t.html"), None);
        let listing = Listing::parse(&html, Some(PAGE_URL))?;
        assert!(listing.next_page().is_none());
        Ok(())
    }

    #[test]
    fn page_without_entries_has_zero_count() -> Result<(), ParseError> {
        let listing = Listing::parse("<html><body><p>Nothing here.</p></body></html>", None)?;
        assert_eq!(listing.entry_count(), 0);
        assert_eq!(listing.records().count(), 0);
        Ok(())
    }

    #[test]
    fn records_iterate_in_document_order() -> Result<(), ParseError> {
        let html = listing_html(
            &["B", "A", "C"]
                .iter()
                .map(|t| entry_html(t, "X", "£1.00", "One", "x.html"))
                .collect::<Vec<_>>()
                .join("\n"),
            None,
        );
        let listing = Listing::parse(&html, None)?;
        let titles: Vec<String> = listing
            .records()
            .filter_map(|r| r.ok().map(|b| b.title))
            .collect();
        assert_eq!(titles, ["B", "A", "C"]);
        Ok(())
    }

    #[test]
    fn star_rating_value_maps_all_words() {
        assert_eq!(star_rating_value("One"), Some("1"));
        assert_eq!(star_rating_value("Two"), Some("2"));
        assert_eq!(star_rating_value("Three"), Some("3"));
        assert_eq!(star_rating_value("Four"), Some("4"));
        assert_eq!(star_rating_value("Five"), Some("5"));
        assert_eq!(star_rating_value("star-rating"), None);
    }
}
