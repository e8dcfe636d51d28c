//! Directory-index listing: fetch a URL and extract child entry names.
//!
//! The remote server publishes plain HTML directory indexes (no API), so
//! entries are derived from anchor-tag targets. The parent-directory marker
//! and the sort-order query links Apache-style indexes emit are excluded,
//! and trailing path separators are stripped.

use scraper::{Html, Selector};
use tracing::instrument;

use super::client::HttpFetcher;
use super::error::FetchError;

/// Fetches a directory-index URL and returns its child entry names, in
/// document order.
///
/// One GET, no retry; the caller decides whether a failure means "skip this
/// directory" or something worse.
///
/// # Errors
///
/// Returns a [`FetchError`] when the request fails; parse problems cannot
/// occur (anything that is not an anchor target is simply not an entry).
#[instrument(skip(fetcher), fields(url = %url))]
pub async fn list(fetcher: &HttpFetcher, url: &str) -> Result<Vec<String>, FetchError> {
    let body = fetcher.get_text(url).await?;
    Ok(parse_directory_listing(&body))
}

/// Extracts entry names from an HTML directory-index document.
///
/// Anchor targets are the entries; `../` and query-string links (`?C=N;O=D`
/// and friends) are skipped, trailing slashes are stripped, and
/// percent-encoding is decoded.
#[must_use]
#[allow(clippy::expect_used)]
pub fn parse_directory_listing(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a").expect("anchor selector is valid");

    document
        .select(&anchors)
        .filter_map(|element| element.value().attr("href"))
        .filter(|href| *href != "../" && !href.starts_with('?'))
        .map(|href| {
            let trimmed = href.trim_end_matches('/');
            urlencoding::decode(trimmed)
                .map_or_else(|_| trimmed.to_string(), |decoded| decoded.into_owned())
        })
        .filter(|entry| !entry.is_empty())
        .collect()
}
