//! Detail page parsing into records

use crate::extract::extract_page;
use crate::output::DetailRecord;
use scraper::Html;
use thiserror::Error;
use url::Url;

/// Why a fetched detail page could not become a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetailError {
    #[error("empty document at {0}")]
    EmptyDocument(String),

    #[error("no code found in page or URL: {0}")]
    NoCode(String),
}

/// Parses a detail page into a [`DetailRecord`]
///
/// The code comes from the page heading or title; failing both, the last
/// path segment of `url` is used, uppercased. A code that does not match the
/// code grammar still yields a record, just without its decoded fields.
///
/// # Arguments
///
/// * `html` - Markup of the detail page
/// * `url` - URL the markup was fetched from
///
/// # Example
///
/// ```
/// use dtc_harvest::crawler::parse_detail_page;
///
/// let html = "<h1>P0300-00 – Random Misfire Detected</h1>\
///             <h2>Possible Causes</h2><ul><li>Plugs</li><li>Coils</li><li>Injectors</li></ul>";
/// let record = parse_detail_page(html, "https://example.com/Land-Rover/P0300-00").unwrap();
/// assert_eq!(record.base_code.as_deref(), Some("P0300"));
/// assert_eq!(record.sections[0].title, "Possible Causes");
/// ```
pub fn parse_detail_page(html: &str, url: &str) -> Result<DetailRecord, DetailError> {
    if html.trim().is_empty() {
        return Err(DetailError::EmptyDocument(url.to_string()));
    }

    let page = extract_page(&Html::parse_document(html));

    let code = match page.code {
        Some(code) => code.as_str().to_string(),
        None => code_from_url(url).ok_or_else(|| DetailError::NoCode(url.to_string()))?,
    };

    Ok(DetailRecord::new(&code, page.definition, url, page.sections))
}

/// Last non-empty path segment of `url`, uppercased
fn code_from_url(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    url.path_segments()?
        .filter(|segment| !segment.trim().is_empty())
        .last()
        .map(|segment| segment.trim().to_uppercase())
}
