//! Structured content extraction from detail pages
//!
//! This module turns a parsed detail page into:
//! - the page's code and free-text definition (from the `h1`, else the `title`)
//! - an ordered list of titled sections holding paragraphs, lists and tables
//!
//! The traversal is written against the [`DomNode`] capability and runs on
//! `scraper` documents.

mod dom;
mod heading;
mod sections;
mod table;

pub use dom::{collapse_whitespace, DomNode};
pub use heading::{code_token_regex, find_code_and_definition, parse_heading_text, parse_title_text};
pub use sections::extract_sections;
pub use table::{convert_table, normalize_table, TableData};

use crate::codec::Code;
use scraper::Html;
use serde::{Deserialize, Serialize};

/// One unit of content inside a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Chunk {
    Paragraph {
        text: String,
    },
    #[serde(rename = "list")]
    ListBlock {
        items: Vec<String>,
    },
    Table(TableData),
}

impl Chunk {
    /// Short name used in flat exports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Paragraph { .. } => "paragraph",
            Self::ListBlock { .. } => "list",
            Self::Table(_) => "table",
        }
    }
}

/// A titled run of content under an `h2`/`h3` heading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub order_index: usize,
    #[serde(rename = "content")]
    pub chunks: Vec<Chunk>,
}

/// Everything read from one detail page
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    /// Code found in the heading or title, if any
    pub code: Option<Code>,
    pub definition: Option<String>,
    pub sections: Vec<Section>,
}

/// Extracts code, definition and sections from a parsed document
///
/// # Example
///
/// ```
/// use dtc_harvest::extract::extract_page;
/// use scraper::Html;
///
/// let html = Html::parse_document(
///     "<h1>P0300-00 – Random Misfire Detected</h1><h2>Causes</h2><ul><li>Plugs</li></ul>",
/// );
/// let page = extract_page(&html);
/// assert_eq!(page.code.unwrap().as_str(), "P0300-00");
/// assert_eq!(page.definition.as_deref(), Some("Random Misfire Detected"));
/// assert_eq!(page.sections.len(), 1);
/// ```
pub fn extract_page(html: &Html) -> ExtractedPage {
    let root = html.root_element();
    let (code, definition) = match find_code_and_definition(&root) {
        Some((code, definition)) => (Some(code), definition),
        None => (None, None),
    };

    ExtractedPage {
        code,
        definition,
        sections: extract_sections(&root),
    }
}
