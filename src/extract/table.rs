use crate::extract::dom::DomNode;
use serde::{Deserialize, Serialize};

/// A table with a header row and rectangular body rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    /// Number of columns, which every row matches
    pub fn width(&self) -> usize {
        self.headers.len()
    }
}

/// Converts a `table` element into rectangular table data
///
/// Headers come from the cells of `thead`; without them the first body row
/// is promoted to the header. Returns `None` for a table with no cells at all.
pub fn convert_table<N: DomNode>(table: &N) -> Option<TableData> {
    let headers: Vec<String> = table
        .descendants_with_tag(&["thead"])
        .first()
        .map(|thead| {
            thead
                .descendants_with_tag(&["th", "td"])
                .iter()
                .map(DomNode::collapsed_text)
                .collect()
        })
        .unwrap_or_default();

    let rows: Vec<Vec<String>> = table
        .descendants_with_tag(&["tr"])
        .iter()
        .filter(|tr| !tr.is_inside("thead", table))
        .map(|tr| {
            tr.children_with_tag(&["td", "th"])
                .iter()
                .map(DomNode::collapsed_text)
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect();

    normalize_table(headers, rows)
}

/// Makes every row as wide as the header
///
/// Short rows are padded with empty strings. A long row grows the header with
/// `col_N` names; growth is cumulative, so the header never shrinks, and rows
/// seen before the growth are padded to the final width.
pub fn normalize_table(mut headers: Vec<String>, mut rows: Vec<Vec<String>>) -> Option<TableData> {
    if headers.is_empty() {
        if rows.is_empty() {
            return None;
        }
        headers = rows.remove(0);
    }

    for row in rows.iter_mut() {
        let width = headers.len();
        if row.len() < width {
            row.resize(width, String::new());
        } else if row.len() > width {
            headers.extend((width..row.len()).map(|i| format!("col_{}", i)));
        }
    }

    let width = headers.len();
    for row in rows.iter_mut() {
        row.resize(width, String::new());
    }

    Some(TableData { headers, rows })
}
