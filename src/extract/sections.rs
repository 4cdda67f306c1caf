use crate::extract::dom::DomNode;
use crate::extract::table::convert_table;
use crate::extract::{Chunk, Section};

/// Tags that start a section
const SECTION_HEADINGS: &[&str] = &["h2", "h3"];

/// Tags that end a section's content
const BOUNDARY_HEADINGS: &[&str] = &["h1", "h2", "h3"];

/// Block elements read as a single paragraph of text
const PARAGRAPH_LIKE: &[&str] = &["p", "div", "blockquote", "pre"];

/// Splits a document into titled sections
///
/// Every `h2`/`h3` opens a section whose content is the run of element
/// siblings that follow it, stopping at the next `h1`-`h3`. Sections that end
/// up with no content are dropped, and `order_index` counts only the sections
/// that are kept.
pub fn extract_sections<N: DomNode>(root: &N) -> Vec<Section> {
    let mut sections = Vec::new();

    for heading in root.descendants_with_tag(SECTION_HEADINGS) {
        let chunks = collect_chunks(&heading);
        if chunks.is_empty() {
            continue;
        }

        sections.push(Section {
            title: heading.collapsed_text(),
            order_index: sections.len(),
            chunks,
        });
    }

    sections
}

/// Classifies the siblings after a heading into content chunks
fn collect_chunks<N: DomNode>(heading: &N) -> Vec<Chunk> {
    heading
        .following_siblings()
        .iter()
        .take_while(|sibling| !BOUNDARY_HEADINGS.contains(&sibling.tag()))
        .filter_map(classify)
        .collect()
}

fn classify<N: DomNode>(element: &N) -> Option<Chunk> {
    let tag = element.tag();

    if PARAGRAPH_LIKE.contains(&tag) {
        let text = element.collapsed_text();
        return (!text.is_empty()).then_some(Chunk::Paragraph { text });
    }

    match tag {
        "ul" | "ol" => {
            let items: Vec<String> = element
                .descendants_with_tag(&["li"])
                .iter()
                .map(DomNode::collapsed_text)
                .filter(|text| !text.is_empty())
                .collect();
            (!items.is_empty()).then_some(Chunk::ListBlock { items })
        }
        "table" => convert_table(element).map(Chunk::Table),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn sections_of(body: &str) -> Vec<Section> {
        let doc = Html::parse_document(&format!("<html><body>{}</body></html>", body));
        extract_sections(&doc.root_element())
    }

    #[test]
    fn test_list_section() {
        let sections = sections_of(
            "<h2>Possible Causes</h2><ul><li>Spark plugs</li><li>Coil</li><li>Injector</li></ul>",
        );
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Possible Causes");
        assert_eq!(sections[0].order_index, 0);
        assert_eq!(
            sections[0].chunks,
            vec![Chunk::ListBlock {
                items: vec!["Spark plugs".into(), "Coil".into(), "Injector".into()]
            }]
        );
    }

    #[test]
    fn test_content_stops_at_next_heading() {
        let sections = sections_of(
            "<h2>Meaning</h2><p>First</p><div>Second</div>\
             <h3>Symptoms</h3><p>Third</p>\
             <h1>Other</h1><p>Not collected</p>",
        );
        assert_eq!(sections.len(), 2);
        assert_eq!(
            sections[0].chunks,
            vec![
                Chunk::Paragraph { text: "First".into() },
                Chunk::Paragraph { text: "Second".into() },
            ]
        );
        assert_eq!(sections[1].title, "Symptoms");
        assert_eq!(sections[1].chunks, vec![Chunk::Paragraph { text: "Third".into() }]);
    }

    #[test]
    fn test_empty_sections_omitted_and_indices_dense() {
        let sections = sections_of(
            "<h2>Empty</h2><p>   </p><ul><li> </li></ul>\
             <h2>Kept</h2><p>Text</p>\
             <h3>Also kept</h3><ol><li>One</li></ol>",
        );
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Kept", "Also kept"]);
        let indices: Vec<usize> = sections.iter().map(|s| s.order_index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_h4_does_not_end_section() {
        let sections = sections_of("<h2>Fix</h2><h4>Note</h4><p>After note</p>");
        assert_eq!(
            sections[0].chunks,
            vec![Chunk::Paragraph { text: "After note".into() }]
        );
    }

    #[test]
    fn test_table_chunk() {
        let sections = sections_of(
            "<h2>Pins</h2><table><tr><th>Pin</th><th>Use</th></tr><tr><td>1</td><td>Ground</td></tr></table>",
        );
        match &sections[0].chunks[0] {
            Chunk::Table(table) => {
                assert_eq!(table.headers, vec!["Pin", "Use"]);
                assert_eq!(table.rows, vec![vec!["1".to_string(), "Ground".to_string()]]);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_no_headings() {
        assert!(sections_of("<p>Just text</p>").is_empty());
    }
}
