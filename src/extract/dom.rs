//! The small slice of DOM querying the extractor needs
//!
//! Section walking and table conversion are written against [`DomNode`] so
//! they do not depend on a particular HTML parser. [`scraper::ElementRef`]
//! is the implementation used in practice.

use scraper::ElementRef;

/// An element in an ordered document tree
pub trait DomNode: Sized + Clone {
    /// Lowercase tag name
    fn tag(&self) -> &str;

    /// All descendant text joined by spaces, with whitespace runs collapsed
    fn collapsed_text(&self) -> String;

    /// Element siblings after this one, in document order
    fn following_siblings(&self) -> Vec<Self>;

    /// Direct element children whose tag is in `tags`
    fn children_with_tag(&self, tags: &[&str]) -> Vec<Self>;

    /// Descendant elements (excluding self) whose tag is in `tags`, in document order
    fn descendants_with_tag(&self, tags: &[&str]) -> Vec<Self>;

    /// True if an ancestor strictly between this node and `boundary` has tag `tag`
    fn is_inside(&self, tag: &str, boundary: &Self) -> bool;

    /// Value of an attribute, if present
    fn attr(&self, name: &str) -> Option<&str>;
}

/// Collapses whitespace runs into single spaces and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl<'a> DomNode for ElementRef<'a> {
    fn tag(&self) -> &str {
        self.value().name()
    }

    fn collapsed_text(&self) -> String {
        collapse_whitespace(&self.text().collect::<Vec<_>>().join(" "))
    }

    fn following_siblings(&self) -> Vec<Self> {
        self.next_siblings().filter_map(ElementRef::wrap).collect()
    }

    fn children_with_tag(&self, tags: &[&str]) -> Vec<Self> {
        self.children()
            .filter_map(ElementRef::wrap)
            .filter(|el| tags.contains(&el.tag()))
            .collect()
    }

    fn descendants_with_tag(&self, tags: &[&str]) -> Vec<Self> {
        self.descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .filter(|el| tags.contains(&el.tag()))
            .collect()
    }

    fn is_inside(&self, tag: &str, boundary: &Self) -> bool {
        self.ancestors()
            .take_while(|node| node.id() != boundary.id())
            .filter_map(ElementRef::wrap)
            .any(|el| el.tag() == tag)
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn first<'a>(doc: &'a Html, css: &str) -> ElementRef<'a> {
        doc.select(&Selector::parse(css).unwrap()).next().unwrap()
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  c "), "a b c");
        assert_eq!(collapse_whitespace(" \n "), "");
    }

    #[test]
    fn test_collapsed_text_joins_inline_nodes() {
        let doc = Html::parse_fragment("<p>Check <b>wiring</b>\n   harness</p>");
        assert_eq!(first(&doc, "p").collapsed_text(), "Check wiring harness");
    }

    #[test]
    fn test_following_siblings_skip_text() {
        let doc = Html::parse_fragment("<div><h2>A</h2> text <p>1</p><ul></ul></div>");
        let tags: Vec<String> = first(&doc, "h2")
            .following_siblings()
            .iter()
            .map(|el| el.tag().to_string())
            .collect();
        assert_eq!(tags, vec!["p", "ul"]);
    }

    #[test]
    fn test_is_inside() {
        let doc = Html::parse_fragment(
            "<table><thead><tr><th>H</th></tr></thead><tbody><tr><td>x</td></tr></tbody></table>",
        );
        let table = first(&doc, "table");
        let rows = table.descendants_with_tag(&["tr"]);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_inside("thead", &table));
        assert!(!rows[1].is_inside("thead", &table));
    }
}
