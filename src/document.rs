//! HTML document abstraction
//!
//! Extraction code is written against the [`DomNode`] trait rather than a
//! concrete HTML parser, so the parsing backend can be swapped without
//! touching the pipeline. The bundled backend wraps [`::scraper`].
//!
//! Parsed documents borrow their nodes and are not `Send`; they are
//! consumed synchronously between suspension points and never retained.
//! Fragments captured from a document are owned HTML strings and travel
//! freely.

use ::scraper::{ElementRef, Html, Selector};

/// Trait representing an HTML element that can be queried structurally
///
/// Selectors are CSS. An invalid selector behaves like one that matches
/// nothing.
pub trait DomNode: Sized + Clone {
    /// First descendant matching the CSS selector.
    fn select_one(&self, selector: &str) -> Option<Self>;

    /// All descendants matching the CSS selector, in document order.
    fn select_all(&self, selector: &str) -> Vec<Self>;

    /// Parent element, if any.
    fn parent_element(&self) -> Option<Self>;

    /// Direct element children, in document order.
    fn child_elements(&self) -> Vec<Self>;

    /// Tag name.
    fn tag(&self) -> String;

    /// Attribute value.
    fn attr(&self, name: &str) -> Option<String>;

    /// Concatenated text of all descendant text nodes.
    fn text(&self) -> String;

    /// Trimmed, non-empty descendant text fragments in document order.
    fn texts(&self) -> Vec<String>;

    /// Trimmed text that sits directly after the opening tag, before any
    /// child element. Empty when the element starts with a child element.
    fn own_text(&self) -> String;

    /// Outer HTML of this element.
    fn outer_html(&self) -> String;
}

impl<'a> DomNode for ElementRef<'a> {
    fn select_one(&self, selector: &str) -> Option<Self> {
        let selector = Selector::parse(selector).ok()?;
        self.select(&selector).next()
    }

    fn select_all(&self, selector: &str) -> Vec<Self> {
        let selector = match Selector::parse(selector) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        self.select(&selector).collect()
    }

    fn parent_element(&self) -> Option<Self> {
        (**self).parent().and_then(ElementRef::wrap)
    }

    fn child_elements(&self) -> Vec<Self> {
        (**self).children().filter_map(ElementRef::wrap).collect()
    }

    fn tag(&self) -> String {
        self.value().name().to_string()
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(str::to_string)
    }

    fn text(&self) -> String {
        self.text().collect()
    }

    fn texts(&self) -> Vec<String> {
        self.text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn own_text(&self) -> String {
        (**self)
            .children()
            .next()
            .and_then(|node| node.value().as_text().map(|t| t.trim().to_string()))
            .unwrap_or_default()
    }

    fn outer_html(&self) -> String {
        self.html()
    }
}

/// A parsed HTML page
///
/// Ephemeral: produced from a response body, queried, and dropped before
/// the next suspension point.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse a full HTML document.
    pub fn parse(text: &str) -> Self {
        Self {
            html: Html::parse_document(text),
        }
    }

    /// Parse an HTML fragment (a captured element).
    pub fn parse_fragment(text: &str) -> Self {
        Self {
            html: Html::parse_fragment(text),
        }
    }

    /// Root element for structural queries.
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }
}

/// An owned HTML fragment captured from a document
///
/// Element bags store fragments instead of borrowed nodes so they can
/// outlive the page they were extracted from and cross task boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment(String);

impl Fragment {
    /// Wrap a raw HTML string.
    pub fn new(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    /// Capture the outer HTML of `node`.
    pub fn capture<N: DomNode>(node: &N) -> Self {
        Self(node.outer_html())
    }

    /// The raw HTML.
    pub fn html(&self) -> &str {
        &self.0
    }

    /// Re-parse the fragment for structural queries.
    pub fn parse(&self) -> Document {
        Document::parse_fragment(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Document {
        Document::parse(html)
    }

    #[test]
    fn select_one_finds_first_match() {
        let document = doc("<html><body><p>a</p><p>b</p></body></html>");
        let p = document.root().select_one("p").unwrap();
        assert_eq!(DomNode::text(&p), "a");
    }

    #[test]
    fn select_all_preserves_document_order() {
        let document = doc("<html><body><p>a</p><p>b</p></body></html>");
        let texts: Vec<String> = document
            .root()
            .select_all("p")
            .iter()
            .map(DomNode::text)
            .collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn invalid_selector_matches_nothing() {
        let document = doc("<html><body><p>a</p></body></html>");
        assert!(document.root().select_one("p[[").is_none());
        assert!(document.root().select_all("p[[").is_empty());
    }

    #[test]
    fn parent_and_children_navigate_elements_only() {
        let document = doc("<html><body><div><span>x</span> text <b>y</b></div></body></html>");
        let div = document.root().select_one("div").unwrap();
        let children = div.child_elements();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].tag(), "span");
        assert_eq!(
            children[0].parent_element().unwrap().tag(),
            "div"
        );
    }

    #[test]
    fn texts_strips_and_skips_empty() {
        let document = doc("<html><body><div> a <span>\n</span><b> b </b></div></body></html>");
        let div = document.root().select_one("div").unwrap();
        assert_eq!(div.texts(), vec!["a", "b"]);
    }

    #[test]
    fn own_text_is_leading_text_only() {
        let document = doc(
            "<html><body><table><tbody><tr>\
             <td> 2023-05-01 <a>link</a></td>\
             <td><a>link</a>tail</td>\
             </tr></tbody></table></body></html>",
        );
        let cells = document.root().select_all("td");
        assert_eq!(cells[0].own_text(), "2023-05-01");
        assert_eq!(cells[1].own_text(), "");
    }

    #[test]
    fn fragment_roundtrips_through_reparse() {
        let document = doc("<html><body><table id=\"t\"><tbody><tr><td>x</td></tr></tbody></table></body></html>");
        let table = document.root().select_one("table").unwrap();
        let fragment = Fragment::capture(&table);
        let reparsed = fragment.parse();
        let cell = reparsed.root().select_one("td").unwrap();
        assert_eq!(DomNode::text(&cell), "x");
    }
}
