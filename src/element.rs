//! Helpers for pulling strings and rows out of HTML elements
//!
//! Everything here is a pure projection over [`DomNode`] values; absence is
//! reported with `Option`, never an error. Callers decide what absence
//! means for their page category.

use crate::document::DomNode;

/// First trimmed, non-empty text fragment of `node` or its descendants.
pub fn first_stripped_text<N: DomNode>(node: &N) -> String {
    node.texts().into_iter().next().unwrap_or_default()
}

/// `href` attribute of the first `<a>` descendant of `node`.
pub fn first_anchor_href<N: DomNode>(node: &N) -> Option<String> {
    node.select_one("a").and_then(|a| a.attr("href"))
}

/// First `<a>` descendant whose text equals `text`.
pub fn anchor_with_text<N: DomNode>(node: &N, text: &str) -> Option<N> {
    node.select_all("a")
        .into_iter()
        .find(|a| first_stripped_text(a) == text)
}

/// Walk a chain of child-element tags, taking the first match at every
/// level. `descend(n, &["div", "p"])` is the first `<p>` child of the
/// first `<div>` child holding one.
pub fn descend<N: DomNode>(node: &N, tags: &[&str]) -> Option<N> {
    let mut frontier = vec![node.clone()];
    for tag in tags {
        frontier = frontier
            .iter()
            .flat_map(DomNode::child_elements)
            .filter(|child| child.tag() == *tag)
            .collect();
        if frontier.is_empty() {
            return None;
        }
    }
    frontier.into_iter().next()
}

/// All elements exactly `depth` levels below `node`.
pub fn descendants_at_depth<N: DomNode>(node: &N, depth: usize) -> Vec<N> {
    let mut frontier = vec![node.clone()];
    for _ in 0..depth {
        frontier = frontier.iter().flat_map(DomNode::child_elements).collect();
    }
    frontier
}

/// `levels`-th ancestor element of `node`.
pub fn ancestor<N: DomNode>(node: &N, levels: usize) -> Option<N> {
    let mut current = node.clone();
    for _ in 0..levels {
        current = current.parent_element()?;
    }
    Some(current)
}

/// Body rows of a `<table>` element, or `None` when it has no `<tbody>`.
pub fn body_rows<N: DomNode>(table: &N) -> Option<Vec<N>> {
    let tbody = table
        .child_elements()
        .into_iter()
        .find(|child| child.tag() == "tbody")?;
    Some(
        tbody
            .child_elements()
            .into_iter()
            .filter(|child| child.tag() == "tr")
            .collect(),
    )
}

/// Cell elements (`<td>`/`<th>`) of a table row.
pub fn row_cells<N: DomNode>(row: &N) -> Vec<N> {
    row.child_elements()
        .into_iter()
        .filter(|child| matches!(child.tag().as_str(), "td" | "th"))
        .collect()
}

/// Text grid of a table's body rows: one record per `<tr>`, one string per
/// cell (first stripped text). `None` when the table has no `<tbody>`.
pub fn text_grid<N: DomNode>(table: &N) -> Option<Vec<Vec<String>>> {
    let rows = body_rows(table)?;
    Some(
        rows.iter()
            .map(|row| row_cells(row).iter().map(first_stripped_text).collect())
            .collect(),
    )
}

/// Like [`text_grid`], with non-breaking spaces normalized to plain spaces
/// (the source site pads some name columns with `&nbsp;`).
pub fn text_grid_normalized<N: DomNode>(table: &N) -> Option<Vec<Vec<String>>> {
    text_grid(table).map(|rows| {
        rows.into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| cell.replace('\u{a0}', " "))
                    .collect()
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    const TABLE: &str = "<html><body><table>\
        <thead><tr><th>H1</th><th>H2</th></tr></thead>\
        <tbody>\
        <tr><td>a1</td><td><a href=\"/x\">a2</a></td></tr>\
        <tr><td>b\u{a0}1</td><td>b2</td></tr>\
        </tbody></table></body></html>";

    #[test]
    fn text_grid_skips_header_rows() {
        let document = Document::parse(TABLE);
        let table = document.root().select_one("table").unwrap();
        let grid = text_grid(&table).unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0], vec!["a1", "a2"]);
    }

    #[test]
    fn text_grid_normalizes_nbsp_on_request() {
        let document = Document::parse(TABLE);
        let table = document.root().select_one("table").unwrap();
        let grid = text_grid_normalized(&table).unwrap();
        assert_eq!(grid[1][0], "b 1");
    }

    #[test]
    fn text_grid_requires_tbody() {
        let document =
            Document::parse("<html><body><table><tr><td>x</td></tr></table></body></html>");
        let table = document.root().select_one("table").unwrap();
        // The HTML parser inserts an implicit tbody around bare rows.
        assert!(text_grid(&table).is_some());
    }

    #[test]
    fn first_anchor_href_reads_nested_links() {
        let document = Document::parse(TABLE);
        let table = document.root().select_one("table").unwrap();
        let rows = body_rows(&table).unwrap();
        let cells = row_cells(&rows[0]);
        assert_eq!(first_anchor_href(&cells[1]).as_deref(), Some("/x"));
        assert_eq!(first_anchor_href(&cells[0]), None);
    }

    #[test]
    fn descend_follows_first_matching_chain() {
        let document = Document::parse(
            "<html><body><div><span>skip</span><p><button><a>hit</a></button></p></div></body></html>",
        );
        let div = document.root().select_one("div").unwrap();
        let a = descend(&div, &["p", "button", "a"]).unwrap();
        assert_eq!(first_stripped_text(&a), "hit");
        assert!(descend(&div, &["p", "table"]).is_none());
    }

    #[test]
    fn descendants_at_depth_collects_level() {
        let document = Document::parse(
            "<html><body><div id=\"r\"><ul><li><i>1</i><i>2</i></li></ul></div></body></html>",
        );
        let root = document.root().select_one("#r").unwrap();
        let level = descendants_at_depth(&root, 3);
        assert_eq!(level.len(), 2);
        assert_eq!(DomNode::text(&level[1]), "2");
    }

    #[test]
    fn ancestor_climbs_exactly() {
        let document =
            Document::parse("<html><body><div><p><b>x</b></p></div></body></html>");
        let b = document.root().select_one("b").unwrap();
        assert_eq!(ancestor(&b, 2).unwrap().tag(), "div");
        assert!(ancestor(&b, 10).is_none());
    }
}
