//! Reading the site's paginated master grids
//!
//! The events grid is an ASP.NET Web Forms table: each page carries a
//! `__VIEWSTATE` input, and the next page is requested by POSTing the
//! pager's event target together with that viewstate. This module parses
//! one page of such a grid into owned pieces and reassembles the walked
//! pages into a single table fragment; the scraper drives the requests.

use std::sync::LazyLock;

use regex::Regex;

use crate::document::{Document, DomNode, Fragment};
use crate::element::body_rows;
use crate::scraper::extract::MASTER_TABLE;
use crate::session::PageKind;
use crate::{Result, ScrapeError};

/// Pagination controls of one grid page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Pager {
    pub current: u32,
    pub last: u32,
    /// Form event target submitted to reach the next page.
    pub event_target: String,
}

/// Owned pieces of one page of a paginated grid.
#[derive(Debug, Clone)]
pub(crate) struct PageChunk {
    pub thead: Option<String>,
    /// Outer HTML of each data row.
    pub rows: Vec<String>,
    pub viewstate: String,
    /// `None` when the grid fits on a single page.
    pub pager: Option<Pager>,
}

/// Parse one page of a paginated master grid.
pub(crate) fn read_chunk(body: &str, kind: PageKind) -> Result<PageChunk> {
    let document = Document::parse(body);
    let root = document.root();

    let viewstate = root
        .select_one("input#__VIEWSTATE")
        .and_then(|input| DomNode::attr(&input, "value"))
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ScrapeError::malformed(kind, "missing viewstate"))?;

    let table = root
        .select_one(MASTER_TABLE)
        .ok_or_else(|| ScrapeError::malformed(kind, "missing expected table"))?;

    let thead = table
        .child_elements()
        .into_iter()
        .find(|child| child.tag() == "thead")
        .map(|thead| thead.outer_html());

    let rows = body_rows(&table)
        .ok_or_else(|| ScrapeError::malformed(kind, "table is missing tbody"))?
        .iter()
        .filter(|row| row.select_one("td.rgPagerCell").is_none())
        .map(DomNode::outer_html)
        .collect();

    let pager = match table.select_one("td.rgPagerCell.NextPrevAndNumeric") {
        Some(cell) => Some(read_pager(&cell, kind)?),
        None => None,
    };

    Ok(PageChunk {
        thead,
        rows,
        viewstate,
        pager,
    })
}

fn read_pager<N: DomNode>(cell: &N, kind: PageKind) -> Result<Pager> {
    let current = cell
        .select_one("a.rgCurrentPage span")
        .map(|span| DomNode::text(&span))
        .and_then(|text| text.trim().parse().ok())
        .ok_or_else(|| ScrapeError::malformed(kind, "pager has no current page number"))?;

    let last = cell
        .select_all("div.rgWrap.rgNumPart a")
        .last()
        .and_then(|a| a.select_one("span"))
        .map(|span| DomNode::text(&span))
        .and_then(|text| text.trim().parse().ok())
        .ok_or_else(|| ScrapeError::malformed(kind, "pager has no last page number"))?;

    let event_target = cell
        .select_one("input.rgPageNext")
        .and_then(|input| input.attr("name"))
        .ok_or_else(|| ScrapeError::malformed(kind, "pager has no next-page event target"))?;

    Ok(Pager {
        current,
        last,
        event_target,
    })
}

/// Reassemble walked grid pages into one table fragment.
pub(crate) fn assemble_table(thead: Option<String>, rows: &[String]) -> Fragment {
    let mut html = String::from("<table class=\"rgMasterTable\">");
    if let Some(thead) = thead {
        html.push_str(&thead);
    }
    html.push_str("<tbody>");
    for row in rows {
        html.push_str(row);
    }
    html.push_str("</tbody></table>");
    Fragment::new(html)
}

/// Force the grid's page size. The tab URL embeds a default page size
/// (sometimes followed by a stray typographic quote) that would otherwise
/// cap pages at ten rows.
pub(crate) fn with_pagesize(url: &str, pagesize: u16) -> String {
    static PAGESIZE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new("&pagesize=[125]0\u{201d}?").expect("static pattern"));
    PAGESIZE
        .replace(url, format!("&pagesize={pagesize}"))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_page(rows: &str, pager: &str) -> String {
        format!(
            "<html><body>\
             <input id=\"__VIEWSTATE\" value=\"vs-1\"/>\
             <table class=\"rgMasterTable\">\
             <thead><tr><th>Date</th><th>Event</th></tr></thead>\
             <tbody>{rows}{pager}</tbody>\
             </table></body></html>"
        )
    }

    const PAGER: &str = "<tr><td class=\"rgPagerCell NextPrevAndNumeric\">\
        <a class=\"rgCurrentPage\"><span>1</span></a>\
        <div class=\"rgWrap rgNumPart\">\
        <a><span>1</span></a><a><span>3</span></a>\
        </div>\
        <input class=\"rgPageNext\" name=\"ctl00$next\"/>\
        </td></tr>";

    #[test]
    fn reads_rows_viewstate_and_pager() {
        let body = grid_page("<tr><td>a</td><td>b</td></tr>", PAGER);
        let chunk = read_chunk(&body, PageKind::Events).unwrap();
        assert_eq!(chunk.viewstate, "vs-1");
        assert_eq!(chunk.rows.len(), 1);
        assert!(chunk.thead.is_some());
        let pager = chunk.pager.unwrap();
        assert_eq!(pager.current, 1);
        assert_eq!(pager.last, 3);
        assert_eq!(pager.event_target, "ctl00$next");
    }

    #[test]
    fn single_page_grid_has_no_pager() {
        let body = grid_page("<tr><td>a</td><td>b</td></tr>", "");
        let chunk = read_chunk(&body, PageKind::Events).unwrap();
        assert!(chunk.pager.is_none());
    }

    #[test]
    fn missing_viewstate_is_malformed() {
        let body = "<html><body><table class=\"rgMasterTable\">\
                    <tbody><tr><td>a</td></tr></tbody></table></body></html>";
        assert!(read_chunk(body, PageKind::Events).is_err());
    }

    #[test]
    fn assembled_table_contains_all_rows() {
        let first = grid_page("<tr><td>a</td><td>b</td></tr>", PAGER);
        let second = grid_page("<tr><td>c</td><td>d</td></tr>", "");
        let mut rows = Vec::new();
        let mut thead = None;
        for body in [first, second] {
            let chunk = read_chunk(&body, PageKind::Events).unwrap();
            if thead.is_none() {
                thead = chunk.thead;
            }
            rows.extend(chunk.rows);
        }
        let fragment = assemble_table(thead, &rows);
        let document = fragment.parse();
        let cells: Vec<String> = document
            .root()
            .select_all("tbody td")
            .iter()
            .map(DomNode::text)
            .collect();
        assert_eq!(cells, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn with_pagesize_rewrites_embedded_parameter() {
        assert_eq!(
            with_pagesize("http://t/events?season=2023&pagesize=10", 50),
            "http://t/events?season=2023&pagesize=50"
        );
        assert_eq!(
            with_pagesize("http://t/events?season=2023&pagesize=20\u{201d}", 50),
            "http://t/events?season=2023&pagesize=50"
        );
        assert_eq!(with_pagesize("http://t/events", 50), "http://t/events");
    }
}
