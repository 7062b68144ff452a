//! Launch-time URL discovery
//!
//! Two navigation pages are crossed before any data page can be fetched:
//! the home page, whose navigation bar links one results hub per season and
//! tier, and each results hub, whose tab panels link the five data-page
//! categories. Both walks are pure projections over an already-parsed
//! document; the scraper drives the requests.

use std::collections::HashMap;

use crate::document::DomNode;
use crate::element::{ancestor, anchor_with_text, descend, descendants_at_depth, first_stripped_text};
use crate::session::{PageKind, Tier};
use crate::{Result, ScrapeError};

/// Path fragment identifying the speedway results link in the navigation
/// bar.
const RESULTS_LINK_PATH: &str = "resultat-speedway";

fn home_malformed(detail: &str) -> ScrapeError {
    ScrapeError::malformed(PageKind::Home, detail)
}

/// Resolve one results-hub URL per requested season from the home page.
///
/// Previous seasons are listed in an accordion, one entry per season, each
/// holding one link per tier. The current season is linked directly from
/// the results accordion as `Resultat <tier alias>`. A requested season
/// outside the discovered range has no results page for the tier.
pub(crate) fn results_urls<N: DomNode>(
    root: &N,
    seasons: &[u16],
    tier: Tier,
) -> Result<HashMap<u16, String>> {
    let navbar = root
        .select_one("div.main-menu-offcanvas.offcanvas-body")
        .ok_or_else(|| home_malformed("missing navigation bar"))?;

    let results_anchor = navbar
        .select_all("a")
        .into_iter()
        .find(|a| {
            a.attr("href")
                .is_some_and(|href| href.contains(RESULTS_LINK_PATH))
        })
        .ok_or_else(|| home_malformed("missing speedway results link"))?;

    let container = ancestor(&results_anchor, 3)
        .ok_or_else(|| home_malformed("results link has no accordion ancestor"))?;
    let results = descend(&container, &["div", "div"])
        .ok_or_else(|| home_malformed("missing results accordion"))?;
    let previous = descend(&results, &["div", "div", "div", "div"])
        .ok_or_else(|| home_malformed("missing previous results accordion"))?;

    let mut urls: HashMap<u16, String> = HashMap::new();
    for entry in previous.child_elements() {
        let season_label = descend(&entry, &["div", "p", "button", "a"])
            .ok_or_else(|| home_malformed("season entry without a label"))?;
        let season: u16 = first_stripped_text(&season_label)
            .parse()
            .map_err(|_| home_malformed("season label is not a year"))?;

        let href = tier
            .aliases()
            .iter()
            .find_map(|alias| anchor_with_text(&entry, alias))
            .and_then(|a| a.attr("href"))
            .ok_or_else(|| home_malformed("season entry without a tier link"))?;

        urls.insert(season, href);
    }

    let (Some(&first), Some(&last)) = (urls.keys().min(), urls.keys().max()) else {
        return Err(home_malformed("no previous seasons listed"));
    };
    let current = last + 1;

    if let Some(&season) = seasons.iter().find(|s| **s < first || **s > current) {
        return Err(ScrapeError::CoordinatesUnavailable { season, tier });
    }

    if seasons.contains(&current) {
        let href = tier
            .aliases()
            .iter()
            .find_map(|alias| {
                let label = format!("Resultat {alias}");
                results
                    .child_elements()
                    .into_iter()
                    .filter(|child| child.tag() == "a")
                    .find(|a| first_stripped_text(a) == label)
            })
            .and_then(|a| a.attr("href"))
            .ok_or(ScrapeError::CoordinatesUnavailable {
                season: current,
                tier,
            })?;
        urls.insert(current, href);
    }

    let resolved: HashMap<u16, String> = seasons
        .iter()
        .filter_map(|season| urls.get(season).map(|url| (*season, url.clone())))
        .collect();
    if let Some(&missing) = seasons.iter().find(|s| !resolved.contains_key(s)) {
        return Err(ScrapeError::CoordinatesUnavailable {
            season: missing,
            tier,
        });
    }
    Ok(resolved)
}

/// Read the five tab-panel URLs of a results hub, in tab order.
///
/// Panels embed their page as an iframe (`src`) or link it (`href`).
pub(crate) fn tab_urls<N: DomNode>(root: &N) -> Result<Vec<(PageKind, String)>> {
    let tab_content = root
        .select_one("div.tab-content")
        .ok_or_else(|| ScrapeError::malformed(PageKind::Results, "missing tab content"))?;

    let panels = descendants_at_depth(&tab_content, 4);
    if panels.len() != PageKind::TABS.len() {
        return Err(ScrapeError::malformed(
            PageKind::Results,
            format!(
                "expected {} tabs, found {}",
                PageKind::TABS.len(),
                panels.len()
            ),
        ));
    }

    PageKind::TABS
        .iter()
        .zip(panels)
        .map(|(kind, panel)| {
            let url = panel
                .attr("src")
                .or_else(|| panel.attr("href"))
                .filter(|url| !url.is_empty())
                .ok_or_else(|| {
                    ScrapeError::malformed(PageKind::Results, format!("missing {kind} tab URL"))
                })?;
            Ok((*kind, url))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn home_page(current_link: &str) -> String {
        format!(
            "<html><body>\
             <div class=\"mx-6 my-0 p-0 main-menu-offcanvas offcanvas-body\">\
             <div><div><div>\
             <a href=\"https://www.svemo.se/vara-sportgrenar/start-speedway/resultat-speedway/\">Resultat Speedway</a>\
             {current_link}\
             <div><div><div><div>\
             <div>\
               <div><p><button><a>2022</a></button></p></div>\
               <div><div><div>\
                 <a href=\"http://ta.test/results-2022-t1\">Bauhausligan</a>\
                 <a href=\"http://ta.test/results-2022-t2\">Allsvenskan</a>\
               </div></div></div>\
             </div>\
             <div>\
               <div><p><button><a>2021</a></button></p></div>\
               <div><div><div>\
                 <a href=\"http://ta.test/results-2021-t1\">Elitserien</a>\
                 <a href=\"http://ta.test/results-2021-t2\">Allsvenskan</a>\
               </div></div></div>\
             </div>\
             </div></div></div></div>\
             </div></div></div>\
             </div>\
             </body></html>"
        )
    }

    #[test]
    fn resolves_previous_season_urls_per_tier() {
        let document = Document::parse(&home_page(""));
        let urls = results_urls(&document.root(), &[2021, 2022], Tier::Elitserien).unwrap();
        assert_eq!(urls[&2022], "http://ta.test/results-2022-t1");
        assert_eq!(urls[&2021], "http://ta.test/results-2021-t1");

        let urls = results_urls(&document.root(), &[2022], Tier::Allsvenskan).unwrap();
        assert_eq!(urls[&2022], "http://ta.test/results-2022-t2");
    }

    #[test]
    fn resolves_current_season_from_results_accordion() {
        let document = Document::parse(&home_page(
            "<a href=\"http://ta.test/results-2023-t1\">Resultat Bauhausligan</a>",
        ));
        let urls = results_urls(&document.root(), &[2023], Tier::Elitserien).unwrap();
        assert_eq!(urls[&2023], "http://ta.test/results-2023-t1");
    }

    #[test]
    fn season_outside_range_is_unavailable() {
        let document = Document::parse(&home_page(""));
        let err = results_urls(&document.root(), &[2019], Tier::Elitserien).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::CoordinatesUnavailable { season: 2019, .. }
        ));

        let err = results_urls(&document.root(), &[2024], Tier::Elitserien).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::CoordinatesUnavailable { season: 2024, .. }
        ));
    }

    #[test]
    fn current_season_without_link_is_unavailable() {
        let document = Document::parse(&home_page(""));
        let err = results_urls(&document.root(), &[2023], Tier::Elitserien).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::CoordinatesUnavailable { season: 2023, .. }
        ));
    }

    #[test]
    fn tab_urls_read_all_five_panels_in_order() {
        let document = Document::parse(
            "<html><body><div class=\"tab-content\">\
             <ul><li><div>\
             <iframe src=\"http://ta.test/events\"></iframe>\
             <iframe src=\"http://ta.test/standings\"></iframe>\
             <iframe src=\"http://ta.test/teams\"></iframe>\
             <iframe src=\"http://ta.test/averages\"></iframe>\
             <a href=\"http://ta.test/attendance\">Attendance</a>\
             </div></li></ul>\
             </div></body></html>",
        );
        let tabs = tab_urls(&document.root()).unwrap();
        assert_eq!(tabs.len(), 5);
        assert_eq!(tabs[0], (PageKind::Events, "http://ta.test/events".to_string()));
        assert_eq!(
            tabs[4],
            (PageKind::Attendance, "http://ta.test/attendance".to_string())
        );
    }

    #[test]
    fn tab_count_mismatch_is_malformed() {
        let document = Document::parse(
            "<html><body><div class=\"tab-content\">\
             <ul><li><div><iframe src=\"x\"></iframe></div></li></ul>\
             </div></body></html>",
        );
        let err = tab_urls(&document.root()).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::MalformedPage {
                kind: PageKind::Results,
                ..
            }
        ));
    }
}
