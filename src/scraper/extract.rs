//! Per-category element extraction
//!
//! One function per page category, projecting a parsed document onto the
//! category's fragment roles. Optional roles extract to `None` when the
//! source page lacks them; mandatory roles missing from the page mean the
//! layout diverged from the expected shape and fail with `MalformedPage`.

use crate::document::{DomNode, Fragment};
use crate::pgelements as pg;
use crate::session::{Language, PageKind};
use crate::{Result, ScrapeError};

/// The grid class the site uses for every data table.
pub(crate) const MASTER_TABLE: &str = "table.rgMasterTable";

fn mandatory<N: DomNode>(root: &N, selector: &str, kind: PageKind, role: &str) -> Result<Fragment> {
    root.select_one(selector)
        .map(|node| Fragment::capture(&node))
        .ok_or_else(|| ScrapeError::malformed(kind, format!("missing expected {role}")))
}

/// Standings: up to three play-off trees (optional; the play-off format
/// varies by season) and the regular season table.
pub(crate) fn standings<N: DomNode>(
    root: &N,
    language: Language,
    parts: &[pg::StandingsPart],
) -> Result<pg::Standings> {
    let mut bag = pg::Standings {
        language,
        po1: None,
        po2: None,
        po3: None,
        regular: None,
    };
    for part in parts {
        match part {
            pg::StandingsPart::Po1 => bag.po1 = playoff_tree(root, 0),
            pg::StandingsPart::Po2 => bag.po2 = playoff_tree(root, 1),
            pg::StandingsPart::Po3 => bag.po3 = playoff_tree(root, 2),
            pg::StandingsPart::Regular => {
                bag.regular = Some(regular_table(root)?);
            }
        }
    }
    Ok(bag)
}

/// The play-off tables carry no distinguishing attributes of their own;
/// their repeater `<div>` ancestors do.
fn playoff_tree<N: DomNode>(root: &N, index: usize) -> Option<Fragment> {
    let selector = format!("div#ctl00_Body_Repeater1_ctl0{index}_RadTreeList1 table");
    root.select_one(&selector).map(|t| Fragment::capture(&t))
}

/// The regular season table is the master grid outside the play-off
/// repeater.
fn regular_table<N: DomNode>(root: &N) -> Result<Fragment> {
    root.select_all(MASTER_TABLE)
        .into_iter()
        .find(|table| !has_repeater_ancestor(table))
        .map(|t| Fragment::capture(&t))
        .ok_or_else(|| {
            ScrapeError::malformed(PageKind::Standings, "missing expected regular season table")
        })
}

fn has_repeater_ancestor<N: DomNode>(node: &N) -> bool {
    let mut current = node.parent_element();
    while let Some(element) = current {
        if element
            .attr("id")
            .is_some_and(|id| id.starts_with("ctl00_Body_Repeater1"))
        {
            return true;
        }
        current = element.parent_element();
    }
    false
}

pub(crate) fn teams<N: DomNode>(root: &N, language: Language) -> Result<pg::Teams> {
    Ok(pg::Teams {
        language,
        table: Some(mandatory(root, MASTER_TABLE, PageKind::Teams, "teams table")?),
    })
}

pub(crate) fn rider_averages<N: DomNode>(root: &N, language: Language) -> Result<pg::RiderAverages> {
    Ok(pg::RiderAverages {
        language,
        table: Some(mandatory(
            root,
            MASTER_TABLE,
            PageKind::RiderAverages,
            "rider averages table",
        )?),
    })
}

/// Attendance: the average figure lives in the first paragraph carrying a
/// bold label; the per-event figures in the master grid.
pub(crate) fn attendance<N: DomNode>(
    root: &N,
    language: Language,
    parts: &[pg::AttendancePart],
) -> Result<pg::Attendance> {
    let mut bag = pg::Attendance {
        language,
        average: None,
        table: None,
    };
    for part in parts {
        match part {
            pg::AttendancePart::Average => {
                let paragraph = root
                    .select_all("p")
                    .into_iter()
                    .find(|p| p.child_elements().iter().any(|c| c.tag() == "b"))
                    .ok_or_else(|| {
                        ScrapeError::malformed(
                            PageKind::Attendance,
                            "missing expected average paragraph",
                        )
                    })?;
                bag.average = Some(Fragment::capture(&paragraph));
            }
            pg::AttendancePart::Table => {
                bag.table = Some(mandatory(
                    root,
                    MASTER_TABLE,
                    PageKind::Attendance,
                    "attendance table",
                )?);
            }
        }
    }
    Ok(bag)
}

pub(crate) fn scorecard<N: DomNode>(
    root: &N,
    language: Language,
    parts: &[pg::ScorecardPart],
) -> Result<pg::Scorecard> {
    let mut bag = pg::Scorecard {
        language,
        result: None,
        attendance: None,
        scorecard: None,
    };
    for part in parts {
        match part {
            pg::ScorecardPart::Result => {
                bag.result = Some(mandatory(
                    root,
                    "div.floatLeft",
                    PageKind::Scorecard,
                    "result division",
                )?);
            }
            pg::ScorecardPart::Attendance => {
                bag.attendance = Some(mandatory(
                    root,
                    "h3",
                    PageKind::Scorecard,
                    "attendance heading",
                )?);
            }
            pg::ScorecardPart::Scorecard => {
                bag.scorecard = Some(mandatory(
                    root,
                    MASTER_TABLE,
                    PageKind::Scorecard,
                    "scorecard table",
                )?);
            }
        }
    }
    Ok(bag)
}

/// Squad: riders grid is mandatory; the guests grid is not rendered for
/// every team.
pub(crate) fn squad<N: DomNode>(
    root: &N,
    language: Language,
    parts: &[pg::SquadPart],
) -> Result<pg::Squad> {
    let mut bag = pg::Squad {
        language,
        riders: None,
        guests: None,
    };
    for part in parts {
        match part {
            pg::SquadPart::Riders => {
                bag.riders = Some(mandatory(
                    root,
                    "div#ctl00_Body_RadGrid1 table",
                    PageKind::Squad,
                    "riders table",
                )?);
            }
            pg::SquadPart::Guests => {
                bag.guests = root
                    .select_one("div#ctl00_Body_RadGrid2 table")
                    .map(|t| Fragment::capture(&t));
            }
        }
    }
    Ok(bag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::pgelements::{AttendancePart, ScorecardPart, SquadPart, StandingsPart};

    #[test]
    fn attendance_extracts_requested_parts_only() {
        let document = Document::parse(
            "<html><body>\
             <p><b>Average:</b> 2 448</p>\
             <table class=\"rgMasterTable\"><tbody><tr><td>x</td></tr></tbody></table>\
             </body></html>",
        );
        let bag = attendance(
            &document.root(),
            Language::SvSe,
            &[AttendancePart::Average],
        )
        .unwrap();
        assert!(bag.average.is_some());
        assert!(bag.table.is_none());
    }

    #[test]
    fn attendance_missing_average_is_malformed() {
        let document = Document::parse("<html><body><p>no bold label</p></body></html>");
        let err = attendance(
            &document.root(),
            Language::SvSe,
            &[AttendancePart::Average],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::MalformedPage {
                kind: PageKind::Attendance,
                ..
            }
        ));
    }

    #[test]
    fn standings_missing_playoff_tree_is_absent() {
        let document = Document::parse(
            "<html><body>\
             <div id=\"ctl00_Body_Repeater1_ctl00_RadTreeList1\"><table><tbody>\
             <tr><td>Semifinal</td></tr></tbody></table></div>\
             <table class=\"rgMasterTable\"><tbody><tr><td>r</td></tr></tbody></table>\
             </body></html>",
        );
        let bag = standings(
            &document.root(),
            Language::EnUs,
            &[
                StandingsPart::Po1,
                StandingsPart::Po3,
                StandingsPart::Regular,
            ],
        )
        .unwrap();
        assert!(bag.po1.is_some());
        assert!(bag.po2.is_none());
        assert!(bag.po3.is_none());
        assert!(bag.regular.is_some());
    }

    #[test]
    fn regular_table_skips_playoff_grids() {
        let document = Document::parse(
            "<html><body>\
             <div id=\"ctl00_Body_Repeater1_ctl00_RadTreeList1\">\
             <table class=\"rgMasterTable\"><tbody><tr><td>po</td></tr></tbody></table></div>\
             <table class=\"rgMasterTable\"><tbody><tr><td>regular</td></tr></tbody></table>\
             </body></html>",
        );
        let bag = standings(&document.root(), Language::EnUs, &[StandingsPart::Regular]).unwrap();
        let fragment = bag.regular.unwrap();
        assert!(fragment.html().contains("regular"));
        assert!(!fragment.html().contains("po"));
    }

    #[test]
    fn squad_guests_grid_is_optional() {
        let document = Document::parse(
            "<html><body>\
             <div id=\"ctl00_Body_RadGrid1\"><table><tbody><tr><td>rider</td></tr></tbody></table></div>\
             </body></html>",
        );
        let bag = squad(
            &document.root(),
            Language::SvSe,
            &[SquadPart::Riders, SquadPart::Guests],
        )
        .unwrap();
        assert!(bag.riders.is_some());
        assert!(bag.guests.is_none());
    }

    #[test]
    fn scorecard_requires_requested_fragments() {
        let document = Document::parse("<html><body><h3>Publik: 1 234</h3></body></html>");
        let bag = scorecard(
            &document.root(),
            Language::SvSe,
            &[ScorecardPart::Attendance],
        )
        .unwrap();
        assert!(bag.attendance.is_some());

        let err = scorecard(&document.root(), Language::SvSe, &[ScorecardPart::Result]);
        assert!(err.is_err());
    }

    #[test]
    fn teams_table_is_mandatory() {
        let document = Document::parse("<html><body></body></html>");
        assert!(teams(&document.root(), Language::SvSe).is_err());
    }
}
