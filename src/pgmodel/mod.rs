//! Typed page models
//!
//! Each model is the transformed, immutable form of one page category's
//! element bag. Transformation is a pure function: the same bag always
//! yields the same model. Field semantics:
//!
//! - a fragment role absent from the bag yields an absent (`None`) field,
//! - a present-but-empty table yields an empty row sequence (`Some` of an
//!   empty vector), distinct from absent,
//! - a row either parses fully into its typed fields or the whole
//!   transformation fails with `MalformedPage`; rows are never silently
//!   dropped or half-filled.
//!
//! Numeric text is parsed per the bag's language, since the page language
//! governs the site's number formatting (see [`numeric`]).

pub mod numeric;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::document::{DomNode, Fragment};
use crate::element::{
    body_rows, first_anchor_href, first_stripped_text, row_cells, text_grid, text_grid_normalized,
};
use crate::pgelements as pg;
use crate::session::{Language, PageKind};
use crate::{Result, ScrapeError};

fn malformed(kind: PageKind, detail: impl Into<String>) -> ScrapeError {
    ScrapeError::malformed(kind, detail)
}

/// Parse a captured table fragment into a text grid of its body rows.
fn table_grid(fragment: &Fragment, kind: PageKind, normalize_nbsp: bool) -> Result<Vec<Vec<String>>> {
    let document = fragment.parse();
    let root = document.root();
    let table = root
        .select_one("table")
        .ok_or_else(|| malformed(kind, "fragment is not a table"))?;
    let grid = if normalize_nbsp {
        text_grid_normalized(&table)
    } else {
        text_grid(&table)
    };
    grid.ok_or_else(|| malformed(kind, "table is missing tbody"))
}

/// Transformed attendance page data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attendance {
    /// Average attendance figure for the season.
    pub average: Option<u32>,
    /// Per-event attendance rows.
    pub table: Option<Vec<Vec<String>>>,
}

impl Attendance {
    pub fn from_pgelements(data: &pg::Attendance) -> Result<Self> {
        let average = match &data.average {
            Some(fragment) => Some(average_figure(fragment, data.language)?),
            None => None,
        };
        let table = match &data.table {
            Some(fragment) => Some(table_grid(fragment, PageKind::Attendance, false)?),
            None => None,
        };
        Ok(Self { average, table })
    }
}

/// The figure sits in the paragraph text right after the bold label.
fn average_figure(fragment: &Fragment, language: Language) -> Result<u32> {
    let document = fragment.parse();
    paragraph_figure(&document.root(), language)
}

fn paragraph_figure<N: DomNode>(root: &N, language: Language) -> Result<u32> {
    let paragraph = root
        .select_one("p")
        .ok_or_else(|| malformed(PageKind::Attendance, "average fragment is not a paragraph"))?;
    let label = paragraph
        .select_one("b")
        .ok_or_else(|| malformed(PageKind::Attendance, "missing expected <b> label"))?
        .text();
    let text = paragraph.text();
    let tail = match text.find(&label) {
        Some(position) => &text[position + label.len()..],
        None => text.as_str(),
    };
    numeric::integer_in(tail, language)
        .ok_or_else(|| malformed(PageKind::Attendance, "unparsable average attendance figure"))
}

/// Transformed rider averages page data
///
/// Non-breaking spaces are replaced with plain spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiderAverages {
    pub table: Option<Vec<Vec<String>>>,
}

impl RiderAverages {
    pub fn from_pgelements(data: &pg::RiderAverages) -> Result<Self> {
        let table = match &data.table {
            Some(fragment) => Some(table_grid(fragment, PageKind::RiderAverages, true)?),
            None => None,
        };
        Ok(Self { table })
    }
}

/// One row of the events table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRow {
    pub date: String,
    pub name: String,
    /// Link to the event's scorecard page, as found on the page.
    pub scorecard_url: Option<String>,
    /// Link to the event's heat statistics page, as found on the page.
    pub heat_stats_url: Option<String>,
}

/// Transformed events page data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Events {
    pub table: Option<Vec<EventRow>>,
}

impl Events {
    pub fn from_pgelements(data: &pg::Events) -> Result<Self> {
        let table = match &data.table {
            Some(fragment) => Some(event_rows(fragment)?),
            None => None,
        };
        Ok(Self { table })
    }
}

fn event_rows(fragment: &Fragment) -> Result<Vec<EventRow>> {
    let document = fragment.parse();
    let root = document.root();
    let table = root
        .select_one("table")
        .ok_or_else(|| malformed(PageKind::Events, "fragment is not a table"))?;
    let rows = body_rows(&table)
        .ok_or_else(|| malformed(PageKind::Events, "table is missing tbody"))?;

    rows.iter()
        .map(|row| {
            let cells = row_cells(row);
            if cells.len() != 4 {
                return Err(malformed(
                    PageKind::Events,
                    format!("event row has {} columns, expected 4", cells.len()),
                ));
            }
            Ok(EventRow {
                date: first_stripped_text(&cells[0]),
                name: first_stripped_text(&cells[1]),
                scorecard_url: first_anchor_href(&cells[2]),
                heat_stats_url: first_anchor_href(&cells[3]),
            })
        })
        .collect()
}

/// A team's name and final score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamScore {
    pub name: String,
    pub points: u32,
}

/// Final result of one event
///
/// The ordering of the two teams follows the source page and is
/// language-dependent: Swedish pages list the home team first, English
/// pages the away team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub team1: TeamScore,
    pub team2: TeamScore,
}

/// Transformed scorecard page data
///
/// In `scorecard`, a rider's heat cell is rendered as
/// `helmet color/result/gate` (e.g. `"B/0/4"`). The source data is
/// inconsistent about where the helmet color character lives; that is
/// handled internally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scorecard {
    pub result: Option<MatchResult>,
    pub attendance: Option<u32>,
    pub scorecard: Option<Vec<Vec<String>>>,
}

impl Scorecard {
    pub fn from_pgelements(data: &pg::Scorecard) -> Result<Self> {
        let result = match &data.result {
            Some(fragment) => Some(match_result(fragment, data.language)?),
            None => None,
        };
        let attendance = match &data.attendance {
            Some(fragment) => Some(attendance_figure(fragment, data.language)?),
            None => None,
        };
        let scorecard = match &data.scorecard {
            Some(fragment) => Some(heat_grid(fragment)?),
            None => None,
        };
        Ok(Self {
            result,
            attendance,
            scorecard,
        })
    }
}

fn match_result(fragment: &Fragment, language: Language) -> Result<MatchResult> {
    let document = fragment.parse();
    let root = document.root();
    let headings = root.select_all("h2");
    if headings.len() != 4 {
        return Err(malformed(
            PageKind::Scorecard,
            format!("expected 4 <h2> elements, got {}", headings.len()),
        ));
    }
    let texts: Vec<String> = headings.iter().map(first_stripped_text).collect();
    if texts.iter().any(String::is_empty) {
        return Err(malformed(
            PageKind::Scorecard,
            "unable to extract text from all <h2> elements",
        ));
    }
    let score = |text: &str| {
        numeric::parse_integer(text, language).ok_or_else(|| {
            malformed(PageKind::Scorecard, format!("unparsable score {text:?}"))
        })
    };
    Ok(MatchResult {
        team1: TeamScore {
            name: texts[0].clone(),
            points: score(&texts[1])?,
        },
        team2: TeamScore {
            name: texts[2].clone(),
            points: score(&texts[3])?,
        },
    })
}

fn attendance_figure(fragment: &Fragment, language: Language) -> Result<u32> {
    let document = fragment.parse();
    let root = document.root();
    let text = first_stripped_text(&root);
    numeric::integer_in(&text, language)
        .ok_or_else(|| malformed(PageKind::Scorecard, "unable to extract attendance figure"))
}

fn heat_grid(fragment: &Fragment) -> Result<Vec<Vec<String>>> {
    let document = fragment.parse();
    let root = document.root();
    let table = root
        .select_one("table")
        .ok_or_else(|| malformed(PageKind::Scorecard, "fragment is not a table"))?;
    let rows = body_rows(&table)
        .ok_or_else(|| malformed(PageKind::Scorecard, "table is missing tbody"))?;

    rows.iter()
        .map(|row| row_cells(row).iter().map(heat_cell).collect())
        .collect()
}

/// Rider cells nest a small schema table; its first row holds the helmet
/// color, result, and gate divisions. A non-breaking space in the color
/// slot means the color sits in the second row instead.
fn heat_cell<N: DomNode>(cell: &N) -> Result<String> {
    let Some(schema) = cell.select_one("table.DriverSchema") else {
        return Ok(first_stripped_text(cell));
    };

    let rows = schema.select_all("tr");
    let divisions = rows
        .first()
        .map(|row| row.select_all("div"))
        .unwrap_or_default();
    if divisions.is_empty() {
        return Err(malformed(
            PageKind::Scorecard,
            "driver schema without data divisions",
        ));
    }

    let mut parts: Vec<String> = divisions.iter().map(first_stripped_text).collect();
    if parts[0].is_empty() {
        if let Some(color) = rows
            .get(1)
            .and_then(|row| row.select_one("div"))
            .map(|div| first_stripped_text(&div))
        {
            parts[0] = color;
        }
    }
    Ok(parts.join("/"))
}

/// Transformed squad page data
///
/// Non-breaking spaces are replaced with plain spaces. A guests grid
/// consisting only of the site's "no records" row is an empty sequence,
/// distinct from an absent guests fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Squad {
    pub riders: Option<Vec<Vec<String>>>,
    pub guests: Option<Vec<Vec<String>>>,
}

impl Squad {
    pub fn from_pgelements(data: &pg::Squad) -> Result<Self> {
        let riders = match &data.riders {
            Some(fragment) => Some(table_grid(fragment, PageKind::Squad, true)?),
            None => None,
        };
        let guests = match &data.guests {
            Some(fragment) => Some(guest_rows(fragment)?),
            None => None,
        };
        Ok(Self { riders, guests })
    }
}

fn guest_rows(fragment: &Fragment) -> Result<Vec<Vec<String>>> {
    let document = fragment.parse();
    let no_records = document.root().select_one("tr.rgNoRecords").is_some();
    if no_records {
        return Ok(Vec::new());
    }
    table_grid(fragment, PageKind::Squad, true)
}

/// One event record flattened out of a play-off tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayoffRecord {
    /// Round label, e.g. "Semifinal 1".
    pub round: String,
    /// Event date as rendered (ISO).
    pub date: String,
    pub home_team: String,
    pub home_score: u32,
    pub away_team: String,
    pub away_score: u32,
}

/// Transformed standings page data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standings {
    pub po1: Option<Vec<PlayoffRecord>>,
    pub po2: Option<Vec<PlayoffRecord>>,
    pub po3: Option<Vec<PlayoffRecord>>,
    /// Regular season table rows.
    pub regular: Option<Vec<Vec<String>>>,
}

impl Standings {
    pub fn from_pgelements(data: &pg::Standings) -> Result<Self> {
        let tree = |fragment: &Option<Fragment>| -> Result<Option<Vec<PlayoffRecord>>> {
            match fragment {
                Some(fragment) => Ok(Some(playoff_records(fragment, data.language)?)),
                None => Ok(None),
            }
        };
        Ok(Self {
            po1: tree(&data.po1)?,
            po2: tree(&data.po2)?,
            po3: tree(&data.po3)?,
            regular: match &data.regular {
                Some(fragment) => Some(table_grid(fragment, PageKind::Standings, false)?),
                None => None,
            },
        })
    }
}

/// Flatten a play-off tree into event records.
///
/// The tree renders as an indented sequence of text fragments: a round
/// label, then one date per event followed by home team, home score, away
/// team, away score. The home team carries a redundant "(H...)" suffix
/// which is stripped.
fn playoff_records(fragment: &Fragment, language: Language) -> Result<Vec<PlayoffRecord>> {
    static HOME_PAREN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r" \(H[^)]*\)$").expect("static pattern"));
    static ISO_DATE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("static pattern"));

    // Date, home team, home score, away team, away score.
    const EVENT_FIELDS: usize = 5;

    let document = fragment.parse();
    let texts: Vec<String> = document
        .root()
        .texts()
        .iter()
        .map(|t| HOME_PAREN.replace(t, "").into_owned())
        .collect();

    let date_positions: Vec<usize> = texts
        .iter()
        .enumerate()
        .filter(|(_, t)| ISO_DATE.is_match(t))
        .map(|(i, _)| i)
        .collect();

    let Some(&first_date) = date_positions.first() else {
        return Err(malformed(
            PageKind::Standings,
            "play-off tree without event dates",
        ));
    };
    if first_date == 0 {
        return Err(malformed(
            PageKind::Standings,
            "play-off tree without a round label",
        ));
    }

    let mut round = texts[first_date - 1].clone();
    let mut records = Vec::new();

    for (i, &position) in date_positions.iter().enumerate() {
        if position + EVENT_FIELDS > texts.len() {
            return Err(malformed(PageKind::Standings, "truncated play-off event"));
        }
        let event = &texts[position..position + EVENT_FIELDS];
        let score = |text: &str| {
            numeric::parse_integer(text, language).ok_or_else(|| {
                malformed(PageKind::Standings, format!("unparsable score {text:?}"))
            })
        };
        records.push(PlayoffRecord {
            round: round.clone(),
            date: event[0].clone(),
            home_team: event[1].clone(),
            home_score: score(&event[2])?,
            away_team: event[3].clone(),
            away_score: score(&event[4])?,
        });

        if let Some(&next) = date_positions.get(i + 1) {
            if next - position > EVENT_FIELDS {
                round = texts[next - 1].clone();
            }
        }
    }

    Ok(records)
}

/// One row of the teams table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamRow {
    pub name: String,
    /// The middle columns, whose headers are locale-dependent.
    pub cells: Vec<String>,
    /// Link to the team's squad page, as found on the page.
    pub squad_url: Option<String>,
}

/// Transformed teams page data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Teams {
    pub table: Option<Vec<TeamRow>>,
}

impl Teams {
    pub fn from_pgelements(data: &pg::Teams) -> Result<Self> {
        let table = match &data.table {
            Some(fragment) => Some(team_rows(fragment)?),
            None => None,
        };
        Ok(Self { table })
    }
}

fn team_rows(fragment: &Fragment) -> Result<Vec<TeamRow>> {
    let document = fragment.parse();
    let root = document.root();
    let table = root
        .select_one("table")
        .ok_or_else(|| malformed(PageKind::Teams, "fragment is not a table"))?;
    let rows = body_rows(&table)
        .ok_or_else(|| malformed(PageKind::Teams, "table is missing tbody"))?;

    rows.iter()
        .map(|row| {
            let cells = row_cells(row);
            if cells.len() != 4 {
                return Err(malformed(
                    PageKind::Teams,
                    format!("team row has {} columns, expected 4", cells.len()),
                ));
            }
            Ok(TeamRow {
                name: first_stripped_text(&cells[0]),
                cells: cells[1..3].iter().map(first_stripped_text).collect(),
                squad_url: first_anchor_href(&cells[3]),
            })
        })
        .collect()
}
