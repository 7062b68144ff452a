//! Per-category element bags
//!
//! A bag holds the HTML fragments that carry meaningful data for one page
//! category, keyed by fragment role. A role that was not requested, or is
//! optional and absent from the source page, is `None`, a valid state
//! that transforms to an absent model field. Bags carry the session
//! language so the transformation into page models stays a pure function.

use crate::document::Fragment;
use crate::session::Language;

/// Fragment roles of a standings page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandingsPart {
    /// First play-off tree on the page.
    Po1,
    /// Second play-off tree.
    Po2,
    /// Third play-off tree.
    Po3,
    /// Regular season table.
    Regular,
}

/// Fragment roles of an attendance page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttendancePart {
    /// Paragraph holding the average attendance figure.
    Average,
    /// Attendance figures by event.
    Table,
}

/// Fragment roles of a scorecard page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScorecardPart {
    /// Team names and final scores.
    Result,
    /// Attendance figure.
    Attendance,
    /// The heat-by-heat scorecard table.
    Scorecard,
}

/// Fragment roles of a squad page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SquadPart {
    /// Non-guest riders.
    Riders,
    /// Guest riders.
    Guests,
}

/// Parsed events page elements
///
/// `table` lists event information and links to scorecard and heat-data
/// pages; it is assembled from every page of the source site's paginated
/// grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Events {
    pub language: Language,
    pub table: Option<Fragment>,
}

/// Parsed standings page elements
///
/// Play-off trees are optional: the play-off format has changed over the
/// years and some seasons render fewer than three trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standings {
    pub language: Language,
    pub po1: Option<Fragment>,
    pub po2: Option<Fragment>,
    pub po3: Option<Fragment>,
    pub regular: Option<Fragment>,
}

/// Parsed teams page elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teams {
    pub language: Language,
    pub table: Option<Fragment>,
}

/// Parsed rider averages page elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiderAverages {
    pub language: Language,
    pub table: Option<Fragment>,
}

/// Parsed attendance page elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendance {
    pub language: Language,
    /// `<p>` holding the average attendance figure.
    pub average: Option<Fragment>,
    /// `<table>` of event-specific attendance figures.
    pub table: Option<Fragment>,
}

/// Parsed scorecard page elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scorecard {
    pub language: Language,
    /// `<div>` with full team names and final scores.
    pub result: Option<Fragment>,
    /// `<h3>` with the attendance figure.
    pub attendance: Option<Fragment>,
    /// The scorecard `<table>`.
    pub scorecard: Option<Fragment>,
}

/// Parsed squad page elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Squad {
    pub language: Language,
    pub riders: Option<Fragment>,
    pub guests: Option<Fragment>,
}
