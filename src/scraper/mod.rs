//! The scraper: session launch and per-category page fetching
//!
//! [`SvemoScraper`] is the crate's entry point. It is constructed around a
//! shared [`Transport`], launched once for a fixed set of coordinates
//! (seasons, tier, language), and then serves any number of concurrent
//! fetches. Each fetch resolves a page category to a URL through the
//! session's locator table, performs the request, and reduces the response
//! to a per-category element bag.
//!
//! Two-hop categories (scorecards, squads) first consult the parent table
//! (events, teams), follow the anchors of the rows the caller selected,
//! and fetch all children concurrently. Failures inside such a batch are
//! reported per child; one missing link never aborts its siblings.

mod browse;
pub(crate) mod extract;
mod launch;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use futures::future::join_all;
use url::Url;

use crate::config::ScraperConfig;
use crate::document::{Document, DomNode, Fragment};
use crate::element::{body_rows, first_anchor_href, first_stripped_text, row_cells};
use crate::pgelements as pg;
use crate::session::{Language, PageKind, SessionState, Tier, FIRST_AVAILABLE_SEASON};
use crate::transport::{Request, Transport};
use crate::{Result, ScrapeError};

/// Identifies one event row of an events table: its date and name columns
/// as rendered by the source site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKey {
    pub date: String,
    pub name: String,
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.name)
    }
}

type Predicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Row selection for two-hop batch fetches
///
/// Predicates receive column text exactly as rendered by the source site.
/// An unset predicate matches everything. Scorecard batches consult both
/// predicates (events date and name columns); squad batches consult only
/// `name` (the team column).
#[derive(Default)]
pub struct RowFilter {
    date: Option<Predicate>,
    name: Option<Predicate>,
}

impl RowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only rows whose date column satisfies `predicate`.
    pub fn date(mut self, predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.date = Some(Box::new(predicate));
        self
    }

    /// Keep only rows whose name column satisfies `predicate`.
    pub fn name(mut self, predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.name = Some(Box::new(predicate));
        self
    }

    fn matches(&self, date: &str, name: &str) -> bool {
        self.date.as_ref().map_or(true, |p| p(date)) && self.matches_name(name)
    }

    fn matches_name(&self, name: &str) -> bool {
        self.name.as_ref().map_or(true, |p| p(name))
    }
}

impl fmt::Debug for RowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowFilter")
            .field("date", &self.date.is_some())
            .field("name", &self.name.is_some())
            .finish()
    }
}

/// An asynchronous scraper for SVEMO speedway data
///
/// The scraper holds the transport behind its trait only and never manages
/// its lifecycle; the caller creates and owns the underlying HTTP client.
/// All fetch operations take `&self` and may run concurrently; the session
/// state is fixed at launch and read-only afterwards.
pub struct SvemoScraper {
    transport: Arc<dyn Transport>,
    config: ScraperConfig,
    session: Option<SessionState>,
    /// Tables kept for reuse by two-hop fetches within this session.
    cache: Mutex<HashMap<(PageKind, u16), Fragment>>,
}

impl SvemoScraper {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, ScraperConfig::default())
    }

    pub fn with_config(transport: Arc<dyn Transport>, config: ScraperConfig) -> Self {
        Self {
            transport,
            config,
            session: None,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Whether a launch has completed successfully.
    pub fn is_launched(&self) -> bool {
        self.session.is_some()
    }

    /// Launch the scraper for the given coordinates.
    ///
    /// Validates the seasons, fixes the base headers and language cookie,
    /// and resolves the locator table for every requested season: one
    /// results hub per season from the home page, then the five data-page
    /// tab URLs from each hub.
    ///
    /// Launching is all-or-nothing: any failure leaves the scraper
    /// unlaunched. Re-launching is permitted and replaces the previous
    /// session entirely.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::CoordinatesUnavailable`] when a season has no
    /// results page for the tier, [`ScrapeError::TransportFailure`] when a
    /// lookup request fails, [`ScrapeError::MalformedPage`] when a
    /// navigation page no longer has the expected shape.
    pub async fn launch(
        &mut self,
        season: u16,
        additional_seasons: &[u16],
        tier: Tier,
        language: Language,
    ) -> Result<()> {
        self.session = None;
        self.cache.lock().unwrap().clear();

        let mut seasons: Vec<u16> = std::iter::once(season)
            .chain(additional_seasons.iter().copied())
            .collect();
        seasons.sort_unstable();
        seasons.dedup();

        if let Some(&early) = seasons.iter().find(|s| **s < FIRST_AVAILABLE_SEASON) {
            return Err(ScrapeError::CoordinatesUnavailable {
                season: early,
                tier,
            });
        }

        tracing::info!(?seasons, %tier, %language, "launching scraper");

        let mut state = SessionState::base(seasons.clone(), tier, language);

        let body = self
            .get_text(&state, &self.config.home_url, PageKind::Home)
            .await?;
        let results_urls = {
            let document = Document::parse(&body);
            launch::results_urls(&document.root(), &seasons, tier)?
        };

        let this = &*self;
        let state_ref = &state;
        let hub_fetches = results_urls.iter().map(|(&season, url)| async move {
            let body = this.get_text(state_ref, url, PageKind::Results).await?;
            let document = Document::parse(&body);
            let tabs = launch::tab_urls(&document.root())?;
            Ok::<_, ScrapeError>((season, tabs))
        });
        let hubs = join_all(hub_fetches).await;

        for hub in hubs {
            let (season, tabs) = hub?;
            for (kind, url) in tabs {
                let url = self.absolutize(&url)?;
                state.locators.insert((kind, season), url);
            }
        }

        self.session = Some(state);
        tracing::info!("scraper launched");
        Ok(())
    }

    /// Fetch events page elements for `season`.
    ///
    /// The events grid is paginated; every page is walked and the rows are
    /// merged into a single table fragment.
    pub async fn events(&self, season: u16) -> Result<pg::Events> {
        self.events_inner(season, false).await
    }

    /// Like [`events`](Self::events), additionally keeping the table for
    /// reuse by [`scorecards`](Self::scorecards) within this session.
    pub async fn events_cached(&self, season: u16) -> Result<pg::Events> {
        self.events_inner(season, true).await
    }

    /// Fetch standings page elements for `season`.
    ///
    /// Play-off parts absent from the page extract as absent; the
    /// play-off format has varied over the seasons.
    pub async fn standings(
        &self,
        season: u16,
        parts: &[pg::StandingsPart],
    ) -> Result<pg::Standings> {
        let state = self.state()?;
        let url = self.locator(state, PageKind::Standings, season)?;
        let body = self.get_text(state, &url, PageKind::Standings).await?;
        let document = Document::parse(&body);
        extract::standings(&document.root(), state.language, parts)
    }

    /// Fetch teams page elements for `season`.
    pub async fn teams(&self, season: u16) -> Result<pg::Teams> {
        self.teams_inner(season, false).await
    }

    /// Like [`teams`](Self::teams), additionally keeping the table for
    /// reuse by [`squads`](Self::squads) within this session.
    pub async fn teams_cached(&self, season: u16) -> Result<pg::Teams> {
        self.teams_inner(season, true).await
    }

    /// Fetch rider averages page elements for `season`.
    pub async fn rider_averages(&self, season: u16) -> Result<pg::RiderAverages> {
        let state = self.state()?;
        let url = self.locator(state, PageKind::RiderAverages, season)?;
        let body = self.get_text(state, &url, PageKind::RiderAverages).await?;
        let document = Document::parse(&body);
        extract::rider_averages(&document.root(), state.language)
    }

    /// Fetch attendance page elements for `season`, limited to the
    /// requested `parts`.
    pub async fn attendance(
        &self,
        season: u16,
        parts: &[pg::AttendancePart],
    ) -> Result<pg::Attendance> {
        let state = self.state()?;
        let url = self.locator(state, PageKind::Attendance, season)?;
        let body = self.get_text(state, &url, PageKind::Attendance).await?;
        let document = Document::parse(&body);
        extract::attendance(&document.root(), state.language, parts)
    }

    /// Fetch elements from every scorecard page linked by the events table
    /// of `season`.
    ///
    /// Rows are narrowed by `filter` (events date and name columns); each
    /// surviving row's scorecard anchor is followed and the child pages
    /// are fetched concurrently. The result order is unspecified; sort by
    /// key if a particular order is needed.
    ///
    /// Failures are per child: a row without a scorecard link yields
    /// [`ScrapeError::PageNotFound`] for that key, a failing child request
    /// yields its own error, and neither prevents the other children from
    /// being returned.
    pub async fn scorecards(
        &self,
        season: u16,
        parts: &[pg::ScorecardPart],
        filter: &RowFilter,
    ) -> Result<Vec<(EventKey, Result<pg::Scorecard>)>> {
        let state = self.state()?;
        let table = self.parent_table(season, PageKind::Events).await?;
        let targets = scorecard_targets(&table, filter)?;

        let fetches = targets.into_iter().map(|(key, href)| async move {
            let outcome = match href {
                Some(href) => self.fetch_scorecard(state, &href, parts).await,
                None => Err(ScrapeError::PageNotFound {
                    kind: PageKind::Scorecard,
                    locator: key.to_string(),
                }),
            };
            if let Err(error) = &outcome {
                tracing::warn!(key = %key, %error, "scorecard fetch failed");
            }
            (key, outcome)
        });

        Ok(join_all(fetches).await)
    }

    /// Fetch elements from every squad page linked by the teams table of
    /// `season`, keyed by team name.
    ///
    /// Only the `name` predicate of `filter` applies (the team column).
    /// Failure semantics match [`scorecards`](Self::scorecards).
    pub async fn squads(
        &self,
        season: u16,
        parts: &[pg::SquadPart],
        filter: &RowFilter,
    ) -> Result<Vec<(String, Result<pg::Squad>)>> {
        let state = self.state()?;
        let table = self.parent_table(season, PageKind::Teams).await?;
        let targets = squad_targets(&table, filter)?;

        let fetches = targets.into_iter().map(|(team, href)| async move {
            let outcome = match href {
                Some(href) => self.fetch_squad(state, &href, parts).await,
                None => Err(ScrapeError::PageNotFound {
                    kind: PageKind::Squad,
                    locator: team.clone(),
                }),
            };
            if let Err(error) = &outcome {
                tracing::warn!(%team, %error, "squad fetch failed");
            }
            (team, outcome)
        });

        Ok(join_all(fetches).await)
    }

    async fn events_inner(&self, season: u16, cache: bool) -> Result<pg::Events> {
        let state = self.state()?;
        let url = self.locator(state, PageKind::Events, season)?;
        let url = browse::with_pagesize(&url, self.config.events_pagesize);
        let table = self.walk_grid(state, &url, PageKind::Events).await?;
        if cache {
            self.cache
                .lock()
                .unwrap()
                .insert((PageKind::Events, season), table.clone());
        }
        Ok(pg::Events {
            language: state.language,
            table: Some(table),
        })
    }

    async fn teams_inner(&self, season: u16, cache: bool) -> Result<pg::Teams> {
        let state = self.state()?;
        let url = self.locator(state, PageKind::Teams, season)?;
        let body = self.get_text(state, &url, PageKind::Teams).await?;
        let bag = {
            let document = Document::parse(&body);
            extract::teams(&document.root(), state.language)?
        };
        if cache {
            if let Some(table) = &bag.table {
                self.cache
                    .lock()
                    .unwrap()
                    .insert((PageKind::Teams, season), table.clone());
            }
        }
        Ok(bag)
    }

    async fn fetch_scorecard(
        &self,
        state: &SessionState,
        href: &str,
        parts: &[pg::ScorecardPart],
    ) -> Result<pg::Scorecard> {
        let url = self.absolutize(href)?;
        let body = self.get_text(state, &url, PageKind::Scorecard).await?;
        let document = Document::parse(&body);
        extract::scorecard(&document.root(), state.language, parts)
    }

    async fn fetch_squad(
        &self,
        state: &SessionState,
        href: &str,
        parts: &[pg::SquadPart],
    ) -> Result<pg::Squad> {
        let url = self.absolutize(href)?;
        let body = self.get_text(state, &url, PageKind::Squad).await?;
        let document = Document::parse(&body);
        extract::squad(&document.root(), state.language, parts)
    }

    /// Parent table for a two-hop fetch: the session cache if the caller
    /// opted in earlier, a fresh fetch otherwise.
    async fn parent_table(&self, season: u16, kind: PageKind) -> Result<Fragment> {
        if let Some(table) = self.cache.lock().unwrap().get(&(kind, season)).cloned() {
            return Ok(table);
        }
        let table = match kind {
            PageKind::Events => self.events_inner(season, false).await?.table,
            PageKind::Teams => self.teams_inner(season, false).await?.table,
            _ => None,
        };
        table.ok_or_else(|| ScrapeError::malformed(kind, "missing expected table"))
    }

    /// Walk every page of a paginated master grid and merge the rows.
    async fn walk_grid(
        &self,
        state: &SessionState,
        url: &str,
        kind: PageKind,
    ) -> Result<Fragment> {
        let limit = self.config.events_pagelimit;
        let mut thead = None;
        let mut rows = Vec::new();
        let mut body = self.get_text(state, url, kind).await?;
        let mut pages = 0u32;

        loop {
            pages += 1;
            if pages > limit {
                return Err(ScrapeError::TablePageLimit { kind, limit });
            }

            let chunk = browse::read_chunk(&body, kind)?;
            if thead.is_none() {
                thead = chunk.thead;
            }
            rows.extend(chunk.rows);

            match chunk.pager {
                Some(pager) if pager.current < pager.last => {
                    let form = vec![
                        ("__EVENTTARGET".to_string(), pager.event_target),
                        ("__VIEWSTATE".to_string(), chunk.viewstate),
                    ];
                    body = self.post_text(state, url, form, kind).await?;
                }
                _ => break,
            }
        }

        Ok(browse::assemble_table(thead, &rows))
    }

    fn state(&self) -> Result<&SessionState> {
        self.session.as_ref().ok_or(ScrapeError::NotLaunched)
    }

    fn locator(&self, state: &SessionState, kind: PageKind, season: u16) -> Result<String> {
        state
            .locator(kind, season)
            .map(str::to_string)
            .ok_or(ScrapeError::CoordinatesUnavailable {
                season,
                tier: state.tier,
            })
    }

    fn absolutize(&self, href: &str) -> Result<String> {
        let base = Url::parse(&self.config.ta_url)
            .map_err(|e| ScrapeError::transport(&self.config.ta_url, Box::new(e)))?;
        base.join(href)
            .map(String::from)
            .map_err(|e| ScrapeError::transport(href, Box::new(e)))
    }

    async fn get_text(&self, state: &SessionState, url: &str, kind: PageKind) -> Result<String> {
        tracing::debug!(%kind, url, "fetching page");
        let request = Request::get(url).headers(&state.request_headers());
        self.send(request).await
    }

    async fn post_text(
        &self,
        state: &SessionState,
        url: &str,
        form: Vec<(String, String)>,
        kind: PageKind,
    ) -> Result<String> {
        tracing::debug!(%kind, url, "posting page form");
        let request = Request::post_form(url, form).headers(&state.request_headers());
        self.send(request).await
    }

    async fn send(&self, request: Request) -> Result<String> {
        let url = request.url.clone();
        let response = self
            .transport
            .request(request)
            .await
            .map_err(|source| ScrapeError::transport(&url, source))?;
        if !response.is_success() {
            return Err(ScrapeError::status(&url, response.status));
        }
        Ok(response.text())
    }
}

/// Read (key, scorecard link) pairs from an events table for the rows
/// selected by `filter`. A selected row without an anchor in the link
/// column keeps its key and maps to `None`.
fn scorecard_targets(
    table: &Fragment,
    filter: &RowFilter,
) -> Result<Vec<(EventKey, Option<String>)>> {
    let document = table.parse();
    let root = document.root();
    let table_node = root
        .select_one("table")
        .ok_or_else(|| ScrapeError::malformed(PageKind::Events, "missing expected table"))?;
    let rows = body_rows(&table_node)
        .ok_or_else(|| ScrapeError::malformed(PageKind::Events, "table is missing tbody"))?;

    let mut targets = Vec::new();
    for row in rows {
        let cells = row_cells(&row);
        if cells.len() < 3 {
            return Err(ScrapeError::malformed(
                PageKind::Events,
                "event row with too few columns",
            ));
        }
        let date = first_stripped_text(&cells[0]);
        let name = first_stripped_text(&cells[1]);
        if !filter.matches(&date, &name) {
            continue;
        }
        let href = first_anchor_href(&cells[2]);
        targets.push((EventKey { date, name }, href));
    }
    Ok(targets)
}

/// Read (team, squad link) pairs from a teams table for the rows selected
/// by `filter`.
fn squad_targets(table: &Fragment, filter: &RowFilter) -> Result<Vec<(String, Option<String>)>> {
    let document = table.parse();
    let root = document.root();
    let table_node = root
        .select_one("table")
        .ok_or_else(|| ScrapeError::malformed(PageKind::Teams, "missing expected table"))?;
    let rows = body_rows(&table_node)
        .ok_or_else(|| ScrapeError::malformed(PageKind::Teams, "table is missing tbody"))?;

    let mut targets = Vec::new();
    for row in rows {
        let cells = row_cells(&row);
        if cells.len() < 4 {
            return Err(ScrapeError::malformed(
                PageKind::Teams,
                "team row with too few columns",
            ));
        }
        let team = first_stripped_text(&cells[0]);
        if !filter.matches_name(&team) {
            continue;
        }
        let href = first_anchor_href(&cells[3]);
        targets.push((team, href));
    }
    Ok(targets)
}
