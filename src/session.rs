//! Session coordinates and state
//!
//! A launched scraper owns one [`SessionState`]: the coordinates it was
//! launched with, the base headers and cookies applied to every request,
//! and the resolved locator table mapping page categories to URLs. The
//! state is built in one piece by the launch sequence and read-only
//! afterwards, so any number of in-flight fetches may share it.

use std::collections::HashMap;
use std::fmt;

/// First season with data on the source site.
pub const FIRST_AVAILABLE_SEASON: u16 = 2011;

/// Cookie controlling the language of every server-rendered page.
pub(crate) const LANGUAGE_COOKIE: &str = "Svemo.TA.Language.SelectedLanguage";

/// League tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Tier 1, branded "Bauhausligan" in recent seasons.
    Elitserien,
    /// Tier 2.
    Allsvenskan,
}

impl Tier {
    /// Names under which the tier appears in the home page navigation,
    /// most recent first.
    pub(crate) fn aliases(self) -> &'static [&'static str] {
        match self {
            Tier::Elitserien => &["Bauhausligan", "Elitserien"],
            Tier::Allsvenskan => &["Allsvenskan"],
        }
    }

    /// Numeric tier.
    pub fn number(self) -> u8 {
        match self {
            Tier::Elitserien => 1,
            Tier::Allsvenskan => 2,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Elitserien => write!(f, "Elitserien"),
            Tier::Allsvenskan => write!(f, "Allsvenskan"),
        }
    }
}

/// Page language, also governing the site's number formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// Swedish.
    SvSe,
    /// English.
    EnUs,
}

impl Language {
    /// Locale code as used by the source site.
    pub fn code(self) -> &'static str {
        match self {
            Language::SvSe => "sv-se",
            Language::EnUs => "en-us",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Logical page kinds
///
/// `Home` and `Results` are navigation pages crossed during launch; the
/// remaining seven are the data-page categories exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    Home,
    Results,
    Events,
    Standings,
    Teams,
    Squad,
    RiderAverages,
    Attendance,
    Scorecard,
}

impl PageKind {
    /// The five categories reachable as tabs of a results page, in the
    /// order the tabs appear.
    pub(crate) const TABS: [PageKind; 5] = [
        PageKind::Events,
        PageKind::Standings,
        PageKind::Teams,
        PageKind::RiderAverages,
        PageKind::Attendance,
    ];
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageKind::Home => "home",
            PageKind::Results => "results",
            PageKind::Events => "events",
            PageKind::Standings => "standings",
            PageKind::Teams => "teams",
            PageKind::Squad => "squad",
            PageKind::RiderAverages => "rider averages",
            PageKind::Attendance => "attendance",
            PageKind::Scorecard => "scorecard",
        };
        f.write_str(name)
    }
}

/// State of a launched scraper
#[derive(Debug, Clone)]
pub(crate) struct SessionState {
    pub seasons: Vec<u16>,
    pub tier: Tier,
    pub language: Language,
    /// Base headers applied to every request.
    pub headers: Vec<(String, String)>,
    /// Base cookies, assembled into a `cookie` header per request.
    pub cookies: Vec<(String, String)>,
    /// Resolved page locators: (category, season) to URL.
    pub locators: HashMap<(PageKind, u16), String>,
}

impl SessionState {
    pub fn base(seasons: Vec<u16>, tier: Tier, language: Language) -> Self {
        Self {
            seasons,
            tier,
            language,
            headers: vec![("accept".to_string(), "text/html".to_string())],
            cookies: vec![(LANGUAGE_COOKIE.to_string(), language.code().to_string())],
            locators: HashMap::new(),
        }
    }

    /// Headers for one request: base headers plus the assembled cookie
    /// header.
    pub fn request_headers(&self) -> Vec<(String, String)> {
        let mut headers = self.headers.clone();
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            headers.push(("cookie".to_string(), cookie));
        }
        headers
    }

    pub fn locator(&self, kind: PageKind, season: u16) -> Option<&str> {
        self.locators.get(&(kind, season)).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_headers_assemble_cookie_header() {
        let state = SessionState::base(vec![2023], Tier::Elitserien, Language::EnUs);
        let headers = state.request_headers();
        assert!(headers.contains(&("accept".to_string(), "text/html".to_string())));
        assert!(headers.contains(&(
            "cookie".to_string(),
            "Svemo.TA.Language.SelectedLanguage=en-us".to_string()
        )));
    }

    #[test]
    fn tier_aliases_cover_rebranding() {
        assert_eq!(Tier::Elitserien.aliases(), ["Bauhausligan", "Elitserien"]);
        assert_eq!(Tier::Allsvenskan.number(), 2);
    }

    #[test]
    fn display_is_source_site_vocabulary() {
        assert_eq!(Language::SvSe.to_string(), "sv-se");
        assert_eq!(PageKind::RiderAverages.to_string(), "rider averages");
    }
}
