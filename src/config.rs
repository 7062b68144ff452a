//! Scraper configuration
//!
//! The defaults point at the production SVEMO domains. Embedding
//! applications normally leave the URLs alone; tests point them at a mock
//! server.

use serde::Deserialize;

/// Home page domain. Season navigation is discovered here.
pub const DEFAULT_HOME_URL: &str = "https://www.svemo.se";

/// Competition administration domain. All data pages live here.
pub const DEFAULT_TA_URL: &str = "https://ta.svemo.se";

/// Configuration for a [`crate::SvemoScraper`]
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Base URL of the public home page.
    #[serde(default = "default_home_url")]
    pub home_url: String,

    /// Base URL of the competition administration site, used to resolve
    /// relative links found inside data pages.
    #[serde(default = "default_ta_url")]
    pub ta_url: String,

    /// Rows per page requested from the paginated events table.
    #[serde(default = "default_events_pagesize")]
    pub events_pagesize: u16,

    /// Maximum number of events table pages to walk before giving up.
    #[serde(default = "default_events_pagelimit")]
    pub events_pagelimit: u32,
}

fn default_home_url() -> String {
    DEFAULT_HOME_URL.to_string()
}

fn default_ta_url() -> String {
    DEFAULT_TA_URL.to_string()
}

fn default_events_pagesize() -> u16 {
    50
}

fn default_events_pagelimit() -> u32 {
    5
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            home_url: default_home_url(),
            ta_url: default_ta_url(),
            events_pagesize: default_events_pagesize(),
            events_pagelimit: default_events_pagelimit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_production_domains() {
        let config = ScraperConfig::default();
        assert_eq!(config.home_url, "https://www.svemo.se");
        assert_eq!(config.ta_url, "https://ta.svemo.se");
        assert_eq!(config.events_pagesize, 50);
        assert_eq!(config.events_pagelimit, 5);
    }
}
