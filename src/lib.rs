//! svemo-scrape: asynchronous typed access to SVEMO speedway results
//!
//! This crate turns the hierarchy of server-rendered HTML pages on the SVEMO
//! website into typed, structured records. A [`SvemoScraper`] is launched once
//! for a fixed set of coordinates (seasons, league tier, language) and then
//! serves any number of concurrent page fetches. Fetched pages are reduced to
//! per-category element bags ([`pgelements`]) which transform into immutable
//! page models ([`pgmodel`]).
//!
//! HTTP is performed through the [`transport::Transport`] trait, so any
//! asynchronous HTTP client can be plugged in; a reqwest-backed adapter is
//! bundled. The scraper never manages the transport's lifecycle, never
//! retries, and never persists anything to disk.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use svemo_scrape::pgelements::AttendancePart;
//! use svemo_scrape::pgmodel;
//! use svemo_scrape::{Language, LeagueTier, ReqwestTransport, SvemoScraper};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(ReqwestTransport::new()?);
//! let mut scraper = SvemoScraper::new(transport);
//! scraper
//!     .launch(2023, &[], LeagueTier::Elitserien, Language::EnUs)
//!     .await?;
//!
//! let bag = scraper.attendance(2023, &[AttendancePart::Average]).await?;
//! let model = pgmodel::Attendance::from_pgelements(&bag)?;
//! println!("average attendance: {:?}", model.average);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod document;
pub mod element;
pub mod pgelements;
pub mod pgmodel;
pub mod scraper;
pub mod session;
pub mod transport;

use thiserror::Error;

use crate::session::{PageKind, Tier};

/// Boxed error type surfaced by transport adapters.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for svemo-scrape operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Network error, timeout, or non-2xx status for a single request.
    #[error("transport failure for {url}: {source}")]
    TransportFailure {
        url: String,
        #[source]
        source: BoxError,
    },

    /// The requested (tier, season) pair has no results page on the source
    /// site. Raised only during launch.
    #[error("no {tier} results page for season {season}")]
    CoordinatesUnavailable { season: u16, tier: Tier },

    /// A fetch was attempted before a successful launch.
    #[error("the scraper has not been launched")]
    NotLaunched,

    /// A two-hop link expected in a parent page row is absent.
    #[error("no {kind} page link found for {locator:?}")]
    PageNotFound { kind: PageKind, locator: String },

    /// A structurally mandatory fragment is missing, or a present fragment
    /// failed its typed parse.
    #[error("malformed {kind} page: {detail}")]
    MalformedPage { kind: PageKind, detail: String },

    /// A paginated table kept offering more pages than the configured limit.
    #[error("{kind} table pager exceeded the limit of {limit} pages")]
    TablePageLimit { kind: PageKind, limit: u32 },
}

impl ScrapeError {
    pub(crate) fn transport(url: impl Into<String>, source: BoxError) -> Self {
        ScrapeError::TransportFailure {
            url: url.into(),
            source,
        }
    }

    pub(crate) fn status(url: impl Into<String>, status: u16) -> Self {
        ScrapeError::TransportFailure {
            url: url.into(),
            source: format!("HTTP status {status}").into(),
        }
    }

    pub(crate) fn malformed(kind: PageKind, detail: impl Into<String>) -> Self {
        ScrapeError::MalformedPage {
            kind,
            detail: detail.into(),
        }
    }
}

/// Result type alias for svemo-scrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

// Re-export commonly used types
pub use config::ScraperConfig;
pub use scraper::{EventKey, RowFilter, SvemoScraper};
pub use session::{Language, PageKind as Page, Tier as LeagueTier};
pub use transport::{ReqwestTransport, Transport};
