//! HTTP transport abstraction
//!
//! The scraper performs every request through the [`Transport`] trait, so
//! any asynchronous HTTP client can be plugged in. An adapter must:
//!
//! - follow HTTP redirects automatically (the core performs no redirect
//!   handling of its own),
//! - be safe for concurrent use (one adapter instance is shared by all
//!   in-flight fetches),
//! - surface network-level failures as errors rather than panicking.
//!
//! Rate limiting, retry policy, and request logging are adapter concerns;
//! the core never retries and imposes no concurrency limit. The source
//! site is also known to respond noticeably slower once its session cookie
//! is replayed, so adapters should avoid persisting server cookies. The
//! bundled [`ReqwestTransport`] keeps the cookie store disabled for this
//! reason.

mod reqwest;

pub use self::reqwest::ReqwestTransport;

use async_trait::async_trait;

use crate::BoxError;

/// HTTP request method used by the scraper
///
/// Only the two methods the source site requires are modeled; paginated
/// tables are walked with form POSTs, everything else is fetched with GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A single outbound HTTP request
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    /// Header name/value pairs, already including any cookie header the
    /// session assembled.
    pub headers: Vec<(String, String)>,
    /// URL-encoded form body for POST requests.
    pub form: Option<Vec<(String, String)>>,
}

impl Request {
    /// Build a GET request for `url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            form: None,
        }
    }

    /// Build a form POST request for `url`.
    pub fn post_form(url: impl Into<String>, form: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            form: Some(form),
        }
    }

    /// Attach a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach all headers from `headers`.
    pub fn headers(mut self, headers: &[(String, String)]) -> Self {
        self.headers.extend(headers.iter().cloned());
        self
    }
}

/// An HTTP response, fully read into memory
///
/// The body is owned by the value, so dropping a `Response` releases the
/// request's resources deterministically on every exit path.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// Whether the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Capability to perform an HTTP request
///
/// Implementations wrap a concrete asynchronous HTTP client. See the module
/// docs for the contract adapters must uphold.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform `request`, following redirects, and return the final
    /// response.
    async fn request(&self, request: Request) -> std::result::Result<Response, BoxError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_request_has_no_form() {
        let request = Request::get("http://example.com/")
            .header("accept", "text/html");
        assert_eq!(request.method, Method::Get);
        assert!(request.form.is_none());
        assert_eq!(request.headers.len(), 1);
    }

    #[test]
    fn post_form_request_carries_fields() {
        let request = Request::post_form(
            "http://example.com/",
            vec![("__EVENTTARGET".to_string(), "next".to_string())],
        );
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.form.as_deref().map(<[_]>::len), Some(1));
    }

    #[test]
    fn success_covers_2xx_only() {
        let mut response = Response {
            status: 200,
            headers: vec![],
            body: b"ok".to_vec(),
        };
        assert!(response.is_success());
        response.status = 299;
        assert!(response.is_success());
        response.status = 301;
        assert!(!response.is_success());
        response.status = 500;
        assert!(!response.is_success());
    }

    #[test]
    fn text_replaces_invalid_utf8() {
        let response = Response {
            status: 200,
            headers: vec![],
            body: vec![0xff, b'a'],
        };
        assert!(response.text().ends_with('a'));
    }
}
