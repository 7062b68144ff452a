//! Bundled reqwest-backed transport adapter

use std::time::Duration;

use async_trait::async_trait;

use super::{Method, Request, Response, Transport};
use crate::BoxError;

/// [`Transport`] implementation on top of a [`reqwest::Client`]
///
/// The default client follows redirects, compresses transfers, and keeps
/// the cookie store disabled (replaying the source site's session cookie is
/// a known slowdown). A pre-configured client can be supplied through
/// `From<reqwest::Client>`; it must be configured to follow redirects.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ::reqwest::Client,
}

impl ReqwestTransport {
    /// Build an adapter with the default client configuration.
    pub fn new() -> std::result::Result<Self, BoxError> {
        let client = ::reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client })
    }
}

impl From<::reqwest::Client> for ReqwestTransport {
    fn from(client: ::reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn request(&self, request: Request) -> std::result::Result<Response, BoxError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(form) = &request.form {
            builder = builder.form(form);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
