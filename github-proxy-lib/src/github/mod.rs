//! GitHub REST API client backing the auth, quota and content collaborators.

mod contents;
mod installation;
mod rate_limit;

pub use installation::GitHubAppAuth;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;

use crate::error::{ProxyError, Result};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";

/// Thin wrapper around a [`reqwest::Client`] preconfigured for the GitHub API.
#[derive(Clone, Debug)]
pub struct GitHubClient {
    http: Client,
    api_url: String,
}

impl GitHubClient {
    /// Build a client for `api_url` whose requests time out after `timeout`.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("github-proxy/", env!("CARGO_PKG_VERSION"))),
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ProxyError::Upstream(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, api_url: api_url.trim_end_matches('/').to_string() })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn get(&self, path: &str, token: &str) -> RequestBuilder {
        self.http
            .get(format!("{}{path}", self.api_url))
            .bearer_auth(token)
    }

    fn post(&self, path: &str, token: &str) -> RequestBuilder {
        self.http
            .post(format!("{}{path}", self.api_url))
            .bearer_auth(token)
    }
}
