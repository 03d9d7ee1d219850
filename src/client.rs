use anyhow::{Context, Result};
use log::debug;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; GRBTessCorrelator/0.1)";

/// Thin blocking HTTP client. Every request goes to the network.
pub struct Client {
    client: reqwest::blocking::Client,
}

impl Client {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Fetch a page and return its body as text
    pub fn fetch_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to fetch: {}", url))?
            .error_for_status()
            .with_context(|| format!("Bad status from: {}", url))?;

        response
            .text()
            .with_context(|| format!("Failed to read response: {}", url))
    }

    /// Fetch a JSON document with query parameters
    pub fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        debug!("GET {} {:?}", url, query);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .with_context(|| format!("Failed to fetch: {}", url))?
            .error_for_status()
            .with_context(|| format!("Bad status from: {}", url))?;

        response
            .json()
            .with_context(|| format!("Failed to parse JSON: {}", url))
    }
}
