use cadastre_core::domain::{Identifier, LookupResult};
use cadastre_core::error::ParseError;
use cadastre_core::ports::{LookupClient, Result};
use log::debug;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://nspd.gov.ru";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const SEARCH_PATH: &str = "/api/geoportal/v2/search/geoportal";
/// Thematic search over real-estate objects by cadastral number
const THEMATIC_SEARCH_ID: &str = "1";
const USER_AGENT: &str = concat!("cadastre-parser/", env!("CARGO_PKG_VERSION"));

/// Connection settings for the public cadastral map service
#[derive(Debug, Clone)]
pub struct NspdConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// The service presents a certificate chain missing from most trust stores
    pub accept_invalid_certs: bool,
}

impl Default for NspdConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            accept_invalid_certs: false,
        }
    }
}

/// HTTP implementation of the LookupClient port
pub struct NspdLookupClient {
    client: Client,
    search_url: String,
}

impl NspdLookupClient {
    pub fn new(config: NspdConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/');
        let mut headers = HeaderMap::new();
        let referer = HeaderValue::from_str(&format!("{}/map", base_url))
            .map_err(|e| ParseError::LookupSetup(e.to_string()))?;
        headers.insert(REFERER, referer);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| ParseError::LookupSetup(e.to_string()))?;

        Ok(Self {
            client,
            search_url: format!("{}{}", base_url, SEARCH_PATH),
        })
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }
}

impl LookupClient for NspdLookupClient {
    fn lookup(&self, identifier: &Identifier) -> LookupResult {
        debug!("GET {} query={}", self.search_url, identifier);
        let response = match self
            .client
            .get(&self.search_url)
            .query(&[
                ("query", identifier.as_str()),
                ("thematicSearchId", THEMATIC_SEARCH_ID),
            ])
            .send()
        {
            Ok(response) => response,
            Err(e) => return LookupResult::Failed(e.to_string()),
        };

        let status = response.status().as_u16();
        match response.text() {
            Ok(body) => classify_response(status, &body),
            Err(e) => LookupResult::Failed(format!("failed to read response body: {}", e)),
        }
    }
}

/// Turns an HTTP status and body into a lookup result.
/// Misses (204, 404, empty or `null` bodies) are not failures.
pub fn classify_response(status: u16, body: &str) -> LookupResult {
    match status {
        200..=299 if body.trim().is_empty() => LookupResult::Empty,
        200..=299 => match serde_json::from_str::<Value>(body) {
            Ok(Value::Null) => LookupResult::Empty,
            Ok(value) => LookupResult::Found(value),
            Err(e) => LookupResult::Failed(format!("invalid JSON in response: {}", e)),
        },
        404 => LookupResult::Empty,
        other => LookupResult::Failed(format!("HTTP status {}", other)),
    }
}
