/// PubMed E-utilities HTTP client.
///
/// `esearch` turns a query into PMIDs (JSON), `efetch` turns PMIDs into
/// article records (XML).
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use super::parser::parse_articles;
use super::query::SearchQuery;
use super::BibliographicService;
use crate::config::{PUBMED_BASE_URL, PubMedConfig};
use crate::error::ServiceError;
use crate::models::Article;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Builder for constructing `PubMedClient` instances.
#[derive(Debug, Default)]
pub struct PubMedClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl PubMedClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a loaded `PubMedConfig`.
    pub fn from_config(config: &PubMedConfig) -> Self {
        let mut builder = Self::new()
            .base_url(&config.base_url)
            .timeout(Duration::from_secs(config.request_timeout_secs));
        if let Some(key) = &config.api_key {
            builder = builder.api_key(key);
        }
        builder
    }

    /// Sets the E-utilities base URL. Defaults to the NCBI endpoint.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the NCBI API key sent with every request.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the per-request timeout. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidUrl` if the base URL does not parse.
    pub fn build(self) -> Result<PubMedClient, ServiceError> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| PUBMED_BASE_URL.to_string());
        reqwest::Url::parse(&base_url)
            .map_err(|e| ServiceError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let timeout = self
            .timeout
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(ServiceError::Network)?;

        Ok(PubMedClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: self.api_key.filter(|key| !key.trim().is_empty()),
        })
    }
}

/// Blocking client for PubMed search and fetch.
pub struct PubMedClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
}

impl PubMedClient {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GETs an E-utilities endpoint, failing on non-success status.
    fn get(
        &self,
        endpoint: &str,
        mut params: Vec<(&'static str, String)>,
    ) -> Result<reqwest::blocking::Response, ServiceError> {
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%url, "pubmed request");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .map_err(ServiceError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Http {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

/// Builds the esearch parameters for a query.
fn search_params(query: &SearchQuery, max_results: u32) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("db", "pubmed".to_string()),
        ("term", query.term().to_string()),
        ("retmode", "json".to_string()),
        ("retmax", max_results.to_string()),
    ];
    if let Some((start, end)) = query.date_range() {
        params.push(("mindate", start.to_string()));
        params.push(("maxdate", end.to_string()));
    }
    params
}

/// Extracts `esearchresult.idlist` from an esearch response.
fn parse_id_list(json: &Value) -> Result<Vec<String>, ServiceError> {
    let result = json
        .get("esearchresult")
        .ok_or_else(|| ServiceError::malformed("Missing 'esearchresult' in esearch response"))?;

    if let Some(error) = result.get("ERROR").and_then(|v| v.as_str()) {
        return Err(ServiceError::malformed(format!("PubMed search error: {}", error)));
    }

    let ids = result
        .get("idlist")
        .and_then(|v| v.as_array())
        .ok_or_else(|| ServiceError::malformed("Missing 'idlist' in esearch response"))?;

    Ok(ids
        .iter()
        .filter_map(|id| id.as_str().map(str::to_string))
        .collect())
}

impl BibliographicService for PubMedClient {
    fn search(&self, query: &SearchQuery, max_results: u32) -> Result<Vec<String>, ServiceError> {
        if query.is_empty() {
            debug!("empty search term, skipping esearch");
            return Ok(Vec::new());
        }

        let response = self.get("esearch.fcgi", search_params(query, max_results))?;
        let json: Value = response.json().map_err(ServiceError::from_reqwest)?;
        let ids = parse_id_list(&json)?;
        debug!(count = ids.len(), "esearch returned ids");
        Ok(ids)
    }

    fn fetch(&self, ids: &[String]) -> Result<Vec<Article>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let params = vec![
            ("db", "pubmed".to_string()),
            ("retmode", "xml".to_string()),
            ("id", ids.join(",")),
        ];
        let xml = self
            .get("efetch.fcgi", params)?
            .text()
            .map_err(ServiceError::from_reqwest)?;
        parse_articles(&xml)
    }
}
