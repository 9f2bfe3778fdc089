pub mod error;
pub mod types;

pub use error::{NominatimError, Result};
pub use types::{SearchOptions, SearchResult};

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim's usage policy requires an identifying User-Agent.
pub const DEFAULT_USER_AGENT: &str = concat!("carte/", env!("CARGO_PKG_VERSION"));

pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
    options: SearchOptions,
}

impl NominatimClient {
    pub fn new(base_url: &str, user_agent: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
            options: SearchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Free-text search. Returns at most `options.limit` results, best first.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let url = format!("{}/search", self.base_url);
        let limit = self.options.limit.to_string();
        let resp = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header("User-Agent", &self.user_agent)
            .query(&[
                ("format", "json"),
                ("limit", limit.as_str()),
                ("accept-language", self.options.language.as_str()),
                ("q", query),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NominatimError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        let results: Vec<SearchResult> = serde_json::from_str(&body)?;
        tracing::debug!(query, count = results.len(), "Nominatim search complete");
        Ok(results)
    }

    /// Coordinates of the best match, or `None` when nothing matched.
    pub async fn lookup(&self, query: &str) -> Result<Option<(f64, f64)>> {
        let results = self.search(query).await?;
        match results.first() {
            Some(best) => Ok(Some(best.coordinates()?)),
            None => Ok(None),
        }
    }
}
