use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::{error::QueryError, model::WeatherResult};

use super::WeatherService;

/// Client for `GET <base_url>?q=<location>&appid=<key>`.
///
/// Units are left at the provider default (Kelvin, meters); normalization
/// happens in [`WeatherResult`].
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, QueryError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, api_key, http })
    }
}

#[async_trait]
impl WeatherService for OpenWeatherClient {
    async fn fetch_current(&self, location: &str) -> Result<WeatherResult, QueryError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(QueryError::EmptyLocation);
        }

        tracing::debug!(%location, "requesting current weather");

        let res = self
            .http
            .get(&self.base_url)
            .query(&[("q", location), ("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(QueryError::NotFound { location: location.to_string() });
        }

        if !status.is_success() {
            return Err(QueryError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let raw: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| QueryError::Malformed(e.to_string()))?;

        WeatherResult::from_raw(location, raw)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
