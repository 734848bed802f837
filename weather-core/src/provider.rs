use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{Config, QueryError, WeatherResult, provider::openweather::OpenWeatherClient};

pub mod openweather;

/// Source of current conditions for a free-form location string.
#[async_trait]
pub trait WeatherService: Send + Sync + Debug {
    async fn fetch_current(&self, location: &str) -> Result<WeatherResult, QueryError>;
}

/// Construct the OpenWeather-compatible client described by `config`.
pub fn service_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherService>> {
    let api_key = config.api_key()?;
    let client = OpenWeatherClient::new(config.base_url.clone(), api_key, config.timeout())?;
    Ok(Arc::new(client))
}
