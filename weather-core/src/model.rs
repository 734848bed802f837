use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QueryError;

const KELVIN_OFFSET: f64 = 273.15;
const METERS_PER_KM: f64 = 1000.0;

/// One past location search. The `id` is assigned once and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub location: String,
}

impl HistoryEntry {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            location: location.into(),
        }
    }
}

/// Display-unit values derived from the provider's raw units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalized {
    /// Visibility in kilometers, two decimals.
    pub visibility_km: String,
    /// Temperature in degrees Celsius, two decimals.
    pub temp_c: String,
}

impl Normalized {
    pub fn from_raw_units(visibility_m: f64, temp_k: f64) -> Self {
        Self {
            visibility_km: fixed2(meters_to_km(visibility_m)),
            temp_c: fixed2(kelvin_to_celsius(temp_k)),
        }
    }
}

/// Current conditions for one location.
///
/// The provider body is kept verbatim in `raw`. Normalization never writes
/// back into it; see [`WeatherResult::normalized_json`] for the display shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResult {
    /// Location string as it was queried.
    pub query: String,
    pub raw: Value,
    pub visibility_m: f64,
    pub temp_k: f64,
    pub normalized: Normalized,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherResult {
    /// Validate a provider body. `visibility` and `main.temp` must be numbers.
    pub fn from_raw(query: &str, raw: Value) -> Result<Self, QueryError> {
        let visibility_m = raw
            .get("visibility")
            .and_then(Value::as_f64)
            .ok_or_else(|| QueryError::Malformed("missing numeric `visibility`".into()))?;

        let temp_k = raw
            .pointer("/main/temp")
            .and_then(Value::as_f64)
            .ok_or_else(|| QueryError::Malformed("missing numeric `main.temp`".into()))?;

        Ok(Self {
            query: query.to_string(),
            normalized: Normalized::from_raw_units(visibility_m, temp_k),
            raw,
            visibility_m,
            temp_k,
            fetched_at: Utc::now(),
        })
    }

    /// Copy of the provider body with `visibility` and `main.temp` replaced
    /// by their normalized strings.
    pub fn normalized_json(&self) -> Value {
        let mut out = self.raw.clone();
        out["visibility"] = Value::String(self.normalized.visibility_km.clone());
        if let Some(main) = out.get_mut("main").and_then(Value::as_object_mut) {
            main.insert("temp".into(), Value::String(self.normalized.temp_c.clone()));
        }
        out
    }

    pub fn city_name(&self) -> Option<&str> {
        self.raw.get("name").and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    pub fn country(&self) -> Option<&str> {
        self.raw.pointer("/sys/country").and_then(Value::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.raw.pointer("/weather/0/description").and_then(Value::as_str)
    }

    pub fn humidity_pct(&self) -> Option<f64> {
        self.raw.pointer("/main/humidity").and_then(Value::as_f64)
    }

    pub fn wind_speed_mps(&self) -> Option<f64> {
        self.raw.pointer("/wind/speed").and_then(Value::as_f64)
    }

    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.raw
            .get("dt")
            .and_then(Value::as_i64)
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
    }

    /// "City, CC" when the provider names the place, else the query.
    pub fn display_name(&self) -> String {
        match (self.city_name(), self.country()) {
            (Some(city), Some(cc)) => format!("{city}, {cc}"),
            (Some(city), None) => city.to_string(),
            _ => self.query.clone(),
        }
    }
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

pub fn meters_to_km(meters: f64) -> f64 {
    meters / METERS_PER_KM
}

fn fixed2(value: f64) -> String {
    format!("{value:.2}")
}
