//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather query service and unit normalization
//! - Persisted search history over a key-value store
//! - The search flow controller and the app that ties them together
//!
//! It is used by `weather-cli`, but holds no terminal code and can back any
//! other front-end.

pub mod app;
pub mod config;
pub mod error;
pub mod history;
pub mod model;
pub mod provider;
pub mod search;
pub mod store;

pub use app::{AppEvent, Dispatched, WeatherApp};
pub use config::Config;
pub use error::{HistoryError, QueryError, StorageError};
pub use history::HistoryManager;
pub use model::{HistoryEntry, Normalized, WeatherResult};
pub use provider::{WeatherService, openweather::OpenWeatherClient, service_from_config};
pub use search::{SearchController, SearchOutcome, SearchState, SearchStatus, SearchTicket};
pub use store::{FileStore, HISTORY_KEY, KeyValueStore, MemoryStore};
