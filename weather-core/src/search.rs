//! Search flow: one location query at a time, published as [`SearchState`].
//!
//! Each call to [`SearchController::search`] gets a fresh request id. The
//! previous in-flight query is aborted, and a completion is only applied if
//! its id still matches the published state, so the last *issued* search
//! always wins regardless of which response arrives first.

use std::{sync::Arc, time::Duration};
use tokio::{
    sync::watch,
    task::{AbortHandle, JoinHandle},
};

use crate::{
    error::QueryError,
    model::{HistoryEntry, WeatherResult},
    provider::WeatherService,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Snapshot consumed by the presentation layer.
///
/// `weather` is only set when `status` is `Success`, `error` only when it is
/// `Error`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchState {
    pub request_id: u64,
    pub status: SearchStatus,
    pub location: Option<String>,
    pub weather: Option<WeatherResult>,
    pub error: Option<QueryError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Success(WeatherResult),
    Failed(QueryError),
    /// A newer search (or a cancel) replaced this one before it finished.
    Superseded,
}

/// Handle to one issued search.
#[derive(Debug)]
pub struct SearchTicket {
    request_id: u64,
    handle: JoinHandle<SearchOutcome>,
}

impl SearchTicket {
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Waits for the query to finish or be superseded.
    ///
    /// A panic inside the query task is resumed here rather than reported
    /// as a superseded search.
    pub async fn outcome(self) -> SearchOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_panic() => {
                tracing::error!(request_id = self.request_id, "search task panicked");
                std::panic::resume_unwind(err.into_panic())
            }
            Err(_) => SearchOutcome::Superseded,
        }
    }
}

#[derive(Debug)]
pub struct SearchController {
    service: Arc<dyn WeatherService>,
    timeout: Duration,
    state: Arc<watch::Sender<SearchState>>,
    last_request: u64,
    in_flight: Option<AbortHandle>,
}

impl SearchController {
    pub fn new(service: Arc<dyn WeatherService>, timeout: Duration) -> Self {
        let (tx, _) = watch::channel(SearchState::default());
        Self {
            service,
            timeout,
            state: Arc::new(tx),
            last_request: 0,
            in_flight: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Starts a query for `location`.
    ///
    /// The state is `Loading` by the time this returns. Must be called from
    /// within a tokio runtime.
    pub fn search(&mut self, location: impl Into<String>) -> SearchTicket {
        let location = location.into();
        self.abort_in_flight();

        self.last_request += 1;
        let request_id = self.last_request;

        self.state.send_replace(SearchState {
            request_id,
            status: SearchStatus::Loading,
            location: Some(location.clone()),
            weather: None,
            error: None,
        });
        tracing::debug!(request_id, %location, "search started");

        let service = Arc::clone(&self.service);
        let state = Arc::clone(&self.state);
        let timeout = self.timeout;

        let handle = tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, service.fetch_current(&location)).await
            {
                Ok(result) => result,
                Err(_) => Err(QueryError::Timeout),
            };
            apply(&state, request_id, result)
        });

        self.in_flight = Some(handle.abort_handle());
        SearchTicket { request_id, handle }
    }

    /// Re-runs a past search. Does not touch history.
    pub fn restore_from_history(&mut self, entry: &HistoryEntry) -> SearchTicket {
        self.search(entry.location.clone())
    }

    /// Drops the in-flight query, if any, and returns to `Idle`.
    pub fn cancel(&mut self) {
        self.abort_in_flight();
        self.last_request += 1;
        self.state.send_replace(SearchState {
            request_id: self.last_request,
            ..SearchState::default()
        });
    }

    fn abort_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}

fn apply(
    state: &watch::Sender<SearchState>,
    request_id: u64,
    result: Result<WeatherResult, QueryError>,
) -> SearchOutcome {
    let mut applied = false;
    state.send_if_modified(|current| {
        if current.request_id != request_id {
            return false;
        }
        match &result {
            Ok(weather) => {
                current.status = SearchStatus::Success;
                current.weather = Some(weather.clone());
                current.error = None;
            }
            Err(err) => {
                current.status = SearchStatus::Error;
                current.weather = None;
                current.error = Some(err.clone());
            }
        }
        applied = true;
        true
    });

    if !applied {
        tracing::debug!(request_id, "discarding stale search result");
        return SearchOutcome::Superseded;
    }

    match result {
        Ok(weather) => {
            tracing::debug!(request_id, "search succeeded");
            SearchOutcome::Success(weather)
        }
        Err(err) => {
            tracing::info!(request_id, error = %err, "search failed");
            SearchOutcome::Failed(err)
        }
    }
}
