//! Ties the search controller to the history manager.
//!
//! User intents arrive as [`AppEvent`]s. Each event is handled exactly once
//! by [`WeatherApp::dispatch`].

use std::{sync::Arc, time::Duration};

use crate::{
    history::HistoryManager,
    model::HistoryEntry,
    provider::WeatherService,
    search::{SearchController, SearchOutcome},
    store::KeyValueStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// A new search typed by the user.
    Search(String),
    /// The user picked an entry from the history list.
    SelectHistory(String),
    DeleteHistory(String),
    ClearHistory,
}

/// What handling an event produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    Searched {
        outcome: SearchOutcome,
        recorded: Option<HistoryEntry>,
    },
    Deleted(Option<HistoryEntry>),
    Cleared,
    /// The event referred to something that no longer exists.
    Ignored,
}

#[derive(Debug)]
pub struct WeatherApp {
    search: SearchController,
    history: HistoryManager,
}

impl WeatherApp {
    pub async fn open(
        service: Arc<dyn WeatherService>,
        store: Arc<dyn KeyValueStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            search: SearchController::new(service, timeout),
            history: HistoryManager::open(store).await,
        }
    }

    pub fn search(&self) -> &SearchController {
        &self.search
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub async fn dispatch(&mut self, event: AppEvent) -> Dispatched {
        tracing::debug!(?event, "dispatch");
        match event {
            AppEvent::Search(location) => {
                let outcome = self.search.search(location.trim()).outcome().await;
                let recorded = match &outcome {
                    SearchOutcome::Success(weather) => {
                        Some(self.history.add(weather.query.clone()).await)
                    }
                    _ => None,
                };
                Dispatched::Searched { outcome, recorded }
            }
            AppEvent::SelectHistory(id) => {
                let Some(entry) = self.history.get(&id).cloned() else {
                    tracing::debug!(%id, "selected history entry no longer exists");
                    return Dispatched::Ignored;
                };
                let outcome = self.search.restore_from_history(&entry).outcome().await;
                Dispatched::Searched { outcome, recorded: None }
            }
            AppEvent::DeleteHistory(id) => Dispatched::Deleted(self.history.delete(&id).await),
            AppEvent::ClearHistory => {
                self.history.clear().await;
                Dispatched::Cleared
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::QueryError, model::WeatherResult, search::SearchStatus, store::MemoryStore};
    use async_trait::async_trait;
    use serde_json::json;

    /// Knows only Paris and Tokyo.
    #[derive(Debug)]
    struct TwoCities;

    #[async_trait]
    impl WeatherService for TwoCities {
        async fn fetch_current(&self, location: &str) -> Result<WeatherResult, QueryError> {
            match location {
                "Paris" | "Tokyo" => WeatherResult::from_raw(
                    location,
                    json!({ "name": location, "visibility": 8000, "main": { "temp": 285.15 } }),
                ),
                other => Err(QueryError::NotFound { location: other.into() }),
            }
        }
    }

    async fn app_with(store: Arc<dyn KeyValueStore>) -> WeatherApp {
        WeatherApp::open(Arc::new(TwoCities), store, Duration::from_secs(5)).await
    }

    #[tokio::test]
    async fn successful_search_is_recorded() {
        let mut app = app_with(Arc::new(MemoryStore::new())).await;

        let out = app.dispatch(AppEvent::Search("  Paris ".into())).await;

        let Dispatched::Searched { outcome, recorded } = out else {
            panic!("unexpected dispatch result");
        };
        assert!(matches!(outcome, SearchOutcome::Success(_)));
        assert_eq!(recorded.map(|e| e.location), Some("Paris".to_string()));
        assert_eq!(app.history().entries()[0].location, "Paris");
        assert_eq!(app.search().state().status, SearchStatus::Success);
    }

    #[tokio::test]
    async fn failed_search_is_not_recorded() {
        let mut app = app_with(Arc::new(MemoryStore::new())).await;

        let out = app.dispatch(AppEvent::Search("Atlantis".into())).await;

        assert!(matches!(out, Dispatched::Searched { recorded: None, .. }));
        assert!(app.history().is_empty());
        assert_eq!(app.search().state().status, SearchStatus::Error);
    }

    #[tokio::test]
    async fn selecting_history_replays_without_duplicating() {
        let mut app = app_with(Arc::new(MemoryStore::new())).await;
        app.dispatch(AppEvent::Search("Tokyo".into())).await;
        app.dispatch(AppEvent::Search("Paris".into())).await;
        let tokyo = app.history().entries()[1].clone();

        let out = app.dispatch(AppEvent::SelectHistory(tokyo.id)).await;

        assert!(matches!(out, Dispatched::Searched { recorded: None, .. }));
        assert_eq!(app.history().len(), 2);
        assert_eq!(app.search().state().location.as_deref(), Some("Tokyo"));
    }

    #[tokio::test]
    async fn selecting_unknown_entry_is_ignored() {
        let mut app = app_with(Arc::new(MemoryStore::new())).await;

        let out = app.dispatch(AppEvent::SelectHistory("gone".into())).await;

        assert_eq!(out, Dispatched::Ignored);
        assert_eq!(app.search().state().status, SearchStatus::Idle);
    }

    #[tokio::test]
    async fn history_persists_across_app_restarts() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        {
            let mut app = app_with(store.clone()).await;
            app.dispatch(AppEvent::Search("Paris".into())).await;
            app.dispatch(AppEvent::Search("Tokyo".into())).await;
            let paris = app.history().entries()[1].id.clone();
            app.dispatch(AppEvent::DeleteHistory(paris)).await;
        }

        let app = app_with(store).await;
        let locations: Vec<_> = app.history().entries().iter().map(|e| e.location.as_str()).collect();
        assert_eq!(locations, vec!["Tokyo"]);
    }

    #[tokio::test]
    async fn clear_history_event() {
        let mut app = app_with(Arc::new(MemoryStore::new())).await;
        app.dispatch(AppEvent::Search("Paris".into())).await;

        assert_eq!(app.dispatch(AppEvent::ClearHistory).await, Dispatched::Cleared);
        assert!(app.history().is_empty());
    }
}
