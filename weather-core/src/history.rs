//! Search history backed by a [`KeyValueStore`].
//!
//! The in-memory list is authoritative. Every mutation rewrites the whole
//! list under [`HISTORY_KEY`], newest first. Readers subscribe through a
//! `watch` channel instead of polling.

use std::{collections::HashSet, sync::Arc};
use tokio::sync::watch;

use crate::{
    error::{HistoryError, StorageError},
    model::HistoryEntry,
    store::{HISTORY_KEY, KeyValueStore},
};

#[derive(Debug)]
pub struct HistoryManager {
    store: Arc<dyn KeyValueStore>,
    entries: Vec<HistoryEntry>,
    tx: watch::Sender<Vec<HistoryEntry>>,
}

impl HistoryManager {
    /// Creates a manager with an empty list. Call [`load`](Self::load) to read
    /// what was persisted.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (tx, _) = watch::channel(Vec::new());
        Self { store, entries: Vec::new(), tx }
    }

    /// Creates a manager and loads the persisted list, failing soft.
    pub async fn open(store: Arc<dyn KeyValueStore>) -> Self {
        let mut manager = Self::new(store);
        manager.load().await;
        manager
    }

    /// Reads the persisted list, reporting storage and parse failures.
    ///
    /// A missing key is not an error. Duplicate ids keep their first
    /// occurrence.
    pub async fn try_load(store: &dyn KeyValueStore) -> Result<Vec<HistoryEntry>, HistoryError> {
        let Some(blob) = store.get(HISTORY_KEY).await? else {
            return Ok(Vec::new());
        };

        let parsed: Vec<HistoryEntry> =
            serde_json::from_str(&blob).map_err(|e| HistoryError::Corrupt(e.to_string()))?;

        let mut seen = HashSet::new();
        let total = parsed.len();
        let entries: Vec<HistoryEntry> =
            parsed.into_iter().filter(|e| seen.insert(e.id.clone())).collect();

        if entries.len() != total {
            tracing::warn!(dropped = total - entries.len(), "dropped duplicate history ids");
        }

        Ok(entries)
    }

    /// Replaces the in-memory list with the persisted one.
    ///
    /// Unreadable or corrupt history is treated as empty: it is logged and
    /// never reported to the caller.
    pub async fn load(&mut self) -> &[HistoryEntry] {
        let entries = match Self::try_load(self.store.as_ref()).await {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, "could not load search history, starting empty");
                Vec::new()
            }
        };

        tracing::debug!(count = entries.len(), "loaded search history");
        self.entries = entries;
        self.publish();
        &self.entries
    }

    /// Records a search for `location` at the front of the list.
    ///
    /// Repeated locations get distinct entries.
    pub async fn add(&mut self, location: impl Into<String>) -> HistoryEntry {
        let entry = HistoryEntry::new(location);
        self.entries.insert(0, entry.clone());
        self.commit().await;
        entry
    }

    /// Removes the entry with `id`. Unknown ids are a no-op and return `None`.
    pub async fn delete(&mut self, id: &str) -> Option<HistoryEntry> {
        let idx = self.entries.iter().position(|e| e.id == id)?;
        let removed = self.entries.remove(idx);
        self.commit().await;
        Some(removed)
    }

    pub async fn clear(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.entries.clear();
        self.commit().await;
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<HistoryEntry>> {
        self.tx.subscribe()
    }

    /// Writes the full list to the store.
    pub async fn persist(&self) -> Result<(), StorageError> {
        let blob = serde_json::to_string(&self.entries)?;
        self.store.set(HISTORY_KEY, &blob).await
    }

    async fn commit(&mut self) {
        self.publish();
        if let Err(err) = self.persist().await {
            tracing::warn!(error = %err, "failed to persist search history");
        }
    }

    fn publish(&self) {
        self.tx.send_replace(self.entries.clone());
    }
}
