//! User settings persisted next to the request log, and a live view of them.

use crate::error::StorageError;
use crate::storage::{DocumentStore, SETTINGS_KEY};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// When set, every provider call is forwarded without interception.
    #[serde(default)]
    pub disable: bool,
}

pub struct SettingsStore {
    store: Arc<dyn DocumentStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Missing settings read as the defaults.
    pub async fn load(&self) -> Result<Settings, StorageError> {
        match self.store.get(SETTINGS_KEY).await? {
            Some(doc) => Ok(serde_json::from_value(doc)?),
            None => Ok(Settings::default()),
        }
    }

    pub async fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        self.store
            .set(SETTINGS_KEY, serde_json::to_value(settings)?)
            .await
    }
}

/// A receiver that never changes. Useful when settings are fixed for the
/// lifetime of the process.
pub fn fixed_settings(settings: Settings) -> watch::Receiver<Settings> {
    let (tx, rx) = watch::channel(settings);
    // Dropping the sender keeps the last value readable through `borrow()`.
    drop(tx);
    rx
}

/// Poll the settings document and publish every change.
///
/// The first load happens before returning so the receiver starts with the
/// persisted value. Read failures keep the last known settings.
pub async fn watch_settings(
    store: Arc<dyn DocumentStore>,
    interval: Duration,
) -> (watch::Receiver<Settings>, JoinHandle<()>) {
    let settings = SettingsStore::new(store);
    let initial = settings.load().await.unwrap_or_else(|e| {
        warn!(error = %e, "failed to load settings, using defaults");
        Settings::default()
    });
    info!(disable = initial.disable, "settings loaded");

    let (tx, rx) = watch::channel(initial);
    let handle = tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            if tx.is_closed() {
                break;
            }
            match settings.load().await {
                Ok(latest) => {
                    tx.send_if_modified(|current| {
                        if *current == latest {
                            return false;
                        }
                        info!(disable = latest.disable, "settings changed");
                        *current = latest;
                        true
                    });
                }
                Err(e) => warn!(error = %e, "settings reload failed"),
            }
        }
    });

    (rx, handle)
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_settings_are_defaults() {
        let settings = SettingsStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(settings.load().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn test_unknown_fields_are_ignored() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(SETTINGS_KEY, json!({"disable": true, "theme": "dark"}))
            .await
            .unwrap();
        let settings = SettingsStore::new(store);
        assert!(settings.load().await.unwrap().disable);
    }

    #[tokio::test]
    async fn test_fixed_settings_stay_readable() {
        let rx = fixed_settings(Settings { disable: true });
        assert!(rx.borrow().disable);
    }

    #[tokio::test]
    async fn test_watch_publishes_changes() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let (mut rx, handle) = watch_settings(Arc::clone(&store), Duration::from_millis(10)).await;
        assert!(!rx.borrow().disable);

        SettingsStore::new(Arc::clone(&store))
            .save(&Settings { disable: true })
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("settings change not published")
            .unwrap();
        assert!(rx.borrow().disable);
        handle.abort();
    }
}
