// Client-side key-value store.
//
// Values are JSON documents stored under a namespace (the equivalent of a
// browser local-storage key). Every successful `set` is broadcast to in-process
// subscribers so views can react without polling.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::broadcast;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("namespace '{namespace}' holds an unexpected value: {source}")]
    Decode {
        namespace: String,
        source: serde_json::Error,
    },

    #[error("failed to serialize store contents: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreChange {
    pub namespace: String,
    pub value: Value,
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, namespace: &str) -> Result<Option<Value>, StoreError>;

    fn set(&self, namespace: &str, value: Value) -> Result<(), StoreError>;

    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

fn notify(sender: &broadcast::Sender<StoreChange>, namespace: &str, value: Value) {
    // No receivers is fine
    let _ = sender.send(StoreChange {
        namespace: namespace.to_string(),
        value,
    });
}

// Process-local store; contents vanish on shutdown.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
    changes: broadcast::Sender<StoreChange>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            entries: RwLock::new(HashMap::new()),
            changes,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, namespace: &str) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(namespace).cloned())
    }

    fn set(&self, namespace: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(namespace.to_string(), value.clone());
        drop(entries);
        notify(&self.changes, namespace, value);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

// Store persisted as a single pretty-printed JSON object on disk.
// The whole file is rewritten on every `set`.
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, Value>>,
    changes: broadcast::Sender<StoreChange>,
}

impl JsonFileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let entries: HashMap<String, Value> = if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            match serde_json::from_reader(reader) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Client store is unreadable, starting empty");
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        tracing::info!(path = %path.display(), namespaces = entries.len(), "Opened client store");
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            path,
            entries: RwLock::new(entries),
            changes,
        })
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    // Written to a sibling file, then renamed over the store
    fn save(&self, entries: &HashMap<String, Value>) -> Result<(), StoreError> {
        let temp = self.temp_path();
        let mut writer = BufWriter::new(File::create(&temp)?);
        serde_json::to_writer_pretty(&mut writer, entries)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, namespace: &str) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(namespace).cloned())
    }

    fn set(&self, namespace: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        let previous = entries.insert(namespace.to_string(), value.clone());
        if let Err(e) = self.save(&entries) {
            // Keep memory and disk in agreement
            match previous {
                Some(old) => entries.insert(namespace.to_string(), old),
                None => entries.remove(namespace),
            };
            return Err(e);
        }
        drop(entries);
        notify(&self.changes, namespace, value);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

// Typed view of one namespace. Missing keys read as `T::default()`.
pub struct Scoped<T> {
    store: Arc<dyn KeyValueStore>,
    namespace: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Scoped<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: &'static str) -> Self {
        Self {
            store,
            namespace,
            _marker: PhantomData,
        }
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    pub fn get(&self) -> Result<T, StoreError> {
        match self.store.get(self.namespace)? {
            Some(value) => serde_json::from_value(value).map_err(|source| StoreError::Decode {
                namespace: self.namespace.to_string(),
                source,
            }),
            None => Ok(T::default()),
        }
    }

    pub fn set(&self, value: &T) -> Result<(), StoreError> {
        self.store.set(self.namespace, serde_json::to_value(value)?)
    }

    // Receiver of changes to this namespace only.
    pub fn watch(&self) -> ScopedWatch<T> {
        ScopedWatch {
            receiver: self.store.subscribe(),
            namespace: self.namespace,
            _marker: PhantomData,
        }
    }
}

pub struct ScopedWatch<T> {
    receiver: broadcast::Receiver<StoreChange>,
    namespace: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> ScopedWatch<T> {
    // Next value written to the namespace, or `None` once the store is gone.
    // Values that fail to decode are skipped.
    pub async fn changed(&mut self) -> Option<T> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if change.namespace == self.namespace => {
                    match serde_json::from_value(change.value) {
                        Ok(value) => return Some(value),
                        Err(e) => {
                            tracing::warn!(namespace = self.namespace, error = %e, "Skipping undecodable store change");
                        }
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(namespace = self.namespace, skipped, "Store watcher lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
