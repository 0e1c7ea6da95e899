//! ==============================================================================
//! sync.rs - cross-page snapshot channel
//! ==============================================================================
//!
//! purpose:
//!     publishes the latest reading set to one shared storage slot and tells
//!     every registered observer about it. the slot holds only the newest
//!     snapshot; history lives in the in-memory series.
//!
//! flow:
//!     publish(readings)
//!        -> serialize (with temperature / metals alias keys)
//!        -> overwrite the slot at `key`
//!        -> call observers in registration order (only if the write landed)
//!
//! relationships:
//!     - used by: controller.rs (dashboard publishes, detail pages read back)
//!     - backed by: MemoryStore (default) or FileStore (config: storage.backend)
//!
//! ==============================================================================

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::domain::ReadingSet;
use crate::error::Result;

/// well-known slot shared by every page
pub const SNAPSHOT_KEY: &str = "aquaReadings";

// ==============================================================================
// snapshot stores
// ==============================================================================

/// string key/value slot storage shared between pages
pub trait SnapshotStore: Send + Sync {
    fn read(&self, key: &str) -> io::Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> io::Result<()>;
}

/// process-local slots; clones share the same map
#[derive(Clone, Default)]
pub struct MemoryStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        Ok(slots.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// one `<key>.json` file per slot inside a directory
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// creates the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SnapshotStore for FileStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        // rename keeps the old snapshot intact if the write dies halfway
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, self.path(key))
    }
}

// ==============================================================================
// channel
// ==============================================================================

pub type Observer = Box<dyn Fn(&ReadingSet) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// read-only view of the shared slot, handed to pages that only listen
#[derive(Clone)]
pub struct SnapshotReader {
    store: Arc<dyn SnapshotStore>,
    key: String,
}

impl SnapshotReader {
    /// last published reading set, if any
    pub fn latest(&self) -> Result<Option<ReadingSet>> {
        match self.store.read(&self.key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

pub struct SyncChannel {
    store: Arc<dyn SnapshotStore>,
    key: String,
    observers: Vec<(SubscriptionId, Observer)>,
    next_id: u64,
}

impl SyncChannel {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self::with_key(store, SNAPSHOT_KEY)
    }

    pub fn with_key(store: Arc<dyn SnapshotStore>, key: impl Into<String>) -> Self {
        Self { store, key: key.into(), observers: Vec::new(), next_id: 0 }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// overwrite the shared slot, then notify observers synchronously
    ///
    /// a failed write returns the error and notifies nobody.
    pub fn publish(&self, readings: &ReadingSet) -> Result<()> {
        let json = serde_json::to_string(readings)?;
        self.store.write(&self.key, &json)?;
        for (_, observer) in &self.observers {
            observer(readings);
        }
        Ok(())
    }

    pub fn subscribe(&mut self, observer: impl Fn(&ReadingSet) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// returns false if the id was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn latest(&self) -> Result<Option<ReadingSet>> {
        self.reader().latest()
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader { store: Arc::clone(&self.store), key: self.key.clone() }
    }
}
