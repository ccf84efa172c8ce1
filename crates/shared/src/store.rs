//! Bounded, ordered record of block ids that have already been handled.
//!
//! [`ProcessedIdSet`] is the in-memory structure and owns the eviction rule.
//! [`PersistentProcessedSet`] loads it from a [`KeyValueStore`] once per run
//! and writes it back on every `add`.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, SyndicationError};

pub const DEFAULT_MAX_PROCESSED: usize = 200;

/// Insertion-ordered id set that keeps only the most recent `capacity` ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedIdSet {
    ids: VecDeque<String>,
    capacity: usize,
}

impl ProcessedIdSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            ids: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Rebuild a set from stored ids (oldest first). Repeats keep their first
    /// position and only the newest `capacity` ids survive.
    pub fn from_ids<I, S>(ids: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new(capacity);
        let mut deduped: Vec<String> = Vec::new();
        for id in ids {
            let id = id.into();
            if !deduped.contains(&id) {
                deduped.push(id);
            }
        }
        let skip = deduped.len().saturating_sub(set.capacity);
        set.ids.extend(deduped.into_iter().skip(skip));
        set
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    /// Append `id` unless present, evicting the oldest ids past capacity.
    /// Returns whether the set changed.
    pub fn add(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push_back(id.to_string());
        while self.ids.len() > self.capacity {
            self.ids.pop_front();
        }
        true
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Ids oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

/// The two operations the pipeline needs from the processed set.
pub trait ProcessedSetStore {
    fn contains(&self, id: &str) -> bool;

    /// Record `id` durably.
    fn add(&mut self, id: &str) -> Result<()>;
}

/// String key-value persistence backing the processed set.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
}

/// SQLite-backed key-value table.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )?;
        Ok(Self { conn })
    }

    /// When `key` was last written, as stored (RFC 3339).
    pub fn updated_at(&self, key: &str) -> Result<Option<String>> {
        let updated = self
            .conn
            .query_row(
                "SELECT updated_at FROM kv WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(updated)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// Non-durable backend, used in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| SyndicationError::Storage("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Storage key for a channel's processed ids.
pub fn processed_key(channel: &str) -> String {
    format!("processed_block_ids:{}", channel)
}

/// A [`ProcessedIdSet`] loaded from, and written through to, a key-value store.
pub struct PersistentProcessedSet<S: KeyValueStore> {
    backend: S,
    key: String,
    set: ProcessedIdSet,
}

impl<S: KeyValueStore> PersistentProcessedSet<S> {
    pub fn load(backend: S, channel: &str, capacity: usize) -> Result<Self> {
        let key = processed_key(channel);
        let set = match backend.get(&key)? {
            Some(raw) => {
                let ids: Vec<String> = serde_json::from_str(&raw)?;
                ProcessedIdSet::from_ids(ids, capacity)
            }
            None => ProcessedIdSet::new(capacity),
        };
        tracing::debug!(key = %key, count = set.len(), "Loaded processed ids");
        Ok(Self { backend, key, set })
    }

    pub fn ids(&self) -> &ProcessedIdSet {
        &self.set
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Forget every id for this channel.
    pub fn clear(&mut self) -> Result<()> {
        self.backend.delete(&self.key)?;
        self.set.clear();
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        let ids: Vec<&str> = self.set.iter().collect();
        self.backend.set(&self.key, &serde_json::to_string(&ids)?)
    }
}

impl<S: KeyValueStore> ProcessedSetStore for PersistentProcessedSet<S> {
    fn contains(&self, id: &str) -> bool {
        self.set.contains(id)
    }

    fn add(&mut self, id: &str) -> Result<()> {
        if self.set.add(id) {
            self.persist()?;
        }
        Ok(())
    }
}
