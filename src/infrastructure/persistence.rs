//! Draft persistence.
//!
//! The in-progress record is stored as a small JSON object under one fixed
//! key of a [`DraftSlot`]. Loading never fails loudly: a missing, unreadable,
//! malformed or stale payload simply yields no draft, and a rejected payload
//! is removed so it is not read again.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{format_timestamp, parse_timestamp, DraftRecord, FieldKind, FieldSchema, FieldValue};

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("Failed to access draft slot at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Draft slot lock poisoned")]
    Poisoned,
}

/// A durable key-value slot holding serialized drafts.
pub trait DraftSlot: Send {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError>;
    fn write(&self, key: &str, payload: &str) -> Result<(), SlotError>;
    fn remove(&self, key: &str) -> Result<(), SlotError>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn io_error(path: &Path, source: io::Error) -> SlotError {
        SlotError::Io { path: path.to_path_buf(), source }
    }
}

impl DraftSlot for FileSlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(&path, e)),
        }
    }

    fn write(&self, key: &str, payload: &str) -> Result<(), SlotError> {
        fs::create_dir_all(&self.dir).map_err(|e| Self::io_error(&self.dir, e))?;
        let path = self.path_for(key);
        fs::write(&path, payload).map_err(|e| Self::io_error(&path, e))
    }

    fn remove(&self, key: &str) -> Result<(), SlotError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(&path, e)),
        }
    }
}

/// In-memory slot. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current raw payload under `key`, if any.
    pub fn payload(&self, key: &str) -> Option<String> {
        self.entries.lock().ok().and_then(|e| e.get(key).cloned())
    }
}

impl DraftSlot for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        let entries = self.entries.lock().map_err(|_| SlotError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, payload: &str) -> Result<(), SlotError> {
        let mut entries = self.entries.lock().map_err(|_| SlotError::Poisoned)?;
        entries.insert(key.to_string(), payload.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SlotError> {
        let mut entries = self.entries.lock().map_err(|_| SlotError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Values restored from the slot: only fields that were non-empty and
/// differed from their default when saved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PersistedDraft {
    values: BTreeMap<String, FieldValue>,
}

impl PersistedDraft {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Why a stored payload was thrown away.
#[derive(Debug, Error)]
enum Rejection {
    #[error("payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("field '{0}' holds a value of the wrong type")]
    BadValue(String),

    #[error("select field '{0}' is empty, draft predates the current form")]
    StaleSelect(String),
}

/// Reads and writes the draft of one form under a fixed key.
pub struct DraftStore {
    slot: Box<dyn DraftSlot>,
    key: String,
    schema: Arc<FieldSchema>,
}

impl DraftStore {
    pub fn new(slot: Box<dyn DraftSlot>, key: impl Into<String>, schema: Arc<FieldSchema>) -> Self {
        Self { slot, key: key.into(), schema }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Restores the stored draft, or `None` if there is nothing usable.
    pub fn load(&self) -> Option<PersistedDraft> {
        let payload = match self.slot.read(&self.key) {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "could not read draft");
                return None;
            }
        };

        match self.decode(&payload) {
            Ok(draft) => {
                debug!(key = %self.key, fields = draft.len(), "restored draft");
                Some(draft)
            }
            Err(reason) => {
                warn!(key = %self.key, %reason, "discarding stored draft");
                if let Err(e) = self.slot.remove(&self.key) {
                    warn!(key = %self.key, error = %e, "could not remove discarded draft");
                }
                None
            }
        }
    }

    /// Overwrites the slot with the minimal payload for `record`.
    pub fn save(&self, record: &DraftRecord) -> Result<(), SlotError> {
        let payload = Value::Object(self.encode(record)).to_string();
        self.slot.write(&self.key, &payload)
    }

    pub fn clear(&self) -> Result<(), SlotError> {
        self.slot.remove(&self.key)
    }

    /// Fields that are empty or equal to their default are left out.
    pub fn encode(&self, record: &DraftRecord) -> Map<String, Value> {
        let mut map = Map::new();
        for field in self.schema.fields() {
            let value = record.get(&field.name);
            if value.is_empty() || *value == field.default {
                continue;
            }
            let json = match value {
                FieldValue::Text(s) => Value::String(s.clone()),
                FieldValue::Bool(b) => Value::Bool(*b),
                FieldValue::Date(d) => Value::String(format_timestamp(d)),
                FieldValue::Unset => continue,
            };
            map.insert(field.name.clone(), json);
        }
        map
    }

    fn decode(&self, payload: &str) -> Result<PersistedDraft, Rejection> {
        let object = match serde_json::from_str::<Value>(payload)? {
            Value::Object(object) => object,
            _ => return Err(Rejection::NotAnObject),
        };

        let mut values = BTreeMap::new();
        for (name, json) in object {
            let Some(field) = self.schema.field(&name) else {
                continue;
            };
            let value = match (&field.kind, json) {
                (_, Value::Null) => continue,
                (FieldKind::Enum { .. }, Value::String(s)) if s.is_empty() => {
                    return Err(Rejection::StaleSelect(name));
                }
                (FieldKind::Boolean, Value::Bool(b)) => FieldValue::Bool(b),
                (FieldKind::Date, Value::String(s)) if s.is_empty() => continue,
                (FieldKind::Date, Value::String(s)) => match parse_timestamp(&s) {
                    Some(date) => FieldValue::Date(date),
                    None => return Err(Rejection::BadValue(name)),
                },
                (FieldKind::Boolean | FieldKind::Date, _) => return Err(Rejection::BadValue(name)),
                (_, Value::String(s)) if s.is_empty() => continue,
                (_, Value::String(s)) => FieldValue::Text(s),
                _ => return Err(Rejection::BadValue(name)),
            };
            values.insert(name, value);
        }
        Ok(PersistedDraft { values })
    }
}
