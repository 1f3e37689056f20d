use chrono::Utc;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::{ChallengeAssignment, Goal, Owned, ProgressLog, Review, Snippet, TrackedRepo};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// In-memory keyed collection of one record type.
///
/// Iteration follows insertion order; replacing an existing key keeps its
/// position. On disk a store is a JSON array of `[key, record]` pairs.
#[derive(Clone, Debug, PartialEq)]
pub struct Store<T> {
    records: IndexMap<String, T>,
}

impl<T> Store<T> {
    pub fn new() -> Self {
        Self {
            records: IndexMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.records.get(key)
    }

    /// Inserts or fully replaces the record under `key`.
    pub fn set(&mut self, key: impl Into<String>, record: T) {
        self.records.insert(key.into(), record);
    }

    pub fn has(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn delete(&mut self, key: &str) -> Option<T> {
        self.records.shift_remove(key)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.records.values()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &T)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: Owned> Store<T> {
    /// Entries whose owner is exactly `owner`, in store order.
    pub fn owned_by<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = (&'a String, &'a T)> {
        self.records
            .iter()
            .filter(move |(_, record)| record.owner_id() == owner)
    }
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(String, T)> for Store<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<T: Serialize> Serialize for Store<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.records.iter())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Store<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pairs = Vec::<(String, T)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

/// Reads a store file. A missing file is an empty store; a file that cannot
/// be read or parsed is moved aside as `<file>.corrupt-<unix-ms>` and the
/// store starts empty. Neither case is reported to callers.
pub fn load<T: DeserializeOwned>(path: &Path) -> Store<T> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!("No existing data at {}, starting fresh", path.display());
            return Store::new();
        }
        Err(e) => {
            tracing::warn!("Failed to read {}: {e}", path.display());
            quarantine(path);
            return Store::new();
        }
    };

    match serde_json::from_str::<Store<T>>(&contents) {
        Ok(store) => {
            tracing::info!("Loaded {} records from {}", store.len(), path.display());
            store
        }
        Err(e) => {
            tracing::warn!("Failed to parse {}: {e}", path.display());
            quarantine(path);
            Store::new()
        }
    }
}

fn quarantine(path: &Path) {
    let mut target = path.as_os_str().to_owned();
    target.push(format!(".corrupt-{}", Utc::now().timestamp_millis()));
    let target = PathBuf::from(target);
    match fs::rename(path, &target) {
        Ok(()) => tracing::warn!("Preserved unreadable data file as {}", target.display()),
        Err(e) => tracing::error!("Could not preserve {}: {e}", path.display()),
    }
}

/// Overwrites `path` with the full contents of `store`.
pub fn save<T: Serialize>(path: &Path, store: &Store<T>) -> Result<(), StorageError> {
    let payload = serde_json::to_string_pretty(store)?;
    write_payload(path, &payload)
}

fn write_payload(path: &Path, payload: &str) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp = path.with_extension("tmp");
    let mut f = File::create(&temp)?;
    f.write_all(payload.as_bytes())?;
    f.sync_all()?;
    fs::rename(temp, path)?;
    Ok(())
}

/// Writes an already serialized store from a blocking task.
pub async fn save_snapshot_async(path: PathBuf, payload: String) -> Result<(), StorageError> {
    tokio::task::spawn_blocking(move || write_payload(&path, &payload))
        .await
        .map_err(|e| {
            StorageError::Io(std::io::Error::other(format!(
                "spawn_blocking failed: {}",
                e
            )))
        })?
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreName {
    Snippets,
    Goals,
    Challenges,
    Reviews,
    Repos,
    Progress,
}

impl StoreName {
    pub const ALL: [StoreName; 6] = [
        StoreName::Snippets,
        StoreName::Goals,
        StoreName::Challenges,
        StoreName::Reviews,
        StoreName::Repos,
        StoreName::Progress,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            StoreName::Snippets => "snippets.json",
            StoreName::Goals => "goals.json",
            StoreName::Challenges => "challenges.json",
            StoreName::Reviews => "reviews.json",
            StoreName::Repos => "repos.json",
            StoreName::Progress => "progress.json",
        }
    }
}

/// Every store the bot owns, one per entity type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stores {
    pub snippets: Store<Snippet>,
    pub goals: Store<Goal>,
    pub challenges: Store<ChallengeAssignment>,
    pub reviews: Store<Review>,
    pub repos: Store<TrackedRepo>,
    pub progress: Store<ProgressLog>,
}

impl Stores {
    pub fn load(data_dir: &Path) -> Self {
        let path = |name: StoreName| data_dir.join(name.file_name());
        Self {
            snippets: load(&path(StoreName::Snippets)),
            goals: load(&path(StoreName::Goals)),
            challenges: load(&path(StoreName::Challenges)),
            reviews: load(&path(StoreName::Reviews)),
            repos: load(&path(StoreName::Repos)),
            progress: load(&path(StoreName::Progress)),
        }
    }

    /// Serializes one store so it can be written without holding a borrow.
    pub fn snapshot(&self, name: StoreName) -> Result<String, StorageError> {
        let payload = match name {
            StoreName::Snippets => serde_json::to_string_pretty(&self.snippets)?,
            StoreName::Goals => serde_json::to_string_pretty(&self.goals)?,
            StoreName::Challenges => serde_json::to_string_pretty(&self.challenges)?,
            StoreName::Reviews => serde_json::to_string_pretty(&self.reviews)?,
            StoreName::Repos => serde_json::to_string_pretty(&self.repos)?,
            StoreName::Progress => serde_json::to_string_pretty(&self.progress)?,
        };
        Ok(payload)
    }

    pub async fn persist(&self, data_dir: &Path, name: StoreName) -> Result<(), StorageError> {
        let payload = self.snapshot(name)?;
        save_snapshot_async(data_dir.join(name.file_name()), payload).await
    }

    pub async fn persist_all(&self, data_dir: &Path) -> Result<(), StorageError> {
        for name in StoreName::ALL {
            self.persist(data_dir, name).await?;
        }
        Ok(())
    }
}
