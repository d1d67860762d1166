use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Number of renames kept for restore.
pub const HISTORY_LIMIT: usize = 5;

const INDEX_FILE: &str = "history.json";
const BLOB_DIR: &str = "blobs";

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: u64,
    pub original_name: String,
    pub final_name: String,
    pub mime_type: String,
    pub created_at: DateTime<Local>,
    pub payload: Arc<[u8]>,
}

impl HistoryEntry {
    pub fn new(
        original_name: impl Into<String>,
        final_name: impl Into<String>,
        mime_type: impl Into<String>,
        payload: Arc<[u8]>,
    ) -> Self {
        Self {
            id: 0,
            original_name: original_name.into(),
            final_name: final_name.into(),
            mime_type: mime_type.into(),
            created_at: Local::now(),
            payload,
        }
    }
}

/// Recent renames, oldest evicted once more than [`HISTORY_LIMIT`] are
/// appended.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
    next_id: u64,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `entry` and returns the id assigned to it.
    pub fn append(&mut self, mut entry: HistoryEntry) -> u64 {
        self.next_id += 1;
        entry.id = self.next_id;
        self.entries.push_back(entry);
        while self.entries.len() > HISTORY_LIMIT {
            if let Some(evicted) = self.entries.pop_front() {
                debug!(id = evicted.id, name = %evicted.final_name, "evicted history entry");
            }
        }
        self.next_id
    }

    /// Most recent first, at most `n` and never more than [`HISTORY_LIMIT`].
    pub fn recent(&self, n: usize) -> Vec<&HistoryEntry> {
        self.entries
            .iter()
            .rev()
            .take(n.min(HISTORY_LIMIT))
            .collect()
    }

    /// 1-based position in the same newest-first order as [`Self::recent`].
    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        let pos = index.checked_sub(1)?;
        self.entries.iter().rev().nth(pos)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct HistoryIndex {
    next_id: u64,
    entries: Vec<StoredEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    id: u64,
    original_name: String,
    final_name: String,
    mime_type: String,
    created_at: DateTime<Local>,
    blob: String,
}

fn blob_name(id: u64) -> String {
    format!("{id:08}.bin")
}

/// Writes the index and one payload file per entry under `dir`. Payload
/// files of evicted entries are removed.
pub fn save_history(dir: &Path, store: &HistoryStore) -> Result<()> {
    let blob_dir = dir.join(BLOB_DIR);
    fs::create_dir_all(&blob_dir)
        .with_context(|| format!("failed to create history directory: {}", blob_dir.display()))?;

    let mut stored = Vec::with_capacity(store.entries.len());
    let mut live_blobs = HashSet::new();
    for entry in &store.entries {
        let blob = blob_name(entry.id);
        let blob_path = blob_dir.join(&blob);
        if !blob_path.exists() {
            fs::write(&blob_path, &entry.payload).with_context(|| {
                format!("failed to write history payload: {}", blob_path.display())
            })?;
        }
        live_blobs.insert(blob.clone());
        stored.push(StoredEntry {
            id: entry.id,
            original_name: entry.original_name.clone(),
            final_name: entry.final_name.clone(),
            mime_type: entry.mime_type.clone(),
            created_at: entry.created_at,
            blob,
        });
    }

    let index = HistoryIndex {
        next_id: store.next_id,
        entries: stored,
    };
    let index_path = dir.join(INDEX_FILE);
    let body = serde_json::to_string_pretty(&index).context("failed to serialize history")?;
    fs::write(&index_path, body)
        .with_context(|| format!("failed to write history: {}", index_path.display()))?;

    for entry in fs::read_dir(&blob_dir)
        .with_context(|| format!("failed to read history directory: {}", blob_dir.display()))?
    {
        let entry = entry
            .with_context(|| format!("failed to read history entry: {}", blob_dir.display()))?;
        let file_name = entry.file_name().to_string_lossy().to_string();
        if live_blobs.contains(&file_name) {
            continue;
        }
        fs::remove_file(entry.path()).with_context(|| {
            format!("failed to remove stale payload: {}", entry.path().display())
        })?;
    }

    Ok(())
}

pub fn load_history(dir: &Path) -> Result<HistoryStore> {
    let index_path = dir.join(INDEX_FILE);
    if !index_path.exists() {
        return Ok(HistoryStore::new());
    }

    let raw = fs::read_to_string(&index_path)
        .with_context(|| format!("failed to read history: {}", index_path.display()))?;
    let index = serde_json::from_str::<HistoryIndex>(&raw).context("history file is corrupt")?;

    let blob_dir = dir.join(BLOB_DIR);
    let mut entries = VecDeque::with_capacity(index.entries.len());
    for stored in index.entries {
        let blob_path = blob_dir.join(&stored.blob);
        let payload = match fs::read(&blob_path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(
                    path = %blob_path.display(),
                    error = %err,
                    "skipping history entry without payload"
                );
                continue;
            }
        };
        entries.push_back(HistoryEntry {
            id: stored.id,
            original_name: stored.original_name,
            final_name: stored.final_name,
            mime_type: stored.mime_type,
            created_at: stored.created_at,
            payload: Arc::from(payload),
        });
    }

    while entries.len() > HISTORY_LIMIT {
        entries.pop_front();
    }

    Ok(HistoryStore {
        entries,
        next_id: index.next_id,
    })
}
