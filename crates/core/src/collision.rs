use crate::name::split_name;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Upper bound on numbered `base(n)ext` attempts for one candidate. Only
/// reached when the existence check never reports a free name.
pub const MAX_NUMBERED_ATTEMPTS: u64 = 1_000_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollisionError<E = Infallible> {
    #[error("no free name for {candidate:?} after {attempts} numbered attempts")]
    Exhausted { candidate: String, attempts: u64 },
    #[error("name check failed: {0}")]
    Lookup(E),
}

/// Returns `candidate` if it is free, otherwise the first free
/// `base(n)ext` for n = 1, 2, ...
pub fn resolve_collision(
    candidate: &str,
    mut exists: impl FnMut(&str) -> bool,
) -> Result<String, CollisionError> {
    try_resolve_collision(candidate, |name| Ok(exists(name)))
}

/// Like [`resolve_collision`], for checks backed by fallible I/O. The first
/// check error aborts resolution.
pub fn try_resolve_collision<E>(
    candidate: &str,
    exists: impl FnMut(&str) -> Result<bool, E>,
) -> Result<String, CollisionError<E>> {
    try_resolve_collision_within(candidate, MAX_NUMBERED_ATTEMPTS, exists)
}

pub fn try_resolve_collision_within<E>(
    candidate: &str,
    limit: u64,
    mut exists: impl FnMut(&str) -> Result<bool, E>,
) -> Result<String, CollisionError<E>> {
    if !exists(candidate).map_err(CollisionError::Lookup)? {
        return Ok(candidate.to_string());
    }

    let parts = split_name(candidate);
    for n in 1..=limit {
        let next = format!("{}({}){}", parts.base, n, parts.extension);
        if !exists(&next).map_err(CollisionError::Lookup)? {
            debug!(candidate, resolved = %next, attempts = n, "resolved name collision");
            return Ok(next);
        }
    }

    warn!(candidate, limit, "gave up looking for a free name");
    Err(CollisionError::Exhausted {
        candidate: candidate.to_string(),
        attempts: limit,
    })
}

/// Snapshot of the file names in one directory, plus names already handed
/// out during the current batch.
#[derive(Debug, Clone, Default)]
pub struct DirectoryListing {
    root: PathBuf,
    existing: HashSet<String>,
    reserved: HashSet<String>,
}

impl DirectoryListing {
    /// Lists the direct children of `root`. A missing directory is an empty
    /// namespace, since writing will create it.
    pub fn scan(root: &Path) -> Result<Self> {
        let mut existing = HashSet::new();

        if root.exists() {
            for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
                let entry = entry
                    .with_context(|| format!("failed to list directory: {}", root.display()))?;
                existing.insert(entry.file_name().to_string_lossy().to_string());
            }
        }

        debug!(root = %root.display(), entries = existing.len(), "scanned target directory");
        Ok(Self {
            root: root.to_path_buf(),
            existing,
            reserved: HashSet::new(),
        })
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            root: PathBuf::new(),
            existing: names.into_iter().map(Into::into).collect(),
            reserved: HashSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn contains(&self, name: &str) -> bool {
        self.existing.contains(name) || self.reserved.contains(name)
    }

    /// Marks `name` as taken for the rest of the batch.
    pub fn reserve(&mut self, name: &str) {
        self.reserved.insert(name.to_string());
    }

    pub fn len(&self) -> usize {
        self.existing.len() + self.reserved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
