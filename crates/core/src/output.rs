use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum WriteError {
    /// The name was free when checked but exists now. Nothing was written.
    #[error("target already exists: {}", path.display())]
    Conflict { path: PathBuf },
    #[error("not a plain file name: {name:?}")]
    InvalidName { name: String },
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WriteError {
    /// Conflicts can be retried after resolving the name again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WriteError::Conflict { .. })
    }
}

/// Writes `payload` to `dir/name`, creating `dir` if needed. An existing file
/// is never overwritten.
pub fn write_new_file(dir: &Path, name: &str, payload: &[u8]) -> Result<PathBuf, WriteError> {
    if !is_plain_file_name(name) {
        return Err(WriteError::InvalidName {
            name: name.to_string(),
        });
    }

    fs::create_dir_all(dir).map_err(|source| WriteError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(name);
    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            return Err(WriteError::Conflict { path });
        }
        Err(source) => return Err(WriteError::Io { path, source }),
    };

    if let Err(source) = file.write_all(payload).and_then(|()| file.sync_all()) {
        drop(file);
        let _ = fs::remove_file(&path);
        return Err(WriteError::Io { path, source });
    }

    info!(path = %path.display(), bytes = payload.len(), "wrote renamed file");
    Ok(path)
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
