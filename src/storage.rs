//! Local key-value store standing in for browser storage.
//!
//! One file per key under a root directory. Values are opaque strings.

use std::io;
use std::path::{Path, PathBuf};
use std::{fs, io::ErrorKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KvStore {
    root: PathBuf,
}

impl KvStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store under `data_dir` if given, else the platform data directory.
    pub fn open_default(data_dir: Option<&Path>) -> Self {
        if let Some(dir) = data_dir {
            return Self::new(dir);
        }
        if let Some(data_dir) = dirs::data_local_dir() {
            return Self::new(data_dir.join("agentdesk").join("state"));
        }
        Self::new(PathBuf::from("cache").join("state"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_key(key)))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    pub fn set(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.path_for(key), value)
    }

    pub fn delete(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    pub fn keys(&self) -> Vec<String> {
        fs::read_dir(&self.root)
            .map(|entries| {
                entries
                    .flatten()
                    .filter_map(|entry| {
                        let path = entry.path();
                        if path.extension().and_then(|e| e.to_str()) == Some("json") {
                            path.file_stem()
                                .and_then(|s| s.to_str())
                                .map(|s| s.to_string())
                        } else {
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_dir_all(&self.root) {
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Keys become file names: keep `[A-Za-z0-9_-]`, at most 64 chars.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect()
}
