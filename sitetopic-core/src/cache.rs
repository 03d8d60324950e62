use crate::error::CacheError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Full ranking stored for one URL.
///
/// On disk this is the two-element array `[categories, themes]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "(Vec<Option<String>>, Vec<String>)",
    into = "(Vec<Option<String>>, Vec<String>)"
)]
pub struct CacheEntry {
    /// Category of each theme, `None` when the topic has no mapping.
    pub categories: Vec<Option<String>>,
    pub themes: Vec<String>,
}

impl CacheEntry {
    pub fn new(categories: Vec<Option<String>>, themes: Vec<String>) -> Self {
        Self { categories, themes }
    }

    /// The first `depth` categories and themes.
    pub fn truncated(&self, depth: usize) -> Self {
        Self {
            categories: self.categories.iter().take(depth).cloned().collect(),
            themes: self.themes.iter().take(depth).cloned().collect(),
        }
    }
}

impl From<(Vec<Option<String>>, Vec<String>)> for CacheEntry {
    fn from((categories, themes): (Vec<Option<String>>, Vec<String>)) -> Self {
        Self { categories, themes }
    }
}

impl From<CacheEntry> for (Vec<Option<String>>, Vec<String>) {
    fn from(entry: CacheEntry) -> Self {
        (entry.categories, entry.themes)
    }
}

/// URL → classification, mirrored to one JSON file.
///
/// Every `set` rewrites the whole file. Callers sharing a cache must hold a
/// lock across lookup, compute and `set`.
#[derive(Debug)]
pub struct ResultCache {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
}

impl ResultCache {
    /// Open the cache at `path`, loading whatever is already there.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut cache = Self {
            path: path.into(),
            entries: BTreeMap::new(),
        };
        cache.load();
        cache
    }

    /// Reload the in-memory mirror from disk.
    ///
    /// A missing file is an empty cache. An unreadable or corrupt file is
    /// logged and also treated as empty.
    pub fn load(&mut self) {
        self.entries = match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(
                        "Cache file {} is corrupt, starting empty: {}",
                        self.path.display(),
                        e
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(
                    "Cache file {} is unreadable, starting empty: {}",
                    self.path.display(),
                    e
                );
                BTreeMap::new()
            }
        };
        debug!(
            "Loaded {} cache entries from {}",
            self.entries.len(),
            self.path.display()
        );
    }

    pub fn get(&self, url: &str) -> Option<&CacheEntry> {
        self.entries.get(url)
    }

    /// Upsert `entry` and write the whole cache to disk.
    pub fn set(&mut self, url: impl Into<String>, entry: CacheEntry) -> Result<(), CacheError> {
        self.entries.insert(url.into(), entry);
        self.persist()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        // Write beside the target and swap it in, so readers never see half a file
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, serde_json::to_string(&self.entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
