//! Chained hash map backing the keyword and category tables.
//!
//! Bucket placement is a SHA-256 digest of the key read as one big-endian
//! integer and reduced modulo the bucket count, so a table loaded from the
//! same JSON file always lays out the same way.

use crate::error::StoreError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_INITIAL_BUCKETS: usize = 1000;
pub const DEFAULT_LOAD_FACTOR: f64 = 0.7;

/// Keyword → topic.
pub type KeywordTable = AssocStore<String>;
/// Topic → display category.
pub type CategoryTable = AssocStore<String>;

#[derive(Debug, Clone)]
pub struct AssocStore<V> {
    buckets: Vec<Vec<(String, V)>>,
    len: usize,
    load_factor: f64,
}

impl<V> AssocStore<V> {
    pub fn new() -> Self {
        Self {
            buckets: empty_buckets(DEFAULT_INITIAL_BUCKETS),
            len: 0,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }

    pub fn with_capacity(initial_buckets: usize, load_factor: f64) -> Result<Self, StoreError> {
        if initial_buckets == 0 {
            return Err(StoreError::InvalidConfig(
                "bucket count must be at least 1".to_string(),
            ));
        }
        if !load_factor.is_finite() || load_factor <= 0.0 {
            return Err(StoreError::InvalidConfig(format!(
                "load factor must be a positive number, got {}",
                load_factor
            )));
        }

        Ok(Self {
            buckets: empty_buckets(initial_buckets),
            len: 0,
            load_factor,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Insert or overwrite `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        let index = bucket_index(&key, self.buckets.len());
        let bucket = &mut self.buckets[index];

        if let Some(slot) = bucket.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
            return;
        }

        bucket.push((key, value));
        self.len += 1;

        while self.len as f64 / self.buckets.len() as f64 > self.load_factor {
            self.resize();
        }
    }

    pub fn get(&self, key: &str) -> Result<&V, StoreError> {
        let index = bucket_index(key, self.buckets.len());
        self.buckets[index]
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_ok()
    }

    /// Remove `key`, returning its value.
    pub fn delete(&mut self, key: &str) -> Result<V, StoreError> {
        let index = bucket_index(key, self.buckets.len());
        let bucket = &mut self.buckets[index];
        let position = bucket
            .iter()
            .position(|(k, _)| k == key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        let (_, value) = bucket.remove(position);
        self.len -= 1;
        Ok(value)
    }

    /// Insert every pair from `pairs`.
    pub fn load_pairs<K, I>(&mut self, pairs: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in pairs {
            self.insert(key, value);
        }
    }

    /// Pairs in bucket order. Calling again starts over.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.iter().map(|(k, v)| (k.as_str(), v)))
    }

    fn resize(&mut self) {
        let new_size = self.buckets.len() * 2;
        let mut new_buckets = empty_buckets(new_size);

        for (key, value) in self.buckets.drain(..).flatten() {
            let index = bucket_index(&key, new_size);
            new_buckets[index].push((key, value));
        }

        debug!("Resized store to {} buckets ({} entries)", new_size, self.len);
        self.buckets = new_buckets;
    }
}

impl<V: DeserializeOwned> AssocStore<V> {
    /// Populate from a flat JSON object of `key: value` pairs.
    pub fn load(&mut self, path: &Path) -> Result<(), StoreError> {
        let content = fs::read_to_string(path)?;
        let data: BTreeMap<String, V> = serde_json::from_str(&content)?;
        debug!("Loading {} entries from {}", data.len(), path.display());
        self.load_pairs(data);
        Ok(())
    }

    /// A fresh store with default sizing loaded from `path`.
    pub fn from_json_file(path: &Path) -> Result<Self, StoreError> {
        let mut store = Self::new();
        store.load(path)?;
        Ok(store)
    }
}

impl<V: Serialize> AssocStore<V> {
    /// Write the store as a flat JSON object.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let data: BTreeMap<&str, &V> = self.iter().collect();
        fs::write(path, serde_json::to_string(&data)?)?;
        Ok(())
    }
}

impl<V> Default for AssocStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for AssocStore<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        store.load_pairs(iter);
        store
    }
}

fn empty_buckets<V>(count: usize) -> Vec<Vec<(String, V)>> {
    (0..count).map(|_| Vec::new()).collect()
}

/// SHA-256 of `key` as a big-endian integer, modulo `bucket_count`.
fn bucket_index(key: &str, bucket_count: usize) -> usize {
    let digest = Sha256::digest(key.as_bytes());
    let modulus = bucket_count as u128;
    let remainder = digest
        .iter()
        .fold(0u128, |acc, byte| (acc * 256 + u128::from(*byte)) % modulus);
    remainder as usize
}
