// Tests for the URL result cache

use sitetopic_core::cache::{CacheEntry, ResultCache};
use std::fs;
use tempfile::TempDir;

fn entry() -> CacheEntry {
    CacheEntry::new(
        vec![Some("Services".to_string()), None],
        vec!["repair".to_string(), "install".to_string()],
    )
}

#[test]
fn test_missing_file_is_empty_cache() {
    let temp_dir = TempDir::new().unwrap();
    let cache = ResultCache::open(temp_dir.path().join("cache.json"));

    assert!(cache.is_empty());
    assert!(cache.get("https://example.com/").is_none());
}

#[test]
fn test_set_then_get() {
    let temp_dir = TempDir::new().unwrap();
    let mut cache = ResultCache::open(temp_dir.path().join("cache.json"));

    cache.set("https://example.com/", entry()).unwrap();

    assert_eq!(cache.get("https://example.com/"), Some(&entry()));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_set_persists_immediately() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cache.json");

    {
        let mut cache = ResultCache::open(&path);
        cache.set("https://example.com/", entry()).unwrap();
    }

    let reopened = ResultCache::open(&path);
    assert_eq!(reopened.get("https://example.com/"), Some(&entry()));
}

#[test]
fn test_set_overwrites_entry() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cache.json");
    let mut cache = ResultCache::open(&path);

    cache.set("u", entry()).unwrap();
    let replacement = CacheEntry::new(vec![None], vec!["other".to_string()]);
    cache.set("u", replacement.clone()).unwrap();

    assert_eq!(ResultCache::open(&path).get("u"), Some(&replacement));
}

#[test]
fn test_file_format_is_url_to_pair_of_arrays() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cache.json");
    let mut cache = ResultCache::open(&path);

    cache.set("https://example.com/", entry()).unwrap();

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        raw,
        serde_json::json!({
            "https://example.com/": [["Services", null], ["repair", "install"]]
        })
    );
}

#[test]
fn test_reads_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cache.json");
    fs::write(&path, r#"{"https://a.example/": [["Shop"], ["pets"]]}"#).unwrap();

    let cache = ResultCache::open(&path);

    assert_eq!(
        cache.get("https://a.example/"),
        Some(&CacheEntry::new(
            vec![Some("Shop".to_string())],
            vec!["pets".to_string()]
        ))
    );
}

#[test]
fn test_corrupt_file_resets_to_empty() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cache.json");
    fs::write(&path, "{ this is not json").unwrap();

    let mut cache = ResultCache::open(&path);
    assert!(cache.is_empty());

    // The next write replaces the corrupt file with a valid one
    cache.set("u", entry()).unwrap();
    assert_eq!(ResultCache::open(&path).get("u"), Some(&entry()));
}

#[test]
fn test_set_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("dir").join("cache.json");
    let mut cache = ResultCache::open(&path);

    cache.set("u", entry()).unwrap();

    assert!(path.exists());
}

#[test]
fn test_truncated_entry() {
    let truncated = entry().truncated(1);
    assert_eq!(truncated.categories, vec![Some("Services".to_string())]);
    assert_eq!(truncated.themes, vec!["repair".to_string()]);

    assert_eq!(entry().truncated(10), entry());
}
