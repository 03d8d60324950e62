use crate::store::KeywordTable;
use serde::Serialize;
use std::collections::HashMap;

/// Counter map that remembers first-insertion order.
///
/// Ranking sorts stably on top of that order, so equal counts always come out
/// in the order their keys were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountMap {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

pub type ScoreMap = CountMap;
pub type FrequentKeywordMap = CountMap;

impl CountMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` to `key`, creating the entry at zero first.
    pub fn add(&mut self, key: &str, count: u64) {
        match self.index.get(key) {
            Some(&position) => self.entries[position].1 += count,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), count));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.index.get(key).map(|&position| self.entries[position].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Positive entries, highest count first, at most `depth` of them.
    pub fn ranked(&self, depth: Option<usize>) -> Vec<RankedEntry> {
        let mut sorted: Vec<&(String, u64)> =
            self.entries.iter().filter(|(_, count)| *count > 0).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));

        sorted
            .into_iter()
            .take(depth.unwrap_or(usize::MAX))
            .map(|(label, count)| RankedEntry {
                label: label.clone(),
                count: *count,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub label: String,
    pub count: u64,
}

/// Scores text against a keyword table.
///
/// `analyze` accumulates, so several texts can be scored into one result;
/// call [`TopicAnalyzer::reset`] to start over.
#[derive(Debug, Default)]
pub struct TopicAnalyzer {
    scores: ScoreMap,
    frequent_keywords: FrequentKeywordMap,
}

impl TopicAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyze(&mut self, text: &str, keywords: &KeywordTable) {
        let haystack = text.to_lowercase();

        for (keyword, topic) in keywords.iter() {
            let count = count_occurrences(&haystack, keyword);
            self.scores.add(topic, count);
            if count > 0 {
                self.frequent_keywords.add(keyword, count);
            }
        }
    }

    /// Topics by descending score. Zero scores never appear.
    pub fn rank(&self, depth: Option<usize>) -> Vec<RankedEntry> {
        self.scores.ranked(depth)
    }

    pub fn rank_frequent_keywords(&self) -> Vec<RankedEntry> {
        self.frequent_keywords.ranked(None)
    }

    pub fn scores(&self) -> &ScoreMap {
        &self.scores
    }

    pub fn frequent_keywords(&self) -> &FrequentKeywordMap {
        &self.frequent_keywords
    }

    pub fn reset(&mut self) {
        self.scores.clear();
        self.frequent_keywords.clear();
    }
}

/// Non-overlapping, case-insensitive substring count.
///
/// `haystack` must already be lowercased. Partial words match: "ремонт" is
/// found inside "ремонтные".
fn count_occurrences(haystack: &str, keyword: &str) -> u64 {
    if keyword.is_empty() {
        return 0;
    }
    haystack.matches(keyword.to_lowercase().as_str()).count() as u64
}
