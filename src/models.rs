use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A single story hit, as returned by the search API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Story {
    #[serde(rename = "objectID", default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(rename = "points", default, deserialize_with = "lenient_count")]
    pub score: u32,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(rename = "num_comments", default, deserialize_with = "lenient_count")]
    pub comments_count: u32,
}

impl Story {
    pub fn has_link(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// Envelope of every search response. Only `hits` is consumed.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub hits: Vec<Story>,
}

// Nulls, numbers and strings are all accepted; anything else becomes empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

// Counts are never negative; malformed values fall back to 0.
fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    };
    Ok(u32::try_from(count).unwrap_or(u32::MAX))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Loaded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub status: EntryStatus,
    pub stories: Vec<Story>,
    pub fetched_at: Instant,
}

/// Results per committed search term, with a time-to-live.
pub struct QueryCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    fn is_entry_valid(&self, entry: &CacheEntry, now: Instant) -> bool {
        entry.status == EntryStatus::Loaded && now.saturating_duration_since(entry.fetched_at) < self.ttl
    }

    /// Stories for `term` if a successful fetch happened within the TTL.
    pub fn get_fresh(&self, term: &str, now: Instant) -> Option<&[Story]> {
        self.entries
            .get(term)
            .filter(|entry| self.is_entry_valid(entry, now))
            .map(|entry| entry.stories.as_slice())
    }

    #[cfg(test)]
    pub fn entry(&self, term: &str) -> Option<&CacheEntry> {
        self.entries.get(term)
    }

    pub fn update_stories(&mut self, term: &str, stories: Vec<Story>, now: Instant) {
        self.entries.insert(
            term.to_string(),
            CacheEntry {
                status: EntryStatus::Loaded,
                stories,
                fetched_at: now,
            },
        );
    }

    pub fn mark_failed(&mut self, term: &str, now: Instant) {
        self.entries.insert(
            term.to_string(),
            CacheEntry {
                status: EntryStatus::Failed,
                stories: Vec::new(),
                fetched_at: now,
            },
        );
    }

    pub fn invalidate(&mut self, term: &str) {
        self.entries.remove(term);
    }

    /// Drops every entry that could no longer be served. Returns how many went.
    pub fn evict_stale(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        // Failed entries are never served, so they go too
        self.entries.retain(|_, entry| {
            entry.status == EntryStatus::Loaded && now.saturating_duration_since(entry.fetched_at) < ttl
        });
        before - self.entries.len()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(id: &str) -> Story {
        Story {
            id: id.to_string(),
            title: format!("Story {}", id),
            score: 1,
            url: String::new(),
            comments_count: 0,
        }
    }

    #[test]
    fn parses_complete_hit() {
        let body = r#"{"hits":[{"objectID":"1","title":"Foo","points":42,"url":"http://x","num_comments":3}]}"#;
        let response: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.hits,
            vec![Story {
                id: "1".to_string(),
                title: "Foo".to_string(),
                score: 42,
                url: "http://x".to_string(),
                comments_count: 3,
            }]
        );
        assert!(response.hits[0].has_link());
    }

    #[test]
    fn missing_and_malformed_fields_default() {
        let body = r#"{"hits":[
            {"objectID":"2","title":null,"points":null,"num_comments":"seven"},
            {"objectID":3,"title":"Neg","points":-5,"url":null,"num_comments":"12"}
        ]}"#;
        let response: SearchResponse = serde_json::from_str(body).unwrap();

        let first = &response.hits[0];
        assert_eq!(first.title, "");
        assert_eq!(first.score, 0);
        assert_eq!(first.comments_count, 0);
        assert!(!first.has_link());

        let second = &response.hits[1];
        assert_eq!(second.id, "3");
        assert_eq!(second.score, 0);
        assert_eq!(second.comments_count, 12);
        assert_eq!(second.url, "");
    }

    #[test]
    fn envelope_without_hits_is_rejected() {
        assert!(serde_json::from_str::<SearchResponse>(r#"{"nbHits":0}"#).is_err());
    }

    #[test]
    fn cache_serves_only_fresh_successes() {
        let start = Instant::now();
        let mut cache = QueryCache::new(Duration::from_secs(60));

        cache.update_stories("rust", vec![story("1")], start);
        cache.mark_failed("go", start);

        assert_eq!(cache.get_fresh("rust", start + Duration::from_secs(59)).map(|s| s.len()), Some(1));
        assert!(cache.get_fresh("rust", start + Duration::from_secs(60)).is_none());
        assert!(cache.get_fresh("go", start).is_none());
        assert_eq!(cache.entry("go").map(|e| e.status), Some(EntryStatus::Failed));
    }

    #[test]
    fn eviction_keeps_fresh_entries() {
        let start = Instant::now();
        let mut cache = QueryCache::new(Duration::from_secs(10));

        cache.update_stories("old", vec![story("1")], start);
        cache.update_stories("new", vec![story("2")], start + Duration::from_secs(8));
        cache.mark_failed("broken", start + Duration::from_secs(8));

        assert_eq!(cache.evict_stale(start + Duration::from_secs(12)), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.entry("new").is_some());

        cache.invalidate("new");
        assert_eq!(cache.len(), 0);
    }
}
